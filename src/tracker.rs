//! # Tracker events
//!
//! Tracker events are a log of unit lifetimes and periodic player statistics. Unlike the game
//! events, every part of a record is a tagged value tree, so there is a single layout and fields
//! added by later builds are recognized by their key being present.

use crate::bits::BitReader;
use crate::errors::{DecodeError, StreamKind};
use crate::models::{ReplayContext, Versioned};
use crate::schema::{Line, SchemaTable};
use crate::variant::{read_struct, Value};
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

/// Combines the index and recycle counter of a unit into the tag used by game events
pub fn unit_tag(index: i64, recycle: i64) -> i64 {
    (index << 18) + recycle
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct TrackerEvent {
    pub frame: u64,
    pub data: TrackerEventData,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub enum TrackerEventData {
    PlayerStats(PlayerStats),
    UnitBorn(UnitBorn),
    UnitDied(UnitDied),
    UnitOwnerChange(UnitOwnerChange),
    UnitTypeChange(UnitTypeChange),
    Upgrade(Upgrade),
    UnitInit(UnitInit),
    UnitDone(UnitDone),
    UnitPositions(UnitPositions),
}

/// Economy and army values of a player at a point in time
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct PlayerStats {
    pub player_id: i64,
    pub minerals_current: i64,
    pub vespene_current: i64,
    pub minerals_collection_rate: i64,
    pub vespene_collection_rate: i64,
    pub workers_active_count: i64,
    pub minerals_used_in_progress_army: i64,
    pub minerals_used_in_progress_economy: i64,
    pub minerals_used_in_progress_technology: i64,
    pub vespene_used_in_progress_army: i64,
    pub vespene_used_in_progress_economy: i64,
    pub vespene_used_in_progress_technology: i64,
    pub minerals_used_current_army: i64,
    pub minerals_used_current_economy: i64,
    pub minerals_used_current_technology: i64,
    pub vespene_used_current_army: i64,
    pub vespene_used_current_economy: i64,
    pub vespene_used_current_technology: i64,
    pub minerals_lost_army: i64,
    pub minerals_lost_economy: i64,
    pub minerals_lost_technology: i64,
    pub vespene_lost_army: i64,
    pub vespene_lost_economy: i64,
    pub vespene_lost_technology: i64,
    pub minerals_killed_army: i64,
    pub minerals_killed_economy: i64,
    pub minerals_killed_technology: i64,
    pub vespene_killed_army: i64,
    pub vespene_killed_economy: i64,
    pub vespene_killed_technology: i64,

    /// Supply used, in units of 1/4096
    pub food_used: i64,
    pub food_made: i64,
    pub minerals_used_active_forces: i64,
    pub vespene_used_active_forces: i64,
    pub minerals_friendly_fire_army: Versioned<i64>,
    pub minerals_friendly_fire_economy: Versioned<i64>,
    pub minerals_friendly_fire_technology: Versioned<i64>,
    pub vespene_friendly_fire_army: Versioned<i64>,
    pub vespene_friendly_fire_economy: Versioned<i64>,
    pub vespene_friendly_fire_technology: Versioned<i64>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct UnitBorn {
    pub unit_tag_index: i64,
    pub unit_tag_recycle: i64,
    pub unit_type_name: String,
    pub control_player_id: i64,
    pub upkeep_player_id: i64,
    pub x: i64,
    pub y: i64,
    pub creator_unit_tag_index: Versioned<Option<i64>>,
    pub creator_unit_tag_recycle: Versioned<Option<i64>>,
    pub creator_ability_name: Versioned<Option<String>>,
}

impl UnitBorn {
    pub fn unit_tag(&self) -> i64 {
        unit_tag(self.unit_tag_index, self.unit_tag_recycle)
    }
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct UnitDied {
    pub unit_tag_index: i64,
    pub unit_tag_recycle: i64,
    pub killer_player_id: Option<i64>,
    pub x: i64,
    pub y: i64,
    pub killer_unit_tag_index: Versioned<Option<i64>>,
    pub killer_unit_tag_recycle: Versioned<Option<i64>>,
}

impl UnitDied {
    pub fn unit_tag(&self) -> i64 {
        unit_tag(self.unit_tag_index, self.unit_tag_recycle)
    }
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct UnitOwnerChange {
    pub unit_tag_index: i64,
    pub unit_tag_recycle: i64,
    pub control_player_id: i64,
    pub upkeep_player_id: i64,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct UnitTypeChange {
    pub unit_tag_index: i64,
    pub unit_tag_recycle: i64,
    pub unit_type_name: String,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct Upgrade {
    pub player_id: i64,
    pub upgrade_type_name: String,
    pub count: i64,
}

/// Construction of a unit was started
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct UnitInit {
    pub unit_tag_index: i64,
    pub unit_tag_recycle: i64,
    pub unit_type_name: String,
    pub control_player_id: i64,
    pub upkeep_player_id: i64,
    pub x: i64,
    pub y: i64,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct UnitDone {
    pub unit_tag_index: i64,
    pub unit_tag_recycle: i64,
}

/// Positions of units that recently took damage. The items are delta encoded triples, see
/// [`UnitPositions::positions`].
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct UnitPositions {
    pub first_unit_index: i64,
    pub items: Vec<i64>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct UnitPosition {
    pub unit_index: i64,
    pub x: i64,
    pub y: i64,
}

impl UnitPositions {
    /// Expands the items into absolute unit indices and map positions. Each triple holds the
    /// offset from the previous unit index followed by the coordinates divided by four. A
    /// trailing partial triple is ignored. Out of range values wrap instead of saturating.
    pub fn positions(&self) -> Vec<UnitPosition> {
        let mut unit_index = self.first_unit_index;
        self.items
            .chunks_exact(3)
            .map(|item| {
                unit_index = unit_index.wrapping_add(item[0]);
                UnitPosition {
                    unit_index,
                    x: item[1].wrapping_mul(4),
                    y: item[2].wrapping_mul(4),
                }
            })
            .collect()
    }
}

pub fn schemas() -> &'static SchemaTable<()> {
    static TABLE: OnceLock<SchemaTable<()>> = OnceLock::new();
    TABLE.get_or_init(|| SchemaTable::new(StreamKind::TrackerEvents, vec![(15405, Line::Any, ())]))
}

/// Positional access to the fields of one payload
struct Fields<'a> {
    value: &'a Value,
    path: &'static str,
}

impl<'a> Fields<'a> {
    fn int(&self, key: i64) -> Result<i64, DecodeError> {
        self.value.require(key, self.path)?.as_i64(self.path)
    }

    fn text(&self, key: i64) -> Result<String, DecodeError> {
        self.value.require(key, self.path)?.as_text(self.path)
    }

    fn opt_int(&self, key: i64) -> Result<Option<i64>, DecodeError> {
        let path = self.path;
        self.value.require(key, path)?.opt(|x| x.as_i64(path))
    }

    /// A field that only newer builds write
    fn later<T, F>(&self, key: i64, f: F) -> Result<Versioned<T>, DecodeError>
    where
        F: FnOnce(&'a Value, &'static str) -> Result<T, DecodeError>,
    {
        let path = self.path;
        Versioned::when(self.value.field(key).is_some(), || {
            f(self.value.require(key, path)?, path)
        })
    }

    fn later_opt_int(&self, key: i64) -> Result<Versioned<Option<i64>>, DecodeError> {
        self.later(key, |x, path| x.opt(|x| x.as_i64(path)))
    }
}

fn player_stats(payload: &Value) -> Result<PlayerStats, DecodeError> {
    let event = Fields {
        value: payload,
        path: "player stats",
    };
    let stats = Fields {
        value: payload.require(1, "player stats")?,
        path: "player stats.stats",
    };
    let stat = |key: i64| stats.int(key);
    let friendly_fire = |key: i64| stats.later(key, |x, path| x.as_i64(path));

    Ok(PlayerStats {
        player_id: event.int(0)?,
        minerals_current: stat(0)?,
        vespene_current: stat(1)?,
        minerals_collection_rate: stat(2)?,
        vespene_collection_rate: stat(3)?,
        workers_active_count: stat(4)?,
        minerals_used_in_progress_army: stat(5)?,
        minerals_used_in_progress_economy: stat(6)?,
        minerals_used_in_progress_technology: stat(7)?,
        vespene_used_in_progress_army: stat(8)?,
        vespene_used_in_progress_economy: stat(9)?,
        vespene_used_in_progress_technology: stat(10)?,
        minerals_used_current_army: stat(11)?,
        minerals_used_current_economy: stat(12)?,
        minerals_used_current_technology: stat(13)?,
        vespene_used_current_army: stat(14)?,
        vespene_used_current_economy: stat(15)?,
        vespene_used_current_technology: stat(16)?,
        minerals_lost_army: stat(17)?,
        minerals_lost_economy: stat(18)?,
        minerals_lost_technology: stat(19)?,
        vespene_lost_army: stat(20)?,
        vespene_lost_economy: stat(21)?,
        vespene_lost_technology: stat(22)?,
        minerals_killed_army: stat(23)?,
        minerals_killed_economy: stat(24)?,
        minerals_killed_technology: stat(25)?,
        vespene_killed_army: stat(26)?,
        vespene_killed_economy: stat(27)?,
        vespene_killed_technology: stat(28)?,
        food_used: stat(29)?,
        food_made: stat(30)?,
        minerals_used_active_forces: stat(31)?,
        vespene_used_active_forces: stat(32)?,
        minerals_friendly_fire_army: friendly_fire(33)?,
        minerals_friendly_fire_economy: friendly_fire(34)?,
        minerals_friendly_fire_technology: friendly_fire(35)?,
        vespene_friendly_fire_army: friendly_fire(36)?,
        vespene_friendly_fire_economy: friendly_fire(37)?,
        vespene_friendly_fire_technology: friendly_fire(38)?,
    })
}

fn unit_born(payload: &Value) -> Result<UnitBorn, DecodeError> {
    let f = Fields {
        value: payload,
        path: "unit born",
    };

    Ok(UnitBorn {
        unit_tag_index: f.int(0)?,
        unit_tag_recycle: f.int(1)?,
        unit_type_name: f.text(2)?,
        control_player_id: f.int(3)?,
        upkeep_player_id: f.int(4)?,
        x: f.int(5)?,
        y: f.int(6)?,
        creator_unit_tag_index: f.later_opt_int(7)?,
        creator_unit_tag_recycle: f.later_opt_int(8)?,
        creator_ability_name: f.later(9, |x, path| x.opt(|x| x.as_text(path)))?,
    })
}

fn unit_died(payload: &Value) -> Result<UnitDied, DecodeError> {
    let f = Fields {
        value: payload,
        path: "unit died",
    };

    Ok(UnitDied {
        unit_tag_index: f.int(0)?,
        unit_tag_recycle: f.int(1)?,
        killer_player_id: f.opt_int(2)?,
        x: f.int(3)?,
        y: f.int(4)?,
        killer_unit_tag_index: f.later_opt_int(5)?,
        killer_unit_tag_recycle: f.later_opt_int(6)?,
    })
}

fn unit_positions(payload: &Value) -> Result<UnitPositions, DecodeError> {
    let path = "unit positions";
    Ok(UnitPositions {
        first_unit_index: payload.require(0, path)?.as_i64(path)?,
        items: payload
            .require(1, path)?
            .as_array(path)?
            .iter()
            .map(|x| x.as_i64(path))
            .collect::<Result<Vec<_>, _>>()?,
    })
}

fn project(tag: i64, payload: &Value) -> Result<Option<TrackerEventData>, DecodeError> {
    let res = match tag {
        0 => TrackerEventData::PlayerStats(player_stats(payload)?),
        1 => TrackerEventData::UnitBorn(unit_born(payload)?),
        2 => TrackerEventData::UnitDied(unit_died(payload)?),
        3 => {
            let f = Fields {
                value: payload,
                path: "unit owner change",
            };
            TrackerEventData::UnitOwnerChange(UnitOwnerChange {
                unit_tag_index: f.int(0)?,
                unit_tag_recycle: f.int(1)?,
                control_player_id: f.int(2)?,
                upkeep_player_id: f.int(3)?,
            })
        }
        4 => {
            let f = Fields {
                value: payload,
                path: "unit type change",
            };
            TrackerEventData::UnitTypeChange(UnitTypeChange {
                unit_tag_index: f.int(0)?,
                unit_tag_recycle: f.int(1)?,
                unit_type_name: f.text(2)?,
            })
        }
        5 => {
            let f = Fields {
                value: payload,
                path: "upgrade",
            };
            TrackerEventData::Upgrade(Upgrade {
                player_id: f.int(0)?,
                upgrade_type_name: f.text(1)?,
                count: f.int(2)?,
            })
        }
        6 => {
            let f = Fields {
                value: payload,
                path: "unit init",
            };
            TrackerEventData::UnitInit(UnitInit {
                unit_tag_index: f.int(0)?,
                unit_tag_recycle: f.int(1)?,
                unit_type_name: f.text(2)?,
                control_player_id: f.int(3)?,
                upkeep_player_id: f.int(4)?,
                x: f.int(5)?,
                y: f.int(6)?,
            })
        }
        7 => {
            let f = Fields {
                value: payload,
                path: "unit done",
            };
            TrackerEventData::UnitDone(UnitDone {
                unit_tag_index: f.int(0)?,
                unit_tag_recycle: f.int(1)?,
            })
        }
        8 => TrackerEventData::UnitPositions(unit_positions(payload)?),
        _ => return Ok(None),
    };

    Ok(Some(res))
}

/// Decodes the tracker event stream
pub fn decode_tracker_events(
    data: &[u8],
    context: &ReplayContext,
) -> Result<Vec<TrackerEvent>, DecodeError> {
    schemas().resolve_for(context)?;
    let mut bits = BitReader::new(data);
    let mut res = Vec::new();
    let mut frame = 0u64;
    while !bits.done() {
        let byte_pos = bits.byte_pos();
        let delta = read_struct(&mut bits)?.as_int::<u32>("tracker frame")?;
        frame += u64::from(delta);
        let tag = read_struct(&mut bits)?.as_i64("tracker event type")?;
        let payload = read_struct(&mut bits)?;

        let data = project(tag, &payload)
            .map_err(|e| DecodeError::EventDecode {
                stream: StreamKind::TrackerEvents,
                code: tag,
                byte_pos,
                frame,
                source: Box::new(e),
            })?
            .ok_or_else(|| DecodeError::UnknownEventType {
                stream: StreamKind::TrackerEvents,
                code: tag,
                byte_pos,
                frame,
            })?;

        res.push(TrackerEvent { frame, data });
    }

    debug!(count = res.len(), frames = frame, "decoded tracker events");
    Ok(res)
}
