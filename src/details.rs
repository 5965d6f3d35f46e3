use crate::bits::BitReader;
use crate::errors::{DecodeError, StreamKind};
use crate::models::{CacheHandle, ReplayContext, Versioned};
use crate::schema::{Line, SchemaTable};
use crate::variant::{read_struct, Value};
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

/// Battle.net identity of a player
#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct Toon {
    pub region: i64,
    pub program_id: i64,
    pub subregion: i64,
    pub uid: i64,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct DetailsPlayer {
    pub name: String,
    pub toon: Toon,
    pub race: String,
    pub color: Color,
    pub control: i64,
    pub team: i64,
    pub handicap: i64,
    pub observe: i64,
    pub result: i64,
    pub working_set_slot: Versioned<Option<i64>>,
}

/// Summary of a finished game
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct Details {
    pub players: Vec<DetailsPlayer>,
    pub map_name: String,
    pub difficulty: String,
    pub thumbnail: String,
    pub blizzard_map: bool,

    /// Windows file time of when the game was played
    pub file_time: i64,

    /// Offset of the recording client's clock from UTC in 100ns units
    pub utc_adjustment: i64,
    pub description: String,
    pub image_file_path: String,
    pub map_file_name: String,
    pub cache_handles: Vec<CacheHandle>,
    pub mini_save: bool,
    pub game_speed: i64,
    pub default_difficulty: i64,
    pub mod_paths: Versioned<Option<Vec<String>>>,
    pub campaign_index: Versioned<i64>,
    pub restart_as_transition_map: Versioned<bool>,
}

pub fn schemas() -> &'static SchemaTable<()> {
    static TABLE: OnceLock<SchemaTable<()>> = OnceLock::new();
    TABLE.get_or_init(|| SchemaTable::new(StreamKind::Details, vec![(15405, Line::Any, ())]))
}

/// Decodes the details stream into its positional fields
pub fn decode_details(data: &[u8], context: &ReplayContext) -> Result<Details, DecodeError> {
    schemas().resolve_for(context)?;
    let root = read_struct(&mut BitReader::new(data))?;
    let res = project(&root, context)?;
    debug!(players = res.players.len(), map = %res.map_name, "decoded details");
    Ok(res)
}

fn projection<T, F>(root: &Value, key: i64, path: &str, f: F) -> Result<T, DecodeError>
where
    F: FnOnce(&Value, &str) -> Result<T, DecodeError>,
{
    let path = format!("{}.{}", path, key);
    f(root.require(key, "details")?, &path)
}

fn player(
    value: &Value,
    path: &str,
    context: &ReplayContext,
) -> Result<DetailsPlayer, DecodeError> {
    let toon = value.require(1, path)?;
    let toon_path = format!("{}.toon", path);
    let color = value.require(3, path)?;
    let color_path = format!("{}.color", path);
    let int = |key: i64| value.require(key, path)?.as_i64(path);
    let channel = |key: i64| color.require(key, &color_path)?.as_int::<u8>(&color_path);

    Ok(DetailsPlayer {
        name: value.require(0, path)?.as_text(path)?,
        toon: Toon {
            region: toon.require(0, &toon_path)?.as_i64(&toon_path)?,
            program_id: toon.require(1, &toon_path)?.as_i64(&toon_path)?,
            subregion: toon.require(2, &toon_path)?.as_i64(&toon_path)?,
            uid: toon.require(4, &toon_path)?.as_i64(&toon_path)?,
        },
        race: value.require(2, path)?.as_text(path)?,
        color: Color {
            a: channel(0)?,
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
        },
        control: int(4)?,
        team: int(5)?,
        handicap: int(6)?,
        observe: int(7)?,
        result: int(8)?,
        working_set_slot: Versioned::when(context.build >= 24764, || {
            value.require(9, path)?.opt(|x| x.as_i64(path))
        })?,
    })
}

fn project(root: &Value, context: &ReplayContext) -> Result<Details, DecodeError> {
    let players = root
        .require(0, "details")?
        .as_array("details.players")?
        .iter()
        .enumerate()
        .map(|(i, p)| player(p, &format!("details.players[{}]", i), context))
        .collect::<Result<Vec<_>, _>>()?;

    let text = |key: i64| projection(root, key, "details", |v, p| v.as_text(p));
    let int = |key: i64| projection(root, key, "details", |v, p| v.as_i64(p));
    let flag = |key: i64| projection(root, key, "details", |v, p| v.as_bool(p));

    let cache_handles = projection(root, 10, "details", |v, p| {
        v.as_array(p)?
            .iter()
            .map(|x| CacheHandle::from_bytes(x.as_bytes(p)?, p))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let mod_paths = Versioned::when(context.build >= 22612 && context.is_wol(), || {
        projection(root, 14, "details", |v, p| {
            v.opt(|x| {
                x.as_array(p)?
                    .iter()
                    .map(|path| path.as_text(p))
                    .collect::<Result<Vec<_>, _>>()
            })
        })
    })?;

    Ok(Details {
        players,
        map_name: text(1)?,
        difficulty: text(2)?,
        thumbnail: projection(root, 3, "details", |v, p| v.require(0, p)?.as_text(p))?,
        blizzard_map: flag(4)?,
        file_time: int(5)?,
        utc_adjustment: int(6)?,
        description: text(7)?,
        image_file_path: text(8)?,
        map_file_name: text(9)?,
        cache_handles,
        mini_save: flag(11)?,
        game_speed: int(12)?,
        default_difficulty: int(13)?,
        mod_paths,
        campaign_index: Versioned::when(context.is_hots(), || int(15))?,
        restart_as_transition_map: Versioned::when(context.build > 26490, || flag(16))?,
    })
}
