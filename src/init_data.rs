//! The init data stream describes the lobby a game was launched from: who joined, the game
//! options, the slot restrictions of the map, and the files the game depends on.

use crate::bits::{BitArray, BitReader};
use crate::errors::{DecodeError, StreamKind};
use crate::models::{CacheHandle, ReplayContext, Versioned};
use crate::schema::{Line, SchemaTable};
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

/// Layout revisions of the init data stream. Every revision keeps the fields of the revisions
/// before it, so layouts are compared by order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InitDataLayout {
    Base,
    V16561,
    V17326,
    V19132,
    V22612,
    V23925,
    V24764,
    V26490,
}

pub fn schemas() -> &'static SchemaTable<InitDataLayout> {
    static TABLE: OnceLock<SchemaTable<InitDataLayout>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use InitDataLayout::*;
        SchemaTable::new(
            StreamKind::InitData,
            vec![
                (15405, Line::Any, Base),
                (16561, Line::Any, V16561),
                (17326, Line::Any, V17326),
                (19132, Line::Any, V19132),
                (22612, Line::Any, V22612),
                (23925, Line::Any, V23925),
                (24764, Line::Any, V24764),
                (26490, Line::Any, V26490),
            ],
        )
    })
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct InitData {
    pub player_init_data: Vec<PlayerInit>,
    pub game_description: GameDescription,
    pub lobby_state: LobbyState,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct PlayerInit {
    pub name: String,
    pub clan_tag: Versioned<Option<String>>,
    pub highest_league: Versioned<Option<u8>>,
    pub combined_race_levels: Versioned<Option<u32>>,
    pub random_seed: u32,
    pub race_preference: Option<u8>,
    pub team_preference: Versioned<Option<u8>>,
    pub test_map: bool,
    pub test_auto: bool,
    pub examine: Versioned<bool>,
    pub custom_interface: Versioned<bool>,
    pub observe: u8,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct GameOptions {
    pub lock_teams: bool,
    pub teams_together: bool,
    pub advanced_shared_control: bool,
    pub random_races: bool,
    pub battle_net: bool,
    pub amm: bool,
    pub competitive: bool,
    pub no_victory_or_defeat: bool,
    pub fog: u8,
    pub observers: u8,
    pub user_difficulty: u8,
    pub client_debug_flags: Versioned<u64>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct SlotDescription {
    pub allowed_colors: BitArray,
    pub allowed_races: BitArray,
    pub allowed_difficulty: BitArray,
    pub allowed_controls: BitArray,
    pub allowed_observe_types: BitArray,
    pub allowed_ai_builds: Versioned<BitArray>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct GameDescription {
    pub random_value: u32,
    pub game_cache_name: String,
    pub game_options: GameOptions,
    pub game_speed: u8,
    pub game_type: u8,
    pub max_users: u8,
    pub max_observers: u8,
    pub max_players: u8,
    pub max_teams: u8,
    pub max_colors: u8,
    pub max_races: u16,
    pub max_controls: u16,
    pub map_size_x: u8,
    pub map_size_y: u8,
    pub map_file_sync_checksum: u32,
    pub map_file_name: String,
    pub map_author_name: String,
    pub mod_file_sync_checksum: u32,
    pub slot_descriptions: Vec<SlotDescription>,
    pub default_difficulty: u8,
    pub default_ai_build: Versioned<u8>,
    pub cache_handles: Vec<CacheHandle>,
    pub is_blizzard_map: bool,
    pub is_premade_ffa: bool,
    pub is_coop_mode: Versioned<bool>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct LobbySlot {
    pub control: u8,
    pub user_id: Option<u8>,
    pub team_id: u8,
    pub color_preference: Option<u8>,
    pub race_preference: Option<u8>,
    pub difficulty: u8,
    pub ai_build: Versioned<u8>,
    pub handicap: u8,
    pub observe: u8,
    pub working_set_slot_id: Versioned<Option<u8>>,
    pub rewards: Vec<u32>,
    pub toon_handle: Versioned<String>,
    pub licenses: Versioned<Vec<u32>>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct LobbyState {
    pub phase: u8,
    pub max_users: u8,
    pub max_observers: u8,
    pub slots: Vec<LobbySlot>,
    pub random_seed: u32,
    pub host_user_id: Option<u8>,
    pub is_single_player: bool,
    pub game_duration: u32,
    pub default_difficulty: u8,
    pub default_ai_build: Versioned<u8>,
}

/// Decodes the init data stream of a replay
pub fn decode_init_data(data: &[u8], context: &ReplayContext) -> Result<InitData, DecodeError> {
    let layout = *schemas().resolve_for(context)?;
    let mut bits = BitReader::new(data);
    let res = InitReader {
        bits: &mut bits,
        layout,
    }
    .parse()?;

    debug!(
        ?layout,
        players = res.player_init_data.len(),
        slots = res.lobby_state.slots.len(),
        "decoded init data"
    );
    Ok(res)
}

struct InitReader<'a, 'b> {
    bits: &'b mut BitReader<'a>,
    layout: InitDataLayout,
}

impl<'a, 'b> InitReader<'a, 'b> {
    fn since(&self, layout: InitDataLayout) -> bool {
        self.layout >= layout
    }

    fn small(&mut self, count: u32) -> Result<u8, DecodeError> {
        self.bits.read_bits(count).map(|x| x as u8)
    }

    fn string(&mut self, len_bits: u32) -> Result<String, DecodeError> {
        let len = self.bits.read_bits(len_bits)? as usize;
        self.bits.read_aligned_string(len)
    }

    /// A bitfield that is prefixed with its width
    fn bitfield(&mut self, width_bits: u32) -> Result<BitArray, DecodeError> {
        let width = self.bits.read_bits(width_bits)? as u32;
        self.bits.read_bit_array(width)
    }

    fn parse(&mut self) -> Result<InitData, DecodeError> {
        let players = self.bits.read_bits(5)?;
        let player_init_data = (0..players)
            .map(|_| self.player())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InitData {
            player_init_data,
            game_description: self.game_description()?,
            lobby_state: self.lobby_state()?,
        })
    }

    fn player(&mut self) -> Result<PlayerInit, DecodeError> {
        use InitDataLayout::*;
        let v24764 = self.since(V24764);
        Ok(PlayerInit {
            name: self.string(8)?,
            clan_tag: Versioned::when(v24764, || {
                self.bits.if_get(|b| {
                    let len = b.read_u8()? as usize;
                    b.read_aligned_string(len)
                })
            })?,
            highest_league: Versioned::when(v24764, || self.bits.if_get(BitReader::read_u8))?,
            combined_race_levels: Versioned::when(v24764, || {
                self.bits.if_get(BitReader::read_u32)
            })?,
            random_seed: self.bits.read_u32()?,
            race_preference: self.bits.if_get(BitReader::read_u8)?,
            team_preference: Versioned::when(self.since(V16561), || {
                self.bits.if_get(BitReader::read_u8)
            })?,
            test_map: self.bits.read_bool()?,
            test_auto: self.bits.read_bool()?,
            examine: Versioned::when(self.since(V22612), || self.bits.read_bool())?,
            custom_interface: Versioned::when(v24764, || self.bits.read_bool())?,
            observe: self.small(2)?,
        })
    }

    fn game_options(&mut self) -> Result<GameOptions, DecodeError> {
        Ok(GameOptions {
            lock_teams: self.bits.read_bool()?,
            teams_together: self.bits.read_bool()?,
            advanced_shared_control: self.bits.read_bool()?,
            random_races: self.bits.read_bool()?,
            battle_net: self.bits.read_bool()?,
            amm: self.bits.read_bool()?,
            competitive: self.bits.read_bool()?,
            no_victory_or_defeat: self.bits.read_bool()?,
            fog: self.small(2)?,
            observers: self.small(2)?,
            user_difficulty: self.small(2)?,
            client_debug_flags: Versioned::when(self.since(InitDataLayout::V22612), || {
                self.bits.read_u64()
            })?,
        })
    }

    fn slot_description(&mut self) -> Result<SlotDescription, DecodeError> {
        Ok(SlotDescription {
            allowed_colors: self.bitfield(6)?,
            allowed_races: self.bitfield(8)?,
            allowed_difficulty: self.bitfield(6)?,
            allowed_controls: self.bitfield(8)?,
            allowed_observe_types: self.bitfield(2)?,
            allowed_ai_builds: Versioned::when(self.since(InitDataLayout::V23925), || {
                self.bitfield(7)
            })?,
        })
    }

    fn game_description(&mut self) -> Result<GameDescription, DecodeError> {
        use InitDataLayout::*;
        let random_value = self.bits.read_u32()?;
        let game_cache_name = self.string(10)?;
        let game_options = self.game_options()?;
        let game_speed = self.small(3)?;
        let game_type = self.small(3)?;
        let max_users = self.small(5)?;
        let max_observers = self.small(5)?;
        let max_players = self.small(5)?;
        let max_teams = self.small(4)? + 1;
        let max_colors = if self.since(V17326) {
            self.small(6)?
        } else {
            self.small(5)? + 1
        };
        let max_races = u16::from(self.bits.read_u8()?) + 1;
        let max_controls = u16::from(self.bits.read_u8()?) + u16::from(!self.since(V26490));
        let map_size_x = self.bits.read_u8()?;
        let map_size_y = self.bits.read_u8()?;
        let map_file_sync_checksum = self.bits.read_u32()?;
        let map_file_name = self.string(11)?;
        let map_author_name = self.string(8)?;
        let mod_file_sync_checksum = self.bits.read_u32()?;

        let slots = self.bits.read_bits(5)?;
        let slot_descriptions = (0..slots)
            .map(|_| self.slot_description())
            .collect::<Result<Vec<_>, _>>()?;

        let default_difficulty = self.small(6)?;
        let default_ai_build = Versioned::when(self.since(V23925), || self.small(7))?;
        let handle_bits = if self.since(V22612) { 6 } else { 4 };
        let handles = self.bits.read_bits(handle_bits)?;
        let cache_handles = (0..handles)
            .map(|i| {
                let raw = self.bits.read_aligned_bytes(CacheHandle::SIZE)?;
                CacheHandle::from_bytes(raw, &format!("game_description.cache_handles[{}]", i))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GameDescription {
            random_value,
            game_cache_name,
            game_options,
            game_speed,
            game_type,
            max_users,
            max_observers,
            max_players,
            max_teams,
            max_colors,
            max_races,
            max_controls,
            map_size_x,
            map_size_y,
            map_file_sync_checksum,
            map_file_name,
            map_author_name,
            mod_file_sync_checksum,
            slot_descriptions,
            default_difficulty,
            default_ai_build,
            cache_handles,
            is_blizzard_map: self.bits.read_bool()?,
            is_premade_ffa: self.bits.read_bool()?,
            is_coop_mode: Versioned::when(self.since(V23925), || self.bits.read_bool())?,
        })
    }

    fn lobby_slot(&mut self) -> Result<LobbySlot, DecodeError> {
        use InitDataLayout::*;
        let reward_bits = if self.since(V24764) { 6 } else { 5 };
        Ok(LobbySlot {
            control: self.bits.read_u8()?,
            user_id: self.bits.if_get(|b| b.read_bits(4).map(|x| x as u8))?,
            team_id: self.small(4)?,
            color_preference: self.bits.if_get(|b| b.read_bits(5).map(|x| x as u8))?,
            race_preference: self.bits.if_get(BitReader::read_u8)?,
            difficulty: self.small(6)?,
            ai_build: Versioned::when(self.since(V23925), || self.small(7))?,
            handicap: self.small(7)?,
            observe: self.small(2)?,
            working_set_slot_id: Versioned::when(self.since(V24764), || {
                self.bits.if_get(BitReader::read_u8)
            })?,
            rewards: self.bits.list_of(reward_bits, BitReader::read_u32)?,
            toon_handle: Versioned::when(self.since(V17326), || self.string(7))?,
            licenses: Versioned::when(self.since(V19132), || {
                self.bits.list_of(9, BitReader::read_u32)
            })?,
        })
    }

    fn lobby_state(&mut self) -> Result<LobbyState, DecodeError> {
        let phase = self.small(3)?;
        let max_users = self.small(5)?;
        let max_observers = self.small(5)?;
        let count = self.bits.read_bits(5)?;
        let slots = (0..count)
            .map(|_| self.lobby_slot())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LobbyState {
            phase,
            max_users,
            max_observers,
            slots,
            random_seed: self.bits.read_u32()?,
            host_user_id: self.bits.if_get(|b| b.read_bits(4).map(|x| x as u8))?,
            is_single_player: self.bits.read_bool()?,
            game_duration: self.bits.read_u32()?,
            default_difficulty: self.small(6)?,
            default_ai_build: Versioned::when(self.since(InitDataLayout::V23925), || {
                self.small(7)
            })?,
        })
    }
}
