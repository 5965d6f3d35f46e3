//! # Models
//!
//! The shared data structures of a decode: the context a replay is decoded under and the
//! structure that all of the streams are collected into. Each stream's own records live next to
//! the decoder that produces them.
//!
//! For serde, we only care about serialization. Deserialization is not implemented because the
//! JSON output is lossy (`Versioned::Missing` and an absent optional are not distinguishable once
//! a downstream consumer flattens them).

use crate::attributes::Attribute;
use crate::details::Details;
use crate::errors::DecodeError;
use crate::game::GameEvent;
use crate::init_data::InitData;
use crate::messages::MessageEvent;
use crate::parsing_utils::{decode_lossy, to_hex, trim_nul};
use crate::tracker::TrackerEvent;
use serde::{Serialize, Serializer};

/// Version of the game client that recorded the replay
#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy, Default)]
pub struct VersionInfo {
    pub major: u16,
    pub minor: u16,
    pub revision: u16,
    pub build: u32,
}

/// Everything a decoder needs to know about the replay besides the stream bytes. Decoders
/// only read it.
#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct ReplayContext {
    /// Build number of the replay, which selects the schema of each stream
    pub build: u32,
    pub base_version: VersionInfo,

    /// Attach the raw bytes of each game event to the record
    pub debug: bool,
}

impl ReplayContext {
    pub fn new(build: u32, base_version: VersionInfo) -> Self {
        ReplayContext {
            build,
            base_version,
            debug: false,
        }
    }

    pub fn with_debug(self, debug: bool) -> Self {
        ReplayContext { debug, ..self }
    }

    /// Replays from the first expansion line
    pub fn is_wol(&self) -> bool {
        self.base_version.major == 1
    }

    /// Replays from the second expansion line
    pub fn is_hots(&self) -> bool {
        self.base_version.major == 2
    }
}

/// Marks a field that not every schema version has. `Missing` means the build that recorded the
/// replay has no such field, which is different from an optional field that was left empty.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub enum Versioned<T> {
    #[default]
    Missing,
    Present(T),
}

impl<T> Versioned<T> {
    /// Decodes the field only when `available`
    pub fn when<E, F>(available: bool, f: F) -> Result<Versioned<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if available {
            f().map(Versioned::Present)
        } else {
            Ok(Versioned::Missing)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Versioned::Missing)
    }

    pub fn present(self) -> Option<T> {
        match self {
            Versioned::Present(x) => Some(x),
            Versioned::Missing => None,
        }
    }

    pub fn as_ref(&self) -> Versioned<&T> {
        match self {
            Versioned::Present(x) => Versioned::Present(x),
            Versioned::Missing => Versioned::Missing,
        }
    }
}

impl<T> From<Option<T>> for Versioned<T> {
    fn from(x: Option<T>) -> Self {
        match x {
            Some(x) => Versioned::Present(x),
            None => Versioned::Missing,
        }
    }
}

impl<T: Serialize> Serialize for Versioned<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Versioned::Present(x) => x.serialize(serializer),
            Versioned::Missing => serializer.serialize_unit_variant("Versioned", 0, "Missing"),
        }
    }
}

/// Reference to a dependency (map, mod, or localization file) on the game's file depot
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct CacheHandle {
    /// File extension, such as `s2ma`
    pub extension: String,

    /// Region of the depot server
    pub server: String,
    pub hash: String,
}

impl CacheHandle {
    pub const SIZE: usize = 40;

    pub fn from_bytes(data: &[u8], path: &str) -> Result<Self, DecodeError> {
        if data.len() != Self::SIZE {
            return Err(DecodeError::shape("40 byte cache handle", path));
        }

        let server = decode_lossy(trim_nul(&data[4..8]));
        Ok(CacheHandle {
            extension: decode_lossy(&data[..4]),
            server: String::from(server.trim_end()),
            hash: to_hex(&data[8..]),
        })
    }
}

/// The streams of a replay that were decoded. A stream is `None` when its bytes were not given or
/// its decode was skipped.
#[derive(Serialize, PartialEq, Debug, Clone, Default)]
pub struct Replay {
    pub init_data: Option<InitData>,
    pub details: Option<Details>,
    pub attributes: Option<Vec<Attribute>>,
    pub messages: Option<Vec<MessageEvent>>,
    pub game_events: Option<Vec<GameEvent>>,
    pub tracker_events: Option<Vec<TrackerEvent>>,
}
