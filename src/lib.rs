//! # s2replay
//!
//! s2replay decodes the binary streams found inside a real-time strategy replay archive: init
//! data, lobby attributes, game details, chat messages, game events, and tracker events. The
//! layout of each stream changed many times over the life of the game, so every decoder picks
//! the schema matching the build that recorded the replay. The archive container itself is not
//! handled here; hand the extracted stream bytes to the [`ParserBuilder`] or to any of the
//! per-stream `decode_*` functions.
//!
//! ```
//! use s2replay::{ParserBuilder, ReplayContext, ReplayStreams, VersionInfo};
//!
//! let version = VersionInfo {
//!     major: 2,
//!     minor: 0,
//!     revision: 4,
//!     build: 24944,
//! };
//!
//! // Normally extracted from the replay archive
//! let game_events: Vec<u8> = Vec::new();
//! let streams = ReplayStreams {
//!     game_events: Some(&game_events),
//!     ..ReplayStreams::default()
//! };
//!
//! let replay = ParserBuilder::new(ReplayContext::new(24944, version), streams)
//!     .must_parse_events()
//!     .parse()?;
//!
//! assert_eq!(replay.game_events, Some(Vec::new()));
//! println!("{}", serde_json::to_string(&replay)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Game events are where most of the build to build churn lives. The dispatch table of each
//! build is resolved once and shared, and most of the event codes are decoded only to keep the
//! stream aligned. Ask for them with [`ParserBuilder::keep_ignored_events`].

pub mod attributes;
pub mod bits;
pub mod core_parser;
pub mod details;
mod errors;
pub mod game;
pub mod init_data;
pub mod messages;
mod models;
mod parser;
mod parsing_utils;
pub mod schema;
pub mod selection;
pub mod tracker;
pub mod variant;

#[cfg(test)]
mod test_utils;

pub use self::attributes::{decode_attributes, Attribute};
pub use self::details::{decode_details, Details};
pub use self::errors::*;
pub use self::game::{
    decode_game_events, decode_game_events_with, GameEvent, GameEventData, GameEventOptions,
};
pub use self::init_data::{decode_init_data, InitData};
pub use self::messages::{decode_messages, MessageEvent};
pub use self::models::*;
pub use self::parser::*;
pub use self::tracker::{decode_tracker_events, TrackerEvent, TrackerEventData};
