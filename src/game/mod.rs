//! # Game events
//!
//! The game event stream records every action a player took along with a large amount of
//! interface chatter. Each record starts with a frame delta, the player id, and a seven bit
//! event code. The meaning of a code depends on the build, so the code is looked up in the
//! dispatch table of the replay's build to find the payload layout. Most codes are parsed only to
//! stay in step with the stream and are dropped afterwards.

pub mod dispatch;
mod events;
mod models;

pub use self::models::*;

use crate::bits::BitReader;
use crate::errors::{DecodeError, StreamKind};
use crate::models::ReplayContext;
use tracing::debug;

/// Controls which game events are returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameEventOptions {
    /// Return events that are parsed only to keep the stream aligned
    pub keep_ignored: bool,

    /// Attach the raw bit span of each event
    pub debug: bool,
}

/// Decodes the game event stream, returning the events that affect the game
pub fn decode_game_events(
    data: &[u8],
    context: &ReplayContext,
) -> Result<Vec<GameEvent>, DecodeError> {
    let options = GameEventOptions {
        keep_ignored: false,
        debug: context.debug,
    };
    decode_game_events_with(data, context, options)
}

struct Header {
    delta: u32,
    player: u8,
    code: u8,
}

fn read_header(bits: &mut BitReader<'_>) -> Result<Header, DecodeError> {
    Ok(Header {
        delta: bits.read_frames()?,
        player: bits.read_bits(5)? as u8,
        code: bits.read_bits(7)? as u8,
    })
}

pub fn decode_game_events_with(
    data: &[u8],
    context: &ReplayContext,
    options: GameEventOptions,
) -> Result<Vec<GameEvent>, DecodeError> {
    let table = dispatch::schemas().resolve_for(context)?;
    let mut bits = BitReader::new(data);
    let mut res = Vec::new();
    let mut frame = 0u64;
    let mut dropped = 0usize;

    // Every record ends aligned, so the cursor lands exactly on the end of a well formed stream
    while bits.byte_pos() != data.len() {
        let start = bits.tell();
        let byte_pos = bits.byte_pos();
        let header = read_header(&mut bits).map_err(|e| match e {
            DecodeError::TruncatedInput { .. } => DecodeError::StreamNotExhausted {
                stream: StreamKind::GameEvents,
                byte_pos,
                len: data.len(),
            },
            e => e,
        })?;

        frame += u64::from(header.delta);
        let entry = table
            .get(&header.code)
            .ok_or_else(|| DecodeError::UnknownEventType {
                stream: StreamKind::GameEvents,
                code: i64::from(header.code),
                byte_pos,
                frame,
            })?;

        let payload = events::read_payload(entry.kind, &mut bits).map_err(|e| {
            DecodeError::EventDecode {
                stream: StreamKind::GameEvents,
                code: i64::from(header.code),
                byte_pos,
                frame,
                source: Box::new(e),
            }
        })?;

        if entry.emit || options.keep_ignored {
            let raw = if options.debug {
                let end = bits.tell();
                Some(RawSpan {
                    start_bit: start,
                    end_bit: end,
                    bytes: bits.read_range(start, end).to_vec(),
                })
            } else {
                None
            };

            res.push(GameEvent {
                frame,
                player: header.player,
                code: header.code,
                data: payload,
                raw,
            });
        } else {
            dropped += 1;
        }

        bits.byte_align()?;
    }

    debug!(count = res.len(), dropped, frames = frame, "decoded game events");
    Ok(res)
}
