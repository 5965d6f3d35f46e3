use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The replay stream a decoder was working on when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StreamKind {
    InitData,
    Attributes,
    Details,
    Messages,
    GameEvents,
    TrackerEvents,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamKind::InitData => "init data",
            StreamKind::Attributes => "attributes",
            StreamKind::Details => "details",
            StreamKind::Messages => "message events",
            StreamKind::GameEvents => "game events",
            StreamKind::TrackerEvents => "tracker events",
        };
        f.write_str(name)
    }
}

/// Every failure a decode can produce. All of them are terminal for the stream being decoded.
#[derive(Error, PartialEq, Debug, Clone)]
pub enum DecodeError {
    #[error("Insufficient data at bit {bit_pos}. Expected {requested} bits, but only {available} left")]
    TruncatedInput {
        bit_pos: usize,
        requested: usize,
        available: usize,
    },

    #[error("Build {build} is older than the earliest known {stream} schema ({earliest})")]
    UnsupportedBuild {
        stream: StreamKind,
        build: u32,
        earliest: u32,
    },

    #[error("Unknown {stream} event type {code:#x} at byte {byte_pos} (frame {frame})")]
    UnknownEventType {
        stream: StreamKind,
        code: i64,
        byte_pos: usize,
        frame: u64,
    },

    #[error("Malformed variant struct at byte {byte_pos}: {reason}")]
    MalformedVariantStruct { byte_pos: usize, reason: String },

    #[error("{stream} did not end on a record boundary: stopped at byte {byte_pos} of {len}")]
    StreamNotExhausted {
        stream: StreamKind,
        byte_pos: usize,
        len: usize,
    },

    #[error("Unrecognized choice {tag} for {field} at bit {bit_pos}")]
    InvalidChoice {
        field: &'static str,
        tag: u64,
        bit_pos: usize,
    },

    #[error("Expected {expected} at {path}")]
    UnexpectedShape { expected: &'static str, path: String },

    #[error("Could not decode {stream} event {code:#x} at byte {byte_pos} (frame {frame})")]
    EventDecode {
        stream: StreamKind,
        code: i64,
        byte_pos: usize,
        frame: u64,
        #[source]
        source: Box<DecodeError>,
    },

    #[error("Failed to decode {stream}")]
    Stream {
        stream: StreamKind,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    pub(crate) fn shape(expected: &'static str, path: impl Into<String>) -> Self {
        DecodeError::UnexpectedShape {
            expected,
            path: path.into(),
        }
    }

    /// Strips the contextual wrappers and returns the error that started it all
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            DecodeError::EventDecode { source, .. } | DecodeError::Stream { source, .. } => {
                source.root_cause()
            }
            x => x,
        }
    }
}
