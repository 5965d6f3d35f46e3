use crate::attributes::decode_attributes;
use crate::details::decode_details;
use crate::errors::{DecodeError, StreamKind};
use crate::game::{decode_game_events_with, GameEventOptions};
use crate::init_data::decode_init_data;
use crate::messages::decode_messages;
use crate::models::{Replay, ReplayContext};
use crate::tracker::decode_tracker_events;
use tracing::debug;

/// Determines how the event streams (messages, game events, and tracker events) are handled.
/// These streams are the bulk of a replay and their formats shift from build to build, so a
/// client may be satisfied with the replay's metadata when they can't be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamParse {
    /// If the event streams fail to decode, return an error
    Always,

    /// Skip decoding the event streams
    Never,

    /// Attempt to decode the event streams, but if unsuccessful, leave them out of the replay
    IgnoreOnError,
}

/// The raw bytes of each stream in a replay, as extracted from the archive. Streams left as
/// `None` are not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayStreams<'a> {
    pub init_data: Option<&'a [u8]>,
    pub details: Option<&'a [u8]>,
    pub attributes: Option<&'a [u8]>,
    pub messages: Option<&'a [u8]>,
    pub game_events: Option<&'a [u8]>,
    pub tracker_events: Option<&'a [u8]>,
}

/// Needs to be used to parse a replay
#[derive(Debug, Clone, PartialEq)]
pub struct ParserBuilder<'a> {
    context: ReplayContext,
    streams: ReplayStreams<'a>,
    event_parse: Option<StreamParse>,
    keep_ignored: bool,
}

impl<'a> ParserBuilder<'a> {
    pub fn new(context: ReplayContext, streams: ReplayStreams<'a>) -> Self {
        ParserBuilder {
            context,
            streams,
            event_parse: None,
            keep_ignored: false,
        }
    }

    /// Attach the raw bit span of each game event to the record
    pub fn with_debug_spans(mut self) -> ParserBuilder<'a> {
        self.context = self.context.with_debug(true);
        self
    }

    /// Return the game events that are only decoded to keep the stream in step
    pub fn keep_ignored_events(mut self) -> ParserBuilder<'a> {
        self.keep_ignored = true;
        self
    }

    pub fn must_parse_events(mut self) -> ParserBuilder<'a> {
        self.event_parse = Some(StreamParse::Always);
        self
    }

    pub fn never_parse_events(mut self) -> ParserBuilder<'a> {
        self.event_parse = Some(StreamParse::Never);
        self
    }

    pub fn ignore_events_on_error(mut self) -> ParserBuilder<'a> {
        self.event_parse = Some(StreamParse::IgnoreOnError);
        self
    }

    pub fn with_event_parse(mut self, parse: StreamParse) -> ParserBuilder<'a> {
        self.event_parse = Some(parse);
        self
    }

    pub fn parse(self) -> Result<Replay, DecodeError> {
        let parser = Parser {
            context: self.context,
            event_parse: self.event_parse.unwrap_or(StreamParse::IgnoreOnError),
            options: GameEventOptions {
                keep_ignored: self.keep_ignored,
                debug: self.context.debug,
            },
        };
        parser.parse(&self.streams)
    }
}

struct Parser {
    context: ReplayContext,
    event_parse: StreamParse,
    options: GameEventOptions,
}

/// Decodes a stream that is given, tagging any error with the stream
fn section<T, F>(
    data: Option<&[u8]>,
    stream: StreamKind,
    f: F,
) -> Result<Option<T>, DecodeError>
where
    F: FnOnce(&[u8]) -> Result<T, DecodeError>,
{
    data.map(f).transpose().map_err(|e| DecodeError::Stream {
        stream,
        source: Box::new(e),
    })
}

impl Parser {
    fn parse(&self, streams: &ReplayStreams<'_>) -> Result<Replay, DecodeError> {
        let ctx = &self.context;
        let init_data = section(streams.init_data, StreamKind::InitData, |d| {
            decode_init_data(d, ctx)
        })?;
        let details = section(streams.details, StreamKind::Details, |d| decode_details(d, ctx))?;
        let attributes = section(streams.attributes, StreamKind::Attributes, |d| {
            decode_attributes(d, ctx)
        })?;

        let messages = self.events(streams.messages, StreamKind::Messages, |d| {
            decode_messages(d, ctx)
        })?;
        let game_events = self.events(streams.game_events, StreamKind::GameEvents, |d| {
            decode_game_events_with(d, ctx, self.options)
        })?;
        let tracker_events = self.events(streams.tracker_events, StreamKind::TrackerEvents, |d| {
            decode_tracker_events(d, ctx)
        })?;

        Ok(Replay {
            init_data,
            details,
            attributes,
            messages,
            game_events,
            tracker_events,
        })
    }

    fn events<T, F>(
        &self,
        data: Option<&[u8]>,
        stream: StreamKind,
        f: F,
    ) -> Result<Option<T>, DecodeError>
    where
        F: FnOnce(&[u8]) -> Result<T, DecodeError>,
    {
        match self.event_parse {
            StreamParse::Always => section(data, stream, f),
            StreamParse::IgnoreOnError => match section(data, stream, f) {
                Ok(x) => Ok(x),
                Err(e) => {
                    debug!(%stream, error = %e.root_cause(), "ignoring stream that failed to decode");
                    Ok(None)
                }
            },
            StreamParse::Never => Ok(None),
        }
    }
}
