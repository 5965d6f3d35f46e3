use crate::bits::BitReader;
use crate::errors::{DecodeError, StreamKind};
use crate::models::ReplayContext;
use crate::schema::{Line, SchemaTable};
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

/// A record of the message stream. The three kinds share a header and are told apart by the
/// header's flags.
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub enum MessageEvent {
    /// A minimap ping
    Ping {
        frame: u64,
        player: u8,
        flags: u8,
        x: u32,
        y: u32,
    },

    Chat {
        frame: u64,
        player: u8,
        flags: u8,

        /// Recipients of the message, such as everyone or only allies
        target: u8,
        text: String,
    },

    /// Opaque network packet
    Packet {
        frame: u64,
        player: u8,
        flags: u8,
        data: [u8; 4],
    },
}

impl MessageEvent {
    pub fn frame(&self) -> u64 {
        match self {
            MessageEvent::Ping { frame, .. }
            | MessageEvent::Chat { frame, .. }
            | MessageEvent::Packet { frame, .. } => *frame,
        }
    }

    pub fn player(&self) -> u8 {
        match self {
            MessageEvent::Ping { player, .. }
            | MessageEvent::Chat { player, .. }
            | MessageEvent::Packet { player, .. } => *player,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            MessageEvent::Chat { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Width of the chat target field per build
pub fn schemas() -> &'static SchemaTable<u32> {
    static TABLE: OnceLock<SchemaTable<u32>> = OnceLock::new();
    TABLE.get_or_init(|| {
        SchemaTable::new(
            StreamKind::Messages,
            vec![(15405, Line::Any, 3), (24247, Line::Hots, 4)],
        )
    })
}

/// Decodes the message stream. Records with flags that have no known layout carry no payload
/// and are skipped.
pub fn decode_messages(
    data: &[u8],
    context: &ReplayContext,
) -> Result<Vec<MessageEvent>, DecodeError> {
    let target_bits = *schemas().resolve_for(context)?;
    let lo_mask = (1u8 << target_bits) - 1;
    let hi_mask = !lo_mask;

    let mut bits = BitReader::new(data);
    let mut res = Vec::new();
    let mut frame = 0u64;
    while !bits.done() {
        frame += u64::from(bits.read_frames()?);
        let player = bits.read_bits(5)? as u8;
        let _kind = bits.read_bits(3)?;
        let flags = bits.read_u8()?;

        match flags {
            0x83 | 0x89 => res.push(MessageEvent::Ping {
                frame,
                player,
                flags,
                x: bits.read_u32()?,
                y: bits.read_u32()?,
            }),
            0x80 => {
                let mut data = [0u8; 4];
                for b in data.iter_mut() {
                    *b = bits.read_u8()?;
                }
                res.push(MessageEvent::Packet {
                    frame,
                    player,
                    flags,
                    data,
                })
            }
            x if x & 0x80 == 0 => {
                let extension = usize::from(x & hi_mask) << 3;
                let len = usize::from(bits.read_u8()?);
                let text = bits.read_aligned_string(len + extension)?;
                res.push(MessageEvent::Chat {
                    frame,
                    player,
                    flags,
                    target: x & lo_mask,
                    text,
                })
            }
            _ => {}
        }
    }

    debug!(count = res.len(), "decoded message events");
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VersionInfo;
    use crate::test_utils::BitWriter;

    fn context(build: u32, major: u16) -> ReplayContext {
        ReplayContext::new(
            build,
            VersionInfo {
                major,
                minor: 0,
                revision: 0,
                build,
            },
        )
    }

    fn header(w: &mut BitWriter, frames: u32, player: u8, flags: u8) {
        w.write_frames(frames);
        w.write_bits(u64::from(player), 5);
        w.write_bits(0, 3);
        w.write_u8(flags);
    }

    #[test]
    fn test_ping_and_chat() {
        let mut w = BitWriter::new();
        header(&mut w, 16, 1, 0x83);
        w.write_u32(100);
        w.write_u32(200);
        header(&mut w, 4, 2, 0x05);
        w.write_u8(2);
        w.write_aligned_bytes(b"gg");
        let data = w.finish();

        let events = decode_messages(&data, &context(20000, 1)).unwrap();
        assert_eq!(
            events,
            vec![
                MessageEvent::Ping {
                    frame: 16,
                    player: 1,
                    flags: 0x83,
                    x: 100,
                    y: 200
                },
                MessageEvent::Chat {
                    frame: 20,
                    player: 2,
                    flags: 0x05,
                    target: 5,
                    text: String::from("gg")
                },
            ]
        );
        assert_eq!(events[1].text(), Some("gg"));
        assert_eq!(events[1].player(), 2);
    }

    #[test]
    fn test_chat_length_extension() {
        let text = "a".repeat(130);
        let mut w = BitWriter::new();
        header(&mut w, 0, 0, 0x12);
        w.write_u8(2);
        w.write_aligned_bytes(text.as_bytes());
        let data = w.finish();

        // three target bits leave 0x10 as the length extension: 16 << 3 = 128
        let events = decode_messages(&data, &context(20000, 1)).unwrap();
        assert_eq!(events[0].text(), Some(text.as_str()));
        match &events[0] {
            MessageEvent::Chat { target, .. } => assert_eq!(*target, 2),
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn test_wider_target_on_hots() {
        let mut w = BitWriter::new();
        header(&mut w, 0, 0, 0x1a);
        w.write_u8(3);
        w.write_aligned_bytes("h".repeat(3 + (0x10 << 3)).as_bytes());
        let data = w.finish();

        let events = decode_messages(&data, &context(24247, 2)).unwrap();
        match &events[0] {
            MessageEvent::Chat { target, text, .. } => {
                assert_eq!(*target, 0xa);
                assert_eq!(text.len(), 3 + (0x10 << 3));
            }
            x => panic!("unexpected {:?}", x),
        };
    }

    #[test]
    fn test_packet_and_unknown_flags() {
        let mut w = BitWriter::new();
        header(&mut w, 1, 3, 0x80);
        w.write_bytes(&[1, 2, 3, 4]);
        header(&mut w, 1, 3, 0x81);
        header(&mut w, 1, 3, 0x89);
        w.write_u32(1);
        w.write_u32(2);
        let data = w.finish();

        let events = decode_messages(&data, &context(20000, 1)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            MessageEvent::Packet {
                frame: 1,
                player: 3,
                flags: 0x80,
                data: [1, 2, 3, 4]
            }
        );
        assert_eq!(events[1].frame(), 3);
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(decode_messages(&[], &context(20000, 1)).unwrap(), vec![]);
    }

    #[test]
    fn test_truncated_ping() {
        let mut w = BitWriter::new();
        header(&mut w, 1, 3, 0x83);
        w.write_u32(1);
        let data = w.finish();
        let err = decode_messages(&data, &context(20000, 1)).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedInput { .. }));
    }
}
