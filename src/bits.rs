use crate::errors::DecodeError;
use crate::parsing_utils::{decode_lossy, offset_i32, offset_i8};
use bitter::{BitReader as _, LittleEndianReader};
use serde::Serialize;

/// Pull decoder over a bit packed stream.
///
/// Bytes are consumed in order and the bits within a byte are consumed from the least
/// significant bit upwards. A read that spans multiple bytes is assembled with the earliest
/// consumed bits in the most significant position, so reading 12 bits at bit offset 4 of
/// `[0xab, 0xcd]` yields `0xacd`.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: LittleEndianReader<'a>,
    data: &'a [u8],

    /// Current offset in bits from the start of `data`
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            bits: LittleEndianReader::new(data),
            data,
            pos: 0,
        }
    }

    /// Length of the underlying buffer in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current position in bits
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Index of the byte that the next read starts in
    pub fn byte_pos(&self) -> usize {
        self.pos / 8
    }

    pub fn bits_remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    pub fn is_aligned(&self) -> bool {
        self.pos % 8 == 0
    }

    /// True once less than a byte of unread data remains. Anything left over is padding.
    pub fn done(&self) -> bool {
        self.bits_remaining() < 8
    }

    fn truncated(&self, requested: usize) -> DecodeError {
        DecodeError::TruncatedInput {
            bit_pos: self.pos,
            requested,
            available: self.bits_remaining(),
        }
    }

    #[inline]
    fn ensure(&self, bits: usize) -> Result<(), DecodeError> {
        if bits > self.bits_remaining() {
            Err(self.truncated(bits))
        } else {
            Ok(())
        }
    }

    /// Reads at most `max` bits without crossing into the next byte
    #[inline]
    fn read_segment(&mut self, max: u32) -> Result<(u64, u32), DecodeError> {
        let width = (8 - (self.pos % 8) as u32).min(max);
        let chunk = self
            .bits
            .read_bits(width)
            .ok_or_else(|| self.truncated(width as usize))?;
        self.pos += width as usize;
        Ok((chunk, width))
    }

    /// Reads up to 64 bits
    pub fn read_bits(&mut self, count: u32) -> Result<u64, DecodeError> {
        debug_assert!(count <= 64);
        self.ensure(count as usize)?;
        let mut result = 0u64;
        let mut remaining = count;
        while remaining != 0 {
            let (chunk, width) = self.read_segment(remaining)?;
            result = (result << width) | chunk;
            remaining -= width;
        }
        Ok(result)
    }

    /// Reads a bitfield of arbitrary width, such as the 255 bit wide allowed race fields
    pub fn read_bit_array(&mut self, len: u32) -> Result<BitArray, DecodeError> {
        self.ensure(len as usize)?;
        let mut segments = Vec::with_capacity(len as usize / 8 + 2);
        let mut remaining = len;
        while remaining != 0 {
            let segment = self.read_segment(remaining)?;
            remaining -= segment.1;
            segments.push(segment);
        }
        Ok(BitArray::from_segments(len, &segments))
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        self.read_bits(1).map(|x| x != 0)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.read_bits(8).map(|x| x as u8)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.read_bits(16).map(|x| x as u16)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_bits(32).map(|x| x as u32)
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.read_bits(64)
    }

    /// Two's complement integer that is `width` bytes wide
    pub fn read_int(&mut self, width: u32) -> Result<i64, DecodeError> {
        debug_assert!(width <= 8);
        let bits = width * 8;
        if bits == 0 {
            return Ok(0);
        }

        let raw = self.read_bits(bits)?;
        let shift = 64 - bits;
        Ok(((raw << shift) as i64) >> shift)
    }

    /// A `u32` stored with a bias of 2^31
    pub fn read_signed_offset32(&mut self) -> Result<i32, DecodeError> {
        self.read_u32().map(offset_i32)
    }

    /// A `u8` stored with a bias of 128
    pub fn read_signed_offset8(&mut self) -> Result<i8, DecodeError> {
        self.read_u8().map(offset_i8)
    }

    /// Decodes a frame delta: a two bit tag selects a width of 6, 14, 22, or 30 bits
    pub fn read_frames(&mut self) -> Result<u32, DecodeError> {
        let tag = self.read_bits(2)? as u32;
        self.read_bits(6 + (tag << 3)).map(|x| x as u32)
    }

    /// Skips the rest of the current byte
    pub fn byte_align(&mut self) -> Result<(), DecodeError> {
        let pad = (8 - self.pos % 8) % 8;
        if pad != 0 {
            self.read_bits(pad as u32)?;
        }
        Ok(())
    }

    pub fn read_aligned_bytes(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        self.byte_align()?;
        let start = self.pos / 8;
        let end = start
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.truncated(count.saturating_mul(8)))?;

        let res = &self.data[start..end];
        self.pos = end * 8;
        self.bits = LittleEndianReader::new(&self.data[end..]);
        Ok(res)
    }

    /// Aligned text. Invalid UTF-8 is replaced rather than failing the decode.
    pub fn read_aligned_string(&mut self, count: usize) -> Result<String, DecodeError> {
        self.read_aligned_bytes(count).map(decode_lossy)
    }

    /// Reads `count` whole bytes from the current bit offset
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, DecodeError> {
        self.ensure(count.saturating_mul(8))?;
        (0..count).map(|_| self.read_u8()).collect()
    }

    /// Returns the bytes covering the bit range without moving the cursor
    pub fn read_range(&self, start_bit: usize, end_bit: usize) -> &'a [u8] {
        let start = (start_bit / 8).min(self.data.len());
        let end = ((end_bit + 7) / 8).clamp(start, self.data.len());
        &self.data[start..end]
    }

    /// Reads a presence bit and then the value if the bit is set
    #[inline]
    pub fn if_get<T, F>(&mut self, mut f: F) -> Result<Option<T>, DecodeError>
    where
        F: FnMut(&mut Self) -> Result<T, DecodeError>,
    {
        if self.read_bool()? {
            f(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a `count_bits` wide length and then that many elements
    pub fn list_of<T, F>(&mut self, count_bits: u32, mut f: F) -> Result<Vec<T>, DecodeError>
    where
        F: FnMut(&mut Self) -> Result<T, DecodeError>,
    {
        debug_assert!(count_bits <= 16);
        let size = self.read_bits(count_bits)? as usize;
        let mut res = Vec::with_capacity(size);
        for _ in 0..size {
            res.push(f(self)?);
        }
        Ok(res)
    }
}

/// A bitfield wider than a machine word. Bit `i` corresponds to bit `i` of the integer that
/// was read, so index 0 is the last bit pulled out of the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitArray {
    len: u32,
    bits: Vec<u8>,
}

impl BitArray {
    fn from_segments(len: u32, segments: &[(u64, u32)]) -> Self {
        let mut bits = vec![0u8; (len as usize + 7) / 8];
        let mut at = 0usize;
        for &(chunk, width) in segments.iter().rev() {
            for j in 0..width {
                if (chunk >> j) & 1 == 1 {
                    bits[at / 8] |= 1 << (at % 8);
                }
                at += 1;
            }
        }

        BitArray { len, bits }
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_set(&self, index: u32) -> bool {
        index < self.len && (self.bits[(index / 8) as usize] >> (index % 8)) & 1 == 1
    }

    /// Little endian bytes of the integer
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// The integer value when it fits in 64 bits
    pub fn to_u64(&self) -> Option<u64> {
        if self.len > 64 {
            return None;
        }

        Some(
            self.bits
                .iter()
                .enumerate()
                .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (i * 8))),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.is_set(i))
    }
}
