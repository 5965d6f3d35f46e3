use crate::errors::DecodeError;
use crate::parsing_utils::{decode_lossy, decode_reversed_tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Byte oriented decoder for the handful of streams that are not bit packed
#[derive(Debug, Clone, PartialEq)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    endian: Endian,

    /// Offset from the start of the buffer
    col: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        ByteReader {
            data,
            endian,
            col: 0,
        }
    }

    pub fn little_endian(data: &'a [u8]) -> Self {
        Self::new(data, Endian::Little)
    }

    pub fn bytes_read(&self) -> usize {
        self.col
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    fn advance(&mut self, ind: usize) {
        self.col += ind;
        self.data = &self.data[ind..];
    }

    /// Returns a slice after ensuring there is enough data for it
    pub fn view_data(&self, size: usize) -> Result<&'a [u8], DecodeError> {
        if size > self.data.len() {
            Err(DecodeError::TruncatedInput {
                bit_pos: self.col * 8,
                requested: size.saturating_mul(8),
                available: self.data.len() * 8,
            })
        } else {
            Ok(&self.data[..size])
        }
    }

    pub fn read_bytes(&mut self, size: usize) -> Result<&'a [u8], DecodeError> {
        let res = self.view_data(size)?;
        self.advance(size);
        Ok(res)
    }

    /// Take the next `size` bytes and interpret them in an infallible fashion
    #[inline]
    pub fn take<F, T>(&mut self, size: usize, mut f: F) -> Result<T, DecodeError>
    where
        F: FnMut(&'a [u8]) -> T,
    {
        let res = f(self.view_data(size)?);
        self.advance(size);
        Ok(res)
    }

    pub fn skip(&mut self, size: usize) -> Result<(), DecodeError> {
        self.take(size, |_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.take(1, |d| d[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let endian = self.endian;
        self.take(2, |d| match endian {
            Endian::Little => u16::from_le_bytes([d[0], d[1]]),
            Endian::Big => u16::from_be_bytes([d[0], d[1]]),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let endian = self.endian;
        self.take(4, |d| {
            let raw = [d[0], d[1], d[2], d[3]];
            match endian {
                Endian::Little => u32::from_le_bytes(raw),
                Endian::Big => u32::from_be_bytes(raw),
            }
        })
    }

    pub fn read_string(&mut self, size: usize) -> Result<String, DecodeError> {
        self.take(size, decode_lossy)
    }

    /// Reads text stored back to front with trailing NUL padding
    pub fn read_reversed_string(&mut self, size: usize) -> Result<String, DecodeError> {
        self.take(size, decode_reversed_tag)
    }
}
