//! Encoders that mirror the decoders so that tests can describe their input field by field

/// Writes values in the bit order `BitReader` consumes them
#[derive(Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    pos: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bits(&mut self, value: u64, count: u32) {
        let mut remaining = count;
        while remaining != 0 {
            if self.pos % 8 == 0 {
                self.buf.push(0);
            }

            let room = 8 - (self.pos % 8) as u32;
            let take = room.min(remaining);
            let chunk = (value >> (remaining - take)) & ((1u64 << take) - 1);
            let last = self.buf.len() - 1;
            self.buf[last] |= (chunk as u8) << (self.pos % 8);
            self.pos += take as usize;
            remaining -= take;
        }
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_bits(u64::from(value), 1);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bits(u64::from(value), 8);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bits(u64::from(value), 16);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bits(u64::from(value), 32);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bits(u64::from((value as u32) ^ 0x8000_0000), 32);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.write_bits(u64::from((value as u8) ^ 0x80), 8);
    }

    pub fn write_frames(&mut self, value: u32) {
        let tag = (0..4u32)
            .find(|t| u64::from(value) < 1u64 << (6 + 8 * t))
            .unwrap_or(3);
        self.write_bits(u64::from(tag), 2);
        self.write_bits(u64::from(value), 6 + 8 * tag);
    }

    pub fn align(&mut self) {
        self.pos = self.buf.len() * 8;
    }

    pub fn write_aligned_bytes(&mut self, data: &[u8]) {
        self.align();
        self.buf.extend_from_slice(data);
        self.pos = self.buf.len() * 8;
    }

    /// A length prefix of `len_bits` followed by the aligned text
    pub fn write_string(&mut self, text: &str, len_bits: u32) {
        self.write_bits(text.len() as u64, len_bits);
        self.write_aligned_bytes(text.as_bytes());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        for &b in data {
            self.write_u8(b);
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Builders for the tagged value trees
pub mod node {
    pub fn vint(value: i64) -> Vec<u8> {
        let mut magnitude = value.unsigned_abs();
        let mut first = ((magnitude & 0x3f) << 1) as u8 | u8::from(value < 0);
        magnitude >>= 6;
        if magnitude != 0 {
            first |= 0x80;
        }

        let mut res = vec![first];
        while magnitude != 0 {
            let mut b = (magnitude & 0x7f) as u8;
            magnitude >>= 7;
            if magnitude != 0 {
                b |= 0x80;
            }
            res.push(b);
        }
        res
    }

    pub fn int(value: i64) -> Vec<u8> {
        let mut res = vec![9];
        res.extend(vint(value));
        res
    }

    pub fn u8(value: u8) -> Vec<u8> {
        vec![6, value]
    }

    pub fn u32(value: u32) -> Vec<u8> {
        let mut res = vec![7];
        res.extend_from_slice(&value.to_be_bytes());
        res
    }

    pub fn blob(data: &[u8]) -> Vec<u8> {
        let mut res = vec![2];
        res.extend(vint(data.len() as i64));
        res.extend_from_slice(data);
        res
    }

    pub fn bit_array(len: i64, data: &[u8]) -> Vec<u8> {
        let mut res = vec![1];
        res.extend(vint(len));
        res.extend_from_slice(data);
        res
    }

    pub fn array(items: Vec<Vec<u8>>) -> Vec<u8> {
        let mut res = vec![0];
        res.extend(vint(items.len() as i64));
        for item in items {
            res.extend(item);
        }
        res
    }

    pub fn choice(tag: i64, value: Vec<u8>) -> Vec<u8> {
        let mut res = vec![3];
        res.extend(vint(tag));
        res.extend(value);
        res
    }

    pub fn optional(value: Option<Vec<u8>>) -> Vec<u8> {
        match value {
            Some(x) => {
                let mut res = vec![4, 1];
                res.extend(x);
                res
            }
            None => vec![4, 0],
        }
    }

    pub fn structure(fields: Vec<(i64, Vec<u8>)>) -> Vec<u8> {
        let mut res = vec![5];
        res.extend(vint(fields.len() as i64));
        for (key, value) in fields {
            res.extend(vint(key));
            res.extend(value);
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitReader;

    #[test]
    fn test_writer_mirrors_reader() {
        let mut writer = BitWriter::new();
        writer.write_bits(0xb, 4);
        writer.write_bits(0xacd, 12);
        assert_eq!(writer.finish(), vec![0xab, 0xcd]);

        let mut writer = BitWriter::new();
        writer.write_bits(0x5, 3);
        writer.write_string("ok", 4);
        writer.write_i32(-7);
        let data = writer.finish();

        let mut bits = BitReader::new(&data);
        assert_eq!(bits.read_bits(3).unwrap(), 5);
        let len = bits.read_bits(4).unwrap() as usize;
        assert_eq!(bits.read_aligned_string(len).unwrap(), "ok");
        assert_eq!(bits.read_signed_offset32().unwrap(), -7);
    }

    #[test]
    fn test_vint_encoding() {
        assert_eq!(node::vint(0), vec![0x00]);
        assert_eq!(node::vint(1), vec![0x02]);
        assert_eq!(node::vint(-1), vec![0x03]);
        assert_eq!(node::vint(64), vec![0x80, 0x01]);
    }
}
