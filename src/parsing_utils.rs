use encoding_rs::UTF_8;

#[inline]
pub fn be_u32(d: &[u8]) -> u32 {
    u32::from_be_bytes([d[0], d[1], d[2], d[3]])
}

#[inline]
pub fn be_u64(d: &[u8]) -> u64 {
    u64::from_be_bytes([d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]])
}

/// Strips a bias of 2^31 from an unsigned value
#[inline]
pub fn offset_i32(raw: u32) -> i32 {
    (raw ^ 0x8000_0000) as i32
}

/// Strips a bias of 128 from an unsigned value
#[inline]
pub fn offset_i8(raw: u8) -> i8 {
    (raw ^ 0x80) as i8
}

/// Player supplied text is not guaranteed to be well formed, so invalid sequences are replaced
pub fn decode_lossy(input: &[u8]) -> String {
    let (s, _) = UTF_8.decode_without_bom_handling(input);
    s.into_owned()
}

/// Attribute values are four character codes stored back to front and padded with NULs
pub fn decode_reversed_tag(input: &[u8]) -> String {
    let data: Vec<u8> = input.iter().rev().copied().filter(|&b| b != 0).collect();
    decode_lossy(&data)
}

pub fn to_hex(input: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut res = String::with_capacity(input.len() * 2);
    for &b in input {
        res.push(char::from(DIGITS[usize::from(b >> 4)]));
        res.push(char::from(DIGITS[usize::from(b & 0xf)]));
    }
    res
}

/// Trailing NULs pad out fixed width fields
pub fn trim_nul(input: &[u8]) -> &[u8] {
    let end = input.iter().rposition(|&b| b != 0).map_or(0, |x| x + 1);
    &input[..end]
}
