use crate::bits::BitReader;
use crate::errors::DecodeError;
use serde::Serialize;

/// Per unit flags of a selection, where `true` means the unit at that slot is deselected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionMask(Vec<bool>);

impl SelectionMask {
    /// Reads a `len` bit wide mask.
    ///
    /// The mask is not stored in stream order. Except for a short leading chunk that brings the
    /// rest of the mask into byte alignment with the end of the read, the bytes are stored back
    /// to front: the short chunk holds the most significant slots and the last byte read holds
    /// slots 0 to 7. The size of the short chunk depends on the bit offset the read ends at.
    pub fn read(bits: &mut BitReader<'_>, len: u32) -> Result<Self, DecodeError> {
        let raw = bits.read_bit_array(len)?;
        let len = i64::from(len);
        let shift = (bits.tell() % 8) as i64;
        let diff = (len + shift) % 8 - shift;
        let first = match diff {
            d if d > 0 => d,
            d if d < 0 => 8 + d,
            _ => 0,
        }
        .min(len);

        let chunks = (len - first) / 8;
        let mask = (0..len)
            .map(|slot| {
                let src = if slot < chunks * 8 {
                    first + 8 * (chunks - slot / 8 - 1) + slot % 8
                } else {
                    slot - chunks * 8
                };
                raw.is_set(src as u32)
            })
            .collect();

        Ok(SelectionMask(mask))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_deselected(&self, slot: usize) -> bool {
        self.0.get(slot).copied().unwrap_or(false)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Slots that are removed from the selection
    pub fn deselected(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &x)| if x { Some(i) } else { None })
    }
}

impl From<Vec<bool>> for SelectionMask {
    fn from(mask: Vec<bool>) -> Self {
        SelectionMask(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(mask: &SelectionMask) -> Vec<usize> {
        mask.deselected().collect()
    }

    #[test]
    fn test_aligned_mask() {
        let data = [0x05, 0x80];
        let mut bits = BitReader::new(&data[..]);
        let mask = SelectionMask::read(&mut bits, 16).unwrap();
        assert_eq!(mask.len(), 16);
        assert_eq!(slots(&mask), vec![0, 2, 15]);
        assert!(bits.done());
    }

    #[test]
    fn test_whole_byte_masks_match_byte_order() {
        let data = [0x81, 0x42, 0x00, 0xff, 0x10];
        for bytes in 1..=data.len() {
            let mut bits = BitReader::new(&data[..]);
            let mask = SelectionMask::read(&mut bits, (bytes * 8) as u32).unwrap();
            let expected: Vec<bool> = data[..bytes]
                .iter()
                .flat_map(|&b| (0..8).map(move |i| (b >> i) & 1 == 1))
                .collect();
            assert_eq!(mask.as_slice(), &expected[..]);
        }
    }

    #[test]
    fn test_unaligned_mask_reordering() {
        let data = [0xf8, 0x00, 0x05];
        let mut bits = BitReader::new(&data[..]);
        bits.read_bits(3).unwrap();
        let mask = SelectionMask::read(&mut bits, 20).unwrap();
        assert_eq!(mask.len(), 20);
        assert_eq!(slots(&mask), vec![3, 4, 5, 6, 7, 16, 18]);
        assert_eq!(bits.tell(), 23);
    }

    #[test]
    fn test_short_mask_within_a_byte() {
        let data = [0b1010_0000];
        let mut bits = BitReader::new(&data[..]);
        bits.read_bits(4).unwrap();
        let mask = SelectionMask::read(&mut bits, 4).unwrap();
        assert_eq!(slots(&mask), vec![1, 3]);
    }

    #[test]
    fn test_wide_mask() {
        let data = [0xff; 64];
        let mut bits = BitReader::new(&data[..]);
        bits.read_bits(1).unwrap();
        let mask = SelectionMask::read(&mut bits, 511).unwrap();
        assert_eq!(mask.len(), 511);
        assert!(mask.as_slice().iter().all(|&x| x));
        assert!(!mask.is_deselected(511));
    }

    #[test]
    fn test_empty_mask() {
        let mut bits = BitReader::new(&[0xff]);
        let mask = SelectionMask::read(&mut bits, 0).unwrap();
        assert!(mask.is_empty());
        assert_eq!(bits.tell(), 0);
    }

    #[test]
    fn test_truncated_mask() {
        let mut bits = BitReader::new(&[0xff]);
        assert!(SelectionMask::read(&mut bits, 9).is_err());
    }
}
