//! Conversions between packed bytes, one-bit-per-item streams and soft values.

/// Expand bytes into one bit per item, most significant bit first.
pub fn unpack_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        bits.extend((0..8).rev().map(|i| (byte >> i) & 1));
    }
    bits
}

/// Pack one-bit items back into bytes, most significant bit first.
///
/// A trailing partial byte is padded with zeros on the right.
pub fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &bit)| acc | ((bit & 1) << (7 - i)))
        })
        .collect()
}

/// Hard decision on a soft value: negative is 0, anything else is 1.
#[inline]
pub fn slice_soft(value: f32) -> u8 {
    if value < 0.0 {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_is_msb_first() {
        assert_eq!(unpack_bits(&[0xA1]), [1, 0, 1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn pack_pads_partial_byte() {
        assert_eq!(pack_bits(&[1, 1, 0, 1]), [0xD0]);
        assert_eq!(pack_bits(&unpack_bits(&[0x12, 0xFE])), [0x12, 0xFE]);
    }

    #[test]
    fn soft_slicer_uses_sign() {
        assert_eq!(slice_soft(-0.3), 0);
        assert_eq!(slice_soft(0.0), 1);
        assert_eq!(slice_soft(1.2), 1);
        assert_eq!(slice_soft(-0.0), 1);
    }
}
