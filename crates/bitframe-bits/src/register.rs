use crate::error::{BitsError, Result};

/// Accumulates received header bits one at a time.
///
/// Bits are counted from the first one inserted after the last
/// [`clear`](Self::clear). Storage grows as needed, so one register serves
/// layouts of any header length.
#[derive(Debug, Clone, Default)]
pub struct HeaderRegister {
    bytes: Vec<u8>,
    len: usize,
}

impl HeaderRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// A register with room for `nbits` bits before reallocating.
    pub fn with_capacity(nbits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(nbits.div_ceil(8)),
            len: 0,
        }
    }

    /// Number of bits held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append one bit (the low bit of `bit`).
    pub fn insert_bit(&mut self, bit: u8) {
        let bit = bit & 1;
        let shift = 7 - (self.len % 8);
        if self.len % 8 == 0 {
            let slot = self.len / 8;
            if slot < self.bytes.len() {
                self.bytes[slot] = 0;
            } else {
                self.bytes.push(0);
            }
        }
        self.bytes[self.len / 8] |= bit << shift;
        self.len += 1;
    }

    /// Append the low `nbits` bits of `value`, least significant first.
    pub fn insert_unit(&mut self, value: u8, nbits: u32) {
        for i in 0..nbits.min(8) {
            self.insert_bit(value >> i);
        }
    }

    /// Drop all held bits. Capacity is kept.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    fn bit_at(&self, index: usize) -> u64 {
        u64::from((self.bytes[index / 8] >> (7 - (index % 8))) & 1)
    }

    fn check_range(&self, offset: usize, width: usize) -> Result<()> {
        if width == 0 || width > 64 {
            return Err(BitsError::InvalidFieldWidth(width));
        }
        match offset.checked_add(width) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(BitsError::FieldOutOfRange {
                offset,
                width,
                len: self.len,
            }),
        }
    }

    /// The `width`-bit value starting at bit `offset`, first bit most significant.
    pub fn extract_field(&self, offset: usize, width: usize) -> Result<u64> {
        self.check_range(offset, width)?;
        Ok((offset..offset + width).fold(0u64, |acc, i| (acc << 1) | self.bit_at(i)))
    }

    /// The `width`-bit value starting at bit `offset`, first bit least significant.
    pub fn extract_field_lsb_first(&self, offset: usize, width: usize) -> Result<u64> {
        self.check_range(offset, width)?;
        Ok((0..width).fold(0u64, |acc, i| acc | (self.bit_at(offset + i) << i)))
    }

    pub fn extract_field8(&self, offset: usize) -> Result<u8> {
        self.extract_field(offset, 8).map(|v| v as u8)
    }

    pub fn extract_field16(&self, offset: usize) -> Result<u16> {
        self.extract_field(offset, 16).map(|v| v as u16)
    }

    pub fn extract_field32(&self, offset: usize) -> Result<u32> {
        self.extract_field(offset, 32).map(|v| v as u32)
    }
}
