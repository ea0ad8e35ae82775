use crate::error::{BitsError, Result};

/// Fibonacci linear feedback shift register.
///
/// Each step outputs the register's low bit, computes the parity of
/// `register & mask` and feeds it back in at bit `len` while shifting
/// right.
#[derive(Debug, Clone)]
pub struct Lfsr {
    register: u32,
    mask: u32,
    seed: u32,
    len: u32,
}

impl Lfsr {
    pub fn new(mask: u32, seed: u32, len: u32) -> Result<Self> {
        if len > 31 {
            return Err(BitsError::LfsrTooLong(len));
        }
        Ok(Self {
            register: seed,
            mask,
            seed,
            len,
        })
    }

    pub fn next_bit(&mut self) -> u8 {
        let output = (self.register & 1) as u8;
        let feedback = (self.register & self.mask).count_ones() & 1;
        self.register = (self.register >> 1) | (feedback << self.len);
        output
    }

    /// The next `nbits` output bits packed LSB first.
    pub fn next_unit(&mut self, nbits: u32) -> u8 {
        (0..nbits.min(8)).fold(0u8, |acc, k| acc ^ (self.next_bit() << k))
    }

    /// Return to the seed state.
    pub fn reset(&mut self) {
        self.register = self.seed;
    }
}
