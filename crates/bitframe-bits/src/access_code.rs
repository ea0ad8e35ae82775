use std::fmt;
use std::str::FromStr;

use crate::error::{BitsError, Result};

/// Longest access code the correlation register can hold.
pub const MAX_ACCESS_CODE_BITS: usize = 64;

/// A synchronization pattern marking the start of a frame.
///
/// The pattern is stored right-aligned in a `u64`: the first bit on the
/// wire is bit `len - 1`, the last bit on the wire is bit 0. That is the
/// same orientation the correlation register has after shifting the
/// pattern in, so matching is a plain XOR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessCode {
    bits: u64,
    len: usize,
}

impl AccessCode {
    /// An access code with no bits. Layouts without a sync pattern use it.
    pub const fn empty() -> Self {
        Self { bits: 0, len: 0 }
    }

    /// Parse a string of `'0'` and `'1'` characters, first transmitted bit first.
    ///
    /// The length must be a multiple of 8 and at most 64.
    pub fn parse(code: &str) -> Result<Self> {
        let len = code.chars().count();
        if len > MAX_ACCESS_CODE_BITS {
            return Err(BitsError::AccessCodeTooLong {
                len,
                max: MAX_ACCESS_CODE_BITS,
            });
        }
        if len % 8 != 0 {
            return Err(BitsError::AccessCodeNotByteAligned(len));
        }

        let mut bits = 0u64;
        for (index, ch) in code.chars().enumerate() {
            let bit = match ch {
                '0' => 0,
                '1' => 1,
                _ => return Err(BitsError::InvalidAccessCodeChar { index, ch }),
            };
            bits = (bits << 1) | bit;
        }

        Ok(Self { bits, len })
    }

    /// Build an access code from the low `len` bits of `bits`.
    pub fn from_bits(bits: u64, len: usize) -> Result<Self> {
        if len > MAX_ACCESS_CODE_BITS {
            return Err(BitsError::AccessCodeTooLong {
                len,
                max: MAX_ACCESS_CODE_BITS,
            });
        }
        if len % 8 != 0 {
            return Err(BitsError::AccessCodeNotByteAligned(len));
        }
        Ok(Self {
            bits: bits & low_mask(len),
            len,
        })
    }

    /// The pattern, right-aligned.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Number of bits in the pattern.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Correlation mask: the low `len` bits set.
    pub fn mask(&self) -> u64 {
        low_mask(self.len)
    }

    /// Number of whole bytes the pattern occupies on the wire.
    pub fn nbytes(&self) -> usize {
        self.len / 8
    }
}

impl FromStr for AccessCode {
    type Err = BitsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.len).rev() {
            let bit = (self.bits >> i) & 1;
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}

fn low_mask(len: usize) -> u64 {
    match len {
        0 => 0,
        n if n >= 64 => u64::MAX,
        n => u64::MAX >> (64 - n),
    }
}
