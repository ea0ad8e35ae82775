/// Errors raised while configuring or using the bit-level primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitsError {
    /// The access code is longer than the 64-bit correlation register.
    #[error("access code too long ({len} bits, max {max})")]
    AccessCodeTooLong { len: usize, max: usize },

    /// The access code does not fill a whole number of bytes.
    #[error("access code length {0} is not a multiple of 8 bits")]
    AccessCodeNotByteAligned(usize),

    /// The access code string contains something other than '0' or '1'.
    #[error("invalid access code character {ch:?} at position {index}")]
    InvalidAccessCodeChar { index: usize, ch: char },

    /// The correlation threshold exceeds the access code length.
    #[error("threshold {threshold} exceeds access code length ({len} bits)")]
    ThresholdTooLarge { threshold: u32, len: usize },

    /// A field extraction reached past the bits held by the register.
    #[error("field [{offset}, {offset}+{width}) out of range ({len} bits held)")]
    FieldOutOfRange {
        offset: usize,
        width: usize,
        len: usize,
    },

    /// A field wider than 64 bits (or zero bits) was requested.
    #[error("invalid field width {0} (must be 1-64)")]
    InvalidFieldWidth(usize),

    /// The LFSR register does not fit the 32-bit state word.
    #[error("lfsr register length {0} too large (max 31)")]
    LfsrTooLong(u32),
}

pub type Result<T> = std::result::Result<T, BitsError>;
