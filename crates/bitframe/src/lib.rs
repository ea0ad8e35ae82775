//! Bitstream packet header framing.
//!
//! bitframe builds link-layer style headers ahead of a payload and finds
//! them again in a continuous stream of bits, tolerating bit errors in the
//! sync pattern and validating the recovered fields.
//!
//! # Crate Structure
//!
//! - [`bits`]: field packing, header register, access code correlation,
//!   CRC-8, LFSR and bit/soft-value helpers
//! - [`format`]: header layouts, the header recovery state machine, the
//!   PDU framer and the stream reader/writer

/// Re-export bit-level primitives.
pub mod bits {
    pub use bitframe_bits::*;
}

/// Re-export header layouts and framing.
pub mod format {
    pub use bitframe_format::*;
}
