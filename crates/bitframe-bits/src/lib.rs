//! Bit-level primitives for packet header framing.
//!
//! This is the lowest layer of bitframe. It knows nothing about header
//! layouts; it only provides the pieces every layout is built from:
//! - [`HeaderBuffer`] packs fixed-width integer fields into a byte buffer
//! - [`HeaderRegister`] accumulates received bits and extracts fields
//! - [`AccessCodeCorrelator`] finds a sync pattern under bit errors
//! - [`Crc8`] and [`Lfsr`] for header protection and scrambling

pub mod access_code;
pub mod bits;
pub mod buffer;
pub mod correlator;
pub mod crc;
pub mod error;
pub mod lfsr;
pub mod register;

pub use access_code::{AccessCode, MAX_ACCESS_CODE_BITS};
pub use bits::{pack_bits, slice_soft, unpack_bits};
pub use buffer::{HeaderBuffer, HeaderField};
pub use correlator::AccessCodeCorrelator;
pub use crc::{header_crc8, Crc8};
pub use error::{BitsError, Result};
pub use lfsr::Lfsr;
pub use register::HeaderRegister;
