use bitframe_bits::{AccessCode, HeaderBuffer, HeaderRegister};

use crate::error::{FormatError, Result};
use crate::layout::default::{checked_len16, write_access_code, DEFAULT_ACCESS_CODE};
use crate::layout::DecodedHeader;
use crate::metadata::{Metadata, BPS, COUNTER, PAYLOAD_BITS, PAYLOAD_SYMBOLS};

/// Configuration for the length + counter layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CounterConfig {
    pub access_code: String,
    pub threshold: u32,
    /// Bits per payload symbol announced in transmitted headers.
    pub bps: u16,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            access_code: DEFAULT_ACCESS_CODE.to_string(),
            threshold: 0,
            bps: 1,
        }
    }
}

/// Access code, duplicated length, bits per symbol and a packet counter.
///
/// ```text
/// ┌─────────────┬──────────┬──────────┬──────────┬──────────┐
/// │ Access code │ Length   │ Length   │ BPS      │ Counter  │
/// │ (0-64 bits) │ (16b BE) │ (16b BE) │ (16b BE) │ (16b BE) │
/// └─────────────┴──────────┴──────────┴──────────┴──────────┘
/// ```
#[derive(Debug, Clone)]
pub struct CounterLayout {
    access_code: AccessCode,
    bps: u16,
    counter: u16,
}

impl CounterLayout {
    /// `bps` must lie in `1..=8`.
    pub fn new(access_code: AccessCode, bps: u16) -> Result<Self> {
        if !(1..=8).contains(&bps) {
            return Err(FormatError::InvalidBitsPerSymbol(u32::from(bps)));
        }
        Ok(Self {
            access_code,
            bps,
            counter: 0,
        })
    }

    pub fn from_config(config: &CounterConfig) -> Result<Self> {
        Self::new(AccessCode::parse(&config.access_code)?, config.bps)
    }

    pub fn access_code(&self) -> &AccessCode {
        &self.access_code
    }

    /// Counter value the next formatted header will carry.
    pub fn counter(&self) -> u16 {
        self.counter
    }

    pub fn header_nbits(&self) -> usize {
        self.access_code.len() + 4 * 16
    }

    pub fn header_nbytes(&self) -> usize {
        self.access_code.nbytes() + 4 * 2
    }

    pub(crate) fn format(
        &mut self,
        payload_len: usize,
        header: &mut HeaderBuffer<'_>,
        info: &mut Metadata,
    ) -> Result<()> {
        let len = checked_len16(payload_len)?;
        write_access_code(&self.access_code, header);
        header.add_field16(len);
        header.add_field16(len);
        header.add_field16(self.bps);
        header.add_field16(self.counter);
        info.insert(COUNTER, self.counter);
        self.counter = self.counter.wrapping_add(1);
        Ok(())
    }

    /// Both length copies agree and the symbol width is non-zero.
    pub fn header_ok(&self, reg: &HeaderRegister) -> bool {
        match (
            reg.extract_field16(0),
            reg.extract_field16(16),
            reg.extract_field16(32),
        ) {
            (Ok(a), Ok(b), Ok(bps)) => a == b && bps != 0,
            _ => false,
        }
    }

    pub fn header_payload(&self, reg: &HeaderRegister) -> Option<DecodedHeader> {
        let len = u64::from(reg.extract_field16(0).ok()?);
        let bps = reg.extract_field16(32).ok()?;
        let counter = reg.extract_field16(48).ok()?;
        let symbols = 8 * len / u64::from(bps.max(1));

        let metadata = Metadata::new()
            .with(PAYLOAD_BITS, 8 * len)
            .with(PAYLOAD_SYMBOLS, symbols)
            .with(BPS, bps)
            .with(COUNTER, counter);
        Some(DecodedHeader {
            metadata,
            payload_items: symbols,
        })
    }
}
