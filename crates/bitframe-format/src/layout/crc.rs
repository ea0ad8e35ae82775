use bitframe_bits::{header_crc8, Crc8, HeaderBuffer, HeaderRegister};

use crate::error::Result;
use crate::layout::DecodedHeader;
use crate::metadata::{Metadata, COUNTER, PAYLOAD_BITS};

/// Mask applied to 12-bit length and counter fields.
pub const FIELD12_MASK: u16 = 0x0FFF;

/// Configuration for the CRC-protected layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CrcConfig {
    /// Metadata key carrying the payload length in bits.
    pub len_key: String,
    /// Metadata key carrying the packet counter.
    pub num_key: String,
}

impl Default for CrcConfig {
    fn default() -> Self {
        Self {
            len_key: PAYLOAD_BITS.to_string(),
            num_key: COUNTER.to_string(),
        }
    }
}

/// 32-bit header with no access code.
///
/// ```text
/// ┌────────────┬────────────┬──────────┐
/// │ Counter    │ Length     │ CRC-8    │
/// │ (12 bits)  │ (12 bits)  │ (8 bits) │
/// └────────────┴────────────┴──────────┘
/// ```
///
/// Lengths and counters are masked to 12 bits; the counter wraps at 4096.
#[derive(Debug, Clone)]
pub struct CrcLayout {
    len_key: String,
    num_key: String,
    counter: u16,
    crc: Crc8,
}

impl CrcLayout {
    pub fn new(len_key: impl Into<String>, num_key: impl Into<String>) -> Self {
        Self {
            len_key: len_key.into(),
            num_key: num_key.into(),
            counter: 0,
            crc: Crc8::new(),
        }
    }

    pub fn from_config(config: &CrcConfig) -> Self {
        Self::new(config.len_key.clone(), config.num_key.clone())
    }

    pub fn counter(&self) -> u16 {
        self.counter
    }

    pub fn header_nbits(&self) -> usize {
        32
    }

    pub fn header_nbytes(&self) -> usize {
        4
    }

    pub(crate) fn format(
        &mut self,
        payload_len: usize,
        header: &mut HeaderBuffer<'_>,
        info: &mut Metadata,
    ) -> Result<()> {
        let len = (payload_len & usize::from(FIELD12_MASK)) as u16;
        let crc = header_crc8(&mut self.crc, len, self.counter);

        let concat = (u32::from(self.counter) << 12) | u32::from(len);
        header.add_field(3, concat, false);
        header.add_field8(crc);

        info.insert(self.num_key.clone(), self.counter);
        self.counter = (self.counter + 1) & FIELD12_MASK;
        Ok(())
    }

    fn fields(reg: &HeaderRegister) -> Option<(u16, u16, u8)> {
        let counter = reg.extract_field(0, 12).ok()? as u16;
        let len = reg.extract_field(12, 12).ok()? as u16;
        let crc = reg.extract_field8(24).ok()?;
        Some((counter, len, crc))
    }

    pub fn header_ok(&mut self, reg: &HeaderRegister) -> bool {
        match Self::fields(reg) {
            Some((counter, len, crc_rcvd)) => header_crc8(&mut self.crc, len, counter) == crc_rcvd,
            None => false,
        }
    }

    pub fn header_payload(&self, reg: &HeaderRegister) -> Option<DecodedHeader> {
        let (counter, len, _) = Self::fields(reg)?;
        let bits = 8 * u64::from(len);

        let mut metadata = Metadata::new().with(PAYLOAD_BITS, bits);
        metadata.insert(self.len_key.clone(), bits);
        metadata.insert(self.num_key.clone(), counter);
        Some(DecodedHeader {
            metadata,
            payload_items: bits,
        })
    }
}
