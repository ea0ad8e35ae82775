use bitframe_bits::{AccessCode, HeaderBuffer, HeaderRegister};

use crate::error::{FormatError, Result};
use crate::layout::DecodedHeader;
use crate::metadata::{Metadata, PAYLOAD_BITS};

/// 64-bit access code used when none is configured.
pub const DEFAULT_ACCESS_CODE: &str =
    "1010110011011101101001001110001011110010100011000010000011111100";

/// Configuration for the duplicated-length layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DefaultConfig {
    /// Access code as a string of '0'/'1', first transmitted bit first.
    pub access_code: String,
    /// Tolerated access code bit errors.
    pub threshold: u32,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            access_code: DEFAULT_ACCESS_CODE.to_string(),
            threshold: 0,
        }
    }
}

/// Access code followed by the payload length twice.
///
/// ```text
/// ┌──────────────────┬───────────┬───────────┐
/// │ Access code      │ Length    │ Length    │
/// │ (0-64 bits)      │ (16b BE)  │ (16b BE)  │
/// └──────────────────┴───────────┴───────────┘
/// ```
#[derive(Debug, Clone)]
pub struct DefaultLayout {
    access_code: AccessCode,
}

impl DefaultLayout {
    pub fn new(access_code: AccessCode) -> Self {
        Self { access_code }
    }

    pub fn from_config(config: &DefaultConfig) -> Result<Self> {
        Ok(Self::new(AccessCode::parse(&config.access_code)?))
    }

    pub fn access_code(&self) -> &AccessCode {
        &self.access_code
    }

    pub fn header_nbits(&self) -> usize {
        self.access_code.len() + 2 * 16
    }

    pub fn header_nbytes(&self) -> usize {
        self.access_code.nbytes() + 2 * 2
    }

    pub(crate) fn format(
        &mut self,
        payload_len: usize,
        header: &mut HeaderBuffer<'_>,
        _info: &mut Metadata,
    ) -> Result<()> {
        let len = checked_len16(payload_len)?;
        write_access_code(&self.access_code, header);
        header.add_field16(len);
        header.add_field16(len);
        Ok(())
    }

    pub fn header_ok(&self, reg: &HeaderRegister) -> bool {
        match (reg.extract_field16(0), reg.extract_field16(16)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    pub fn header_payload(&self, reg: &HeaderRegister) -> Option<DecodedHeader> {
        let len = u64::from(reg.extract_field16(0).ok()?);
        Some(DecodedHeader {
            metadata: Metadata::new().with(PAYLOAD_BITS, 8 * len),
            payload_items: 8 * len,
        })
    }
}

pub(crate) fn write_access_code(code: &AccessCode, header: &mut HeaderBuffer<'_>) {
    header.add_field(code.nbytes(), code.bits(), false);
}

pub(crate) fn checked_len16(payload_len: usize) -> Result<u16> {
    u16::try_from(payload_len).map_err(|_| FormatError::PayloadTooLarge {
        size: payload_len,
        max: u16::MAX as usize,
    })
}
