use bitframe_bits::{header_crc8, Crc8, HeaderBuffer, HeaderRegister};

use crate::error::{FormatError, Result};
use crate::layout::crc::FIELD12_MASK;
use crate::layout::DecodedHeader;
use crate::metadata::{Metadata, PACKET_LEN, PACKET_NUM, PAYLOAD_BITS};

const LEN_BITS: u32 = 12;
const NUM_BITS: u32 = 12;
const CRC_BITS: u32 = 8;

/// Configuration for the variable bits-per-symbol layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VariableBitsConfig {
    /// Header length in transmitted units.
    pub header_len: usize,
    /// Header bits carried by each unit (1-8).
    pub bits_per_symbol: u32,
    pub len_key: String,
    pub num_key: String,
}

impl Default for VariableBitsConfig {
    fn default() -> Self {
        Self {
            header_len: 32,
            bits_per_symbol: 1,
            len_key: PACKET_LEN.to_string(),
            num_key: PACKET_NUM.to_string(),
        }
    }
}

/// Header fields recovered from a unit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableFields {
    /// Payload length in bytes.
    pub len: u16,
    /// Packet counter, absent when the header is too short to hold it.
    pub num: Option<u16>,
}

/// Length, counter and CRC-8 spread over units of `bits_per_symbol` bits.
///
/// Each field is written least significant bits first, `bits_per_symbol`
/// bits per unit, in the order length (12 bits), counter (12 bits), CRC
/// (8 bits). A header shorter than the fields need cuts the tail off; only
/// the CRC units actually present are checked.
#[derive(Debug, Clone)]
pub struct VariableBitsLayout {
    header_len: usize,
    bits_per_symbol: u32,
    mask: u8,
    len_key: String,
    num_key: String,
    counter: u16,
    crc: Crc8,
}

impl VariableBitsLayout {
    pub fn new(
        header_len: usize,
        bits_per_symbol: u32,
        len_key: impl Into<String>,
        num_key: impl Into<String>,
    ) -> Result<Self> {
        if !(1..=8).contains(&bits_per_symbol) {
            return Err(FormatError::InvalidBitsPerSymbol(bits_per_symbol));
        }
        if header_len == 0 {
            return Err(FormatError::EmptyHeader);
        }
        Ok(Self {
            header_len,
            bits_per_symbol,
            mask: unit_mask(bits_per_symbol),
            len_key: len_key.into(),
            num_key: num_key.into(),
            counter: 0,
            crc: Crc8::new(),
        })
    }

    pub fn from_config(config: &VariableBitsConfig) -> Result<Self> {
        Self::new(
            config.header_len,
            config.bits_per_symbol,
            config.len_key.clone(),
            config.num_key.clone(),
        )
    }

    pub fn bits_per_symbol(&self) -> u32 {
        self.bits_per_symbol
    }

    pub fn len_key(&self) -> &str {
        &self.len_key
    }

    pub fn counter(&self) -> u16 {
        self.counter
    }

    /// Header length in transmitted units.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    pub fn header_nbits(&self) -> usize {
        self.header_len * self.bits_per_symbol as usize
    }

    pub fn header_nbytes(&self) -> usize {
        self.header_len
    }

    /// Build the header units for `payload_len` and advance the counter.
    pub(crate) fn encode_units(&mut self, payload_len: usize, info: &mut Metadata) -> Vec<u8> {
        let len = (payload_len & usize::from(FIELD12_MASK)) as u16;
        let crc = header_crc8(&mut self.crc, len, self.counter);

        let mut units = vec![0u8; self.header_len];
        let mut k = 0;
        for (value, width) in [
            (u32::from(len), LEN_BITS),
            (u32::from(self.counter), NUM_BITS),
            (u32::from(crc), CRC_BITS),
        ] {
            let mut shift = 0;
            while shift < width && k < self.header_len {
                units[k] = ((value >> shift) as u8) & self.mask;
                shift += self.bits_per_symbol;
                k += 1;
            }
        }

        info.insert(self.num_key.clone(), self.counter);
        self.counter = (self.counter + 1) & FIELD12_MASK;
        units
    }

    pub(crate) fn format(
        &mut self,
        payload_len: usize,
        header: &mut HeaderBuffer<'_>,
        info: &mut Metadata,
    ) -> Result<()> {
        let units = self.encode_units(payload_len, info);
        header.add_bytes(&units);
        Ok(())
    }

    /// Split the register back into units of `bits_per_symbol` bits.
    pub(crate) fn units_from_register(&self, reg: &HeaderRegister) -> Option<Vec<u8>> {
        let bps = self.bits_per_symbol as usize;
        (0..self.header_len)
            .map(|i| reg.extract_field_lsb_first(i * bps, bps).ok().map(|v| v as u8))
            .collect()
    }

    /// Decode and check a unit sequence. `None` means the CRC did not match.
    pub fn decode_units(&mut self, units: &[u8]) -> Option<VariableFields> {
        let mut k = 0;
        let mut read_field = |width: u32| -> Option<u16> {
            if k >= units.len() {
                return None;
            }
            let mut value = 0u16;
            let mut shift = 0;
            while shift < width && k < units.len() {
                value |= u16::from(units[k] & self.mask) << shift;
                shift += self.bits_per_symbol;
                k += 1;
            }
            Some(value & ((1 << width) - 1))
        };

        let len = read_field(LEN_BITS)?;
        let num = read_field(NUM_BITS);
        let Some(num_value) = num else {
            return Some(VariableFields { len, num: None });
        };

        let crc = header_crc8(&mut self.crc, len, num_value);
        let mut shift = 0;
        while shift < CRC_BITS && k < units.len() {
            if units[k] & self.mask != (crc >> shift) & self.mask {
                return None;
            }
            shift += self.bits_per_symbol;
            k += 1;
        }
        Some(VariableFields { len, num })
    }

    pub fn header_ok(&mut self, reg: &HeaderRegister) -> bool {
        self.units_from_register(reg)
            .and_then(|units| self.decode_units(&units))
            .is_some()
    }

    pub fn header_payload(&mut self, reg: &HeaderRegister) -> Option<DecodedHeader> {
        let units = self.units_from_register(reg)?;
        let fields = self.decode_units(&units)?;
        Some(self.describe(fields))
    }

    pub(crate) fn describe(&self, fields: VariableFields) -> DecodedHeader {
        let bits = 8 * u64::from(fields.len);
        let mut metadata = Metadata::new().with(PAYLOAD_BITS, bits);
        metadata.insert(self.len_key.clone(), fields.len);
        if let Some(num) = fields.num {
            metadata.insert(self.num_key.clone(), num);
        }
        DecodedHeader {
            metadata,
            payload_items: bits.div_ceil(u64::from(self.bits_per_symbol)),
        }
    }
}

pub(crate) fn unit_mask(bits_per_symbol: u32) -> u8 {
    u8::MAX >> (8 - bits_per_symbol.clamp(1, 8))
}
