//! Header layouts.
//!
//! Every layout knows how to serialize a header for a payload length and
//! how to validate and decode a header held in a [`HeaderRegister`].
//! [`HeaderLayout`] is the closed set the formatter dispatches over.

pub mod counter;
pub mod crc;
pub mod default;
pub mod ofdm;
pub mod variable;

use bitframe_bits::{AccessCode, HeaderBuffer, HeaderRegister};
use bytes::{Bytes, BytesMut};

use crate::error::Result;
use crate::metadata::Metadata;

pub use counter::{CounterConfig, CounterLayout};
pub use crc::{CrcConfig, CrcLayout};
pub use default::{DefaultConfig, DefaultLayout, DEFAULT_ACCESS_CODE};
pub use ofdm::{default_occupied_carriers, OfdmConfig, OfdmLayout};
pub use variable::{VariableBitsConfig, VariableBitsLayout, VariableFields};

/// A validated header: its metadata and the payload length in items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHeader {
    pub metadata: Metadata,
    pub payload_items: u64,
}

/// One of the supported header layouts.
#[derive(Debug, Clone)]
pub enum HeaderLayout {
    Default(DefaultLayout),
    Counter(CounterLayout),
    Crc(CrcLayout),
    VariableBits(VariableBitsLayout),
    Ofdm(OfdmLayout),
}

impl HeaderLayout {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default(_) => "default",
            Self::Counter(_) => "counter",
            Self::Crc(_) => "crc",
            Self::VariableBits(_) => "variable_bits",
            Self::Ofdm(_) => "ofdm",
        }
    }

    /// The sync pattern preceding the header; empty for layouts without one.
    pub fn access_code(&self) -> AccessCode {
        match self {
            Self::Default(l) => *l.access_code(),
            Self::Counter(l) => *l.access_code(),
            Self::Crc(_) | Self::VariableBits(_) | Self::Ofdm(_) => AccessCode::empty(),
        }
    }

    /// Header size in bits, access code included.
    pub fn header_nbits(&self) -> usize {
        match self {
            Self::Default(l) => l.header_nbits(),
            Self::Counter(l) => l.header_nbits(),
            Self::Crc(l) => l.header_nbits(),
            Self::VariableBits(l) => l.header_nbits(),
            Self::Ofdm(l) => l.header_nbits(),
        }
    }

    /// Size of the buffer `format` produces.
    pub fn header_nbytes(&self) -> usize {
        match self {
            Self::Default(l) => l.header_nbytes(),
            Self::Counter(l) => l.header_nbytes(),
            Self::Crc(l) => l.header_nbytes(),
            Self::VariableBits(l) => l.header_nbytes(),
            Self::Ofdm(l) => l.header_nbytes(),
        }
    }

    /// Whether parse input is one unit per item rather than one bit.
    pub fn carries_units(&self) -> bool {
        matches!(self, Self::VariableBits(_) | Self::Ofdm(_))
    }

    /// Bits carried by each input item when parsing.
    pub fn bits_per_item(&self) -> u32 {
        match self {
            Self::Default(_) | Self::Counter(_) | Self::Crc(_) => 1,
            Self::VariableBits(l) => l.bits_per_symbol(),
            Self::Ofdm(l) => l.bits_per_header_sym(),
        }
    }

    /// Serialize a header for `payload_len` bytes.
    ///
    /// Returns the header and `metadata` extended with whatever the layout
    /// recorded (the counter value used, for layouts that count).
    pub fn format(
        &mut self,
        payload_len: usize,
        metadata: &Metadata,
    ) -> Result<(Bytes, Metadata)> {
        let mut buf = BytesMut::zeroed(self.header_nbytes());
        let mut info = metadata.clone();
        {
            let mut header = HeaderBuffer::new(&mut buf);
            match self {
                Self::Default(l) => l.format(payload_len, &mut header, &mut info)?,
                Self::Counter(l) => l.format(payload_len, &mut header, &mut info)?,
                Self::Crc(l) => l.format(payload_len, &mut header, &mut info)?,
                Self::VariableBits(l) => l.format(payload_len, &mut header, &mut info)?,
                Self::Ofdm(l) => l.format(payload_len, &mut header, &mut info)?,
            }
        }
        Ok((buf.freeze(), info))
    }

    /// Structural check of the header bits following the access code.
    pub fn header_ok(&mut self, reg: &HeaderRegister) -> bool {
        match self {
            Self::Default(l) => l.header_ok(reg),
            Self::Counter(l) => l.header_ok(reg),
            Self::Crc(l) => l.header_ok(reg),
            Self::VariableBits(l) => l.header_ok(reg),
            Self::Ofdm(l) => l.header_ok(reg),
        }
    }

    /// Decode a header that passed [`header_ok`](Self::header_ok).
    pub fn header_payload(&mut self, reg: &HeaderRegister) -> Option<DecodedHeader> {
        match self {
            Self::Default(l) => l.header_payload(reg),
            Self::Counter(l) => l.header_payload(reg),
            Self::Crc(l) => l.header_payload(reg),
            Self::VariableBits(l) => l.header_payload(reg),
            Self::Ofdm(l) => l.header_payload(reg),
        }
    }
}

impl From<DefaultLayout> for HeaderLayout {
    fn from(layout: DefaultLayout) -> Self {
        Self::Default(layout)
    }
}

impl From<CounterLayout> for HeaderLayout {
    fn from(layout: CounterLayout) -> Self {
        Self::Counter(layout)
    }
}

impl From<CrcLayout> for HeaderLayout {
    fn from(layout: CrcLayout) -> Self {
        Self::Crc(layout)
    }
}

impl From<VariableBitsLayout> for HeaderLayout {
    fn from(layout: VariableBitsLayout) -> Self {
        Self::VariableBits(layout)
    }
}

impl From<OfdmLayout> for HeaderLayout {
    fn from(layout: OfdmLayout) -> Self {
        Self::Ofdm(layout)
    }
}

/// Layout selection plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "layout", rename_all = "snake_case"))]
pub enum LayoutConfig {
    Default(DefaultConfig),
    Counter(CounterConfig),
    Crc(CrcConfig),
    VariableBits(VariableBitsConfig),
    Ofdm(OfdmConfig),
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::Default(DefaultConfig::default())
    }
}

impl LayoutConfig {
    pub fn build(&self) -> Result<HeaderLayout> {
        Ok(match self {
            Self::Default(c) => DefaultLayout::from_config(c)?.into(),
            Self::Counter(c) => CounterLayout::from_config(c)?.into(),
            Self::Crc(c) => CrcLayout::from_config(c).into(),
            Self::VariableBits(c) => VariableBitsLayout::from_config(c)?.into(),
            Self::Ofdm(c) => OfdmLayout::from_config(c)?.into(),
        })
    }

    /// Access code bit-error tolerance; zero for layouts without a code.
    pub fn threshold(&self) -> u32 {
        match self {
            Self::Default(c) => c.threshold,
            Self::Counter(c) => c.threshold,
            Self::Crc(_) | Self::VariableBits(_) | Self::Ofdm(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{COUNTER, PACKET_NUM};

    #[test]
    fn sizes_per_layout() {
        let cases: Vec<(LayoutConfig, usize, usize, u32)> = vec![
            (LayoutConfig::default(), 96, 12, 1),
            (LayoutConfig::Counter(CounterConfig::default()), 128, 16, 1),
            (LayoutConfig::Crc(CrcConfig::default()), 32, 4, 1),
            (
                LayoutConfig::VariableBits(VariableBitsConfig {
                    header_len: 8,
                    bits_per_symbol: 4,
                    ..VariableBitsConfig::default()
                }),
                32,
                8,
                4,
            ),
            (LayoutConfig::Ofdm(OfdmConfig::default()), 48, 48, 1),
        ];
        for (config, nbits, nbytes, per_item) in cases {
            let layout = config.build().unwrap();
            assert_eq!(layout.header_nbits(), nbits, "{}", layout.name());
            assert_eq!(layout.header_nbytes(), nbytes, "{}", layout.name());
            assert_eq!(layout.bits_per_item(), per_item, "{}", layout.name());
            assert_eq!(
                layout.carries_units(),
                matches!(config, LayoutConfig::VariableBits(_) | LayoutConfig::Ofdm(_))
            );
        }
    }

    #[test]
    fn only_sync_layouts_have_access_codes() {
        let default = LayoutConfig::default().build().unwrap();
        assert_eq!(default.access_code().len(), 64);
        let crc = LayoutConfig::Crc(CrcConfig::default()).build().unwrap();
        assert!(crc.access_code().is_empty());
    }

    #[test]
    fn default_header_bytes() {
        let config = LayoutConfig::Default(DefaultConfig {
            access_code: "1010101010101010".to_string(),
            threshold: 0,
        });
        let mut layout = config.build().unwrap();
        let (header, info) = layout.format(4800, &Metadata::new()).unwrap();
        assert_eq!(&header[..], &[0xAA, 0xAA, 0x12, 0xC0, 0x12, 0xC0]);
        assert!(info.is_empty());
    }

    #[test]
    fn format_keeps_input_metadata() {
        let mut layout = LayoutConfig::Counter(CounterConfig::default())
            .build()
            .unwrap();
        let meta = Metadata::new().with("tx_time", 12);
        let (_, out) = layout.format(10, &meta).unwrap();
        assert_eq!(out.get_int("tx_time"), Some(12));
        assert_eq!(out.get_int(COUNTER), Some(0));
        let (_, out) = layout.format(10, &meta).unwrap();
        assert_eq!(out.get_int(COUNTER), Some(1));

        let mut vb = LayoutConfig::VariableBits(VariableBitsConfig::default())
            .build()
            .unwrap();
        let (_, out) = vb.format(10, &meta).unwrap();
        assert_eq!(out.get_int(PACKET_NUM), Some(0));
    }

    #[test]
    fn oversized_payload_is_an_error_for_16_bit_layouts() {
        let mut layout = LayoutConfig::default().build().unwrap();
        assert!(layout.format(70_000, &Metadata::new()).is_err());
        let mut crc = LayoutConfig::Crc(CrcConfig::default()).build().unwrap();
        assert!(crc.format(70_000, &Metadata::new()).is_ok());
    }

    #[test]
    fn threshold_only_for_sync_layouts() {
        let config = LayoutConfig::Counter(CounterConfig {
            threshold: 3,
            ..CounterConfig::default()
        });
        assert_eq!(config.threshold(), 3);
        assert_eq!(LayoutConfig::Crc(CrcConfig::default()).threshold(), 0);
    }

    #[test]
    fn bad_access_code_fails_to_build() {
        let config = LayoutConfig::Default(DefaultConfig {
            access_code: "10102".to_string(),
            threshold: 0,
        });
        assert!(config.build().is_err());
    }
}
