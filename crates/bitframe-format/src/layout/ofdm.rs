use bitframe_bits::{HeaderBuffer, HeaderRegister, Lfsr};

use crate::error::{FormatError, Result};
use crate::layout::variable::VariableBitsLayout;
use crate::layout::DecodedHeader;
use crate::metadata::{Metadata, FRAME_LEN, PACKET_LEN, PACKET_NUM};

/// Scrambler taps, seed and register length for header whitening.
const SCRAMBLE_MASK: u32 = 0x8a;
const SCRAMBLE_SEED: u32 = 0x6f;
const SCRAMBLE_LEN: u32 = 7;

/// One OFDM symbol with 48 data carriers around DC, 802.11a-style.
pub fn default_occupied_carriers() -> Vec<Vec<i32>> {
    let row = (-26..-21)
        .chain(-20..-7)
        .chain(-6..0)
        .chain(1..7)
        .chain(8..21)
        .chain(22..27)
        .collect();
    vec![row]
}

/// Configuration for the OFDM layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OfdmConfig {
    /// Carrier indices occupied on each OFDM symbol, repeated cyclically.
    pub occupied_carriers: Vec<Vec<i32>>,
    /// Number of OFDM symbols the header spans.
    pub n_syms: usize,
    pub len_key: String,
    pub frame_len_key: String,
    pub num_key: String,
    pub bits_per_header_sym: u32,
    pub bits_per_payload_sym: u32,
    /// XOR header units with a fixed LFSR sequence.
    pub scramble_header: bool,
}

impl Default for OfdmConfig {
    fn default() -> Self {
        Self {
            occupied_carriers: default_occupied_carriers(),
            n_syms: 1,
            len_key: PACKET_LEN.to_string(),
            frame_len_key: FRAME_LEN.to_string(),
            num_key: PACKET_NUM.to_string(),
            bits_per_header_sym: 1,
            bits_per_payload_sym: 1,
            scramble_header: true,
        }
    }
}

/// Variable-bits header laid over the first `n_syms` OFDM symbols.
///
/// The header occupies one unit per occupied carrier. Units are optionally
/// whitened with a fixed scramble sequence. Decoded headers report the
/// payload in symbols and the number of OFDM symbols the payload spans.
#[derive(Debug, Clone)]
pub struct OfdmLayout {
    inner: VariableBitsLayout,
    occupied_carriers: Vec<Vec<i32>>,
    syms_per_set: usize,
    bits_per_payload_sym: u32,
    frame_len_key: String,
    scramble_mask: Vec<u8>,
}

impl OfdmLayout {
    pub fn from_config(config: &OfdmConfig) -> Result<Self> {
        let rows = config.occupied_carriers.len();
        let syms_per_set: usize = config.occupied_carriers.iter().map(Vec::len).sum();
        if syms_per_set == 0 {
            return Err(FormatError::EmptyCarrierTable);
        }
        if config.n_syms > rows {
            return Err(FormatError::HeaderSymbolsOutOfRange {
                n_syms: config.n_syms,
                rows,
            });
        }
        if config.bits_per_payload_sym == 0 {
            return Err(FormatError::InvalidBitsPerSymbol(0));
        }

        let header_len = config.occupied_carriers[..config.n_syms]
            .iter()
            .map(Vec::len)
            .sum();
        let inner = VariableBitsLayout::new(
            header_len,
            config.bits_per_header_sym,
            config.len_key.clone(),
            config.num_key.clone(),
        )?;

        let scramble_mask = if config.scramble_header {
            let mut lfsr = Lfsr::new(SCRAMBLE_MASK, SCRAMBLE_SEED, SCRAMBLE_LEN)?;
            (0..header_len)
                .map(|_| lfsr.next_unit(config.bits_per_header_sym))
                .collect()
        } else {
            vec![0; header_len]
        };

        Ok(Self {
            inner,
            occupied_carriers: config.occupied_carriers.clone(),
            syms_per_set,
            bits_per_payload_sym: config.bits_per_payload_sym,
            frame_len_key: config.frame_len_key.clone(),
            scramble_mask,
        })
    }

    pub fn bits_per_header_sym(&self) -> u32 {
        self.inner.bits_per_symbol()
    }

    pub fn bits_per_payload_sym(&self) -> u32 {
        self.bits_per_payload_sym
    }

    /// Occupied carriers summed over every row of the table.
    pub fn syms_per_set(&self) -> usize {
        self.syms_per_set
    }

    pub fn scramble_mask(&self) -> &[u8] {
        &self.scramble_mask
    }

    pub fn counter(&self) -> u16 {
        self.inner.counter()
    }

    pub fn header_nbits(&self) -> usize {
        self.inner.header_nbits()
    }

    pub fn header_nbytes(&self) -> usize {
        self.inner.header_nbytes()
    }

    pub(crate) fn format(
        &mut self,
        payload_len: usize,
        header: &mut HeaderBuffer<'_>,
        info: &mut Metadata,
    ) -> Result<()> {
        let mut units = self.inner.encode_units(payload_len, info);
        self.scramble(&mut units);
        header.add_bytes(&units);
        Ok(())
    }

    fn scramble(&self, units: &mut [u8]) {
        for (unit, mask) in units.iter_mut().zip(&self.scramble_mask) {
            *unit ^= mask;
        }
    }

    fn descrambled_units(&self, reg: &HeaderRegister) -> Option<Vec<u8>> {
        let mut units = self.inner.units_from_register(reg)?;
        self.scramble(&mut units);
        Some(units)
    }

    pub fn header_ok(&mut self, reg: &HeaderRegister) -> bool {
        self.descrambled_units(reg)
            .and_then(|units| self.inner.decode_units(&units))
            .is_some()
    }

    pub fn header_payload(&mut self, reg: &HeaderRegister) -> Option<DecodedHeader> {
        let units = self.descrambled_units(reg)?;
        let fields = self.inner.decode_units(&units)?;
        let mut decoded = self.inner.describe(fields);

        let symbols = (8 * u64::from(fields.len)).div_ceil(u64::from(self.bits_per_payload_sym));
        decoded.metadata.insert(self.inner.len_key(), symbols);
        decoded
            .metadata
            .insert(self.frame_len_key.clone(), self.frame_len(symbols));
        decoded.payload_items = symbols;
        Some(decoded)
    }

    /// Number of OFDM symbols needed to carry `symbols` payload symbols.
    ///
    /// A single-row table gives `ceil(symbols / carriers)`. With several rows
    /// each whole set counts as one symbol per row, and the remainder walks
    /// the rows in order until it is covered, so a short tail on a narrow
    /// row may need one symbol more than dividing by the set size suggests.
    pub fn frame_len(&self, symbols: u64) -> u64 {
        let per_set = self.syms_per_set as u64;
        let full_sets = symbols / per_set;
        let mut frame_len = full_sets * self.occupied_carriers.len() as u64;
        let mut covered = full_sets * per_set;
        for row in self.occupied_carriers.iter().cycle() {
            if covered >= symbols {
                break;
            }
            covered += row.len() as u64;
            frame_len += 1;
        }
        frame_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PAYLOAD_BITS;

    fn register_from_units(units: &[u8], bps: u32) -> HeaderRegister {
        let mut reg = HeaderRegister::new();
        for &unit in units {
            reg.insert_unit(unit, bps);
        }
        reg
    }

    fn two_row_config() -> OfdmConfig {
        OfdmConfig {
            occupied_carriers: vec![vec![-2, -1, 1, 2], vec![-1, 1]],
            n_syms: 2,
            bits_per_header_sym: 8,
            bits_per_payload_sym: 8,
            ..OfdmConfig::default()
        }
    }

    #[test]
    fn default_table_has_48_carriers() {
        let table = default_occupied_carriers();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].len(), 48);
        assert!(!table[0].contains(&0));
        assert!(!table[0].contains(&-21));
        assert!(!table[0].contains(&7));

        let layout = OfdmLayout::from_config(&OfdmConfig::default()).unwrap();
        assert_eq!(layout.header_nbytes(), 48);
        assert_eq!(layout.header_nbits(), 48);
    }

    #[test]
    fn scramble_mask_follows_lfsr() {
        let layout = OfdmLayout::from_config(&OfdmConfig::default()).unwrap();
        assert_eq!(
            &layout.scramble_mask()[..16],
            &[1, 1, 1, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 1, 0]
        );

        let config = OfdmConfig {
            bits_per_header_sym: 2,
            ..OfdmConfig::default()
        };
        let layout = OfdmLayout::from_config(&config).unwrap();
        assert_eq!(&layout.scramble_mask()[..4], &[3, 3, 2, 1]);
    }

    #[test]
    fn unscrambled_mask_is_zero() {
        let config = OfdmConfig {
            scramble_header: false,
            ..OfdmConfig::default()
        };
        let layout = OfdmLayout::from_config(&config).unwrap();
        assert!(layout.scramble_mask().iter().all(|&m| m == 0));
    }

    #[test]
    fn rejects_bad_tables() {
        let empty = OfdmConfig {
            occupied_carriers: vec![],
            ..OfdmConfig::default()
        };
        assert!(matches!(
            OfdmLayout::from_config(&empty),
            Err(FormatError::EmptyCarrierTable)
        ));

        let too_many = OfdmConfig {
            n_syms: 3,
            ..two_row_config()
        };
        assert!(matches!(
            OfdmLayout::from_config(&too_many),
            Err(FormatError::HeaderSymbolsOutOfRange { n_syms: 3, rows: 2 })
        ));

        let no_payload_bits = OfdmConfig {
            bits_per_payload_sym: 0,
            ..OfdmConfig::default()
        };
        assert!(matches!(
            OfdmLayout::from_config(&no_payload_bits),
            Err(FormatError::InvalidBitsPerSymbol(0))
        ));
    }

    #[test]
    fn format_then_parse_reports_symbols_and_frame_len() {
        let mut tx = OfdmLayout::from_config(&two_row_config()).unwrap();
        let mut rx = OfdmLayout::from_config(&two_row_config()).unwrap();

        let mut buf = vec![0u8; tx.header_nbytes()];
        let mut info = Metadata::new();
        tx.format(9, &mut HeaderBuffer::new(&mut buf), &mut info).unwrap();
        assert_eq!(info.get_int(PACKET_NUM), Some(0));

        let reg = register_from_units(&buf, 8);
        assert!(rx.header_ok(&reg));
        let decoded = rx.header_payload(&reg).unwrap();
        // 72 bits at 8 bits per symbol: 9 symbols, one full set of 6 plus
        // the 4-carrier row.
        assert_eq!(decoded.payload_items, 9);
        assert_eq!(decoded.metadata.get_int(PACKET_LEN), Some(9));
        assert_eq!(decoded.metadata.get_int(FRAME_LEN), Some(3));
        assert_eq!(decoded.metadata.get_int(PAYLOAD_BITS), Some(72));
        assert_eq!(decoded.metadata.get_int(PACKET_NUM), Some(0));
    }

    #[test]
    fn scrambled_header_fails_without_descrambling() {
        let mut tx = OfdmLayout::from_config(&two_row_config()).unwrap();
        let mut buf = vec![0u8; tx.header_nbytes()];
        tx.format(9, &mut HeaderBuffer::new(&mut buf), &mut Metadata::new())
            .unwrap();

        let plain_config = OfdmConfig {
            scramble_header: false,
            ..two_row_config()
        };
        let mut plain = OfdmLayout::from_config(&plain_config).unwrap();
        assert!(!plain.header_ok(&register_from_units(&buf, 8)));
    }

    #[test]
    fn frame_len_walks_rows_cyclically() {
        let layout = OfdmLayout::from_config(&two_row_config()).unwrap();
        assert_eq!(layout.frame_len(0), 0);
        assert_eq!(layout.frame_len(4), 1);
        assert_eq!(layout.frame_len(5), 2);
        assert_eq!(layout.frame_len(6), 2);
        assert_eq!(layout.frame_len(7), 3);
        assert_eq!(layout.frame_len(11), 4);
        assert_eq!(layout.frame_len(12), 4);
    }

    #[test]
    fn single_row_frame_len_is_ceiling() {
        let layout = OfdmLayout::from_config(&OfdmConfig::default()).unwrap();
        for (symbols, expected) in [(0, 0), (1, 1), (48, 1), (49, 2), (96, 2), (97, 3)] {
            assert_eq!(layout.frame_len(symbols), expected, "{symbols} symbols");
        }
    }
}
