use bitframe_bits::{unpack_bits, AccessCode, HeaderRegister};
use bitframe_format::layout::{CrcConfig, VariableBitsConfig};
use bitframe_format::metadata::{COUNTER, PACKET_LEN, PACKET_NUM, PAYLOAD_BITS, SKIP_SAMPS};
use bitframe_format::{
    DefaultConfig, DefaultLayout, FramingState, HeaderFormatter, LayoutConfig, Metadata,
    DEFAULT_ACCESS_CODE,
};

const SHORT_CODE: &str = "1010101010101010";

fn short_default() -> HeaderFormatter {
    HeaderFormatter::new(DefaultLayout::new(AccessCode::parse(SHORT_CODE).unwrap()))
}

fn parse_all(formatter: &mut HeaderFormatter, items: &[u8]) -> Vec<Metadata> {
    let mut results = Vec::new();
    let consumed = formatter.parse(items, &mut results);
    assert_eq!(consumed, items.len());
    results
}

#[test]
fn default_header_for_4800() {
    let mut formatter = short_default();
    let (header, _) = formatter.format_len(4800, &Metadata::new()).unwrap();
    assert_eq!(header.as_ref(), &[0xAA, 0xAA, 0x12, 0xC0, 0x12, 0xC0]);
}

/// Filler bytes that never contain, or lead into, a false `1010...` sync.
const FILLER: [u8; 8] = [0x00, 0xFF, 0x0F, 0xF0, 0x33, 0xCC, 0x3C, 0xC3];

#[test]
fn spliced_header_in_106_byte_buffer() {
    for offset in [0usize, 1, 40, 100] {
        let mut buffer: Vec<u8> = (0..106usize)
            .map(|i| {
                if i < offset {
                    FILLER[i % FILLER.len()]
                } else {
                    (i * 37 % 256) as u8
                }
            })
            .collect();
        buffer[offset..offset + 6].copy_from_slice(&[0xAA, 0xAA, 0x00, 0x64, 0x00, 0x64]);

        let mut formatter = short_default();
        let results = parse_all(&mut formatter, &unpack_bits(&buffer));
        assert_eq!(results.len(), 1, "offset {offset}");
        assert_eq!(results[0].get_int(PAYLOAD_BITS), Some(848 - 48));
        assert_eq!(
            results[0].get_int(SKIP_SAMPS),
            Some(offset as i64 * 8 + 48)
        );
        assert_eq!(formatter.payload_remaining(), offset as u64 * 8);
        let expected = if offset == 0 {
            FramingState::SyncSearch
        } else {
            FramingState::HaveHeader
        };
        assert_eq!(formatter.state(), expected, "offset {offset}");
    }
}

#[test]
fn sixty_four_bit_code_round_trip() {
    let config = LayoutConfig::Default(DefaultConfig::default());
    let mut tx = HeaderFormatter::from_config(&config).unwrap();
    let mut rx = HeaderFormatter::from_config(&config).unwrap();
    assert_eq!(rx.header_nbits(), 96);

    let (header, _) = tx.format_len(1234, &Metadata::new()).unwrap();
    let mut items = vec![0u8; 17];
    items.extend(unpack_bits(&header));

    let results = parse_all(&mut rx, &items);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get_int(PAYLOAD_BITS), Some(1234 * 8));
    assert_eq!(results[0].get_int(SKIP_SAMPS), Some(17 + 96));
}

#[test]
fn single_bit_code_error_needs_threshold() {
    let code = AccessCode::parse(DEFAULT_ACCESS_CODE).unwrap();
    let mut tx = HeaderFormatter::new(DefaultLayout::new(code));
    let (header, _) = tx.format_len(8, &Metadata::new()).unwrap();

    for flip in 0..64 {
        let mut bits = unpack_bits(&header);
        bits[flip] ^= 1;

        let mut strict = HeaderFormatter::new(DefaultLayout::new(code));
        assert!(parse_all(&mut strict, &bits).is_empty(), "flip {flip}");

        let mut tolerant = HeaderFormatter::with_threshold(DefaultLayout::new(code), 1).unwrap();
        let results = parse_all(&mut tolerant, &bits);
        assert_eq!(results.len(), 1, "flip {flip}");
        assert_eq!(results[0].get_int(PAYLOAD_BITS), Some(64));
    }
}

#[test]
fn split_stream_yields_same_records() {
    let mut tx = short_default();
    let mut stream = Vec::new();
    for len in [3usize, 0, 9, 1] {
        stream.extend([0u8; 5]);
        let (header, _) = tx.format_len(len, &Metadata::new()).unwrap();
        stream.extend(unpack_bits(&header));
        stream.extend(std::iter::repeat(0u8).take(len * 8));
    }

    let whole = parse_all(&mut short_default(), &stream);
    assert_eq!(whole.len(), 4);

    for chunk in [1usize, 7, 48, 100] {
        let mut rx = short_default();
        let mut pieces = Vec::new();
        for part in stream.chunks(chunk) {
            assert_eq!(rx.parse(part, &mut pieces), part.len());
        }
        assert_eq!(pieces, whole, "chunk {chunk}");
    }
}

#[test]
fn crc_layout_round_trip_and_counter() {
    let config = LayoutConfig::Crc(CrcConfig::default());
    let mut tx = HeaderFormatter::from_config(&config).unwrap();
    let mut rx = HeaderFormatter::from_config(&config).unwrap();

    let mut stream = Vec::new();
    for len in [2usize, 5] {
        let (header, meta) = tx.format_len(len, &Metadata::new()).unwrap();
        assert!(meta.contains_key(COUNTER));
        stream.extend(unpack_bits(&header));
        stream.extend(std::iter::repeat(1u8).take(len * 8));
    }

    let results = parse_all(&mut rx, &stream);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].get_int(COUNTER), Some(0));
    assert_eq!(results[1].get_int(COUNTER), Some(1));
    assert_eq!(results[1].get_int(PAYLOAD_BITS), Some(40));
    assert_eq!(results[1].get_int(SKIP_SAMPS), Some(32));
}

#[test]
fn crc_rejects_every_flip_of_up_to_three_bits() {
    let mut layout = LayoutConfig::Crc(CrcConfig::default()).build().unwrap();
    let (header, _) = layout.format(100, &Metadata::new()).unwrap();
    let bits = unpack_bits(&header);

    let accepts = |layout: &mut bitframe_format::HeaderLayout, flips: &[usize]| {
        let mut reg = HeaderRegister::new();
        for (i, bit) in bits.iter().enumerate() {
            reg.insert_bit(bit ^ u8::from(flips.contains(&i)));
        }
        layout.header_ok(&reg)
    };

    assert!(accepts(&mut layout, &[]));
    for a in 0..32 {
        assert!(!accepts(&mut layout, &[a]), "flip {a}");
        for b in a + 1..32 {
            assert!(!accepts(&mut layout, &[a, b]), "flips {a},{b}");
            for c in b + 1..32 {
                assert!(!accepts(&mut layout, &[a, b, c]), "flips {a},{b},{c}");
            }
        }
    }
}

#[test]
fn crc_four_bit_blind_spots() {
    let mut layout = LayoutConfig::Crc(CrcConfig::default()).build().unwrap();
    let (header, _) = layout.format(100, &Metadata::new()).unwrap();
    let bits = unpack_bits(&header);

    let mut blind = Vec::new();
    for a in 0..32 {
        for b in a + 1..32 {
            for c in b + 1..32 {
                for d in c + 1..32 {
                    let mut reg = HeaderRegister::new();
                    for (i, bit) in bits.iter().enumerate() {
                        let flipped = i == a || i == b || i == c || i == d;
                        reg.insert_bit(bit ^ u8::from(flipped));
                    }
                    if layout.header_ok(&reg) {
                        blind.push([a, b, c, d]);
                    }
                }
            }
        }
    }
    assert_eq!(blind.len(), 285);
    assert_eq!(blind[0], [0, 1, 2, 10]);
}

#[test]
fn variable_bits_unit_counts() {
    for (bps, expected_units) in [(1u32, 32usize), (8, 4)] {
        let config = LayoutConfig::VariableBits(VariableBitsConfig {
            header_len: expected_units,
            bits_per_symbol: bps,
            ..VariableBitsConfig::default()
        });
        let mut formatter = HeaderFormatter::from_config(&config).unwrap();
        let (header, _) = formatter.format_len(10, &Metadata::new()).unwrap();
        assert_eq!(header.len(), formatter.header_nbits() / bps as usize);
        assert_eq!(header.len(), expected_units);
    }
}

#[test]
fn variable_bits_stream_of_units() {
    let config = LayoutConfig::VariableBits(VariableBitsConfig {
        header_len: 16,
        bits_per_symbol: 2,
        ..VariableBitsConfig::default()
    });
    let mut tx = HeaderFormatter::from_config(&config).unwrap();
    let mut rx = HeaderFormatter::from_config(&config).unwrap();

    let mut units = Vec::new();
    for len in [1usize, 3] {
        let (header, _) = tx.format_len(len, &Metadata::new()).unwrap();
        units.extend_from_slice(&header);
        // 8 * len bits at 2 bits per unit.
        units.extend(std::iter::repeat(0b11u8).take(len * 4));
    }

    let results = parse_all(&mut rx, &units);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].get_int(PACKET_LEN), Some(1));
    assert_eq!(results[1].get_int(PACKET_LEN), Some(3));
    assert_eq!(results[1].get_int(PACKET_NUM), Some(1));
    assert_eq!(results[1].get_int(SKIP_SAMPS), Some(16));
}

#[test]
fn sync_needs_a_full_access_code_of_received_bits() {
    let code = AccessCode::parse("0000000011111111").unwrap();
    let header_nbits = HeaderFormatter::new(DefaultLayout::new(code)).header_nbits();

    // Only the trailing 0xFF of the code arrives; the cleared correlator
    // must not stand in for the missing zero byte.
    let mut formatter = HeaderFormatter::new(DefaultLayout::new(code));
    let results = parse_all(&mut formatter, &unpack_bits(&[0xFF, 0x00, 0x01, 0x00, 0x01]));
    assert!(results.is_empty());

    let mut formatter = HeaderFormatter::new(DefaultLayout::new(code));
    let results = parse_all(
        &mut formatter,
        &unpack_bits(&[0x00, 0xFF, 0x00, 0x01, 0x00, 0x01]),
    );
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get_int(PAYLOAD_BITS), Some(8));
    assert_eq!(results[0].get_int(SKIP_SAMPS), Some(header_nbits as i64));
}

#[test]
fn sync_after_payload_needs_fresh_access_code_bits() {
    let code = AccessCode::parse("0000000011111111").unwrap();
    let mut tx = HeaderFormatter::new(DefaultLayout::new(code));
    let (header, _) = tx.format_len(1, &Metadata::new()).unwrap();

    // A one-byte payload, then a truncated second header missing its
    // leading zero byte.
    let mut bytes = header.to_vec();
    bytes.push(0x5A);
    bytes.extend_from_slice(&[0xFF, 0x00, 0x01, 0x00, 0x01]);

    let mut rx = HeaderFormatter::new(DefaultLayout::new(code));
    let results = parse_all(&mut rx, &unpack_bits(&bytes));
    assert_eq!(results.len(), 1);
}
