/// Table-driven CRC-8, MSB first, no reflection, no final XOR.
#[derive(Clone)]
pub struct Crc8 {
    table: [u8; 256],
    value: u8,
    init: u8,
}

impl Crc8 {
    /// Header CRC: polynomial 0x07, initial value 0xFF.
    pub fn new() -> Self {
        Self::with_poly(0x07, 0xFF)
    }

    /// CRC-8 with a custom polynomial and initial value.
    pub fn with_poly(poly: u8, init: u8) -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let mut crc = i as u8;
            for _ in 0..8 {
                if crc & 0x80 != 0 {
                    crc = (crc << 1) ^ poly;
                } else {
                    crc <<= 1;
                }
            }
            *slot = crc;
        }
        Self {
            table,
            value: init,
            init,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.value = self.table[(self.value ^ byte) as usize];
        }
    }

    pub fn finalize(&self) -> u8 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = self.init;
    }

    /// One-shot checksum of `data`.
    pub fn checksum(&mut self, data: &[u8]) -> u8 {
        self.reset();
        self.update(data);
        self.finalize()
    }
}

impl Default for Crc8 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc8")
            .field("value", &self.value)
            .field("init", &self.init)
            .finish_non_exhaustive()
    }
}

/// CRC protecting the `{length, counter}` pair of CRC-checked headers.
///
/// Both values enter the checksum as 16-bit little-endian byte pairs,
/// length first.
pub fn header_crc8(crc: &mut Crc8, len: u16, counter: u16) -> u8 {
    let [l0, l1] = len.to_le_bytes();
    let [c0, c1] = counter.to_le_bytes();
    crc.checksum(&[l0, l1, c0, c1])
}
