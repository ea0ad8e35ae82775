use crate::access_code::{AccessCode, MAX_ACCESS_CODE_BITS};
use crate::error::{BitsError, Result};

/// Sliding-window access code detector.
///
/// Keeps the last 64 received bits in a shift register and compares the
/// newest `len` of them against the access code. A position matches when
/// the Hamming distance is at most the threshold. No match is reported
/// until at least `len` bits have been pushed since construction or the
/// last [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct AccessCodeCorrelator {
    code: AccessCode,
    threshold: u32,
    data_reg: u64,
    /// Bits pushed since the last reset, saturating at the register width.
    filled: usize,
}

impl AccessCodeCorrelator {
    /// Exact-match correlator (threshold 0).
    pub fn new(code: AccessCode) -> Self {
        Self {
            code,
            threshold: 0,
            data_reg: 0,
            filled: 0,
        }
    }

    /// Correlator tolerating up to `threshold` bit errors.
    pub fn with_threshold(code: AccessCode, threshold: u32) -> Result<Self> {
        let mut correlator = Self::new(code);
        correlator.set_threshold(threshold)?;
        Ok(correlator)
    }

    /// Change the tolerated bit-error count.
    ///
    /// Fails if `threshold` is larger than the access code length.
    pub fn set_threshold(&mut self, threshold: u32) -> Result<()> {
        if threshold as usize > self.code.len() {
            return Err(BitsError::ThresholdTooLarge {
                threshold,
                len: self.code.len(),
            });
        }
        self.threshold = threshold;
        Ok(())
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn access_code(&self) -> &AccessCode {
        &self.code
    }

    /// Current Hamming distance between the register and the access code.
    pub fn distance(&self) -> u32 {
        ((self.data_reg ^ self.code.bits()) & self.code.mask()).count_ones()
    }

    /// Shift in one bit (low bit of `bit`).
    ///
    /// Returns the Hamming distance when the window now matches.
    pub fn push_bit(&mut self, bit: u8) -> Option<u32> {
        self.data_reg = (self.data_reg << 1) | u64::from(bit & 1);
        self.filled = (self.filled + 1).min(MAX_ACCESS_CODE_BITS);
        if self.filled < self.code.len() {
            return None;
        }
        let wrong = self.distance();
        (wrong <= self.threshold).then_some(wrong)
    }

    /// Forget the bit history.
    pub fn reset(&mut self) {
        self.data_reg = 0;
        self.filled = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(value: u64, len: usize) -> Vec<u8> {
        (0..len).rev().map(|i| ((value >> i) & 1) as u8).collect()
    }

    fn first_match(correlator: &mut AccessCodeCorrelator, bits: &[u8]) -> Option<(usize, u32)> {
        bits.iter()
            .enumerate()
            .find_map(|(i, &b)| correlator.push_bit(b).map(|d| (i, d)))
    }

    #[test]
    fn exact_match_at_end_of_pattern() {
        let code = AccessCode::parse("11100101").unwrap();
        let mut correlator = AccessCodeCorrelator::new(code);
        let mut bits = vec![0, 0, 0];
        bits.extend(bits_of(0xE5, 8));
        assert_eq!(first_match(&mut correlator, &bits), Some((10, 0)));
    }

    #[test]
    fn single_error_needs_threshold() {
        let code = AccessCode::parse("1010101010101010").unwrap();
        let corrupted = bits_of(0xAAAA ^ 0x0100, 16);

        let mut strict = AccessCodeCorrelator::new(code);
        assert_eq!(first_match(&mut strict, &corrupted), None);

        let mut tolerant = AccessCodeCorrelator::with_threshold(code, 1).unwrap();
        assert_eq!(first_match(&mut tolerant, &corrupted), Some((15, 1)));
    }

    #[test]
    fn threshold_above_length_rejected() {
        let code = AccessCode::parse("11110000").unwrap();
        let err = AccessCodeCorrelator::with_threshold(code, 9).unwrap_err();
        assert_eq!(err, BitsError::ThresholdTooLarge { threshold: 9, len: 8 });
        assert!(AccessCodeCorrelator::with_threshold(code, 8).is_ok());
    }

    #[test]
    fn empty_code_matches_every_bit() {
        let mut correlator = AccessCodeCorrelator::new(AccessCode::empty());
        assert_eq!(correlator.push_bit(1), Some(0));
        assert_eq!(correlator.push_bit(0), Some(0));
    }

    #[test]
    fn reset_clears_history() {
        let code = AccessCode::parse("11111111").unwrap();
        let mut correlator = AccessCodeCorrelator::new(code);
        for _ in 0..7 {
            assert_eq!(correlator.push_bit(1), None);
        }
        correlator.reset();
        assert_eq!(correlator.push_bit(1), None);
        assert_eq!(correlator.distance(), 7);
    }

    #[test]
    fn leading_zeros_need_real_bits() {
        let code = AccessCode::parse("0000000011111111").unwrap();
        let mut correlator = AccessCodeCorrelator::new(code);
        assert_eq!(first_match(&mut correlator, &bits_of(0xFF, 8)), None);

        // Same again after a reset: the cleared register is not history.
        correlator.reset();
        assert_eq!(first_match(&mut correlator, &bits_of(0xFF, 8)), None);

        correlator.reset();
        assert_eq!(
            first_match(&mut correlator, &bits_of(0x00FF, 16)),
            Some((15, 0))
        );
    }
}
