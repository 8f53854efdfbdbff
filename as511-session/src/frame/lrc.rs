//! Longitudinal Redundancy Check (LRC) calculation

/// LRC calculator
///
/// The AS511 check byte is the running exclusive-or of every byte between the
/// start marker and the check byte itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct LrcCalc {
    lrc_value: u8,
}

impl LrcCalc {
    /// Create a new LRC calculator
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the LRC value to initial state
    pub fn reset(&mut self) {
        self.lrc_value = 0;
    }

    /// Update the LRC value with a single byte
    pub fn update(&mut self, data: u8) {
        self.lrc_value ^= data;
    }

    /// Update the LRC value with multiple bytes
    pub fn update_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.update(byte);
        }
    }

    /// Get the current LRC value
    pub fn value(&self) -> u8 {
        self.lrc_value
    }
}

/// Compute the LRC of a byte sequence
pub fn compute_checksum(bytes: &[u8]) -> u8 {
    let mut calc = LrcCalc::new();
    calc.update_bytes(bytes);
    calc.value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(compute_checksum(&[]), 0);
    }

    #[test]
    fn test_known_value() {
        // LEN ADDR CMD TYPE NUMBER ETX of a READ for FB1 at station 2
        assert_eq!(compute_checksum(&[0x05, 0x02, 0x10, 0x08, 0x01, 0x03]), 0x1D);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF];
        let mut calc = LrcCalc::new();
        calc.update_bytes(&data[..2]);
        calc.update_bytes(&data[2..]);
        assert_eq!(calc.value(), compute_checksum(&data));
    }

    #[test]
    fn test_lrc_reset() {
        let mut calc = LrcCalc::new();
        calc.update(0x01);
        calc.reset();
        assert_eq!(calc.value(), 0);
    }

    #[test]
    fn test_appending_checksum_cancels_out() {
        let data = [0x12, 0x34, 0x56];
        let mut calc = LrcCalc::new();
        calc.update_bytes(&data);
        calc.update(compute_checksum(&data));
        assert_eq!(calc.value(), 0);
    }
}
