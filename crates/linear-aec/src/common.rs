//! Block and transform size constants shared across the crate.
//!
//! The canceller operates on 10 ms blocks at a 16 kHz rate. Spectral frames
//! come from a zero-padded transform of twice the block length, so a frame
//! carries `FFT_LENGTH_BY_2_PLUS_1` bins.

pub(crate) const FFT_LENGTH_BY_2: usize = 160;
pub const FFT_LENGTH_BY_2_PLUS_1: usize = FFT_LENGTH_BY_2 + 1;
pub(crate) const FFT_LENGTH_BY_2_MINUS_1: usize = FFT_LENGTH_BY_2 - 1;
pub(crate) const FFT_LENGTH: usize = 2 * FFT_LENGTH_BY_2;

pub const BLOCK_SIZE: usize = FFT_LENGTH_BY_2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_sizes_consistent() {
        assert_eq!(FFT_LENGTH, 2 * BLOCK_SIZE);
        assert_eq!(FFT_LENGTH_BY_2_PLUS_1, BLOCK_SIZE + 1);
        assert_eq!(FFT_LENGTH_BY_2_MINUS_1, BLOCK_SIZE - 1);
    }
}
