//! Per-block output record of the echo subtractor.

use crate::common::{BLOCK_SIZE, FFT_LENGTH_BY_2_PLUS_1};
use crate::fft_data::FftData;

/// Signals produced by one block of echo subtraction: the scaled echo
/// estimate, both prediction errors, their spectra and power spectra.
///
/// The record is fully rewritten by every `process` call, so a single
/// instance can be reused across blocks.
#[derive(Clone)]
pub struct SubtractorOutput {
    pub s_main: [f32; BLOCK_SIZE],
    pub e_main: [f32; BLOCK_SIZE],
    pub e_shadow: [f32; BLOCK_SIZE],
    pub e_main_fft: FftData,
    pub e_main_nonwindowed_fft: FftData,
    pub e_shadow_fft: FftData,
    pub e2_main: [f32; FFT_LENGTH_BY_2_PLUS_1],
    pub e2_main_nonwindowed: [f32; FFT_LENGTH_BY_2_PLUS_1],
    pub e2_shadow: [f32; FFT_LENGTH_BY_2_PLUS_1],
}

impl Default for SubtractorOutput {
    fn default() -> Self {
        Self {
            s_main: [0.0; BLOCK_SIZE],
            e_main: [0.0; BLOCK_SIZE],
            e_shadow: [0.0; BLOCK_SIZE],
            e_main_fft: FftData::default(),
            e_main_nonwindowed_fft: FftData::default(),
            e_shadow_fft: FftData::default(),
            e2_main: [0.0; FFT_LENGTH_BY_2_PLUS_1],
            e2_main_nonwindowed: [0.0; FFT_LENGTH_BY_2_PLUS_1],
            e2_shadow: [0.0; FFT_LENGTH_BY_2_PLUS_1],
        }
    }
}

impl SubtractorOutput {
    /// Resets all fields to zero.
    pub fn reset(&mut self) {
        self.s_main.fill(0.0);
        self.e_main.fill(0.0);
        self.e_shadow.fill(0.0);
        self.e_main_fft.clear();
        self.e_main_nonwindowed_fft.clear();
        self.e_shadow_fft.clear();
        self.e2_main.fill(0.0);
        self.e2_main_nonwindowed.fill(0.0);
        self.e2_shadow.fill(0.0);
    }
}
