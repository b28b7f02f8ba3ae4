//! Narrow-band render detection feeding the main filter adaptation.

use crate::common::{FFT_LENGTH_BY_2, FFT_LENGTH_BY_2_MINUS_1, FFT_LENGTH_BY_2_PLUS_1};
use crate::render_buffer::RenderBuffer;

const COUNTER_THRESHOLD: usize = 5;

/// Updates the narrow-band counters from the render spectrum at the echo
/// path delay. While the delay is unknown the counters are cleared.
fn identify_small_narrow_band_regions(
    render_buffer: &RenderBuffer,
    delay_partitions: Option<usize>,
    narrow_band_counters: &mut [usize; FFT_LENGTH_BY_2_MINUS_1],
) {
    let Some(delay) = delay_partitions else {
        narrow_band_counters.fill(0);
        return;
    };

    let x2 = render_buffer.spectrum(delay);
    for k in 1..FFT_LENGTH_BY_2 {
        narrow_band_counters[k - 1] = if x2[k] > 3.0 * x2[k - 1].max(x2[k + 1]) {
            narrow_band_counters[k - 1] + 1
        } else {
            0
        };
    }
}

/// Tracks render bins that persistently dominate their neighbours.
///
/// Sustained narrow-band excitation carries too little spectral information
/// to adapt on, so the main filter gain consults this analyzer to freeze
/// adaptation in and around such regions.
#[derive(Debug)]
pub struct RenderSignalAnalyzer {
    narrow_band_counters: [usize; FFT_LENGTH_BY_2_MINUS_1],
}

impl Default for RenderSignalAnalyzer {
    fn default() -> Self {
        Self {
            narrow_band_counters: [0; FFT_LENGTH_BY_2_MINUS_1],
        }
    }
}

impl RenderSignalAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the detection state from the current render history.
    pub fn update(&mut self, render_buffer: &RenderBuffer, delay_partitions: Option<usize>) {
        identify_small_narrow_band_regions(
            render_buffer,
            delay_partitions,
            &mut self.narrow_band_counters,
        );
    }

    /// Returns true when the render signal has been poorly exciting for a
    /// sustained period.
    pub fn poor_signal_excitation(&self) -> bool {
        self.narrow_band_counters.iter().any(|&counter| counter > 10)
    }

    /// Zeroes `v` in and around the detected narrow-band regions.
    pub fn mask_regions_around_narrow_bands(&self, v: &mut [f32; FFT_LENGTH_BY_2_PLUS_1]) {
        if self.narrow_band_counters[0] > COUNTER_THRESHOLD {
            v[0] = 0.0;
            v[1] = 0.0;
        }
        for k in 2..FFT_LENGTH_BY_2 - 1 {
            if self.narrow_band_counters[k - 1] > COUNTER_THRESHOLD {
                v[k - 2..=k + 2].fill(0.0);
            }
        }
        if self.narrow_band_counters[FFT_LENGTH_BY_2 - 2] > COUNTER_THRESHOLD {
            v[FFT_LENGTH_BY_2 - 1] = 0.0;
            v[FFT_LENGTH_BY_2] = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{BLOCK_SIZE, FFT_LENGTH};
    use std::f32::consts::PI;

    /// Feeds `num_blocks` blocks of a sinusoid landing exactly on `bin` into
    /// the buffer, updating the analyzer after each insert.
    fn render_sinusoid(
        analyzer: &mut RenderSignalAnalyzer,
        buffer: &mut RenderBuffer,
        bin: usize,
        num_blocks: usize,
    ) {
        let mut sample_index = 0usize;
        for _ in 0..num_blocks {
            let mut block = [0.0f32; BLOCK_SIZE];
            for v in block.iter_mut() {
                *v = 100.0 * (2.0 * PI * bin as f32 * sample_index as f32 / FFT_LENGTH as f32).sin();
                sample_index += 1;
            }
            buffer.insert(&block);
            analyzer.update(buffer, Some(0));
        }
    }

    #[test]
    fn no_narrow_bands_initially() {
        let analyzer = RenderSignalAnalyzer::new();
        assert!(!analyzer.poor_signal_excitation());
    }

    #[test]
    fn mask_is_identity_without_narrow_bands() {
        let analyzer = RenderSignalAnalyzer::new();
        let mut v = [1.0f32; FFT_LENGTH_BY_2_PLUS_1];
        analyzer.mask_regions_around_narrow_bands(&mut v);
        assert!(v.iter().all(|&x| x == 1.0));
    }

    #[test]
    fn detects_sustained_sinusoidal_render() {
        let mut analyzer = RenderSignalAnalyzer::new();
        let mut buffer = RenderBuffer::new(13);
        render_sinusoid(&mut analyzer, &mut buffer, 32, 12);
        assert!(analyzer.poor_signal_excitation());

        let mut v = [1.0f32; FFT_LENGTH_BY_2_PLUS_1];
        analyzer.mask_regions_around_narrow_bands(&mut v);
        for k in 30..=34 {
            assert_eq!(v[k], 0.0, "bin {k}");
        }
        assert_eq!(v[29], 1.0);
        assert_eq!(v[35], 1.0);
    }

    #[test]
    fn update_without_delay_resets_counters() {
        let mut analyzer = RenderSignalAnalyzer::new();
        let mut buffer = RenderBuffer::new(13);
        render_sinusoid(&mut analyzer, &mut buffer, 32, 12);
        assert!(analyzer.poor_signal_excitation());

        analyzer.update(&buffer, None);
        assert!(!analyzer.poor_signal_excitation());

        let mut v = [1.0f32; FFT_LENGTH_BY_2_PLUS_1];
        analyzer.mask_regions_around_narrow_bands(&mut v);
        assert!(v.iter().all(|&x| x == 1.0));
    }
}
