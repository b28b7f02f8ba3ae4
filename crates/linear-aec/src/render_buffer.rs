//! Render history consumed by the adaptive filters.

use derive_more::Debug;

use crate::block_fft::BlockFft;
use crate::common::{BLOCK_SIZE, FFT_LENGTH_BY_2_PLUS_1};
use crate::fft_data::FftData;

/// Ring of transforms and power spectra of the recent render blocks.
///
/// `insert` decrements the write position, so the newest entry sits at
/// `position()` and increasing offsets walk toward older blocks. The
/// capacity must cover the longest filter's partition count.
#[derive(Debug)]
pub struct RenderBuffer {
    size: usize,
    position: usize,
    #[debug(skip)]
    ffts: Vec<FftData>,
    #[debug(skip)]
    spectra: Vec<[f32; FFT_LENGTH_BY_2_PLUS_1]>,
    #[debug(skip)]
    last_block: [f32; BLOCK_SIZE],
    #[debug(skip)]
    fft: BlockFft,
}

impl RenderBuffer {
    /// Creates a buffer holding `size_blocks` blocks of render history.
    pub fn new(size_blocks: usize) -> Self {
        assert!(size_blocks > 0);
        Self {
            size: size_blocks,
            position: 0,
            ffts: vec![FftData::default(); size_blocks],
            spectra: vec![[0.0; FFT_LENGTH_BY_2_PLUS_1]; size_blocks],
            last_block: [0.0; BLOCK_SIZE],
            fft: BlockFft::new(),
        }
    }

    /// Inserts a render block.
    ///
    /// The stored transform spans the new block and the previously inserted
    /// one, matching the filters' overlapping two-block convention.
    pub fn insert(&mut self, block: &[f32]) {
        assert_eq!(BLOCK_SIZE, block.len());
        self.position = if self.position == 0 {
            self.size - 1
        } else {
            self.position - 1
        };

        self.fft
            .padded_fft(block, &self.last_block, &mut self.ffts[self.position]);
        self.ffts[self.position].spectrum(&mut self.spectra[self.position]);
        self.last_block.copy_from_slice(block);
    }

    /// Returns the number of history slots.
    pub(crate) fn size_blocks(&self) -> usize {
        self.size
    }

    /// Returns the slot index of the most recent insert.
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    /// Returns the circular transform history.
    pub(crate) fn fft_history(&self) -> &[FftData] {
        &self.ffts
    }

    /// Returns the power spectrum at the given offset from the most recent
    /// insert (0 = newest).
    pub(crate) fn spectrum(&self, offset_blocks: usize) -> &[f32; FFT_LENGTH_BY_2_PLUS_1] {
        &self.spectra[(self.position + offset_blocks) % self.size]
    }

    /// Computes the per-bin sum of the `num_spectra` most recent power
    /// spectra.
    pub(crate) fn spectral_sum(
        &self,
        num_spectra: usize,
        x2: &mut [f32; FFT_LENGTH_BY_2_PLUS_1],
    ) {
        debug_assert!(num_spectra <= self.size);
        x2.fill(0.0);
        let mut position = self.position;
        for _ in 0..num_spectra {
            for (out, &val) in x2.iter_mut().zip(self.spectra[position].iter()) {
                *out += val;
            }
            position = if position < self.size - 1 {
                position + 1
            } else {
                0
            };
        }
    }
}
