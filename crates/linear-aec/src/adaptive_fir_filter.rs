//! Partitioned frequency-domain adaptive FIR filter.
//!
//! The filter state is a set of two-block frequency-domain partitions that
//! are convolved with the render transform history. Adaptation applies a
//! precomputed gradient and constrains one partition per call to keep the
//! impulse response causal within its partition.

use derive_more::Debug;

use crate::block_fft::BlockFft;
use crate::common::{FFT_LENGTH, FFT_LENGTH_BY_2, FFT_LENGTH_BY_2_PLUS_1};
use crate::data_dumper::DataDumper;
use crate::fft_data::FftData;
use crate::render_buffer::RenderBuffer;

/// Computes the per-partition frequency responses H2[p][k] = |H[p][k]|².
pub(crate) fn compute_frequency_response(
    num_partitions: usize,
    h: &[FftData],
    h2: &mut [[f32; FFT_LENGTH_BY_2_PLUS_1]],
) {
    debug_assert_eq!(num_partitions, h2.len());
    for (h_p, h2_p) in h.iter().zip(h2.iter_mut()).take(num_partitions) {
        h_p.spectrum(h2_p);
    }
}

/// Adapts the filter partitions: H[p] += G * conj(X[p]).
pub(crate) fn adapt_partitions(
    render_buffer: &RenderBuffer,
    g: &FftData,
    num_partitions: usize,
    h: &mut [FftData],
) {
    let x_history = render_buffer.fft_history();
    let mut index = render_buffer.position();
    for h_p in h.iter_mut().take(num_partitions) {
        let x_p = &x_history[index];
        for k in 0..FFT_LENGTH_BY_2_PLUS_1 {
            h_p.re[k] += x_p.re[k] * g.re[k] + x_p.im[k] * g.im[k];
            h_p.im[k] += x_p.re[k] * g.im[k] - x_p.im[k] * g.re[k];
        }
        index = if index < x_history.len() - 1 {
            index + 1
        } else {
            0
        };
    }
}

/// Produces the filter output: S = sum_p H[p] * X[p].
pub(crate) fn apply_filter(
    render_buffer: &RenderBuffer,
    num_partitions: usize,
    h: &[FftData],
    s: &mut FftData,
) {
    s.clear();

    let x_history = render_buffer.fft_history();
    let mut index = render_buffer.position();
    for h_p in h.iter().take(num_partitions) {
        let x_p = &x_history[index];
        for k in 0..FFT_LENGTH_BY_2_PLUS_1 {
            s.re[k] += x_p.re[k] * h_p.re[k] - x_p.im[k] * h_p.im[k];
            s.im[k] += x_p.re[k] * h_p.im[k] + x_p.im[k] * h_p.re[k];
        }
        index = if index < x_history.len() - 1 {
            index + 1
        } else {
            0
        };
    }
}

/// Sums the partition frequency responses into a per-bin echo return loss
/// estimate.
fn compute_erl(
    h2: &[[f32; FFT_LENGTH_BY_2_PLUS_1]],
    erl: &mut [f32; FFT_LENGTH_BY_2_PLUS_1],
) {
    erl.fill(0.0);
    for h2_p in h2 {
        for (erl_k, &h2_pk) in erl.iter_mut().zip(h2_p.iter()) {
            *erl_k += h2_pk;
        }
    }
}

/// Frequency-domain adaptive FIR filter with partitioned convolution.
#[derive(Debug)]
pub(crate) struct AdaptiveFirFilter {
    #[debug(skip)]
    fft: BlockFft,
    size_partitions: usize,
    #[debug(skip)]
    h: Vec<FftData>,
    #[debug(skip)]
    h2: Vec<[f32; FFT_LENGTH_BY_2_PLUS_1]>,
    #[debug(skip)]
    erl: [f32; FFT_LENGTH_BY_2_PLUS_1],
    partition_to_constrain: usize,
}

impl AdaptiveFirFilter {
    pub(crate) fn new(size_partitions: usize) -> Self {
        debug_assert!(size_partitions > 0);
        Self {
            fft: BlockFft::new(),
            size_partitions,
            h: vec![FftData::default(); size_partitions],
            h2: vec![[0.0; FFT_LENGTH_BY_2_PLUS_1]; size_partitions],
            erl: [0.0; FFT_LENGTH_BY_2_PLUS_1],
            partition_to_constrain: 0,
        }
    }

    /// Produces the output of the filter.
    pub(crate) fn filter(&self, render_buffer: &RenderBuffer, s: &mut FftData) {
        apply_filter(render_buffer, self.size_partitions, &self.h, s);
    }

    /// Adapts the filter, constrains the next partition in the cycle and
    /// refreshes the frequency response and echo return loss estimates.
    pub(crate) fn adapt(&mut self, render_buffer: &RenderBuffer, g: &FftData) {
        adapt_partitions(render_buffer, g, self.size_partitions, &mut self.h);
        self.constrain();
        compute_frequency_response(self.size_partitions, &self.h, &mut self.h2);
        compute_erl(&self.h2, &mut self.erl);
    }

    /// Receives reports that known echo path changes have occurred.
    pub(crate) fn handle_echo_path_change(&mut self) {
        for h_p in &mut self.h {
            h_p.clear();
        }
        for h2_p in &mut self.h2 {
            h2_p.fill(0.0);
        }
        self.erl.fill(0.0);
        self.partition_to_constrain = 0;
    }

    /// Returns the filter size in partitions.
    pub(crate) fn size_partitions(&self) -> usize {
        self.size_partitions
    }

    /// Returns the current echo return loss estimate.
    pub(crate) fn erl(&self) -> &[f32; FFT_LENGTH_BY_2_PLUS_1] {
        &self.erl
    }

    /// Gets a reference to the filter coefficients.
    pub(crate) fn get_filter(&self) -> &[FftData] {
        &self.h
    }

    /// Dumps the partition coefficients, real parts before imaginary parts.
    pub(crate) fn dump_filter(&self, name: &str, dumper: &mut dyn DataDumper) {
        for h_p in &self.h {
            dumper.dump_raw(name, &h_p.re);
            dumper.dump_raw(name, &h_p.im);
        }
    }

    /// Constrains the next partition to a causal half-window impulse
    /// response and advances the round-robin cycle.
    fn constrain(&mut self) {
        let mut h_td = [0.0f32; FFT_LENGTH];
        self.fft
            .ifft(&self.h[self.partition_to_constrain], &mut h_td);

        const SCALE: f32 = 1.0 / FFT_LENGTH_BY_2 as f32;
        for v in &mut h_td[..FFT_LENGTH_BY_2] {
            *v *= SCALE;
        }
        h_td[FFT_LENGTH_BY_2..].fill(0.0);

        self.fft
            .fft(&mut h_td, &mut self.h[self.partition_to_constrain]);

        self.partition_to_constrain = if self.partition_to_constrain < self.size_partitions - 1 {
            self.partition_to_constrain + 1
        } else {
            0
        };
    }
}
