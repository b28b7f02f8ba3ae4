//! Block transform service.
//!
//! Wraps `realfft` plans for the 320-point real-valued transforms used by the
//! subtractor. Plans and scratch buffers are created once at construction and
//! reused, so the transform methods take `&mut self`.

use std::f32::consts::PI;
use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use crate::common::{FFT_LENGTH, FFT_LENGTH_BY_2};
use crate::fft_data::FftData;

/// Window type for transform operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Window {
    Rectangular,
    Hanning,
}

/// Provides the forward, inverse, and padded block transforms.
///
/// Scaling convention: the forward transform is unnormalized and the inverse
/// output is scaled by `FFT_LENGTH_BY_2`, i.e.
/// `ifft(fft(x)) == x * FFT_LENGTH_BY_2`.
pub(crate) struct BlockFft {
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
    forward_scratch: Vec<Complex<f32>>,
    inverse_scratch: Vec<Complex<f32>>,
    bins: Vec<Complex<f32>>,
    hanning: [f32; FFT_LENGTH_BY_2],
}

impl BlockFft {
    pub(crate) fn new() -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(FFT_LENGTH);
        let inverse = planner.plan_fft_inverse(FFT_LENGTH);
        let forward_scratch = forward.make_scratch_vec();
        let inverse_scratch = inverse.make_scratch_vec();
        let bins = forward.make_output_vec();

        // Symmetric Hanning window: 0.5 * (1 - cos(2*pi*n/(N-1))) for n=0..N-1.
        let mut hanning = [0.0f32; FFT_LENGTH_BY_2];
        for (n, w) in hanning.iter_mut().enumerate() {
            let phase = 2.0 * PI * n as f32 / (FFT_LENGTH_BY_2 - 1) as f32;
            *w = 0.5 * (1.0 - phase.cos());
        }

        Self {
            forward,
            inverse,
            forward_scratch,
            inverse_scratch,
            bins,
            hanning,
        }
    }

    /// Computes the forward transform.
    ///
    /// `x` is used as scratch space and is modified in place. The result is
    /// unpacked into `x_out` with the DC and Nyquist bins forced real.
    pub(crate) fn fft(&mut self, x: &mut [f32; FFT_LENGTH], x_out: &mut FftData) {
        if let Err(e) =
            self.forward
                .process_with_scratch(x, &mut self.bins, &mut self.forward_scratch)
        {
            tracing::warn!("Forward transform failed: {e}");
            x_out.clear();
            return;
        }
        x_out.copy_from_complex(&self.bins);
    }

    /// Computes the inverse transform.
    ///
    /// The library inverse is scaled by `FFT_LENGTH`; the output is halved
    /// here to establish the `FFT_LENGTH_BY_2` convention.
    pub(crate) fn ifft(&mut self, x_in: &FftData, x: &mut [f32; FFT_LENGTH]) {
        x_in.copy_to_complex(&mut self.bins);
        if let Err(e) =
            self.inverse
                .process_with_scratch(&mut self.bins, x, &mut self.inverse_scratch)
        {
            tracing::warn!("Inverse transform failed: {e}");
            x.fill(0.0);
            return;
        }
        for v in x.iter_mut() {
            *v *= 0.5;
        }
    }

    /// Windows the input, zero-pads the first half, then computes the
    /// transform.
    ///
    /// Input `x` must be `FFT_LENGTH_BY_2` samples long. The first half of
    /// the internal buffer is zeros; the last half is `x`, optionally
    /// windowed.
    pub(crate) fn zero_padded_fft(&mut self, x: &[f32], window: Window, x_out: &mut FftData) {
        debug_assert_eq!(FFT_LENGTH_BY_2, x.len());
        let mut fft_buf = [0.0f32; FFT_LENGTH];
        match window {
            Window::Rectangular => {
                fft_buf[FFT_LENGTH_BY_2..].copy_from_slice(x);
            }
            Window::Hanning => {
                for (dst, (src, w)) in fft_buf[FFT_LENGTH_BY_2..]
                    .iter_mut()
                    .zip(x.iter().zip(self.hanning.iter()))
                {
                    *dst = src * w;
                }
            }
        }
        self.fft(&mut fft_buf, x_out);
    }

    /// Concatenates `x_old` and `x` (each `FFT_LENGTH_BY_2` samples), then
    /// computes the transform. No windowing.
    pub(crate) fn padded_fft(&mut self, x: &[f32], x_old: &[f32], x_out: &mut FftData) {
        debug_assert_eq!(FFT_LENGTH_BY_2, x.len());
        debug_assert_eq!(FFT_LENGTH_BY_2, x_old.len());
        let mut fft_buf = [0.0f32; FFT_LENGTH];
        fft_buf[..FFT_LENGTH_BY_2].copy_from_slice(x_old);
        fft_buf[FFT_LENGTH_BY_2..].copy_from_slice(x);
        self.fft(&mut fft_buf, x_out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(actual: f32, expected: f32, context: &str) {
        let tolerance = 1e-3 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() < tolerance,
            "{context}: expected {expected}, got {actual}"
        );
    }

    #[test]
    fn fft_all_zeros() {
        let mut fft = BlockFft::new();
        let mut x = [0.0f32; FFT_LENGTH];
        let mut x_out = FftData::default();
        fft.fft(&mut x, &mut x_out);
        assert!(x_out.re.iter().all(|&v| v == 0.0));
        assert!(x_out.im.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn fft_impulse() {
        let mut fft = BlockFft::new();
        let mut x = [0.0f32; FFT_LENGTH];
        x[0] = 1.0;
        let mut x_out = FftData::default();
        fft.fft(&mut x, &mut x_out);
        // Transform of a unit impulse at t=0: all re = 1, all im = 0.
        for &v in &x_out.re {
            assert_near(v, 1.0, "impulse re");
        }
        for &v in &x_out.im {
            assert!(v.abs() < 1e-4, "impulse im: got {v}");
        }
    }

    #[test]
    fn fft_dc() {
        let mut fft = BlockFft::new();
        let mut x = [1.0f32; FFT_LENGTH];
        let mut x_out = FftData::default();
        fft.fft(&mut x, &mut x_out);
        // Transform of all-ones: re[0] = FFT_LENGTH, rest = 0.
        assert_near(x_out.re[0], FFT_LENGTH as f32, "dc bin");
        for &v in &x_out.re[1..] {
            assert!(v.abs() < 1e-3, "non-dc re: got {v}");
        }
        for &v in &x_out.im {
            assert!(v.abs() < 1e-3, "non-dc im: got {v}");
        }
    }

    #[test]
    fn ifft_all_zeros() {
        let mut fft = BlockFft::new();
        let x_in = FftData::default();
        let mut x = [0.0f32; FFT_LENGTH];
        fft.ifft(&x_in, &mut x);
        assert!(x.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn ifft_all_ones_re() {
        let mut fft = BlockFft::new();
        let mut x_in = FftData::default();
        x_in.re.fill(1.0);
        let mut x = [0.0f32; FFT_LENGTH];
        fft.ifft(&x_in, &mut x);
        // Inverse of (1,0,0,...) in re: impulse of height FFT_LENGTH_BY_2.
        assert_near(x[0], FFT_LENGTH_BY_2 as f32, "impulse height");
        for &v in &x[1..] {
            assert!(v.abs() < 1e-2, "non-impulse sample: got {v}");
        }
    }

    #[test]
    fn fft_and_ifft_roundtrip() {
        let mut fft = BlockFft::new();
        let mut v = 0;
        for _ in 0..20 {
            let mut x = [0.0f32; FFT_LENGTH];
            let mut x_ref = [0.0f32; FFT_LENGTH];
            for j in 0..FFT_LENGTH {
                x[j] = v as f32;
                // ifft(fft(x)) = FFT_LENGTH_BY_2 * x (unnormalized).
                x_ref[j] = v as f32 * FFT_LENGTH_BY_2 as f32;
                v += 1;
            }
            let mut x_out = FftData::default();
            fft.fft(&mut x, &mut x_out);
            fft.ifft(&x_out, &mut x);
            for j in 0..FFT_LENGTH {
                assert_near(x[j], x_ref[j], &format!("roundtrip sample {j}"));
            }
        }
    }

    #[test]
    fn zero_padded_fft_rectangular() {
        let mut fft = BlockFft::new();
        let mut v = 0;
        for _ in 0..10 {
            let mut x_in = [0.0f32; FFT_LENGTH_BY_2];
            let mut x_ref = [0.0f32; FFT_LENGTH];
            for j in 0..FFT_LENGTH_BY_2 {
                x_in[j] = v as f32;
                x_ref[j + FFT_LENGTH_BY_2] = v as f32 * FFT_LENGTH_BY_2 as f32;
                v += 1;
            }
            let mut x_out = FftData::default();
            fft.zero_padded_fft(&x_in, Window::Rectangular, &mut x_out);
            let mut x_result = [0.0f32; FFT_LENGTH];
            fft.ifft(&x_out, &mut x_result);
            for j in 0..FFT_LENGTH {
                assert_near(x_result[j], x_ref[j], &format!("sample {j}"));
            }
        }
    }

    #[test]
    fn zero_padded_fft_hanning_applies_window() {
        let mut fft = BlockFft::new();
        let x_in = [100.0f32; FFT_LENGTH_BY_2];
        let mut x_out = FftData::default();
        fft.zero_padded_fft(&x_in, Window::Hanning, &mut x_out);
        let mut x_result = [0.0f32; FFT_LENGTH];
        fft.ifft(&x_out, &mut x_result);

        // First half stays zero-padded; second half carries the windowed input.
        for j in 0..FFT_LENGTH_BY_2 {
            assert!(x_result[j].abs() < 0.5, "padding sample {j}: {}", x_result[j]);
            let expected = 100.0 * fft.hanning[j] * FFT_LENGTH_BY_2 as f32;
            assert_near(
                x_result[j + FFT_LENGTH_BY_2],
                expected,
                &format!("windowed sample {j}"),
            );
        }
    }

    #[test]
    fn padded_fft_concatenates_blocks() {
        let mut fft = BlockFft::new();
        let mut v = 0;
        let mut x_old = [0.0f32; FFT_LENGTH_BY_2];
        for _ in 0..10 {
            let mut x_in = [0.0f32; FFT_LENGTH_BY_2];
            for j in 0..FFT_LENGTH_BY_2 {
                x_in[j] = v as f32;
                v += 1;
            }

            let mut x_ref = [0.0f32; FFT_LENGTH];
            x_ref[..FFT_LENGTH_BY_2].copy_from_slice(&x_old);
            x_ref[FFT_LENGTH_BY_2..].copy_from_slice(&x_in);
            for val in &mut x_ref {
                *val *= FFT_LENGTH_BY_2 as f32;
            }

            let mut x_out = FftData::default();
            fft.padded_fft(&x_in, &x_old, &mut x_out);
            x_old = x_in;

            let mut x_result = [0.0f32; FFT_LENGTH];
            fft.ifft(&x_out, &mut x_result);
            for j in 0..FFT_LENGTH {
                assert_near(x_result[j], x_ref[j], &format!("sample {j}"));
            }
        }
    }

    #[test]
    fn hanning_window_shape() {
        let fft = BlockFft::new();
        assert_eq!(fft.hanning[0], 0.0);
        assert_eq!(fft.hanning[FFT_LENGTH_BY_2 - 1], 0.0);
        for n in 0..FFT_LENGTH_BY_2 / 2 {
            let mirrored = fft.hanning[FFT_LENGTH_BY_2 - 1 - n];
            assert!((fft.hanning[n] - mirrored).abs() < 1e-6);
        }
        let peak = fft
            .hanning
            .iter()
            .fold(0.0f32, |acc, &w| acc.max(w));
        assert!(peak > 0.999 && peak <= 1.0);
    }
}
