//! Spectral frame type shared by the filters and gain computers.

use realfft::num_complex::Complex;

use crate::common::{FFT_LENGTH_BY_2, FFT_LENGTH_BY_2_PLUS_1};

/// Holds the real and imaginary parts produced from a 320-point real-valued
/// transform.
///
/// The transform of a real 320-sample signal produces 161 complex bins (DC
/// through Nyquist). The DC and Nyquist bins are always real-valued, so
/// `im[0]` and `im[160]` are kept at zero.
#[derive(Clone)]
pub struct FftData {
    pub re: [f32; FFT_LENGTH_BY_2_PLUS_1],
    pub im: [f32; FFT_LENGTH_BY_2_PLUS_1],
}

impl Default for FftData {
    fn default() -> Self {
        Self {
            re: [0.0; FFT_LENGTH_BY_2_PLUS_1],
            im: [0.0; FFT_LENGTH_BY_2_PLUS_1],
        }
    }
}

impl FftData {
    /// Sets all bins to zero.
    pub(crate) fn clear(&mut self) {
        self.re.fill(0.0);
        self.im.fill(0.0);
    }

    /// Computes the power spectrum: `out[k] = re[k]^2 + im[k]^2`.
    pub(crate) fn spectrum(&self, power_spectrum: &mut [f32; FFT_LENGTH_BY_2_PLUS_1]) {
        for k in 0..FFT_LENGTH_BY_2_PLUS_1 {
            power_spectrum[k] = self.re[k] * self.re[k] + self.im[k] * self.im[k];
        }
    }

    /// Unpacks a complex transform output into separate re/im arrays.
    ///
    /// The DC and Nyquist imaginary parts are forced to zero.
    pub(crate) fn copy_from_complex(&mut self, v: &[Complex<f32>]) {
        debug_assert_eq!(FFT_LENGTH_BY_2_PLUS_1, v.len());
        for k in 0..FFT_LENGTH_BY_2_PLUS_1 {
            self.re[k] = v[k].re;
            self.im[k] = v[k].im;
        }
        self.im[0] = 0.0;
        self.im[FFT_LENGTH_BY_2] = 0.0;
    }

    /// Packs re/im arrays into a complex buffer for the inverse transform.
    ///
    /// The DC and Nyquist bins are written as purely real, which the inverse
    /// transform requires.
    pub(crate) fn copy_to_complex(&self, v: &mut [Complex<f32>]) {
        debug_assert_eq!(FFT_LENGTH_BY_2_PLUS_1, v.len());
        for k in 0..FFT_LENGTH_BY_2_PLUS_1 {
            v[k] = Complex::new(self.re[k], self.im[k]);
        }
        v[0].im = 0.0;
        v[FFT_LENGTH_BY_2].im = 0.0;
    }
}
