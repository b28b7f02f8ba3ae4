//! Update gain computation for the shadow adaptive filter.

use crate::common::FFT_LENGTH_BY_2_PLUS_1;
use crate::config::ShadowFilterConfig;
use crate::fft_data::FftData;

/// Computes the adaptation gain for the shadow filter.
///
/// The shadow filter trades stability for speed: its step size is a plain
/// power-normalized rate without the mismatch model of the main gain, so it
/// re-converges quickly after an echo path change.
pub(crate) struct ShadowFilterUpdateGain {
    config: ShadowFilterConfig,
    call_counter: usize,
}

impl ShadowFilterUpdateGain {
    pub(crate) fn new(config: &ShadowFilterConfig) -> Self {
        Self {
            config: config.clone(),
            call_counter: 0,
        }
    }

    /// Takes action in the case of a known echo path change.
    pub(crate) fn handle_echo_path_change(&mut self) {
        self.call_counter = 0;
    }

    /// Computes the gain for the shadow filter's next adaptation step.
    pub(crate) fn compute(
        &mut self,
        render_power: &[f32; FFT_LENGTH_BY_2_PLUS_1],
        e_shadow: &FftData,
        size_partitions: usize,
        saturated_capture_signal: bool,
        gain_fft: &mut FftData,
    ) {
        self.call_counter += 1;
        if self.call_counter <= size_partitions || saturated_capture_signal {
            gain_fft.clear();
            return;
        }

        // mu = rate / X2 above the noise gate, 0 elsewhere; G = mu * E_shadow.
        for k in 0..FFT_LENGTH_BY_2_PLUS_1 {
            let mu = if render_power[k] > self.config.noise_gate {
                self.config.rate / render_power[k]
            } else {
                0.0
            };
            gain_fft.re[k] = mu * e_shadow.re[k];
            gain_fft.im[k] = mu * e_shadow.im[k];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubtractorConfig;

    fn default_gain() -> ShadowFilterUpdateGain {
        ShadowFilterUpdateGain::new(&SubtractorConfig::default().shadow)
    }

    fn shadow_error() -> FftData {
        let mut e = FftData::default();
        e.re.fill(2.0);
        e.im.fill(-1.0);
        e
    }

    #[test]
    fn gain_is_zero_during_warmup() {
        let mut gain = default_gain();
        let render_power = [1e8f32; FFT_LENGTH_BY_2_PLUS_1];
        let e = shadow_error();
        let mut g = FftData::default();

        for _ in 0..5 {
            gain.compute(&render_power, &e, 5, false, &mut g);
            assert!(g.re.iter().all(|&v| v == 0.0));
            assert!(g.im.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn gain_scales_error_by_normalized_rate() {
        let mut gain = default_gain();
        let rate = SubtractorConfig::default().shadow.rate;
        let render_power = [1e8f32; FFT_LENGTH_BY_2_PLUS_1];
        let e = shadow_error();
        let mut g = FftData::default();

        for _ in 0..6 {
            gain.compute(&render_power, &e, 5, false, &mut g);
        }

        let mu = rate / 1e8;
        for k in 0..FFT_LENGTH_BY_2_PLUS_1 {
            assert!((g.re[k] - mu * 2.0).abs() < 1e-12, "re bin {k}");
            assert!((g.im[k] + mu * 1.0).abs() < 1e-12, "im bin {k}");
        }
    }

    #[test]
    fn saturation_zeros_gain() {
        let mut gain = default_gain();
        let render_power = [1e8f32; FFT_LENGTH_BY_2_PLUS_1];
        let e = shadow_error();
        let mut g = FftData::default();

        for _ in 0..6 {
            gain.compute(&render_power, &e, 5, false, &mut g);
        }
        assert!(g.re.iter().any(|&v| v != 0.0));

        gain.compute(&render_power, &e, 5, true, &mut g);
        assert!(g.re.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn noise_gate_masks_weakly_excited_bins() {
        let mut gain = default_gain();
        let mut render_power = [1e8f32; FFT_LENGTH_BY_2_PLUS_1];
        render_power[40] = 100.0;
        let e = shadow_error();
        let mut g = FftData::default();

        for _ in 0..6 {
            gain.compute(&render_power, &e, 5, false, &mut g);
        }

        assert_eq!(g.re[40], 0.0);
        assert!(g.re[41] != 0.0);
    }

    #[test]
    fn echo_path_change_restarts_warmup() {
        let mut gain = default_gain();
        let render_power = [1e8f32; FFT_LENGTH_BY_2_PLUS_1];
        let e = shadow_error();
        let mut g = FftData::default();

        for _ in 0..6 {
            gain.compute(&render_power, &e, 5, false, &mut g);
        }
        assert!(g.re.iter().any(|&v| v != 0.0));

        gain.handle_echo_path_change();
        gain.compute(&render_power, &e, 5, false, &mut g);
        assert!(g.re.iter().all(|&v| v == 0.0));
    }
}
