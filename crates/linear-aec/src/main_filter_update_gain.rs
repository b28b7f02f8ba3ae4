//! Update gain computation for the main adaptive filter.

use crate::adaptive_fir_filter::AdaptiveFirFilter;
use crate::common::FFT_LENGTH_BY_2_PLUS_1;
use crate::config::MainFilterConfig;
use crate::echo_path_variability::EchoPathVariability;
use crate::fft_data::FftData;
use crate::render_signal_analyzer::RenderSignalAnalyzer;
use crate::subtractor_output::SubtractorOutput;

const H_ERROR_INITIAL: f32 = 10_000.0;
const POOR_EXCITATION_COUNTER_INITIAL: usize = 1_000;

/// Computes the adaptation gain for the main filter.
///
/// The step size follows an NLMS rule scaled by `h_error`, a per-bin
/// estimate of how far the filter is from the true echo path. The estimate
/// is debited on every update and replenished through leakage terms chosen
/// by comparing the main and shadow error spectra.
pub(crate) struct MainFilterUpdateGain {
    config: MainFilterConfig,
    h_error: [f32; FFT_LENGTH_BY_2_PLUS_1],
    poor_excitation_counter: usize,
    call_counter: usize,
}

impl MainFilterUpdateGain {
    pub(crate) fn new(config: &MainFilterConfig) -> Self {
        Self {
            config: config.clone(),
            h_error: [H_ERROR_INITIAL; FFT_LENGTH_BY_2_PLUS_1],
            poor_excitation_counter: POOR_EXCITATION_COUNTER_INITIAL,
            call_counter: 0,
        }
    }

    /// Takes action in the case of a known echo path change. Every change
    /// kind currently takes the same reset.
    pub(crate) fn handle_echo_path_change(
        &mut self,
        _echo_path_variability: &EchoPathVariability,
    ) {
        self.h_error.fill(H_ERROR_INITIAL);
        self.poor_excitation_counter = POOR_EXCITATION_COUNTER_INITIAL;
        self.call_counter = 0;
    }

    /// Computes the gain for the main filter's next adaptation step.
    pub(crate) fn compute(
        &mut self,
        render_power: &[f32; FFT_LENGTH_BY_2_PLUS_1],
        render_signal_analyzer: &RenderSignalAnalyzer,
        subtractor_output: &SubtractorOutput,
        filter: &AdaptiveFirFilter,
        saturated_capture_signal: bool,
        gain_fft: &mut FftData,
    ) {
        let e_main = &subtractor_output.e_main_fft;
        let e2_main = &subtractor_output.e2_main;
        let e2_shadow = &subtractor_output.e2_shadow;
        let erl = filter.erl();
        let size_partitions = filter.size_partitions();

        self.call_counter += 1;

        if render_signal_analyzer.poor_signal_excitation() {
            self.poor_excitation_counter = 0;
        }

        // Do not update the filter if the render is not sufficiently excited.
        self.poor_excitation_counter += 1;
        if self.poor_excitation_counter < size_partitions
            || saturated_capture_signal
            || self.call_counter <= size_partitions
        {
            gain_fft.clear();
        } else {
            // mu = h_error / (0.5 * h_error * X2 + n * E2).
            let mut mu = [0.0f32; FFT_LENGTH_BY_2_PLUS_1];
            for k in 0..FFT_LENGTH_BY_2_PLUS_1 {
                if render_power[k] >= self.config.noise_gate {
                    mu[k] = self.h_error[k]
                        / (0.5 * self.h_error[k] * render_power[k]
                            + size_partitions as f32 * e2_main[k]);
                }
            }

            // Avoid updating the filter close to narrow bands.
            render_signal_analyzer.mask_regions_around_narrow_bands(&mut mu);

            // h_error -= 0.5 * mu * X2 * h_error.
            for k in 0..FFT_LENGTH_BY_2_PLUS_1 {
                self.h_error[k] -= 0.5 * mu[k] * render_power[k] * self.h_error[k];
            }

            // G = mu * E_main.
            for k in 0..FFT_LENGTH_BY_2_PLUS_1 {
                gain_fft.re[k] = mu[k] * e_main.re[k];
                gain_fft.im[k] = mu[k] * e_main.im[k];
            }
        }

        // h_error += factor * erl.
        for k in 0..FFT_LENGTH_BY_2_PLUS_1 {
            if e2_main[k] <= e2_shadow[k] {
                self.h_error[k] += self.config.leakage_converged * erl[k];
            } else {
                self.h_error[k] += self.config.leakage_diverged * erl[k];
            }
            self.h_error[k] = self.h_error[k].max(self.config.error_floor);
        }
    }
}
