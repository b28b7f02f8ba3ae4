//! Echo subtractor built on two parallel adaptive filters.
//!
//! The main filter carries the stable echo path estimate used for the
//! subtracted output. The shadow filter adapts with a larger step size and
//! no stability safeguards, so after an echo path change it re-converges
//! first and its error spectrum steers the main filter's leakage model.

use derive_more::Debug;

use crate::adaptive_fir_filter::AdaptiveFirFilter;
use crate::aec_state::AecState;
use crate::block_fft::{BlockFft, Window};
use crate::common::{BLOCK_SIZE, FFT_LENGTH, FFT_LENGTH_BY_2, FFT_LENGTH_BY_2_PLUS_1};
use crate::config::SubtractorConfig;
use crate::data_dumper::DataDumper;
use crate::echo_path_variability::{DelayAdjustment, EchoPathVariability};
use crate::fft_data::FftData;
use crate::main_filter_update_gain::MainFilterUpdateGain;
use crate::render_buffer::RenderBuffer;
use crate::render_signal_analyzer::RenderSignalAnalyzer;
use crate::shadow_filter_update_gain::ShadowFilterUpdateGain;
use crate::subtractor_output::SubtractorOutput;

/// Computes the prediction error e = y - IFFT(S)[second half] * scale and
/// clamps it to the representable 16 bit sample range.
fn prediction_error(
    fft: &mut BlockFft,
    s: &FftData,
    y: &[f32],
    e: &mut [f32; BLOCK_SIZE],
    s_scaled: Option<&mut [f32; BLOCK_SIZE]>,
) {
    let mut tmp = [0.0f32; FFT_LENGTH];
    fft.ifft(s, &mut tmp);
    const SCALE: f32 = 1.0 / FFT_LENGTH_BY_2 as f32;
    for k in 0..BLOCK_SIZE {
        e[k] = y[k] - tmp[k + FFT_LENGTH_BY_2] * SCALE;
    }
    for v in e.iter_mut() {
        *v = v.clamp(-32768.0, 32767.0);
    }
    if let Some(s_scaled) = s_scaled {
        for (s_k, &tmp_k) in s_scaled.iter_mut().zip(&tmp[FFT_LENGTH_BY_2..]) {
            *s_k = SCALE * tmp_k;
        }
    }
}

/// Returns whether either filter produced an error energy large enough,
/// relative to the capture energy, to call the subtractor converged.
///
/// Near-silent capture blocks are never judged.
fn detect_convergence(
    e_main: &[f32; BLOCK_SIZE],
    e_shadow: &[f32; BLOCK_SIZE],
    y: &[f32],
) -> bool {
    let sum_of_squares = |acc: f32, &v: &f32| acc + v * v;
    let e2_main = e_main.iter().fold(0.0, sum_of_squares);
    let e2_shadow = e_shadow.iter().fold(0.0, sum_of_squares);
    let y2 = y.iter().fold(0.0, sum_of_squares);

    y2 > BLOCK_SIZE as f32 * 50.0 * 50.0 && (e2_main > 0.3 * y2 || e2_shadow > 0.1 * y2)
}

/// Convergence latch of the subtractor. `Converged` is reached at most once
/// per session and only an echo path change returns it to `Tracking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConvergenceState {
    Tracking,
    Converged,
}

/// Provides linear echo subtraction using dual adaptive filters.
#[derive(Debug)]
pub struct Subtractor {
    #[debug(skip)]
    fft: BlockFft,
    main_filter: AdaptiveFirFilter,
    shadow_filter: AdaptiveFirFilter,
    #[debug(skip)]
    main_gain: MainFilterUpdateGain,
    #[debug(skip)]
    shadow_gain: ShadowFilterUpdateGain,
    convergence: ConvergenceState,
    #[debug(skip)]
    data_dumper: Box<dyn DataDumper>,
}

impl Subtractor {
    /// Creates a subtractor from the configuration bundle. Out-of-range
    /// configuration values are sanitized.
    pub fn new(config: &SubtractorConfig, data_dumper: Box<dyn DataDumper>) -> Self {
        let mut config = config.clone();
        if !config.validate() {
            tracing::error!("Invalid subtractor config; using sanitized values.");
        }

        Self {
            fft: BlockFft::new(),
            main_filter: AdaptiveFirFilter::new(config.main.length_blocks),
            shadow_filter: AdaptiveFirFilter::new(config.shadow.length_blocks),
            main_gain: MainFilterUpdateGain::new(&config.main),
            shadow_gain: ShadowFilterUpdateGain::new(&config.shadow),
            convergence: ConvergenceState::Tracking,
            data_dumper,
        }
    }

    /// Performs one block of echo subtraction.
    pub fn process(
        &mut self,
        render_buffer: &RenderBuffer,
        capture: &[f32],
        render_signal_analyzer: &RenderSignalAnalyzer,
        aec_state: &AecState,
        output: &mut SubtractorOutput,
    ) {
        assert_eq!(BLOCK_SIZE, capture.len());
        debug_assert!(
            self.main_filter
                .size_partitions()
                .max(self.shadow_filter.size_partitions())
                <= render_buffer.size_blocks()
        );
        output.reset();
        let y = capture;

        let mut s = FftData::default();

        // Form and analyze the output of the main filter.
        self.main_filter.filter(render_buffer, &mut s);
        prediction_error(
            &mut self.fft,
            &s,
            y,
            &mut output.e_main,
            Some(&mut output.s_main),
        );
        self.fft
            .zero_padded_fft(&output.e_main, Window::Hanning, &mut output.e_main_fft);
        self.fft.zero_padded_fft(
            &output.e_main,
            Window::Rectangular,
            &mut output.e_main_nonwindowed_fft,
        );

        // Form and analyze the output of the shadow filter.
        self.shadow_filter.filter(render_buffer, &mut s);
        prediction_error(&mut self.fft, &s, y, &mut output.e_shadow, None);
        self.fft
            .zero_padded_fft(&output.e_shadow, Window::Hanning, &mut output.e_shadow_fft);

        // Check for filter convergence.
        if self.convergence == ConvergenceState::Tracking
            && detect_convergence(&output.e_main, &output.e_shadow, y)
        {
            self.convergence = ConvergenceState::Converged;
        }

        // Compute the power spectra for the downstream consumers.
        output.e_main_fft.spectrum(&mut output.e2_main);
        output
            .e_main_nonwindowed_fft
            .spectrum(&mut output.e2_main_nonwindowed);
        output.e_shadow_fft.spectrum(&mut output.e2_shadow);

        // Update the main filter.
        let mut x2 = [0.0f32; FFT_LENGTH_BY_2_PLUS_1];
        render_buffer.spectral_sum(self.main_filter.size_partitions(), &mut x2);
        let mut g = FftData::default();
        self.main_gain.compute(
            &x2,
            render_signal_analyzer,
            output,
            &self.main_filter,
            aec_state.saturated_capture(),
            &mut g,
        );
        self.main_filter.adapt(render_buffer, &g);
        self.data_dumper.dump_raw("subtractor_g_main", &g.re);
        self.data_dumper.dump_raw("subtractor_g_main", &g.im);

        // Update the shadow filter, recomputing the render power when the
        // partition counts differ.
        if self.shadow_filter.size_partitions() != self.main_filter.size_partitions() {
            render_buffer.spectral_sum(self.shadow_filter.size_partitions(), &mut x2);
        }
        self.shadow_gain.compute(
            &x2,
            &output.e_shadow_fft,
            self.shadow_filter.size_partitions(),
            aec_state.saturated_capture(),
            &mut g,
        );
        self.shadow_filter.adapt(render_buffer, &g);
        self.data_dumper.dump_raw("subtractor_g_shadow", &g.re);
        self.data_dumper.dump_raw("subtractor_g_shadow", &g.im);

        self.main_filter
            .dump_filter("subtractor_h_main", self.data_dumper.as_mut());
        self.shadow_filter
            .dump_filter("subtractor_h_shadow", self.data_dumper.as_mut());
    }

    /// Handles reported echo path changes.
    pub fn handle_echo_path_change(&mut self, echo_path_variability: &EchoPathVariability) {
        match echo_path_variability.delay_change {
            DelayAdjustment::None => {}
            // TODO: differentiate the reset depth per adjustment kind.
            DelayAdjustment::BufferFlush
            | DelayAdjustment::DelayReset
            | DelayAdjustment::NewDetectedDelay
            | DelayAdjustment::BufferReadjustment => {
                self.main_filter.handle_echo_path_change();
                self.shadow_filter.handle_echo_path_change();
                self.main_gain.handle_echo_path_change(echo_path_variability);
                self.shadow_gain.handle_echo_path_change();
                self.convergence = ConvergenceState::Tracking;
            }
        }
    }

    /// Returns whether the subtractor has judged its filters converged
    /// since the last echo path change.
    pub fn converged_filter(&self) -> bool {
        self.convergence == ConvergenceState::Converged
    }
}
