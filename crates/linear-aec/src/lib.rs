//! Linear acoustic echo cancellation through adaptive subtraction.
//!
//! Estimates the echo path between a render signal and its acoustic echo in
//! the capture signal, and subtracts the predicted echo block by block. A
//! stable main filter produces the output while a fast shadow filter guides
//! its adaptation after echo path changes.

pub(crate) mod adaptive_fir_filter;
pub mod aec_state;
pub(crate) mod block_fft;
pub mod common;
pub mod config;
pub mod data_dumper;
pub mod echo_path_variability;
pub mod fft_data;
pub(crate) mod main_filter_update_gain;
pub mod render_buffer;
pub mod render_signal_analyzer;
pub(crate) mod shadow_filter_update_gain;
pub mod subtractor;
pub mod subtractor_output;
