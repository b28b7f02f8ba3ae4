//! Signal block generators for property-based testing.
//!
//! Provides both strategy functions (for use with `#[strategy(...)]`) and
//! `Arbitrary`-deriving structs for common processing inputs. Blocks are
//! 10 ms at 16 kHz, matching the canceller's processing granularity.

use proptest::prelude::*;
use test_strategy::Arbitrary;

/// Samples per processing block.
pub const BLOCK_SIZE: usize = 160;

/// A coarse signal level, spanning the gating thresholds of the adaptive
/// filters: silence, sub-noise-gate excitation, and strong excitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum SignalLevel {
    #[weight(1)]
    Silent,
    #[weight(1)]
    Faint,
    #[weight(2)]
    Speech,
    #[weight(1)]
    Loud,
}

impl SignalLevel {
    /// Peak sample magnitude for this level.
    pub fn peak(self) -> f32 {
        match self {
            Self::Silent => 0.0,
            Self::Faint => 1.0,
            Self::Speech => 1000.0,
            Self::Loud => 30000.0,
        }
    }
}

/// A render block together with the level it was generated at.
#[derive(Debug, Clone, Arbitrary)]
pub struct LeveledRenderBlock {
    pub level: SignalLevel,
    #[strategy(scaled_block(#level.peak()))]
    pub samples: Vec<f32>,
}

/// Generate a render block spanning the full 16 bit sample range.
pub fn render_block() -> impl Strategy<Value = Vec<f32>> {
    scaled_block(32768.0)
}

/// Generate a capture block spanning the representable sample range.
pub fn capture_block() -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-32768.0f32..=32767.0, BLOCK_SIZE..=BLOCK_SIZE)
}

/// Generate a block with samples in `[-peak, peak]`.
pub fn scaled_block(peak: f32) -> impl Strategy<Value = Vec<f32>> {
    // proptest rejects zero-width float ranges, so the silent case needs an
    // explicit constant strategy.
    let sample = if peak == 0.0 {
        Just(0.0f32).boxed()
    } else {
        (-peak..=peak).boxed()
    };
    proptest::collection::vec(sample, BLOCK_SIZE..=BLOCK_SIZE)
}

/// Generate a short echo path impulse response with unit-range taps.
pub fn echo_path(max_len: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..=1.0f32, 1..=max_len)
}
