//! Echo path variability tracking.

/// Kind of delay adjustment that occurred on the echo path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayAdjustment {
    None,
    BufferFlush,
    DelayReset,
    NewDetectedDelay,
    BufferReadjustment,
}

/// Describes changes in the echo path reported by the surrounding system.
#[derive(Debug, Clone)]
pub struct EchoPathVariability {
    pub gain_change: bool,
    pub delay_change: DelayAdjustment,
    pub clock_drift: bool,
}

impl EchoPathVariability {
    pub fn new(gain_change: bool, delay_change: DelayAdjustment, clock_drift: bool) -> Self {
        Self {
            gain_change,
            delay_change,
            clock_drift,
        }
    }

    /// Returns whether the audio path has changed (gain or delay).
    pub fn audio_path_changed(&self) -> bool {
        self.gain_change || self.delay_change != DelayAdjustment::None
    }
}
