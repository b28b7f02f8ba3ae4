//! Capture-path state consulted by the filter adaptation.

const SATURATION_THRESHOLD: f32 = 32_700.0;

/// Tracks whether the capture signal is saturated.
///
/// Both gain computers freeze adaptation while the flag is set, since a
/// clipped capture block carries no usable echo information.
#[derive(Debug, Default)]
pub struct AecState {
    capture_saturation: bool,
}

impl AecState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the saturation flag from the capture block.
    pub fn update_capture_saturation(&mut self, x: &[f32]) {
        self.capture_saturation = x.iter().any(|&v| v.abs() >= SATURATION_THRESHOLD);
    }

    /// Returns whether the capture signal was saturated.
    pub fn saturated_capture(&self) -> bool {
        self.capture_saturation
    }
}
