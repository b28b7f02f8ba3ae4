//! Static configuration for the subtractor.

/// Configuration of the main adaptive filter and its update gain.
#[derive(Debug, Clone)]
pub struct MainFilterConfig {
    pub length_blocks: usize,
    pub leakage_converged: f32,
    pub leakage_diverged: f32,
    pub error_floor: f32,
    pub noise_gate: f32,
}

/// Configuration of the shadow adaptive filter and its update gain.
#[derive(Debug, Clone)]
pub struct ShadowFilterConfig {
    pub length_blocks: usize,
    pub rate: f32,
    pub noise_gate: f32,
}

/// Configuration bundle passed unchanged to the two adaptive filters and
/// their paired gain computers at construction.
#[derive(Debug, Clone)]
pub struct SubtractorConfig {
    pub main: MainFilterConfig,
    pub shadow: ShadowFilterConfig,
}

impl Default for SubtractorConfig {
    fn default() -> Self {
        Self {
            main: MainFilterConfig {
                length_blocks: 13,
                leakage_converged: 0.00005,
                leakage_diverged: 0.05,
                error_floor: 0.001,
                noise_gate: 20_075_344.0,
            },
            shadow: ShadowFilterConfig {
                length_blocks: 13,
                rate: 0.7,
                noise_gate: 20_075_344.0,
            },
        }
    }
}

impl SubtractorConfig {
    /// Validates and clamps config parameters to reasonable ranges.
    /// Returns `true` if no changes were needed.
    pub fn validate(&mut self) -> bool {
        let mut ok = true;

        ok &= floor_limit_usize(&mut self.main.length_blocks, 1);
        ok &= limit_f32(&mut self.main.leakage_converged, 0.0, 1000.0);
        ok &= limit_f32(&mut self.main.leakage_diverged, 0.0, 1000.0);
        ok &= limit_f32(&mut self.main.error_floor, 0.0, 1000.0);
        ok &= limit_f32(&mut self.main.noise_gate, 0.0, 100_000_000.0);

        ok &= floor_limit_usize(&mut self.shadow.length_blocks, 1);
        ok &= limit_f32(&mut self.shadow.rate, 0.0, 1.0);
        ok &= limit_f32(&mut self.shadow.noise_gate, 0.0, 100_000_000.0);

        ok
    }
}

fn limit_f32(value: &mut f32, min: f32, max: f32) -> bool {
    let clamped = value.clamp(min, max);
    let clamped = if clamped.is_finite() { clamped } else { min };
    let unchanged = *value == clamped;
    *value = clamped;
    unchanged
}

fn floor_limit_usize(value: &mut usize, min: usize) -> bool {
    if *value < min {
        *value = min;
        false
    } else {
        true
    }
}
