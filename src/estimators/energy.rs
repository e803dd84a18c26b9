//! Coulomb counter: trapezoidal integration of signed current.
//!
//! `Ah += (I + I_prev) / 2 * Δt_ms / 3_600_000`
//!
//! The total is kept in `f64`: a single fast-loop increment is on the
//! order of 1e-8 Ah, below `f32` resolution once the total passes ~1 Ah.
//! The accumulator is never reset while the process runs.

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Cumulative signed charge throughput.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyAccumulator {
    amp_hours: f64,
    last_current_a: f32,
    /// `None` until the first sample primes the integrator.
    last_sample_ms: Option<u64>,
}

impl EnergyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrate the interval since the previous sample.
    ///
    /// The first call only records the sample.  A timestamp that did not
    /// advance contributes nothing but still replaces the previous current.
    pub fn update(&mut self, current_a: f32, now_ms: u64) {
        if let Some(last_ms) = self.last_sample_ms {
            let delta_ms = now_ms.saturating_sub(last_ms);
            if delta_ms > 0 && current_a.is_finite() {
                let mean_a = (f64::from(current_a) + f64::from(self.last_current_a)) / 2.0;
                self.amp_hours += mean_a * (delta_ms as f64 / MS_PER_HOUR);
            }
        }
        if current_a.is_finite() {
            self.last_current_a = current_a;
        }
        self.last_sample_ms = Some(now_ms.max(self.last_sample_ms.unwrap_or(0)));
    }

    /// Net amp-hours since boot (positive = net charge in).
    pub fn amp_hours(&self) -> f64 {
        self.amp_hours
    }

    pub fn last_sample_ms(&self) -> Option<u64> {
        self.last_sample_ms
    }
}
