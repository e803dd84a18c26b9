//! Charge-direction hysteresis.
//!
//! Two asymmetric current thresholds bracket a hold band.  Inside the
//! band the previous decision is kept, so sensor noise around a single
//! crossing point cannot flip the state.
//!
//! ```text
//!            discharge_threshold        charge_threshold
//!   ─────────────────┼─────────── hold ───────┼──────────────▶ current (A)
//!   is_charging=false│                        │is_charging=true
//! ```

/// Whether the pack is currently being charged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChargeDirectionState {
    pub is_charging: bool,
}

impl ChargeDirectionState {
    /// Apply one current sample.  Returns `true` if the state flipped.
    pub fn update(&mut self, current_a: f32, charge_threshold_a: f32, discharge_threshold_a: f32) -> bool {
        let next = if current_a >= charge_threshold_a {
            true
        } else if current_a <= discharge_threshold_a {
            false
        } else {
            self.is_charging
        };
        let changed = next != self.is_charging;
        self.is_charging = next;
        changed
    }
}
