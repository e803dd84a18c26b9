//! Relay reconciliation.
//!
//! The relay pin can be flipped by electrical glitches outside software
//! control.  On its own cadence the service compares the physical level
//! with the level implied by [`ChargingState`] and re-asserts the intended
//! one.  The logical state is never changed here and a mismatch never
//! raises the alert level.

use crate::app::ports::ActuatorPort;

use super::charging::ChargingState;

/// A corrected divergence between intended and observed relay level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCorrection {
    pub expected: bool,
    pub observed: bool,
}

/// Compare and, on mismatch, re-drive the relay pin.
pub fn reconcile_relay(charging: &ChargingState, hw: &mut impl ActuatorPort) -> Option<RelayCorrection> {
    let expected = charging.relay_signal();
    let observed = hw.relay_signal();
    if observed == expected {
        return None;
    }
    hw.set_relay_signal(expected);
    Some(RelayCorrection { expected, observed })
}
