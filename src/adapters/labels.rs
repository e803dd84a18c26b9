//! Display strings for the closed enums the core works with.
//!
//! The core never handles these strings; only the boundary adapters
//! (HTTP, telemetry, serial log) look them up here.

use crate::control::alert::AlertLevel;
use crate::control::context::BatteryState;

/// Indexed by [`AlertLevel::code`].
const ALERT_LABELS: [&str; 3] = ["Normal", "Warning", "Critical"];

/// Indexed by `BatteryState as u8`.
const BATTERY_STATE_LABELS: [&str; 3] = ["Charging", "Discharging", "Idle"];

pub fn alert_label(level: AlertLevel) -> &'static str {
    ALERT_LABELS[usize::from(level.code())]
}

pub fn battery_state_label(state: BatteryState) -> &'static str {
    BATTERY_STATE_LABELS[state as usize]
}

/// Human-readable charging state returned by the relay endpoint.
pub fn charging_label(enabled: bool) -> &'static str {
    if enabled { "Charging ENABLED" } else { "Charging DISABLED" }
}
