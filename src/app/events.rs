//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: tagged serial lines on the device,
//! a recording vector in tests.

use crate::control::alert::AlertLevel;
use crate::control::charging::ChargingTransition;
use crate::control::context::BatteryState;
use crate::control::fan::FanBand;
use crate::control::reconcile::RelayCorrection;
use crate::error::{ActuatorError, CommsError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started and the relay has been driven to its boot state.
    Started { charging_enabled: bool },

    /// Current transducer zero offset measured.
    Calibrated { zero_offset_counts: f32 },

    /// Alert classification changed.
    AlertChanged { from: AlertLevel, to: AlertLevel },

    /// Fan switched on or off.
    FanChanged { is_on: bool, duty: u8, band: FanBand },

    /// Fan PWM write rejected; the previous duty stays in effect and the
    /// next slow tick tries again.
    FanWriteFailed { duty: u8, error: ActuatorError },

    /// Charging enable changed (automatic or manual).
    ChargingChanged(ChargingTransition),

    /// Charge direction crossed a hysteresis threshold.
    DirectionChanged { is_charging: bool },

    /// Relay pin disagreed with the intended level and was re-driven.
    RelayCorrected(RelayCorrection),

    /// Temperature probe read invalid; fail-safe behaviour engaged.
    TemperatureInvalid,

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryRecord),

    /// Telemetry push failed; the record is dropped.
    TelemetryFailed(CommsError),
}

/// A point-in-time snapshot of everything the boundary adapters report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    pub voltage_v: f32,
    pub current_a: f32,
    /// `None` when the probe read is invalid.
    pub temperature_c: Option<f32>,
    pub soc_pct: f32,
    pub soh_pct: f32,
    pub alert: AlertLevel,
    pub amp_hours: f64,
    pub fan_on: bool,
    pub fan_duty: u8,
    pub charging_enabled: bool,
    pub battery_state: BatteryState,
}
