//! Shared mutable context owned by the control loop.
//!
//! `ControlContext` is the single struct the controllers read from and
//! write to: the latest reading, the estimator state, actuator state and
//! configuration.  It replaces module-level globals; the service owns it
//! and passes the relevant parts to each controller by reference.

use crate::config::SystemConfig;
use crate::estimators::direction::ChargeDirectionState;
use crate::estimators::energy::EnergyAccumulator;

use super::alert::AlertLevel;
use super::charging::ChargingState;
use super::fan::FanState;

// ---------------------------------------------------------------------------
// Battery reading (produced by the sensors, read-only to controllers)
// ---------------------------------------------------------------------------

/// One filtered, unit-converted measurement of the pack.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatteryReading {
    /// Pack voltage (V).
    pub voltage_v: f32,
    /// Pack current (A), positive = charging, deadbanded.
    pub current_a: f32,
    /// Pack temperature (°C); `None` when the probe read is invalid.
    pub temperature_c: Option<f32>,
}

/// Coarse direction label reported at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BatteryState {
    Charging = 0,
    Discharging = 1,
    Idle = 2,
}

impl BatteryState {
    /// Derive the label from the hysteretic direction and the present current.
    pub fn classify(is_charging: bool, current_a: f32) -> Self {
        if is_charging {
            Self::Charging
        } else if current_a < 0.0 {
            Self::Discharging
        } else {
            Self::Idle
        }
    }
}

// ---------------------------------------------------------------------------
// ControlContext
// ---------------------------------------------------------------------------

pub struct ControlContext {
    // -- Configuration --
    pub config: SystemConfig,

    // -- Sensor data --
    /// Latest reading.  Voltage/current refresh every fast tick,
    /// temperature every slow tick.
    pub reading: BatteryReading,

    // -- Estimators --
    pub direction: ChargeDirectionState,
    pub energy: EnergyAccumulator,

    // -- Control outputs --
    pub alert: AlertLevel,
    pub fan: FanState,
    pub charging: ChargingState,

    // -- Timing --
    pub fast_ticks: u64,
    pub slow_ticks: u64,
}

impl ControlContext {
    pub fn new(config: SystemConfig) -> Self {
        let charging = ChargingState::new(config.charging_enabled_at_boot);
        Self {
            config,
            reading: BatteryReading::default(),
            direction: ChargeDirectionState::default(),
            energy: EnergyAccumulator::new(),
            alert: AlertLevel::Normal,
            fan: FanState::off(),
            charging,
            fast_ticks: 0,
            slow_ticks: 0,
        }
    }

    pub fn battery_state(&self) -> BatteryState {
        BatteryState::classify(self.direction.is_charging, self.reading.current_a)
    }
}
