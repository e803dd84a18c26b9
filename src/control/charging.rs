//! Charging-enable controller.
//!
//! Binary state with a re-enable margin below full voltage.  The relay
//! module is wired inverted: asserting the GPIO (HIGH) *disables*
//! charging, so the physical signal is always `!enabled`.
//!
//! ## Manual override
//!
//! An external command sets the state directly and switches the
//! controller to [`ChargingMode::ManualOverride`].  While overridden,
//! automatic re-enable is suppressed.  The automatic disable rules are
//! safety cut-offs and always evaluate; when one fires the charger is
//! disabled and control returns to [`ChargingMode::Auto`].

use crate::config::SystemConfig;

use super::context::BatteryReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargingMode {
    Auto,
    ManualOverride,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargingCause {
    /// Voltage reached the full-charge cut-off.
    FullVoltage,
    /// Pack temperature above `temp_high`.
    OverTemperature,
    /// Temperature probe invalid, treated as too hot.
    TemperatureInvalid,
    /// Over-voltage while current is flowing in.
    OverVoltageWhileCharging,
    /// Conditions recovered below the re-enable margin.
    Recovered,
    /// External command.
    Manual,
}

/// A change of `enabled` and why it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargingTransition {
    pub enabled: bool,
    pub cause: ChargingCause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargingState {
    pub enabled: bool,
    pub mode: ChargingMode,
}

/// Physical relay level for a logical charging state.
pub const fn relay_signal_for(enabled: bool) -> bool {
    !enabled
}

impl ChargingState {
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            mode: ChargingMode::Auto,
        }
    }

    /// GPIO level that should currently be on the relay pin.
    pub const fn relay_signal(&self) -> bool {
        relay_signal_for(self.enabled)
    }

    pub fn is_overridden(&self) -> bool {
        self.mode == ChargingMode::ManualOverride
    }

    /// Automatic evaluation against the latest reading.
    pub fn evaluate(
        &mut self,
        reading: &BatteryReading,
        is_charging: bool,
        cfg: &SystemConfig,
    ) -> Option<ChargingTransition> {
        if self.enabled {
            let cause = Self::disable_cause(reading, is_charging, cfg)?;
            self.enabled = false;
            self.mode = ChargingMode::Auto;
            return Some(ChargingTransition { enabled: false, cause });
        }

        if self.is_overridden() {
            return None;
        }

        let temp_ok = reading.temperature_c.is_some_and(|t| t < cfg.temp_high_c);
        let v = reading.voltage_v;
        if v < cfg.full_voltage_v
            && temp_ok
            && !is_charging
            && v < cfg.full_voltage_v - cfg.recharge_margin_v
        {
            self.enabled = true;
            return Some(ChargingTransition {
                enabled: true,
                cause: ChargingCause::Recovered,
            });
        }
        None
    }

    /// Apply an external command: `Some(state)` sets it, `None` toggles.
    pub fn apply_manual(&mut self, desired: Option<bool>) -> ChargingTransition {
        self.enabled = desired.unwrap_or(!self.enabled);
        self.mode = ChargingMode::ManualOverride;
        ChargingTransition {
            enabled: self.enabled,
            cause: ChargingCause::Manual,
        }
    }

    fn disable_cause(reading: &BatteryReading, is_charging: bool, cfg: &SystemConfig) -> Option<ChargingCause> {
        let v = reading.voltage_v;
        match reading.temperature_c {
            None => return Some(ChargingCause::TemperatureInvalid),
            Some(t) if t > cfg.temp_high_c => return Some(ChargingCause::OverTemperature),
            Some(_) => {}
        }
        if v >= cfg.full_voltage_v {
            return Some(ChargingCause::FullVoltage);
        }
        if is_charging && v > cfg.voltage_high_v {
            return Some(ChargingCause::OverVoltageWhileCharging);
        }
        None
    }
}
