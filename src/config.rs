//! System configuration parameters
//!
//! All tunable parameters for the battery monitor.  Values can be
//! overridden via NVS (non-volatile storage).
//!
//! The SoC compensation terms (`temp_comp_*`, `internal_resistance_ohm`)
//! are empirical calibration parameters, not physical constants, and are
//! expected to be tuned per deployed pack.

use serde::{Deserialize, Serialize};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- ADC / front-end ---
    /// ADC reference voltage (V)
    pub adc_reference_v: f32,
    /// Full-scale ADC count (4095 for 12-bit)
    pub adc_resolution: f32,
    /// Samples averaged for the zero-current calibration
    pub calibration_samples: u16,
    /// Samples averaged for routine voltage/current reads
    pub routine_samples: u16,
    /// Samples averaged for a temperature read
    pub temperature_samples: u16,
    /// Settling delay between consecutive samples (microseconds)
    pub sample_delay_us: u32,

    // --- Voltage divider ---
    /// Upper divider resistor (ohms)
    pub divider_r1_ohm: f32,
    /// Lower divider resistor (ohms)
    pub divider_r2_ohm: f32,

    // --- Current transducer ---
    /// Transducer sensitivity (V per A)
    pub current_sensitivity_v_per_a: f32,
    /// Readings with magnitude below this are clamped to 0 A
    pub current_deadband_a: f32,

    // --- Charge direction hysteresis ---
    /// Current at or above which the pack is considered charging (A)
    pub charge_threshold_a: f32,
    /// Current at or below which the pack is no longer charging (A)
    pub discharge_threshold_a: f32,

    // --- SoC / SoH ---
    /// Pack voltage treated as 0 % SoC
    pub empty_voltage_v: f32,
    /// Pack voltage treated as 100 % SoC (also the charge cut-off)
    pub full_voltage_v: f32,
    /// Temperature above which the SoC estimate is penalised (°C)
    pub temp_comp_reference_c: f32,
    /// SoC voltage penalty per °C above the reference (V/°C)
    pub temp_comp_v_per_c: f32,
    /// Internal resistance used for IR-drop compensation (ohms)
    pub internal_resistance_ohm: f32,
    /// Nameplate capacity (Ah)
    pub rated_capacity_ah: f32,
    /// Last measured capacity (Ah), the SoH input
    pub measured_capacity_ah: f32,

    // --- Alert thresholds ---
    /// Critical over-temperature; also the fan full-speed threshold (°C)
    pub temp_high_c: f32,
    /// Warning temperature; start of the fan warning band (°C)
    pub temp_warning_c: f32,
    /// Fan switch-off temperature (°C)
    pub temp_off_c: f32,
    /// Critical over-voltage (V)
    pub voltage_high_v: f32,
    /// Critical under-voltage (V)
    pub voltage_low_v: f32,
    /// Critical over-current (A)
    pub current_high_a: f32,

    // --- Fan ---
    /// Duty applied when the temperature reading is invalid (0-255)
    pub fan_failsafe_duty: u8,
    /// Duty applied above `temp_high_c` (0-255)
    pub fan_max_duty: u8,
    /// Warning band duty at `temp_warning_c`
    pub fan_warning_min_duty: u8,
    /// Warning band duty at `temp_high_c`
    pub fan_warning_max_duty: u8,
    /// Lower band duty just above `temp_off_c`
    pub fan_low_min_duty: u8,
    /// Lower band duty at `temp_warning_c`
    pub fan_low_max_duty: u8,

    // --- Charging ---
    /// Margin below full voltage required before re-enabling (V)
    pub recharge_margin_v: f32,
    /// Charging state written to the relay at boot
    pub charging_enabled_at_boot: bool,

    // --- Timing ---
    /// Temperature / alert / fan / charging cadence (milliseconds)
    pub slow_tick_interval_ms: u32,
    /// Relay reconciliation cadence (milliseconds)
    pub reconcile_interval_ms: u32,
    /// Telemetry push cadence (seconds)
    pub telemetry_interval_secs: u32,
    /// Yield between loop iterations (milliseconds)
    pub loop_yield_ms: u32,

    // --- Network ---
    /// Remote logging endpoint (empty = telemetry disabled)
    pub telemetry_endpoint: heapless::String<128>,
    /// HTTP server port
    pub http_port: u16,
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Front-end
            adc_reference_v: 3.3,
            adc_resolution: 4095.0,
            calibration_samples: 500,
            routine_samples: 20,
            temperature_samples: 8,
            sample_delay_us: 500,

            // 30k / 7.5k divider (0-25 V module)
            divider_r1_ohm: 30_000.0,
            divider_r2_ohm: 7_500.0,

            // ACS712-20A
            current_sensitivity_v_per_a: 0.1,
            current_deadband_a: 0.15,

            charge_threshold_a: 0.5,
            discharge_threshold_a: 0.2,

            // 3S Li-ion pack
            empty_voltage_v: 9.0,
            full_voltage_v: 12.6,
            temp_comp_reference_c: 25.0,
            temp_comp_v_per_c: 0.005,
            internal_resistance_ohm: 0.05,
            rated_capacity_ah: 10.0,
            measured_capacity_ah: 10.0,

            temp_high_c: 50.0,
            temp_warning_c: 40.0,
            temp_off_c: 35.0,
            voltage_high_v: 12.8,
            voltage_low_v: 8.7,
            current_high_a: 10.0,

            fan_failsafe_duty: 180,
            fan_max_duty: 255,
            fan_warning_min_duty: 128,
            fan_warning_max_duty: 230,
            fan_low_min_duty: 60,
            fan_low_max_duty: 128,

            recharge_margin_v: 0.3,
            charging_enabled_at_boot: true,

            slow_tick_interval_ms: 2_000,
            reconcile_interval_ms: 5_000,
            telemetry_interval_secs: 30,
            loop_yield_ms: 10,

            telemetry_endpoint: heapless::String::new(),
            http_port: 80,
            wifi_ssid: heapless::String::new(),
            wifi_password: heapless::String::new(),
        }
    }
}

impl SystemConfig {
    /// Range- and ordering-check every field.  Invalid values are
    /// rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.adc_reference_v > 0.0 && self.adc_resolution > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "adc reference and resolution must be > 0",
            ));
        }
        if self.calibration_samples == 0 || self.routine_samples == 0 || self.temperature_samples == 0 {
            return Err(ConfigError::ValidationFailed("sample counts must be >= 1"));
        }
        if self.sample_delay_us > 10_000 {
            return Err(ConfigError::ValidationFailed(
                "sample_delay_us must be <= 10000",
            ));
        }
        if !(self.divider_r1_ohm >= 0.0 && self.divider_r2_ohm > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "divider_r2_ohm must be > 0 and divider_r1_ohm >= 0",
            ));
        }
        if !(self.current_sensitivity_v_per_a > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "current_sensitivity_v_per_a must be > 0",
            ));
        }
        if !(self.current_deadband_a >= 0.0) {
            return Err(ConfigError::ValidationFailed("current_deadband_a must be >= 0"));
        }
        if !(self.discharge_threshold_a < self.charge_threshold_a) {
            return Err(ConfigError::ValidationFailed(
                "discharge_threshold_a must be < charge_threshold_a",
            ));
        }
        if !(self.empty_voltage_v < self.full_voltage_v) {
            return Err(ConfigError::ValidationFailed(
                "empty_voltage_v must be < full_voltage_v",
            ));
        }
        if !(self.voltage_low_v < self.voltage_high_v) {
            return Err(ConfigError::ValidationFailed(
                "voltage_low_v must be < voltage_high_v",
            ));
        }
        if !(self.rated_capacity_ah > 0.0 && self.measured_capacity_ah >= 0.0) {
            return Err(ConfigError::ValidationFailed(
                "rated_capacity_ah must be > 0 and measured_capacity_ah >= 0",
            ));
        }
        if !(self.temp_off_c < self.temp_warning_c && self.temp_warning_c < self.temp_high_c) {
            return Err(ConfigError::ValidationFailed(
                "temperature bands must satisfy temp_off < temp_warning < temp_high",
            ));
        }
        if self.fan_low_min_duty == 0
            || self.fan_low_min_duty > self.fan_low_max_duty
            || self.fan_low_max_duty > self.fan_warning_min_duty
            || self.fan_warning_min_duty > self.fan_warning_max_duty
            || self.fan_warning_max_duty > self.fan_max_duty
        {
            return Err(ConfigError::ValidationFailed(
                "fan duties must be non-decreasing from low band to max and > 0",
            ));
        }
        if self.fan_failsafe_duty == 0 {
            return Err(ConfigError::ValidationFailed("fan_failsafe_duty must be > 0"));
        }
        if !(self.recharge_margin_v >= 0.0) {
            return Err(ConfigError::ValidationFailed("recharge_margin_v must be >= 0"));
        }
        if !(100..=60_000).contains(&self.slow_tick_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "slow_tick_interval_ms must be 100-60000",
            ));
        }
        if !(100..=600_000).contains(&self.reconcile_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "reconcile_interval_ms must be 100-600000",
            ));
        }
        if !(5..=3600).contains(&self.telemetry_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_secs must be 5-3600",
            ));
        }
        if self.loop_yield_ms > 1000 {
            return Err(ConfigError::ValidationFailed("loop_yield_ms must be <= 1000"));
        }
        Ok(())
    }

    /// Divider gain `(R1 + R2) / R2`.
    pub fn divider_ratio(&self) -> f32 {
        (self.divider_r1_ohm + self.divider_r2_ohm) / self.divider_r2_ohm
    }

    /// Volts per ADC count.
    pub fn volts_per_count(&self) -> f32 {
        self.adc_reference_v / self.adc_resolution
    }

    /// Load from `port`, falling back to defaults on any failure.
    pub fn load_or_default(port: &impl ConfigPort) -> Self {
        match port.load() {
            Ok(cfg) => cfg,
            Err(ConfigError::NotFound) => {
                info!("No stored config, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!("Stored config unusable ({}), using defaults", e);
                Self::default()
            }
        }
    }
}
