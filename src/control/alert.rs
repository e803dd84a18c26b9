//! Alert-level classifier.
//!
//! Pure function, recomputed every slow tick with no memory of the
//! previous level.  Critical always wins over Warning.

use crate::config::SystemConfig;

use super::context::BatteryReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum AlertLevel {
    Normal = 0,
    Warning = 1,
    Critical = 2,
}

impl AlertLevel {
    /// Numeric code used on the telemetry wire.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Classify the reading against the configured limits.
///
/// Temperature clauses never fire on an invalid probe; an invalid probe
/// with otherwise normal values is a Warning.
pub fn classify(reading: &BatteryReading, cfg: &SystemConfig) -> AlertLevel {
    let over_temp = reading.temperature_c.is_some_and(|t| t > cfg.temp_high_c);
    if over_temp
        || reading.voltage_v > cfg.voltage_high_v
        || reading.voltage_v < cfg.voltage_low_v
        || reading.current_a > cfg.current_high_a
    {
        return AlertLevel::Critical;
    }

    match reading.temperature_c {
        Some(t) if t > cfg.temp_warning_c => AlertLevel::Warning,
        None => AlertLevel::Warning,
        Some(_) => AlertLevel::Normal,
    }
}
