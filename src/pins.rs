//! GPIO / peripheral pin assignments for the battery monitor board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Analog inputs (ADC1)
// ---------------------------------------------------------------------------

/// Pack voltage through the R1/R2 divider.  ADC1 channel 6 (GPIO 34).
pub const VOLTAGE_ADC_GPIO: i32 = 34;
/// Hall-effect current transducer output.  ADC1 channel 7 (GPIO 35).
pub const CURRENT_ADC_GPIO: i32 = 35;
/// NTC thermistor divider on the pack.  ADC1 channel 0 (GPIO 36).
pub const TEMP_ADC_GPIO: i32 = 36;

// ---------------------------------------------------------------------------
// Cooling fan (4-wire PWM or MOSFET-switched)
// ---------------------------------------------------------------------------

/// LEDC PWM output for fan speed.
pub const FAN_PWM_GPIO: i32 = 25;
/// LEDC base frequency for the fan (25 kHz, above audible range).
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;
/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;

// ---------------------------------------------------------------------------
// Charging relay
// ---------------------------------------------------------------------------

/// Digital output to the charge-enable relay module.
/// Inverted wiring: HIGH = relay energised = charging DISABLED.
/// Configured input-output so the level can be read back.
pub const CHARGE_RELAY_GPIO: i32 = 26;
