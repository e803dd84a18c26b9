//! NTC thermistor temperature sensor (10 kOhm @ 25 C, B = 3950).
//!
//! Wired in a voltage divider with a fixed 10 kOhm resistor on the high
//! side, read through the analog front-end.  The simplified Beta
//! (Steinhart-Hart) equation converts resistance to temperature.
//!
//! A reading at either rail or outside the plausible range is an error,
//! never a clamped value: the controllers treat it as "unknown" and fail
//! safe.

use crate::error::SensorError;

const R25: f32 = 10_000.0;
const BETA: f32 = 3950.0;
const T25_K: f32 = 298.15;
const R_DIVIDER: f32 = 10_000.0;
/// Pin voltage within this of a rail means the probe is open or shorted.
const RAIL_MARGIN_V: f32 = 0.01;

pub const MIN_PLAUSIBLE_C: f32 = -40.0;
pub const MAX_PLAUSIBLE_C: f32 = 125.0;

/// Convert averaged ADC counts to °C.
pub fn counts_to_celsius(avg_counts: f32, adc_reference_v: f32, adc_resolution: f32) -> Result<f32, SensorError> {
    let voltage = avg_counts / adc_resolution * adc_reference_v;
    if voltage.is_nan() || voltage <= RAIL_MARGIN_V {
        return Err(SensorError::ShortCircuit);
    }
    if voltage >= adc_reference_v - RAIL_MARGIN_V {
        return Err(SensorError::OpenCircuit);
    }
    let r_ntc = R_DIVIDER * voltage / (adc_reference_v - voltage);
    let inv_t = (1.0 / T25_K) + (1.0 / BETA) * (r_ntc / R25).ln();
    if inv_t <= 0.0 {
        return Err(SensorError::OutOfRange);
    }
    let celsius = (1.0 / inv_t) - 273.15;
    if !(MIN_PLAUSIBLE_C..=MAX_PLAUSIBLE_C).contains(&celsius) {
        return Err(SensorError::OutOfRange);
    }
    Ok(celsius)
}

/// Inverse of [`counts_to_celsius`]; used to synthesise readings in tests
/// and the host simulation.
pub fn celsius_to_counts(celsius: f32, adc_reference_v: f32, adc_resolution: f32) -> f32 {
    let t_k = celsius + 273.15;
    let r_ntc = R25 * (BETA * (1.0 / t_k - 1.0 / T25_K)).exp();
    let voltage = adc_reference_v * r_ntc / (R_DIVIDER + r_ntc);
    voltage / adc_reference_v * adc_resolution
}
