//! State of Charge from compensated terminal voltage.
//!
//! ```text
//! soc = clamp((V + V_ir + V_temp - V_empty) / (V_full - V_empty) * 100, 0, 100)
//! V_ir   = I * R_internal            (only while I > 0)
//! V_temp = -(T - T_ref) * k          (only while T > T_ref and T is valid)
//! ```

use crate::config::SystemConfig;

/// IR-drop compensation term (V).
pub fn ir_drop_compensation(current_a: f32, internal_resistance_ohm: f32) -> f32 {
    if current_a > 0.0 {
        current_a * internal_resistance_ohm
    } else {
        0.0
    }
}

/// Temperature compensation term (V).  Zero for an invalid reading.
pub fn temperature_compensation(temperature_c: Option<f32>, reference_c: f32, v_per_c: f32) -> f32 {
    match temperature_c {
        Some(t) if t > reference_c => -(t - reference_c) * v_per_c,
        _ => 0.0,
    }
}

/// Estimated state of charge in percent, always within `0.0..=100.0`.
pub fn state_of_charge(
    voltage_v: f32,
    current_a: f32,
    temperature_c: Option<f32>,
    cfg: &SystemConfig,
) -> f32 {
    let compensated = voltage_v
        + ir_drop_compensation(current_a, cfg.internal_resistance_ohm)
        + temperature_compensation(temperature_c, cfg.temp_comp_reference_c, cfg.temp_comp_v_per_c);
    let span = cfg.full_voltage_v - cfg.empty_voltage_v;
    let soc = (compensated - cfg.empty_voltage_v) / span * 100.0;
    if soc.is_nan() {
        return 0.0;
    }
    soc.clamp(0.0, 100.0)
}
