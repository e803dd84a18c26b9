//! Pack voltage through a resistive divider.
//!
//! `V = counts * (Vref / resolution) * (R1 + R2) / R2`

pub fn counts_to_volts(avg_counts: f32, volts_per_count: f32, divider_ratio: f32) -> f32 {
    avg_counts * volts_per_count * divider_ratio
}
