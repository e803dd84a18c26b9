//! State of Health: measured capacity as a percentage of rated capacity.
//!
//! The measured capacity is an injected input (config or
//! `AppCommand::SetMeasuredCapacity`); nothing on the device learns it yet.

/// `measured / rated * 100`.  Returns 0 for a non-positive rating.
pub fn state_of_health(measured_capacity_ah: f32, rated_capacity_ah: f32) -> f32 {
    if !(rated_capacity_ah > 0.0) {
        return 0.0;
    }
    measured_capacity_ah / rated_capacity_ah * 100.0
}
