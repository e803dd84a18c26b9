//! Cooling fan driver (LEDC PWM, 25 kHz, 8-bit).
//!
//! A dumb actuator: the fan controller decides the duty, this writes it.
//! Duty 0 stops the fan.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the LEDC channel via hw_init helpers.
//! On host/test: hw_init records the duty in an atomic.

use log::warn;

use crate::drivers::hw_init;
use crate::error::ActuatorError;

#[derive(Debug, Default)]
pub struct FanDriver;

impl FanDriver {
    pub fn new() -> Self {
        Self
    }

    /// Write a new duty.  On failure the channel keeps its previous duty.
    pub fn set_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        if !hw_init::ledc_set(hw_init::LEDC_CH_FAN, duty) {
            warn!("Fan PWM write failed (duty {})", duty);
            return Err(ActuatorError::PwmWriteFailed);
        }
        Ok(())
    }
}
