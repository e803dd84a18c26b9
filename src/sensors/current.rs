//! Hall-effect current transducer.
//!
//! `I = (counts - zero_offset) * (Vref / resolution) / sensitivity`, then
//! a deadband forces |I| below the threshold to exactly zero so sensor
//! noise alone cannot flip the charge direction.
//!
//! The zero offset is measured once at startup while no current is
//! assumed to flow.  If that assumption is violated the offset error
//! persists for the process lifetime; nothing corrects it at runtime.
//! A [`CurrentConverter`] cannot be built without a [`CalibrationOffset`],
//! so no conversion can happen before calibration.

use embedded_hal::delay::DelayNs;

use crate::config::SystemConfig;

use super::front_end::{AdcSource, AnalogChannel, AnalogFrontEnd};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOffset {
    pub zero_current_adc_average: f32,
}

impl CalibrationOffset {
    /// Average `samples` reads of the current channel.
    pub fn measure<A: AdcSource, D: DelayNs>(fe: &mut AnalogFrontEnd<A, D>, samples: u16) -> Self {
        Self {
            zero_current_adc_average: fe.read_channel(AnalogChannel::Current, samples),
        }
    }
}

/// Force |value| < `deadband` to zero.
pub fn apply_deadband(value: f32, deadband: f32) -> f32 {
    if value.abs() < deadband { 0.0 } else { value }
}

#[derive(Debug, Clone, Copy)]
pub struct CurrentConverter {
    offset: CalibrationOffset,
    volts_per_count: f32,
    sensitivity_v_per_a: f32,
    deadband_a: f32,
}

impl CurrentConverter {
    pub fn new(offset: CalibrationOffset, cfg: &SystemConfig) -> Self {
        Self {
            offset,
            volts_per_count: cfg.volts_per_count(),
            sensitivity_v_per_a: cfg.current_sensitivity_v_per_a,
            deadband_a: cfg.current_deadband_a,
        }
    }

    /// Re-read scaling from a new config; the offset is kept.
    pub fn rescale(&mut self, cfg: &SystemConfig) {
        *self = Self::new(self.offset, cfg);
    }

    pub fn amps(&self, avg_counts: f32) -> f32 {
        let raw = (avg_counts - self.offset.zero_current_adc_average) * self.volts_per_count / self.sensitivity_v_per_a;
        apply_deadband(raw, self.deadband_a)
    }

    pub fn offset(&self) -> CalibrationOffset {
        self.offset
    }
}
