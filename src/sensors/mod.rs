//! Sensor subsystem: analog front-end, unit converters and the
//! aggregating [`SensorHub`].
//!
//! ```text
//!   AdcSource ──▶ AnalogFrontEnd ──▶ voltage::counts_to_volts ──▶ V
//!                      │         └─▶ CurrentConverter::amps ──▶ I  (deadbanded)
//!                      └───────────▶ temperature::counts_to_celsius ──▶ Option<°C>
//! ```
//!
//! The hub measures the current-sensor zero offset in its constructor,
//! exactly once, before any current conversion is possible.

pub mod current;
pub mod front_end;
pub mod temperature;
pub mod voltage;

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::SensorPort;
use crate::config::SystemConfig;
use current::{CalibrationOffset, CurrentConverter};
use front_end::{AdcSource, AnalogChannel, AnalogFrontEnd};

/// Sampling and scaling parameters lifted from [`SystemConfig`].
#[derive(Debug, Clone, Copy)]
struct Scaling {
    routine_samples: u16,
    temperature_samples: u16,
    volts_per_count: f32,
    divider_ratio: f32,
    adc_reference_v: f32,
    adc_resolution: f32,
}

impl Scaling {
    fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            routine_samples: cfg.routine_samples,
            temperature_samples: cfg.temperature_samples,
            volts_per_count: cfg.volts_per_count(),
            divider_ratio: cfg.divider_ratio(),
            adc_reference_v: cfg.adc_reference_v,
            adc_resolution: cfg.adc_resolution,
        }
    }
}

/// Owns the front-end and the calibrated converters.
pub struct SensorHub<A, D> {
    front_end: AnalogFrontEnd<A, D>,
    current: CurrentConverter,
    scaling: Scaling,
}

impl<A: AdcSource, D: DelayNs> SensorHub<A, D> {
    /// Build the hub and run the one-time zero-current calibration.
    ///
    /// Blocks for `calibration_samples × sample_delay_us`.
    pub fn new(adc: A, delay: D, cfg: &SystemConfig) -> Self {
        let mut front_end = AnalogFrontEnd::new(adc, delay, cfg.sample_delay_us);
        let offset = CalibrationOffset::measure(&mut front_end, cfg.calibration_samples);
        debug!(
            "Current sensor zero offset: {:.1} counts ({} samples)",
            offset.zero_current_adc_average, cfg.calibration_samples
        );
        Self {
            front_end,
            current: CurrentConverter::new(offset, cfg),
            scaling: Scaling::from_config(cfg),
        }
    }

    pub fn calibration(&self) -> CalibrationOffset {
        self.current.offset()
    }

    /// Pick up new scaling after a config reload.  Calibration is kept.
    pub fn apply_config(&mut self, cfg: &SystemConfig) {
        self.front_end.set_sample_delay_us(cfg.sample_delay_us);
        self.current.rescale(cfg);
        self.scaling = Scaling::from_config(cfg);
    }

    pub fn front_end_mut(&mut self) -> &mut AnalogFrontEnd<A, D> {
        &mut self.front_end
    }
}

impl<A: AdcSource, D: DelayNs> SensorPort for SensorHub<A, D> {
    fn read_voltage(&mut self) -> f32 {
        let s = self.scaling;
        let counts = self.front_end.read_channel(AnalogChannel::Voltage, s.routine_samples);
        voltage::counts_to_volts(counts, s.volts_per_count, s.divider_ratio)
    }

    fn read_current(&mut self) -> f32 {
        let counts = self
            .front_end
            .read_channel(AnalogChannel::Current, self.scaling.routine_samples);
        self.current.amps(counts)
    }

    fn read_temperature(&mut self) -> Option<f32> {
        let s = self.scaling;
        let counts = self
            .front_end
            .read_channel(AnalogChannel::Temperature, s.temperature_samples);
        match temperature::counts_to_celsius(counts, s.adc_reference_v, s.adc_resolution) {
            Ok(c) => Some(c),
            Err(e) => {
                debug!("Temperature read invalid ({:.0} counts): {}", counts, e);
                None
            }
        }
    }
}
