//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and both actuator drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  On non-espidf targets
//! the underlying drivers use cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::config::SystemConfig;
use crate::drivers::fan::FanDriver;
use crate::drivers::relay::RelayDriver;
use crate::error::ActuatorError;
use crate::sensors::SensorHub;
use crate::sensors::front_end::AdcSource;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<A, D> {
    sensor_hub: SensorHub<A, D>,
    fan: FanDriver,
    relay: RelayDriver,
}

impl<A: AdcSource, D: DelayNs> HardwareAdapter<A, D> {
    pub fn new(sensor_hub: SensorHub<A, D>, fan: FanDriver, relay: RelayDriver) -> Self {
        Self {
            sensor_hub,
            fan,
            relay,
        }
    }

    pub fn sensors_mut(&mut self) -> &mut SensorHub<A, D> {
        &mut self.sensor_hub
    }

    /// Re-derive sensor scaling after a config reload.  The zero-current
    /// calibration is kept.
    pub fn apply_config(&mut self, cfg: &SystemConfig) {
        self.sensor_hub.apply_config(cfg);
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<A: AdcSource, D: DelayNs> SensorPort for HardwareAdapter<A, D> {
    fn read_voltage(&mut self) -> f32 {
        self.sensor_hub.read_voltage()
    }

    fn read_current(&mut self) -> f32 {
        self.sensor_hub.read_current()
    }

    fn read_temperature(&mut self) -> Option<f32> {
        self.sensor_hub.read_temperature()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<A: AdcSource, D: DelayNs> ActuatorPort for HardwareAdapter<A, D> {
    fn set_fan_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.fan.set_duty(duty)
    }

    fn set_relay_signal(&mut self, high: bool) {
        self.relay.set_level(high);
    }

    fn relay_signal(&self) -> bool {
        self.relay.level()
    }
}
