//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the [`ControlContext`] and runs the controllers on
//! the cadences the main loop drives.  All I/O flows through port traits
//! injected at call sites, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          AppService           │
//! ActuatorPort ◀──│ estimators · fan · charging   │ ──▶ TelemetryPort
//!                 │ alert · reconcile             │
//!                 └──────────────────────────────┘
//! ```
//!
//! | Entry point          | Cadence          | Work                                   |
//! |----------------------|------------------|----------------------------------------|
//! | [`fast_tick`]        | every iteration  | V/I read, direction, coulomb counting  |
//! | [`slow_tick`]        | 2 s              | temperature, alert, fan, charging      |
//! | [`reconcile_tick`]   | 5 s              | relay readback and correction          |
//! | [`push_telemetry`]   | 30 s             | remote push, failure logged + dropped  |
//!
//! [`fast_tick`]: AppService::fast_tick
//! [`slow_tick`]: AppService::slow_tick
//! [`reconcile_tick`]: AppService::reconcile_tick
//! [`push_telemetry`]: AppService::push_telemetry

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::control::alert::{self, AlertLevel};
use crate::control::charging::ChargingState;
use crate::control::context::{BatteryReading, BatteryState, ControlContext};
use crate::control::fan::{self, FanState};
use crate::control::reconcile::{self, RelayCorrection};
use crate::error::{CommsError, Error};
use crate::estimators::{soc, soh};

use super::commands::{AppCommand, CommandReply};
use super::events::{AppEvent, TelemetryRecord};
use super::ports::{ActuatorPort, ConfigPort, EventSink, SensorPort, TelemetryPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    ctx: ControlContext,
    /// Latched while the probe reads invalid so the warning is emitted once.
    temperature_fault: bool,
    config_dirty: bool,
    /// Set by `UpdateConfig` until the loop collects the new settings.
    reload_pending: bool,
    telemetry_failures: u32,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            ctx: ControlContext::new(config),
            temperature_fault: false,
            config_dirty: false,
            reload_pending: false,
            telemetry_failures: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive actuators to their boot state.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        if let Err(error) = hw.set_fan_duty(0) {
            sink.emit(&AppEvent::FanWriteFailed { duty: 0, error });
        }
        hw.set_relay_signal(self.ctx.charging.relay_signal());
        sink.emit(&AppEvent::Started {
            charging_enabled: self.ctx.charging.enabled,
        });
        info!(
            "AppService started (charging {})",
            if self.ctx.charging.enabled { "enabled" } else { "disabled" }
        );
    }

    // ── Cadenced work ─────────────────────────────────────────

    /// Fast loop: refresh voltage and current, update charge direction and
    /// integrate energy.
    pub fn fast_tick(&mut self, now_ms: u64, hw: &mut impl SensorPort, sink: &mut impl EventSink) {
        self.ctx.fast_ticks += 1;
        let voltage_v = hw.read_voltage();
        let current_a = hw.read_current();
        self.ctx.reading.voltage_v = voltage_v;
        self.ctx.reading.current_a = current_a;

        let cfg = &self.ctx.config;
        if self
            .ctx
            .direction
            .update(current_a, cfg.charge_threshold_a, cfg.discharge_threshold_a)
        {
            sink.emit(&AppEvent::DirectionChanged {
                is_charging: self.ctx.direction.is_charging,
            });
        }
        self.ctx.energy.update(current_a, now_ms);
    }

    /// Slow tick: temperature, alert classification, fan and charging control.
    pub fn slow_tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        self.ctx.slow_ticks += 1;

        // 1. Temperature
        let temperature = hw.read_temperature();
        self.ctx.reading.temperature_c = temperature;
        match (temperature.is_none(), self.temperature_fault) {
            (true, false) => {
                self.temperature_fault = true;
                sink.emit(&AppEvent::TemperatureInvalid);
            }
            (false, true) => {
                self.temperature_fault = false;
                info!("Temperature probe recovered");
            }
            _ => {}
        }

        let reading = self.ctx.reading;
        let cfg = &self.ctx.config;

        // 2. Alert
        let level = alert::classify(&reading, cfg);
        if level != self.ctx.alert {
            sink.emit(&AppEvent::AlertChanged {
                from: self.ctx.alert,
                to: level,
            });
            self.ctx.alert = level;
        }

        // 3. Fan.  A rejected write leaves the state at what the fan is
        // really doing, so the next tick sees the same change and retries.
        let prev_fan = self.ctx.fan;
        let band = fan::evaluate(&mut self.ctx.fan, reading.temperature_c, cfg, now_ms);
        if self.ctx.fan.duty != prev_fan.duty {
            let duty = self.ctx.fan.duty;
            match hw.set_fan_duty(duty) {
                Ok(()) => debug!("Fan duty {} -> {} ({:?})", prev_fan.duty, duty, band),
                Err(error) => {
                    self.ctx.fan = prev_fan;
                    sink.emit(&AppEvent::FanWriteFailed { duty, error });
                }
            }
        }
        if self.ctx.fan.is_on != prev_fan.is_on {
            sink.emit(&AppEvent::FanChanged {
                is_on: self.ctx.fan.is_on,
                duty: self.ctx.fan.duty,
                band,
            });
        }

        // 4. Charging
        let is_charging = self.ctx.direction.is_charging;
        if let Some(transition) = self.ctx.charging.evaluate(&reading, is_charging, cfg) {
            hw.set_relay_signal(self.ctx.charging.relay_signal());
            sink.emit(&AppEvent::ChargingChanged(transition));
        }
    }

    /// Reconciliation: re-assert the relay pin if it drifted.
    pub fn reconcile_tick(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) -> Option<RelayCorrection> {
        let correction = reconcile::reconcile_relay(&self.ctx.charging, hw)?;
        sink.emit(&AppEvent::RelayCorrected(correction));
        Some(correction)
    }

    /// Build a record from current state and hand it to the uplink.
    ///
    /// A failure is reported through the sink and returned; nothing is
    /// buffered or retried.
    pub fn push_telemetry(
        &mut self,
        uplink: &mut impl TelemetryPort,
        sink: &mut impl EventSink,
    ) -> Result<(), CommsError> {
        let record = self.build_telemetry();
        sink.emit(&AppEvent::Telemetry(record));
        match uplink.push(&record) {
            Ok(()) => {
                self.telemetry_failures = 0;
                Ok(())
            }
            Err(e) => {
                self.telemetry_failures = self.telemetry_failures.saturating_add(1);
                sink.emit(&AppEvent::TelemetryFailed(e));
                Err(e)
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command from the HTTP endpoint or a test harness.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<CommandReply, Error> {
        match cmd {
            AppCommand::SetCharging(desired) => {
                let transition = self.ctx.charging.apply_manual(desired);
                hw.set_relay_signal(self.ctx.charging.relay_signal());
                sink.emit(&AppEvent::ChargingChanged(transition));
                Ok(CommandReply::Charging(transition.enabled))
            }
            AppCommand::SetMeasuredCapacity(ah) => {
                if !(ah.is_finite() && ah >= 0.0) {
                    return Err(Error::Config("measured capacity must be finite and >= 0"));
                }
                self.ctx.config.measured_capacity_ah = ah;
                self.config_dirty = true;
                info!("Measured capacity set to {:.2} Ah", ah);
                Ok(CommandReply::Applied)
            }
            AppCommand::UpdateConfig(new_config) => {
                if let Err(e) = new_config.validate() {
                    warn!("Rejected config update: {}", e);
                    return Err(e.into());
                }
                self.ctx.config = new_config;
                self.config_dirty = true;
                self.reload_pending = true;
                info!("Configuration updated at runtime");
                Ok(CommandReply::Applied)
            }
        }
    }

    /// Config installed by `UpdateConfig` since the last call, for the
    /// parts outside the service that cache settings (sensor scaling,
    /// scheduler intervals, telemetry endpoint).  Controllers read the
    /// new values on their next tick without this.
    pub fn take_config_reload(&mut self) -> Option<&SystemConfig> {
        if core::mem::take(&mut self.reload_pending) {
            Some(&self.ctx.config)
        } else {
            None
        }
    }

    /// Persist the config if a command changed it.  Returns `true` if saved.
    pub fn persist_config_if_dirty(&mut self, storage: &mut impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        match storage.save(&self.ctx.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config saved to NVS");
                true
            }
            Err(e) => {
                warn!("Config save failed: {}", e);
                false
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Fresh on-demand read for the live data endpoint.
    ///
    /// Reads every sensor now and derives the estimates from that reading
    /// without mutating controller or accumulator state.
    pub fn live_status(&self, hw: &mut impl SensorPort) -> TelemetryRecord {
        let reading = BatteryReading {
            voltage_v: hw.read_voltage(),
            current_a: hw.read_current(),
            temperature_c: hw.read_temperature(),
        };
        self.record_for(&reading, alert::classify(&reading, &self.ctx.config))
    }

    /// Snapshot of the last cadenced reading and controller outputs.
    pub fn build_telemetry(&self) -> TelemetryRecord {
        self.record_for(&self.ctx.reading, self.ctx.alert)
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    pub fn reading(&self) -> BatteryReading {
        self.ctx.reading
    }

    pub fn alert(&self) -> AlertLevel {
        self.ctx.alert
    }

    pub fn fan(&self) -> FanState {
        self.ctx.fan
    }

    pub fn charging(&self) -> ChargingState {
        self.ctx.charging
    }

    pub fn is_charging(&self) -> bool {
        self.ctx.direction.is_charging
    }

    pub fn battery_state(&self) -> BatteryState {
        self.ctx.battery_state()
    }

    pub fn amp_hours(&self) -> f64 {
        self.ctx.energy.amp_hours()
    }

    pub fn state_of_charge(&self) -> f32 {
        let r = &self.ctx.reading;
        soc::state_of_charge(r.voltage_v, r.current_a, r.temperature_c, &self.ctx.config)
    }

    pub fn state_of_health(&self) -> f32 {
        soh::state_of_health(self.ctx.config.measured_capacity_ah, self.ctx.config.rated_capacity_ah)
    }

    /// Milliseconds the fan has been running continuously (0 when off).
    pub fn fan_run_time_ms(&self, now_ms: u64) -> u64 {
        self.ctx.fan.run_time_ms(now_ms)
    }

    pub fn fast_tick_count(&self) -> u64 {
        self.ctx.fast_ticks
    }

    pub fn slow_tick_count(&self) -> u64 {
        self.ctx.slow_ticks
    }

    /// Consecutive failed telemetry pushes.
    pub fn telemetry_failures(&self) -> u32 {
        self.telemetry_failures
    }

    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }

    // ── Internal ──────────────────────────────────────────────

    fn record_for(&self, reading: &BatteryReading, alert: AlertLevel) -> TelemetryRecord {
        let cfg = &self.ctx.config;
        let is_charging = self.ctx.direction.is_charging;
        TelemetryRecord {
            voltage_v: reading.voltage_v,
            current_a: reading.current_a,
            temperature_c: reading.temperature_c,
            soc_pct: soc::state_of_charge(reading.voltage_v, reading.current_a, reading.temperature_c, cfg),
            soh_pct: soh::state_of_health(cfg.measured_capacity_ah, cfg.rated_capacity_ah),
            alert,
            amp_hours: self.ctx.energy.amp_hours(),
            fan_on: self.ctx.fan.is_on,
            fan_duty: self.ctx.fan.duty,
            charging_enabled: self.ctx.charging.enabled,
            battery_state: BatteryState::classify(is_charging, reading.current_a),
        }
    }
}
