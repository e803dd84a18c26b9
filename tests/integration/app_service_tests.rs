//! Integration tests for the sensors → AppService → actuators pipeline.
//!
//! These run on the host (x86_64) and drive the service tick by tick
//! against the recording mocks, asserting on the actuator history and
//! the emitted events.

use super::mock_hw::{ActuatorCall, MemConfigStore, MockHardware, MockUplink, RecordingSink};

use battmon::app::commands::{AppCommand, CommandReply};
use battmon::app::events::AppEvent;
use battmon::app::service::AppService;
use battmon::config::SystemConfig;
use battmon::control::alert::AlertLevel;
use battmon::control::charging::{ChargingCause, ChargingMode};
use battmon::control::context::BatteryState;
use battmon::error::CommsError;

fn make_app(hw: &mut MockHardware) -> (AppService, RecordingSink) {
    let mut app = AppService::new(SystemConfig::default());
    let mut sink = RecordingSink::new();
    app.start(hw, &mut sink);
    (app, sink)
}

fn charging_causes(sink: &RecordingSink) -> Vec<(bool, ChargingCause)> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ChargingChanged(t) => Some((t.enabled, t.cause)),
            _ => None,
        })
        .collect()
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn start_drives_boot_state() {
    let mut hw = MockHardware::new();
    let (app, sink) = make_app(&mut hw);

    // Charging enabled at boot: relay LOW, fan stopped.
    assert_eq!(hw.calls, vec![ActuatorCall::FanDuty(0), ActuatorCall::Relay(false)]);
    assert!(app.charging().enabled);
    assert_eq!(sink.events, vec![AppEvent::Started { charging_enabled: true }]);
}

#[test]
fn boot_disabled_asserts_relay() {
    let mut cfg = SystemConfig::default();
    cfg.charging_enabled_at_boot = false;
    let mut app = AppService::new(cfg);
    let mut hw = MockHardware::new();
    app.start(&mut hw, &mut RecordingSink::new());
    assert_eq!(hw.relay_writes(), vec![true]);
}

// ── Temperature-driven control ────────────────────────────────

#[test]
fn over_temperature_cools_and_cuts_charging() {
    let mut hw = MockHardware::with_reading(12.0, 1.0, Some(55.0));
    let (mut app, mut sink) = make_app(&mut hw);

    app.fast_tick(0, &mut hw, &mut sink);
    app.slow_tick(0, &mut hw, &mut sink);

    assert_eq!(hw.last_fan_duty(), Some(255));
    assert!(!app.charging().enabled);
    assert_eq!(hw.relay_writes().last(), Some(&true));
    assert_eq!(app.alert(), AlertLevel::Critical);
    assert_eq!(charging_causes(&sink), vec![(false, ChargingCause::OverTemperature)]);
}

#[test]
fn invalid_probe_is_reported_once_and_fails_safe() {
    let mut hw = MockHardware::with_reading(12.0, 0.0, None);
    let (mut app, mut sink) = make_app(&mut hw);

    app.slow_tick(0, &mut hw, &mut sink);
    app.slow_tick(2_000, &mut hw, &mut sink);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::TemperatureInvalid)), 1);
    assert_eq!(hw.last_fan_duty(), Some(app.config().fan_failsafe_duty));
    assert_eq!(app.alert(), AlertLevel::Warning);
    assert_eq!(charging_causes(&sink), vec![(false, ChargingCause::TemperatureInvalid)]);

    // Probe back below the off threshold: fan stops, charger returns.
    hw.temperature_c = Some(25.0);
    app.slow_tick(4_000, &mut hw, &mut sink);
    assert!(!app.fan().is_on);
    assert_eq!(hw.last_fan_duty(), Some(0));
    assert_eq!(app.alert(), AlertLevel::Normal);
    assert_eq!(charging_causes(&sink).last(), Some(&(true, ChargingCause::Recovered)));
}

#[test]
fn fan_hysteresis_across_bands() {
    let mut hw = MockHardware::with_reading(12.0, 0.0, Some(30.0));
    let (mut app, mut sink) = make_app(&mut hw);

    // Below warning and off: stays off, no duty write.
    app.slow_tick(0, &mut hw, &mut sink);
    assert!(!app.fan().is_on);
    assert_eq!(hw.last_fan_duty(), Some(0));
    let writes_before = hw.calls.len();

    // Midway through the warning band.
    hw.temperature_c = Some(45.0);
    app.slow_tick(2_000, &mut hw, &mut sink);
    assert_eq!(hw.last_fan_duty(), Some(179));
    assert!(hw.calls.len() > writes_before);

    // Falling into the spin-down band keeps the fan running, slower.
    hw.temperature_c = Some(38.0);
    app.slow_tick(4_000, &mut hw, &mut sink);
    assert!(app.fan().is_on);
    assert_eq!(hw.last_fan_duty(), Some(101));
    assert_eq!(app.fan_run_time_ms(6_000), 4_000);

    // At the off threshold it stops.
    hw.temperature_c = Some(35.0);
    app.slow_tick(6_000, &mut hw, &mut sink);
    assert!(!app.fan().is_on);
    assert_eq!(hw.last_fan_duty(), Some(0));

    // Same spin-down temperature from the off state: stays off.
    hw.temperature_c = Some(38.0);
    app.slow_tick(8_000, &mut hw, &mut sink);
    assert!(!app.fan().is_on);

    let fan_events = sink.count(|e| matches!(e, AppEvent::FanChanged { .. }));
    assert_eq!(fan_events, 2, "one on, one off");
}

#[test]
fn rejected_fan_write_is_retried_next_tick() {
    let mut hw = MockHardware::with_reading(12.0, 0.0, Some(55.0));
    let (mut app, mut sink) = make_app(&mut hw);
    hw.fail_fan_writes = 1;

    app.slow_tick(0, &mut hw, &mut sink);
    assert_eq!(hw.last_fan_duty(), Some(0), "hardware still at the boot duty");
    assert!(!app.fan().is_on, "state follows the hardware, not the request");
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::FanWriteFailed { duty: 255, .. })),
        1
    );
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FanChanged { .. })), 0);

    app.slow_tick(2_000, &mut hw, &mut sink);
    assert_eq!(hw.last_fan_duty(), Some(255));
    assert!(app.fan().is_on);
    assert_eq!(app.build_telemetry().fan_duty, 255);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FanChanged { is_on: true, .. })), 1);
}

// ── Voltage-driven charging ───────────────────────────────────

#[test]
fn full_voltage_disables_until_margin() {
    let mut hw = MockHardware::with_reading(12.6, 0.0, Some(25.0));
    let (mut app, mut sink) = make_app(&mut hw);

    app.fast_tick(0, &mut hw, &mut sink);
    app.slow_tick(0, &mut hw, &mut sink);
    assert!(!app.charging().enabled);

    // Inside the margin: stays off.
    hw.voltage_v = 12.4;
    app.fast_tick(10, &mut hw, &mut sink);
    app.slow_tick(2_000, &mut hw, &mut sink);
    assert!(!app.charging().enabled);

    // Below full - margin: back on.
    hw.voltage_v = 12.2;
    app.fast_tick(20, &mut hw, &mut sink);
    app.slow_tick(4_000, &mut hw, &mut sink);
    assert!(app.charging().enabled);
    assert_eq!(hw.relay_writes(), vec![false, true, false]);
    assert_eq!(
        charging_causes(&sink),
        vec![(false, ChargingCause::FullVoltage), (true, ChargingCause::Recovered)]
    );
}

#[test]
fn over_voltage_while_charging_disables() {
    let mut hw = MockHardware::with_reading(12.5, 2.0, Some(25.0));
    let mut cfg = SystemConfig::default();
    cfg.voltage_high_v = 12.4;
    let mut app = AppService::new(cfg);
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);

    app.fast_tick(0, &mut hw, &mut sink);
    assert!(app.is_charging());
    app.slow_tick(0, &mut hw, &mut sink);
    assert_eq!(charging_causes(&sink), vec![(false, ChargingCause::OverVoltageWhileCharging)]);
}

// ── Manual override ───────────────────────────────────────────

#[test]
fn manual_off_suppresses_auto_reenable() {
    let mut hw = MockHardware::with_reading(11.5, 0.0, Some(25.0));
    let (mut app, mut sink) = make_app(&mut hw);

    let reply = app
        .handle_command(AppCommand::SetCharging(Some(false)), &mut hw, &mut sink)
        .unwrap();
    assert_eq!(reply, CommandReply::Charging(false));
    assert_eq!(hw.relay_writes().last(), Some(&true));
    assert_eq!(app.charging().mode, ChargingMode::ManualOverride);

    app.fast_tick(0, &mut hw, &mut sink);
    app.slow_tick(0, &mut hw, &mut sink);
    assert!(!app.charging().enabled, "auto re-enable must wait for the operator");

    // Toggle back on.
    let reply = app
        .handle_command(AppCommand::SetCharging(None), &mut hw, &mut sink)
        .unwrap();
    assert_eq!(reply, CommandReply::Charging(true));
    assert_eq!(hw.relay_writes().last(), Some(&false));
}

#[test]
fn safety_cutoff_overrides_manual_on() {
    let mut hw = MockHardware::with_reading(11.5, 0.0, Some(25.0));
    let (mut app, mut sink) = make_app(&mut hw);
    app.handle_command(AppCommand::SetCharging(Some(true)), &mut hw, &mut sink)
        .unwrap();

    hw.temperature_c = Some(60.0);
    app.slow_tick(0, &mut hw, &mut sink);
    assert!(!app.charging().enabled);
    assert_eq!(app.charging().mode, ChargingMode::Auto);
}

// ── Reconciliation ────────────────────────────────────────────

#[test]
fn reconcile_reasserts_drifted_relay() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = make_app(&mut hw);

    assert!(app.reconcile_tick(&mut hw, &mut sink).is_none());

    hw.glitch_relay();
    let correction = app.reconcile_tick(&mut hw, &mut sink).unwrap();
    assert!(!correction.expected);
    assert!(correction.observed);
    assert!(!hw.pin_level());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::RelayCorrected(_))), 1);

    assert!(app.reconcile_tick(&mut hw, &mut sink).is_none());
}

// ── Fast loop ─────────────────────────────────────────────────

#[test]
fn fast_ticks_integrate_energy_and_track_direction() {
    let mut hw = MockHardware::with_reading(12.0, 2.0, Some(25.0));
    let (mut app, mut sink) = make_app(&mut hw);

    app.fast_tick(0, &mut hw, &mut sink);
    app.fast_tick(1_800_000, &mut hw, &mut sink);
    app.fast_tick(3_600_000, &mut hw, &mut sink);

    assert!((app.amp_hours() - 2.0).abs() < 1e-9);
    assert!(app.is_charging());
    assert_eq!(app.battery_state(), BatteryState::Charging);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::DirectionChanged { .. })), 1);
    assert_eq!(app.fast_tick_count(), 3);

    // Into the hold band: direction kept.
    hw.current_a = 0.3;
    app.fast_tick(3_600_010, &mut hw, &mut sink);
    assert!(app.is_charging());

    hw.current_a = -1.0;
    app.fast_tick(3_600_020, &mut hw, &mut sink);
    assert!(!app.is_charging());
    assert_eq!(app.battery_state(), BatteryState::Discharging);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_push_success_and_failure() {
    let mut hw = MockHardware::with_reading(12.0, -1.0, Some(25.0));
    let (mut app, mut sink) = make_app(&mut hw);
    app.fast_tick(0, &mut hw, &mut sink);
    app.slow_tick(0, &mut hw, &mut sink);

    let mut uplink = MockUplink::default();
    app.push_telemetry(&mut uplink, &mut sink).unwrap();
    assert_eq!(uplink.pushed.len(), 1);
    assert_eq!(uplink.pushed[0].voltage_v, 12.0);
    assert_eq!(uplink.pushed[0].battery_state, BatteryState::Discharging);

    uplink.fail_with = Some(CommsError::NotConnected);
    let before = app.build_telemetry();
    assert_eq!(app.push_telemetry(&mut uplink, &mut sink), Err(CommsError::NotConnected));
    assert_eq!(app.telemetry_failures(), 1);
    assert_eq!(app.build_telemetry(), before, "a failed push leaves state alone");
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::TelemetryFailed(CommsError::NotConnected))),
        1
    );

    uplink.fail_with = None;
    app.push_telemetry(&mut uplink, &mut sink).unwrap();
    assert_eq!(app.telemetry_failures(), 0);
}

#[test]
fn live_status_reads_fresh_without_mutating() {
    let mut hw = MockHardware::with_reading(12.0, 0.0, Some(25.0));
    let (mut app, mut sink) = make_app(&mut hw);
    app.fast_tick(0, &mut hw, &mut sink);
    app.slow_tick(0, &mut hw, &mut sink);

    hw.voltage_v = 13.0;
    hw.temperature_c = Some(45.0);
    let reads = hw.sensor_reads;
    let live = app.live_status(&mut hw);

    assert_eq!(hw.sensor_reads, reads + 3);
    assert_eq!(live.voltage_v, 13.0);
    assert_eq!(live.alert, AlertLevel::Critical);
    assert_eq!(app.reading().voltage_v, 12.0);
    assert_eq!(app.alert(), AlertLevel::Normal);
    assert!(!app.fan().is_on, "controllers only run on their cadence");
}

// ── Config ────────────────────────────────────────────────────

#[test]
fn config_changes_are_persisted_once() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = make_app(&mut hw);
    let mut store = MemConfigStore::default();

    assert!(!app.persist_config_if_dirty(&mut store));

    app.handle_command(AppCommand::SetMeasuredCapacity(9.0), &mut hw, &mut sink)
        .unwrap();
    assert!(app.persist_config_if_dirty(&mut store));
    assert!(!app.persist_config_if_dirty(&mut store));
    assert_eq!(store.saves, 1);
    assert_eq!(store.saved.as_ref().map(|c| c.measured_capacity_ah), Some(9.0));
}

#[test]
fn failed_save_stays_dirty() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = make_app(&mut hw);
    let mut store = MemConfigStore {
        fail_saves: true,
        ..MemConfigStore::default()
    };

    app.handle_command(AppCommand::SetMeasuredCapacity(9.0), &mut hw, &mut sink)
        .unwrap();
    assert!(!app.persist_config_if_dirty(&mut store));
    assert!(app.is_config_dirty());

    store.fail_saves = false;
    assert!(app.persist_config_if_dirty(&mut store));
}

#[test]
fn invalid_config_update_is_rejected() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = make_app(&mut hw);

    let mut bad = SystemConfig::default();
    bad.temp_off_c = bad.temp_high_c + 1.0;
    assert!(app.handle_command(AppCommand::UpdateConfig(bad), &mut hw, &mut sink).is_err());
    assert!(!app.is_config_dirty());
    assert_eq!(app.config(), &SystemConfig::default());

    let mut good = SystemConfig::default();
    good.temp_high_c = 55.0;
    assert_eq!(
        app.handle_command(AppCommand::UpdateConfig(good), &mut hw, &mut sink),
        Ok(CommandReply::Applied)
    );
    assert_eq!(app.config().temp_high_c, 55.0);
}
