//! The main-loop wiring in miniature: scheduler + delegate + service
//! driven over simulated time.

use super::mock_hw::{MemConfigStore, MockHardware, MockUplink, RecordingSink};

use battmon::app::commands::AppCommand;
use battmon::app::events::AppEvent;
use battmon::app::ports::{Cadence, SchedulerDelegate};
use battmon::app::service::AppService;
use battmon::config::SystemConfig;
use battmon::scheduler::Scheduler;

struct Loop<'a> {
    app: &'a mut AppService,
    hw: &'a mut MockHardware,
    sink: &'a mut RecordingSink,
    uplink: &'a mut MockUplink,
    store: &'a mut MemConfigStore,
}

impl SchedulerDelegate for Loop<'_> {
    fn on_cadence(&mut self, cadence: Cadence, now_ms: u64) {
        match cadence {
            Cadence::Slow => self.app.slow_tick(now_ms, self.hw, self.sink),
            Cadence::Reconcile => {
                self.app.reconcile_tick(self.hw, self.sink);
                self.app.persist_config_if_dirty(self.store);
            }
            Cadence::Telemetry => {
                let _ = self.app.push_telemetry(self.uplink, self.sink);
            }
        }
    }
}

struct Rig {
    app: AppService,
    hw: MockHardware,
    sink: RecordingSink,
    uplink: MockUplink,
    store: MemConfigStore,
    sched: Scheduler,
}

impl Rig {
    fn new(hw: MockHardware) -> Self {
        let cfg = SystemConfig::default();
        let mut hw = hw;
        let mut sink = RecordingSink::new();
        let mut app = AppService::new(cfg.clone());
        app.start(&mut hw, &mut sink);
        Self {
            app,
            hw,
            sink,
            uplink: MockUplink::default(),
            store: MemConfigStore::default(),
            sched: Scheduler::new(&cfg, 0),
        }
    }

    /// Run loop iterations every `step_ms` over `[from, to)`.
    fn run(&mut self, from: u64, to: u64, step_ms: u64) {
        let mut now = from;
        while now < to {
            self.app.fast_tick(now, &mut self.hw, &mut self.sink);
            let mut d = Loop {
                app: &mut self.app,
                hw: &mut self.hw,
                sink: &mut self.sink,
                uplink: &mut self.uplink,
                store: &mut self.store,
            };
            self.sched.poll(now, &mut d);
            if let Some(cfg) = self.app.take_config_reload() {
                self.sched.apply_config(cfg, now);
            }
            now += step_ms;
        }
    }
}

#[test]
fn one_minute_of_cadences() {
    let mut rig = Rig::new(MockHardware::with_reading(12.0, -1.0, Some(25.0)));
    rig.run(0, 60_010, 10);

    assert_eq!(rig.app.fast_tick_count(), 6_001);
    assert_eq!(rig.app.slow_tick_count(), 31);
    assert_eq!(rig.uplink.pushed.len(), 2);
    // 1 A out for 60 s.
    assert!((rig.app.amp_hours() + 60.0 / 3600.0).abs() < 1e-9);
    assert!(rig.uplink.pushed[1].amp_hours < rig.uplink.pushed[0].amp_hours);
}

#[test]
fn relay_glitch_is_repaired_within_one_reconcile_period() {
    let mut rig = Rig::new(MockHardware::new());
    rig.run(0, 1_000, 10);
    rig.hw.glitch_relay();
    rig.run(1_000, 6_000, 10);

    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::RelayCorrected(_))), 1);
    assert!(!rig.hw.pin_level());
}

#[test]
fn dirty_config_is_saved_on_reconcile_cadence() {
    let mut rig = Rig::new(MockHardware::new());
    rig.app
        .handle_command(AppCommand::SetMeasuredCapacity(7.5), &mut rig.hw, &mut rig.sink)
        .unwrap();

    rig.run(0, 4_990, 10);
    assert_eq!(rig.store.saves, 0);
    rig.run(4_990, 5_010, 10);
    assert_eq!(rig.store.saves, 1);
    assert!((rig.app.state_of_health() - 75.0).abs() < 1e-4);
}

#[test]
fn overheating_pack_over_time() {
    let mut rig = Rig::new(MockHardware::with_reading(12.0, 1.0, Some(30.0)));
    rig.run(0, 10_000, 10);
    assert!(!rig.app.fan().is_on);
    assert!(rig.app.charging().enabled);

    rig.hw.temperature_c = Some(52.0);
    rig.run(10_000, 14_000, 10);
    assert_eq!(rig.hw.last_fan_duty(), Some(255));
    assert!(!rig.app.charging().enabled);

    // Cooling into the warning band: fan scales down but charging stays
    // off while current still flows in.
    rig.hw.temperature_c = Some(42.0);
    rig.run(14_000, 18_000, 10);
    assert!(rig.app.fan().is_on);
    assert!(rig.hw.last_fan_duty().is_some_and(|d| d < 255));
    assert!(!rig.app.charging().enabled);

    // Load removed, pack cool: charger comes back.
    rig.hw.temperature_c = Some(30.0);
    rig.hw.current_a = 0.0;
    rig.run(18_000, 22_000, 10);
    assert!(!rig.app.fan().is_on);
    assert!(rig.app.charging().enabled);
}

#[test]
fn config_update_retimes_the_cadences() {
    let mut rig = Rig::new(MockHardware::new());
    rig.run(0, 10_010, 10);
    assert_eq!(rig.app.slow_tick_count(), 6);

    let mut cfg = SystemConfig::default();
    cfg.slow_tick_interval_ms = 500;
    cfg.telemetry_interval_secs = 5;
    rig.app
        .handle_command(AppCommand::UpdateConfig(cfg), &mut rig.hw, &mut rig.sink)
        .unwrap();

    rig.run(10_010, 20_020, 10);
    assert_eq!(rig.sched.interval_ms(Cadence::Slow), 500);
    assert_eq!(rig.sched.interval_ms(Cadence::Telemetry), 5_000);
    // Pending deadlines pulled in: slow from 10 510, telemetry from 15 010.
    assert_eq!(rig.app.slow_tick_count(), 26);
    assert_eq!(rig.uplink.pushed.len(), 2);
}
