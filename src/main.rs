//! BattMon Firmware: Main Entry Point
//!
//! Hexagonal architecture driven by one cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   SystemClock     │
//! │  (Sensor+Actuator) (EventSink)    (ConfigPort)                 │
//! │  WifiAdapter       TelemetryClient              HttpServer     │
//! │  (Connectivity)    (TelemetryPort)              (dashboard)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Estimators · Fan · Charging · Alert · Reconcile       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven: slow · reconcile · telemetry)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use battmon::adapters::hardware::HardwareAdapter;
use battmon::adapters::http_server::HttpServer;
use battmon::adapters::log_sink::LogEventSink;
use battmon::adapters::nvs::NvsAdapter;
use battmon::adapters::telemetry_client::TelemetryClient;
use battmon::adapters::time::SystemClock;
use battmon::adapters::wifi::{ConnectivityPort, WifiAdapter};
use battmon::app::events::AppEvent;
use battmon::app::ports::{ActuatorPort, Cadence, EventSink, SchedulerDelegate, SensorPort, TelemetryPort};
use battmon::app::service::AppService;
use battmon::config::SystemConfig;
use battmon::drivers::delay::sample_delay;
use battmon::drivers::fan::FanDriver;
use battmon::drivers::relay::RelayDriver;
use battmon::drivers::watchdog::Watchdog;
use battmon::drivers::hw_init;
use battmon::pins;
use battmon::scheduler::Scheduler;
use battmon::sensors::SensorHub;
use battmon::sensors::front_end::Adc1;

// ── Scheduler delegate ────────────────────────────────────────
//
// Bridges the scheduler (which only knows cadences) to the service
// and the adapters each cadence needs.  Built fresh every iteration
// so it can borrow everything mutably for the duration of one poll.

struct LoopDelegate<'a, H, T> {
    app: &'a mut AppService,
    hw: &'a mut H,
    sink: &'a mut LogEventSink,
    uplink: &'a mut T,
    nvs: Option<&'a mut NvsAdapter>,
}

impl<H, T> SchedulerDelegate for LoopDelegate<'_, H, T>
where
    H: SensorPort + ActuatorPort,
    T: TelemetryPort,
{
    fn on_cadence(&mut self, cadence: Cadence, now_ms: u64) {
        match cadence {
            Cadence::Slow => self.app.slow_tick(now_ms, self.hw, self.sink),
            Cadence::Reconcile => {
                self.app.reconcile_tick(self.hw, self.sink);
                if let Some(nvs) = self.nvs.as_deref_mut() {
                    self.app.persist_config_if_dirty(nvs);
                }
            }
            Cadence::Telemetry => {
                // Failures are already reported through the sink; drop them.
                let _ = self.app.push_telemetry(self.uplink, self.sink);
            }
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  BattMon v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without ADC and relay control the monitor cannot run safely.
        error!("HAL init failed: {}, charging disabled, halting", e);
        hw_init::force_charging_disabled();
        #[allow(clippy::empty_loop)]
        loop {}
    }
    let clock = SystemClock::new();

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            None
        }
    };
    let config = nvs
        .as_ref()
        .map_or_else(SystemConfig::default, |n| SystemConfig::load_or_default(n));

    // ── 4. Sensors (blocks for the zero-current calibration) ──
    let mut log_sink = LogEventSink::new();
    let sensor_hub = SensorHub::new(Adc1, sample_delay(), &config);
    log_sink.emit(&AppEvent::Calibrated {
        zero_offset_counts: sensor_hub.calibration().zero_current_adc_average,
    });

    let mut hw = HardwareAdapter::new(
        sensor_hub,
        FanDriver::new(),
        RelayDriver::new(pins::CHARGE_RELAY_GPIO),
    );

    // ── 5. Application service ────────────────────────────────
    let mut app = AppService::new(config.clone());
    app.start(&mut hw, &mut log_sink);

    // ── 6. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let mut wifi = WifiAdapter::new();
    match EspWifi::new(peripherals.modem, sysloop.clone(), None)
        .and_then(|driver| BlockingWifi::wrap(driver, sysloop))
    {
        Ok(driver) => wifi.attach(driver),
        Err(e) => error!("WiFi driver init failed: {:?}", e),
    }
    if let Err(e) = wifi.set_credentials(&config.wifi_ssid, &config.wifi_password) {
        warn!("WiFi credentials rejected: {}", e);
    } else if let Err(e) = wifi.connect() {
        // Not fatal: monitoring and control run offline, telemetry
        // retries the link on its own cadence.
        warn!("WiFi connect failed: {}", e);
    }

    let mut uplink = TelemetryClient::new(wifi, &config.telemetry_endpoint);
    let mut http = match HttpServer::bind(config.http_port) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("HTTP server unavailable: {}", e);
            None
        }
    };

    // Subscribed only now: calibration and the first WiFi connect may
    // legitimately block longer than the stall timeout.
    let watchdog = Watchdog::default();
    let mut sched = Scheduler::new(&config, clock.uptime_ms());
    let mut loop_yield = std::time::Duration::from_millis(u64::from(config.loop_yield_ms));

    info!("System ready. Entering control loop.");

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        // Boundary requests first, so a page load never waits a full tick.
        if let Some(server) = http.as_mut() {
            server.poll(&mut app, &mut hw, &mut log_sink);
        }

        let now_ms = clock.uptime_ms();
        app.fast_tick(now_ms, &mut hw, &mut log_sink);

        let mut delegate = LoopDelegate {
            app: &mut app,
            hw: &mut hw,
            sink: &mut log_sink,
            uplink: &mut uplink,
            nvs: nvs.as_mut(),
        };
        sched.poll(now_ms, &mut delegate);

        // Settings cached outside the service follow a runtime config update.
        if let Some(cfg) = app.take_config_reload() {
            hw.apply_config(cfg);
            sched.apply_config(cfg, now_ms);
            uplink.set_endpoint(&cfg.telemetry_endpoint);
            loop_yield = std::time::Duration::from_millis(u64::from(cfg.loop_yield_ms));
        }

        watchdog.feed();
        std::thread::sleep(loop_yield);
    }
}
