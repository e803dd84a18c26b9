//! Full hardware path on the host: scripted ADC counts through the
//! `SensorHub` and `HardwareAdapter` into the service, out to the
//! simulated LEDC and relay GPIO.
//!
//! The simulated peripherals are process-wide, so everything touching
//! them lives in this one test.

use embedded_hal::delay::DelayNs;

use super::mock_hw::RecordingSink;

use battmon::adapters::hardware::HardwareAdapter;
use battmon::app::commands::AppCommand;
use battmon::app::ports::ActuatorPort;
use battmon::app::service::AppService;
use battmon::config::SystemConfig;
use battmon::drivers::fan::FanDriver;
use battmon::drivers::hw_init;
use battmon::drivers::relay::RelayDriver;
use battmon::pins;
use battmon::sensors::SensorHub;
use battmon::sensors::front_end::{AdcSource, AnalogChannel};
use battmon::sensors::temperature::celsius_to_counts;

struct ScriptedAdc {
    voltage: u16,
    current: u16,
    temperature: u16,
}

impl AdcSource for ScriptedAdc {
    fn read_raw(&mut self, channel: AnalogChannel) -> u16 {
        match channel {
            AnalogChannel::Voltage => self.voltage,
            AnalogChannel::Current => self.current,
            AnalogChannel::Temperature => self.temperature,
        }
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

fn counts_for_pin_volts(v: f32, cfg: &SystemConfig) -> u16 {
    (v / cfg.volts_per_count()).round() as u16
}

#[test]
fn adc_counts_to_fan_and_relay() {
    let cfg = SystemConfig::default();
    let zero_counts = 1900;
    let adc = ScriptedAdc {
        // 12.0 V pack behind the 5:1 divider.
        voltage: counts_for_pin_volts(12.0 / cfg.divider_ratio(), &cfg),
        current: zero_counts,
        temperature: celsius_to_counts(25.0, cfg.adc_reference_v, cfg.adc_resolution).round() as u16,
    };
    let hub = SensorHub::new(adc, NoDelay, &cfg);
    assert_eq!(hub.calibration().zero_current_adc_average, f32::from(zero_counts));

    let mut hw = HardwareAdapter::new(hub, FanDriver::new(), RelayDriver::new(pins::CHARGE_RELAY_GPIO));
    let mut sink = RecordingSink::new();
    let mut app = AppService::new(cfg.clone());
    app.start(&mut hw, &mut sink);
    assert!(!hw.relay_signal());

    app.fast_tick(0, &mut hw, &mut sink);
    app.slow_tick(0, &mut hw, &mut sink);
    let r = app.reading();
    assert!((r.voltage_v - 12.0).abs() < 0.01, "{}", r.voltage_v);
    assert_eq!(r.current_a, 0.0, "zero offset lands inside the deadband");
    assert!((r.temperature_c.unwrap() - 25.0).abs() < 0.5);
    assert_eq!(hw_init::sim_fan_duty(), 0);

    // 2 A in (0.2 V above the zero point) and an overheating pack.
    {
        let adc = hw.sensors_mut().front_end_mut().adc_mut();
        adc.current = zero_counts + counts_for_pin_volts(0.2, &cfg);
        adc.temperature = celsius_to_counts(55.0, cfg.adc_reference_v, cfg.adc_resolution).round() as u16;
    }
    app.fast_tick(10, &mut hw, &mut sink);
    app.slow_tick(2_000, &mut hw, &mut sink);

    assert!((app.reading().current_a - 2.0).abs() < 0.02);
    assert!(app.is_charging());
    assert_eq!(hw_init::sim_fan_duty(), cfg.fan_max_duty);
    assert!(!app.charging().enabled);
    assert!(hw_init::gpio_read(pins::CHARGE_RELAY_GPIO), "HIGH disables charging");

    // A glitch on the pad is caught by reconciliation.
    hw_init::gpio_write(pins::CHARGE_RELAY_GPIO, false);
    assert!(app.reconcile_tick(&mut hw, &mut sink).is_some());
    assert!(hw.relay_signal());

    // Probe unplugged: divider floats to the rail.
    hw.sensors_mut().front_end_mut().adc_mut().temperature = 4095;
    app.slow_tick(4_000, &mut hw, &mut sink);
    assert_eq!(app.reading().temperature_c, None);
    assert_eq!(hw_init::sim_fan_duty(), cfg.fan_failsafe_duty);

    // A reloaded divider changes the voltage scaling without recalibrating.
    let mut reloaded = cfg.clone();
    reloaded.divider_r1_ohm = 22_500.0;
    app.handle_command(AppCommand::UpdateConfig(reloaded), &mut hw, &mut sink)
        .unwrap();
    if let Some(new_cfg) = app.take_config_reload() {
        hw.apply_config(new_cfg);
    }
    app.fast_tick(4_010, &mut hw, &mut sink);
    assert!((app.reading().voltage_v - 9.6).abs() < 0.01, "{}", app.reading().voltage_v);
    assert_eq!(hw.sensors_mut().calibration().zero_current_adc_average, f32::from(zero_counts));
}
