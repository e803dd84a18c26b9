//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! tagged line to the ESP-IDF logger (UART / USB-CDC in production).
//! This is the serial diagnostics surface of the device.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

use super::labels::{alert_label, battery_state_label};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | V={:.2}V I={:.2}A T={} | SoC={:.1}% SoH={:.1}% | \
                     Ah={:.4} | alert={} | fan={}({}) | charging={} | {}",
                    t.voltage_v,
                    t.current_a,
                    temperature_text(t.temperature_c),
                    t.soc_pct,
                    t.soh_pct,
                    t.amp_hours,
                    alert_label(t.alert),
                    if t.fan_on { "ON" } else { "OFF" },
                    t.fan_duty,
                    if t.charging_enabled { "ENABLED" } else { "DISABLED" },
                    battery_state_label(t.battery_state),
                );
            }
            AppEvent::AlertChanged { from, to } => {
                info!("ALERT | {} -> {}", alert_label(*from), alert_label(*to));
            }
            AppEvent::FanChanged { is_on, duty, band } => {
                info!("FAN | {} duty={} band={:?}", if *is_on { "ON" } else { "OFF" }, duty, band);
            }
            AppEvent::FanWriteFailed { duty, error } => {
                warn!("FAN | duty {} not applied: {}, retrying", duty, error);
            }
            AppEvent::ChargingChanged(tr) => {
                info!(
                    "CHARGE | {} cause={:?}",
                    if tr.enabled { "ENABLED" } else { "DISABLED" },
                    tr.cause
                );
            }
            AppEvent::DirectionChanged { is_charging } => {
                info!("CHARGE | direction {}", if *is_charging { "charging" } else { "not charging" });
            }
            AppEvent::RelayCorrected(c) => {
                warn!(
                    "RELAY | pin read {} expected {}, re-asserted",
                    u8::from(c.observed),
                    u8::from(c.expected)
                );
            }
            AppEvent::TemperatureInvalid => {
                warn!("ALERT | temperature probe invalid, fan fail-safe and charging blocked");
            }
            AppEvent::TelemetryFailed(e) => {
                warn!("TELEM | push failed: {} (dropped)", e);
            }
            AppEvent::Calibrated { zero_offset_counts } => {
                info!("CAL | current zero offset {:.1} counts", zero_offset_counts);
            }
            AppEvent::Started { charging_enabled } => {
                info!(
                    "START | charging {}",
                    if *charging_enabled { "ENABLED" } else { "DISABLED" }
                );
            }
        }
    }
}

/// `"25.3°C"`, or `"invalid"` when the probe read failed.
fn temperature_text(celsius: Option<f32>) -> String {
    celsius.map_or_else(|| "invalid".to_owned(), |c| format!("{c:.1}\u{00b0}C"))
}
