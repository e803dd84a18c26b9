//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, event sinks, storage, telemetry
//! uplink) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware or the network directly.

use crate::config::SystemConfig;
use crate::error::{ActuatorError, CommsError};

use super::events::TelemetryRecord;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain physical readings.
///
/// Every call performs a fresh averaged burst; nothing is cached.
pub trait SensorPort {
    /// Pack voltage in volts.
    fn read_voltage(&mut self) -> f32;

    /// Signed pack current in amps (positive = charging), deadband applied.
    fn read_current(&mut self) -> f32;

    /// Pack temperature in °C, or `None` when the probe reading is invalid.
    fn read_temperature(&mut self) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Set fan PWM duty (0 – 255).  0 stops the fan.  On error the
    /// previous duty is still in effect.
    fn set_fan_duty(&mut self, duty: u8) -> Result<(), ActuatorError>;

    /// Drive the charge relay pin to the given physical level.
    fn set_relay_signal(&mut self, high: bool);

    /// Read back the physical level currently on the relay pin.
    fn relay_signal(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, test
/// recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry port (driven adapter: domain → remote collector)
// ───────────────────────────────────────────────────────────────

/// Outbound push of one telemetry record.
///
/// A failed push is reported, never retried by the implementation.
pub trait TelemetryPort {
    fn push(&mut self, record: &TelemetryRecord) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the service)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the [`Scheduler`](crate::scheduler::Scheduler)
/// invokes when a cadence comes due.  The main loop implements it by
/// forwarding to the matching `AppService` tick.
pub trait SchedulerDelegate {
    fn on_cadence(&mut self, cadence: Cadence, now_ms: u64);
}

/// The independent periodic jobs of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Temperature, alert, fan and charging evaluation.
    Slow,
    /// Relay physical/intended comparison.
    Reconcile,
    /// Remote telemetry push.
    Telemetry,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("storage I/O"),
        }
    }
}
