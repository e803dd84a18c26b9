//! Error types for the battery monitor firmware.
//!
//! Each subsystem reports its own `Copy` error so failures pass through
//! the service and adapters without allocation.  [`Error`] is what a
//! rejected command returns to its caller.
//!
//! Nothing here is fatal to the control loop: callers log and continue.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Why an [`AppCommand`](crate::app::commands::AppCommand) was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The value or configuration carried by the command is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Thermistor divider reads at the supply rail (probe disconnected).
    OpenCircuit,
    /// Thermistor divider reads at ground (probe shorted).
    ShortCircuit,
    /// Converted value is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenCircuit => write!(f, "probe open circuit"),
            Self::ShortCircuit => write!(f, "probe short circuit"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// LEDC duty write for the fan channel was rejected.
    PwmWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "fan PWM write failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// Station is not associated / has no IP.
    NotConnected,
    /// No telemetry endpoint configured.
    EndpointNotConfigured,
    /// The request URL does not fit the fixed buffer.
    UrlTooLong,
    /// Transport-level failure (DNS, TLS, timeout).
    RequestFailed,
    /// Receiver answered with a non-success status.
    HttpStatus(u16),
    /// Wi-Fi association failed.
    WifiConnectFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "no network connectivity"),
            Self::EndpointNotConfigured => write!(f, "telemetry endpoint not configured"),
            Self::UrlTooLong => write!(f, "request URL too long"),
            Self::RequestFailed => write!(f, "HTTP request failed"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
        }
    }
}
