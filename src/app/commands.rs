//! Inbound commands to the application service.
//!
//! Actions requested from outside the control loop.  Today only the
//! `/relay` endpoint issues one; the rest exist for tests and for a
//! future configuration surface.  The
//! [`AppService`](super::service::AppService) interprets them.

use crate::config::SystemConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Set charging enable explicitly, or toggle it when `None`.
    /// Puts the charging controller into manual override.
    SetCharging(Option<bool>),

    /// Inject the measured pack capacity (Ah) used for State of Health.
    SetMeasuredCapacity(f32),

    /// Hot-reload configuration.  Rejected if it fails validation.
    UpdateConfig(SystemConfig),
}

/// Result of a successfully applied command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandReply {
    /// Charging enable after the command.
    Charging(bool),
    /// Command applied, nothing to report.
    Applied,
}
