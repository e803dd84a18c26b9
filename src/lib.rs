//! BattMon firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod estimators;
pub mod pins;
pub mod scheduler;

// Hardware-facing modules carry their own cfg-gated simulation
// backends, so they build and test on the host as well.
pub mod adapters;
pub mod drivers;
pub mod sensors;
