//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the orchestration rules for the battery monitor:
//! which controllers run on which cadence, how commands are applied and
//! what gets reported.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
