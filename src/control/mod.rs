//! Control state machine: the safety-relevant decisions.
//!
//! Two independent hysteretic controllers, one classifier and one
//! reconciliation check, all operating on the latest [`BatteryReading`]
//! held in the shared [`ControlContext`]:
//!
//! ```text
//!   BatteryReading ──┬──▶ alert::classify ─────────▶ AlertLevel
//!                    ├──▶ fan::evaluate ───────────▶ FanState    ──▶ PWM
//!                    └──▶ ChargingState::evaluate ─▶ enabled      ──▶ relay (inverted)
//!
//!   ChargingState ─────▶ reconcile::reconcile_relay ◀── relay readback
//! ```
//!
//! Every path fails toward safety: an invalid temperature turns cooling
//! on and charging off.
//!
//! [`BatteryReading`]: context::BatteryReading
//! [`ControlContext`]: context::ControlContext

pub mod alert;
pub mod charging;
pub mod context;
pub mod fan;
pub mod reconcile;
