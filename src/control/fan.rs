//! Temperature-driven fan controller with three-band hysteresis.
//!
//! ```text
//!  duty
//!   255 ┤                                   ┌──────── Full
//!       │                          ╱────────┘
//!       │                 ╱───────╱  Warning band (always on)
//!       │        ╱───────╱
//!       │  ╱────╱  SpinDown band (only while already on)
//!     0 ┼──┴──────────┴───────────┴─────────────▶ °C
//!        temp_off   temp_warning  temp_high
//! ```
//!
//! A fan that is off stays off until the temperature enters the warning
//! band; a fan that is on keeps spinning (ramping down) until the
//! temperature falls to `temp_off`.  The gap between `temp_off` and
//! `temp_warning` is the deadband that stops on/off cycling.

use crate::config::SystemConfig;

/// Fan actuator state.  Invariant: `is_on == (duty > 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanState {
    pub is_on: bool,
    /// PWM duty, 0 – 255.
    pub duty: u8,
    /// Uptime (ms) of the last off→on transition; `None` while off.
    pub on_since_ms: Option<u64>,
}

impl FanState {
    pub const fn off() -> Self {
        Self {
            is_on: false,
            duty: 0,
            on_since_ms: None,
        }
    }

    fn run_at(&mut self, duty: u8, now_ms: u64) {
        if duty == 0 {
            self.stop();
            return;
        }
        if !self.is_on {
            self.on_since_ms = Some(now_ms);
        }
        self.is_on = true;
        self.duty = duty;
    }

    fn stop(&mut self) {
        *self = Self::off();
    }

    /// Milliseconds the fan has been running continuously.
    pub fn run_time_ms(&self, now_ms: u64) -> u64 {
        self.on_since_ms.map_or(0, |t| now_ms.saturating_sub(t))
    }
}

impl Default for FanState {
    fn default() -> Self {
        Self::off()
    }
}

/// Which band produced the last decision (for logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanBand {
    /// Temperature invalid: fixed medium duty.
    FailSafe,
    /// Above `temp_high`.
    Full,
    /// `(temp_warning, temp_high]`.
    Warning,
    /// `(temp_off, temp_warning]` while already running.
    SpinDown,
    /// Off, or switched off at `temp_off`.
    Off,
}

/// Run one evaluation and update `fan` in place.
pub fn evaluate(fan: &mut FanState, temperature_c: Option<f32>, cfg: &SystemConfig, now_ms: u64) -> FanBand {
    let Some(t) = temperature_c else {
        fan.run_at(cfg.fan_failsafe_duty, now_ms);
        return FanBand::FailSafe;
    };

    if t > cfg.temp_high_c {
        fan.run_at(cfg.fan_max_duty, now_ms);
        FanBand::Full
    } else if t > cfg.temp_warning_c {
        let duty = interpolate_duty(
            t,
            cfg.temp_warning_c,
            cfg.temp_high_c,
            cfg.fan_warning_min_duty,
            cfg.fan_warning_max_duty,
        );
        fan.run_at(duty, now_ms);
        FanBand::Warning
    } else if fan.is_on && t <= cfg.temp_off_c {
        fan.stop();
        FanBand::Off
    } else if fan.is_on {
        let duty = interpolate_duty(
            t,
            cfg.temp_off_c,
            cfg.temp_warning_c,
            cfg.fan_low_min_duty,
            cfg.fan_low_max_duty,
        );
        fan.run_at(duty, now_ms);
        FanBand::SpinDown
    } else {
        FanBand::Off
    }
}

/// Linear map of `t` in `[t_lo, t_hi]` onto `[d_lo, d_hi]`, clamped.
fn interpolate_duty(t: f32, t_lo: f32, t_hi: f32, d_lo: u8, d_hi: u8) -> u8 {
    let span = t_hi - t_lo;
    let frac = if span > 0.0 { ((t - t_lo) / span).clamp(0.0, 1.0) } else { 1.0 };
    let duty = f32::from(d_lo) + frac * (f32::from(d_hi) - f32::from(d_lo));
    duty.round().clamp(f32::from(d_lo), f32::from(d_hi)) as u8
}
