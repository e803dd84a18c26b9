//! Cadence scheduler.
//!
//! The control loop runs the fast tick on every iteration; everything
//! slower is driven from here.  Each [`Cadence`] has its own interval and
//! deadline, so the slow tick, reconciliation and telemetry never share a
//! timer.  When a deadline passes the scheduler notifies a
//! [`SchedulerDelegate`]; the main loop implements the delegate by
//! forwarding to the service.
//!
//! ```text
//!   loop ──▶ Scheduler::poll(now_ms)
//!                 │  Slow       every slow_tick_interval_ms  (first poll fires)
//!                 │  Reconcile  every reconcile_interval_ms
//!                 │  Telemetry  every telemetry_interval_secs
//!                 ▼
//!           SchedulerDelegate::on_cadence(cadence, now_ms)
//! ```
//!
//! A late poll fires a cadence once and re-arms from `now`; missed
//! periods are not replayed.

use log::info;

use crate::app::ports::{Cadence, SchedulerDelegate};
use crate::config::SystemConfig;

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

const CADENCE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy)]
struct CadenceEntry {
    cadence: Cadence,
    interval_ms: u64,
    next_due_ms: u64,
}

pub struct Scheduler {
    entries: [CadenceEntry; CADENCE_COUNT],
}

impl Scheduler {
    /// Arm every cadence relative to `now_ms`.  The slow tick is due
    /// immediately so the first loop iteration has a full reading.
    pub fn new(cfg: &SystemConfig, now_ms: u64) -> Self {
        let [slow, reconcile, telemetry] = intervals(cfg);
        Self {
            entries: [
                CadenceEntry {
                    cadence: Cadence::Slow,
                    interval_ms: slow,
                    next_due_ms: now_ms,
                },
                CadenceEntry {
                    cadence: Cadence::Reconcile,
                    interval_ms: reconcile,
                    next_due_ms: now_ms.saturating_add(reconcile),
                },
                CadenceEntry {
                    cadence: Cadence::Telemetry,
                    interval_ms: telemetry,
                    next_due_ms: now_ms.saturating_add(telemetry),
                },
            ],
        }
    }

    /// Fire every cadence whose deadline has passed, in declaration order.
    pub fn poll(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) {
        for entry in self.entries.iter_mut() {
            if now_ms >= entry.next_due_ms {
                entry.next_due_ms = now_ms.saturating_add(entry.interval_ms);
                delegate.on_cadence(entry.cadence, now_ms);
            }
        }
    }

    /// Pick up new intervals after a config reload.  Pending deadlines
    /// are pulled in if the new interval is shorter.
    pub fn apply_config(&mut self, cfg: &SystemConfig, now_ms: u64) {
        for (entry, interval) in self.entries.iter_mut().zip(intervals(cfg)) {
            if entry.interval_ms != interval {
                info!(
                    "Scheduler: {:?} interval {} ms -> {} ms",
                    entry.cadence, entry.interval_ms, interval
                );
                entry.interval_ms = interval;
                entry.next_due_ms = entry.next_due_ms.min(now_ms.saturating_add(interval));
            }
        }
    }

    /// Interval currently armed for `cadence`.
    pub fn interval_ms(&self, cadence: Cadence) -> u64 {
        self.entries
            .iter()
            .find(|e| e.cadence == cadence)
            .map_or(0, |e| e.interval_ms)
    }
}

fn intervals(cfg: &SystemConfig) -> [u64; CADENCE_COUNT] {
    [
        u64::from(cfg.slow_tick_interval_ms.max(1)),
        u64::from(cfg.reconcile_interval_ms.max(1)),
        u64::from(cfg.telemetry_interval_secs.max(1)) * 1_000,
    ]
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
