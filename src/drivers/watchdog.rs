//! Task watchdog for the control loop.
//!
//! The main task subscribes after startup and calls [`Watchdog::feed`]
//! once per loop iteration.  A loop that stops iterating (a hung HTTP
//! exchange, a telemetry request that never returns) panics and reboots
//! the board, which re-asserts the relay from the boot default.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure, esp_task_wdt_reset};
use log::{info, warn};

/// Longest tolerated gap between feeds.  Covers one telemetry request
/// (10 s client timeout) with margin.
pub const DEFAULT_TIMEOUT_MS: u32 = 15_000;

pub struct Watchdog {
    armed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Arm the TWDT for the calling task.  Failure leaves the loop
    /// unsupervised but running.
    pub fn new(timeout_ms: u32) -> Self {
        let armed = Self::subscribe_current_task(timeout_ms);
        if armed {
            info!("Watchdog armed: {} ms", timeout_ms);
        } else {
            warn!("Watchdog not armed; control loop runs unsupervised");
        }
        Self { armed }
    }

    #[cfg(target_os = "espidf")]
    fn subscribe_current_task(timeout_ms: u32) -> bool {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: called once from the main task before the loop starts.
        let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
        if ret != ESP_OK as i32 {
            warn!("TWDT reconfigure: {}", ret);
        }
        // SAFETY: a null handle subscribes the calling task.
        unsafe { esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK as i32 }
    }

    #[cfg(not(target_os = "espidf"))]
    fn subscribe_current_task(_timeout_ms: u32) -> bool {
        false
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.armed {
            // SAFETY: the calling task is the one subscribed in `new`.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}
