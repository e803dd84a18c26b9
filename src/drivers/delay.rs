//! Inter-sample settling delay.
//!
//! The analog front-end spaces its samples with a short blocking delay.
//! On the device that is the ROM busy-wait ([`Ets`](esp_idf_hal::delay::Ets)),
//! which keeps the sampling window deterministic.  On the host a thread
//! sleep stands in.

#[cfg(target_os = "espidf")]
pub type SampleDelay = esp_idf_hal::delay::Ets;

#[cfg(target_os = "espidf")]
pub fn sample_delay() -> SampleDelay {
    esp_idf_hal::delay::Ets
}

#[cfg(not(target_os = "espidf"))]
pub type SampleDelay = StdDelay;

#[cfg(not(target_os = "espidf"))]
pub fn sample_delay() -> SampleDelay {
    StdDelay
}

/// `DelayNs` backed by `std::thread::sleep`.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

#[cfg(not(target_os = "espidf"))]
impl embedded_hal::delay::DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}
