//! Charge-enable relay driver.
//!
//! The relay module is wired inverted: driving the pin HIGH energises the
//! relay and *disables* charging.  This driver deals only in physical
//! levels; the logical mapping lives in the charging controller.
//!
//! The pin is configured input-output so the level actually present on
//! the pad can be read back for reconciliation.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives and reads the GPIO via hw_init.
//! On host/test: hw_init keeps the level in an atomic that tests can flip.

use crate::drivers::hw_init;

pub struct RelayDriver {
    gpio: i32,
    commanded: bool,
}

impl RelayDriver {
    pub fn new(gpio: i32) -> Self {
        Self { gpio, commanded: false }
    }

    pub fn set_level(&mut self, high: bool) {
        hw_init::gpio_write(self.gpio, high);
        self.commanded = high;
    }

    /// Level read back from the pad.
    pub fn level(&self) -> bool {
        hw_init::gpio_read(self.gpio)
    }

    /// Last level this driver wrote.
    pub fn commanded(&self) -> bool {
        self.commanded
    }
}
