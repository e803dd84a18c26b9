//! Analog front-end: burst sampling and averaging.
//!
//! `read_channel` takes N consecutive raw samples of one channel with a
//! fixed settling delay between them and returns the arithmetic mean in
//! ADC counts.  Reads never fail; out-of-range counts are averaged like
//! any other and the converters downstream absorb the noise.
//!
//! ## Dual-target design
//!
//! [`Adc1`] reads the ESP32 ADC1 oneshot unit on the device and the
//! hw_init simulation atomics on the host.  Tests can also plug in any
//! other [`AdcSource`].

use embedded_hal::delay::DelayNs;

use crate::drivers::hw_init;

/// The analog inputs wired to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogChannel {
    Voltage,
    Current,
    Temperature,
}

impl AnalogChannel {
    pub const fn adc1_channel(self) -> u32 {
        match self {
            Self::Voltage => hw_init::ADC1_CH_VOLTAGE,
            Self::Current => hw_init::ADC1_CH_CURRENT,
            Self::Temperature => hw_init::ADC1_CH_TEMP,
        }
    }
}

/// One raw conversion of a channel.
pub trait AdcSource {
    fn read_raw(&mut self, channel: AnalogChannel) -> u16;
}

/// ADC1 oneshot unit (configured by `hw_init::init_peripherals`).
#[derive(Debug, Default, Clone, Copy)]
pub struct Adc1;

impl AdcSource for Adc1 {
    fn read_raw(&mut self, channel: AnalogChannel) -> u16 {
        hw_init::adc1_read(channel.adc1_channel())
    }
}

pub struct AnalogFrontEnd<A, D> {
    adc: A,
    delay: D,
    sample_delay_us: u32,
}

impl<A: AdcSource, D: DelayNs> AnalogFrontEnd<A, D> {
    pub fn new(adc: A, delay: D, sample_delay_us: u32) -> Self {
        Self {
            adc,
            delay,
            sample_delay_us,
        }
    }

    /// Mean of `samples` consecutive reads (0 is treated as 1).
    pub fn read_channel(&mut self, channel: AnalogChannel, samples: u16) -> f32 {
        let n = samples.max(1);
        let mut sum: u32 = 0;
        for i in 0..n {
            if i > 0 && self.sample_delay_us > 0 {
                self.delay.delay_us(self.sample_delay_us);
            }
            sum += u32::from(self.adc.read_raw(channel));
        }
        sum as f32 / f32::from(n)
    }

    pub fn set_sample_delay_us(&mut self, us: u32) {
        self.sample_delay_us = us;
    }

    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }
}
