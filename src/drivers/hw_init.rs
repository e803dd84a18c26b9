//! One-shot hardware peripheral initialization and raw register helpers.
//!
//! Configures the ADC1 oneshot unit, the relay GPIO and the fan LEDC
//! timer/channel using raw ESP-IDF sys calls.  Called once from `main()`
//! before the control loop starts.
//!
//! On non-espidf targets the read/write helpers are backed by atomics so
//! host tests can inject ADC counts and observe actuator writes.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
        init_relay_gpio()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

/// ADC1 channel numbers on the classic ESP32 for the pins in [`pins`].
pub const ADC1_CH_VOLTAGE: u32 = 6; // GPIO 34
pub const ADC1_CH_CURRENT: u32 = 7; // GPIO 35
pub const ADC1_CH_TEMP: u32 = 0; // GPIO 36

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.  `init_adc()` completes before the loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    for ch in [ADC1_CH_VOLTAGE, ADC1_CH_CURRENT, ADC1_CH_TEMP] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), ch, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    info!(
        "hw_init: ADC1 configured (CH{}=V GPIO{}, CH{}=I GPIO{}, CH{}=T GPIO{})",
        ADC1_CH_VOLTAGE,
        pins::VOLTAGE_ADC_GPIO,
        ADC1_CH_CURRENT,
        pins::CURRENT_ADC_GPIO,
        ADC1_CH_TEMP,
        pins::TEMP_ADC_GPIO
    );
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract: single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

#[cfg(not(target_os = "espidf"))]
static SIM_ADC: [AtomicU16; 3] = [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)];

#[cfg(not(target_os = "espidf"))]
fn sim_adc_slot(channel: u32) -> Option<&'static AtomicU16> {
    match channel {
        ADC1_CH_VOLTAGE => Some(&SIM_ADC[0]),
        ADC1_CH_CURRENT => Some(&SIM_ADC[1]),
        ADC1_CH_TEMP => Some(&SIM_ADC[2]),
        _ => None,
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> u16 {
    sim_adc_slot(channel).map_or(0, |a| a.load(Ordering::Relaxed))
}

/// Inject a raw ADC count for the simulated channel.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw: u16) {
    if let Some(a) = sim_adc_slot(channel) {
        a.store(raw, Ordering::Relaxed);
    }
}

// ── Relay GPIO (input-output for readback) ────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_relay_gpio() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::CHARGE_RELAY_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    info!("hw_init: relay GPIO{} configured (input-output)", pins::CHARGE_RELAY_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on a pin
    // configured with its input buffer enabled.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: writes an already-configured output pin. Main-loop only.
    unsafe {
        gpio_set_level(pin, if high { 1 } else { 0 });
    }
}

/// Drive the relay pin HIGH (charging disabled) whether or not
/// [`init_peripherals`] got as far as configuring it.  For the halt path.
#[cfg(target_os = "espidf")]
pub fn force_charging_disabled() {
    let pin = pins::CHARGE_RELAY_GPIO;
    // SAFETY: single pin, called before the control loop exists.  Level is
    // latched before the output driver is enabled so the pad never dips LOW.
    unsafe {
        gpio_set_level(pin, 1);
        gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT);
        gpio_set_level(pin, 1);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn force_charging_disabled() {
    gpio_write(pins::CHARGE_RELAY_GPIO, true);
}

#[cfg(not(target_os = "espidf"))]
static SIM_RELAY_LEVEL: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    pin == pins::CHARGE_RELAY_GPIO && SIM_RELAY_LEVEL.load(Ordering::Relaxed)
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    if pin == pins::CHARGE_RELAY_GPIO {
        SIM_RELAY_LEVEL.store(high, Ordering::Relaxed);
    }
}

// ── LEDC PWM (fan) ────────────────────────────────────────────

pub const LEDC_CH_FAN: u32 = 0;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: fan (25 kHz, 8-bit)
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::FAN_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: single main-task context via init_peripherals().
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: LEDC_CH_FAN,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: pins::FAN_PWM_GPIO,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    info!(
        "hw_init: LEDC configured (fan=CH{} GPIO{} @ {} Hz, {}-bit)",
        LEDC_CH_FAN,
        pins::FAN_PWM_GPIO,
        pins::FAN_PWM_FREQ_HZ,
        pins::PWM_RESOLUTION_BITS
    );
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) -> bool {
    // SAFETY: LEDC channel was configured in init_ledc(); only the main
    // loop writes duty registers.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty as u32) == ESP_OK as i32
            && ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel) == ESP_OK as i32
    }
}

#[cfg(not(target_os = "espidf"))]
static SIM_FAN_DUTY: AtomicU8 = AtomicU8::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(channel: u32, duty: u8) -> bool {
    if channel == LEDC_CH_FAN {
        SIM_FAN_DUTY.store(duty, Ordering::Relaxed);
    }
    true
}

/// Last duty written to the simulated fan channel.
#[cfg(not(target_os = "espidf"))]
pub fn sim_fan_duty() -> u8 {
    SIM_FAN_DUTY.load(Ordering::Relaxed)
}
