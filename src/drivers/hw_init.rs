//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions, the backlight LEDC timer/channel and the
//! button edge interrupts using raw ESP-IDF sys calls.  Called once from
//! `main()` before the event loop starts.  Host builds get no-op
//! simulations so the rest of the crate links and tests unchanged.

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    IsrInstallFailed(i32),
    ShutdownHookFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc)   => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc)     => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::IsrInstallFailed(rc)   => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::ShutdownHookFailed(rc) => write!(f, "shutdown handler registration failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

use crate::config::{ButtonPins, OutputPins};
#[cfg(target_os = "espidf")]
use crate::pins;

/// LEDC channel driving the backlight.
pub const LEDC_CH_BACKLIGHT: u32 = 0;

#[cfg(target_os = "espidf")]
pub fn init_peripherals(outputs: &OutputPins, buttons: &ButtonPins) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before event loop; single-threaded.
    unsafe {
        init_gpio_inputs(buttons)?;
        init_gpio_outputs(outputs)?;
        if let Some(pin) = outputs.brightness {
            init_ledc(pin)?;
        }
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(_outputs: &OutputPins, _buttons: &ButtonPins) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs(buttons: &ButtonPins) -> Result<(), HwInitError> {
    for pin in [buttons.upper, buttons.lower] {
        // Active-low with pull-up; both edges are reported.
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: button inputs configured (upper={}, lower={})", buttons.upper, buttons.lower);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe from any context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs(outputs: &OutputPins) -> Result<(), HwInitError> {
    let output_pins = [outputs.display, outputs.led_red, outputs.led_white, outputs.beeper];

    for pin in output_pins.into_iter().flatten() {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: GPIO outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio_outputs(). Main-loop only.
    unsafe { gpio_set_level(pin, if high { 1 } else { 0 }); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc(gpio: i32) -> Result<(), HwInitError> {
    // Timer 0: backlight (1 kHz, 8-bit)
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: pins::PWM_RESOLUTION_BITS as ledc_timer_bit_t,
        freq_hz: pins::BACKLIGHT_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: LEDC_CH_BACKLIGHT,
        timer_sel: ledc_timer_t_LEDC_TIMER_0,
        gpio_num: gpio,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    }) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    info!("hw_init: LEDC configured (backlight=CH0 on GPIO{})", gpio);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: LEDC channels were configured in init_ledc(); the shutdown
    // handler is the only writer besides the main loop and only writes 0.
    unsafe {
        esp_idf_sys::ledc_set_duty(
            ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            duty as u32,
        );
        esp_idf_sys::ledc_update_duty(
            ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
        );
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicI32, Ordering};
#[cfg(target_os = "espidf")]
use embedded_hal::digital::PinState;

#[cfg(target_os = "espidf")]
use crate::app::button::ButtonId;
#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event};

#[cfg(target_os = "espidf")]
static UPPER_PIN: AtomicI32 = AtomicI32::new(-1);
#[cfg(target_os = "espidf")]
static LOWER_PIN: AtomicI32 = AtomicI32::new(-1);

#[cfg(target_os = "espidf")]
fn push_edge(button: ButtonId, pin: i32) {
    let level = PinState::from(gpio_read(pin));
    push_event(Event::Edge { button, level });
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn upper_button_isr(_arg: *mut core::ffi::c_void) {
    push_edge(ButtonId::Upper, UPPER_PIN.load(Ordering::Relaxed));
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn lower_button_isr(_arg: *mut core::ffi::c_void) {
    push_edge(ButtonId::Lower, LOWER_PIN.load(Ordering::Relaxed));
}

/// Install per-pin GPIO ISR service and register the button handlers.
/// Call after init_peripherals() and before the event loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service(buttons: &ButtonPins) -> Result<(), HwInitError> {
    UPPER_PIN.store(buttons.upper, Ordering::Relaxed);
    LOWER_PIN.store(buttons.lower, Ordering::Relaxed);

    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable). ISR handlers registered
    // below are static functions that only push to the event queue.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        gpio_isr_handler_add(buttons.upper, Some(upper_button_isr), core::ptr::null_mut());
        gpio_intr_enable(buttons.upper);

        gpio_isr_handler_add(buttons.lower, Some(lower_button_isr), core::ptr::null_mut());
        gpio_intr_enable(buttons.lower);
    }
    info!("hw_init: ISR service installed (buttonUpper, buttonLower)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service(_buttons: &ButtonPins) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

// ── Shutdown hook ─────────────────────────────────────────────

/// Longest a restart waits for the main loop to finish its shutdown.
pub const SHUTDOWN_GRACE_MS: u64 = 500;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn on_shutdown() {
    // Blank first: the loop may be stuck and never get to it.
    ledc_set(LEDC_CH_BACKLIGHT, 0);
    let done = crate::events::request_shutdown(SHUTDOWN_GRACE_MS, 10, |ms| {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms as u32);
    });
    if !done {
        log::warn!("hw_init: main loop did not finish shutdown in {} ms", SHUTDOWN_GRACE_MS);
    }
}

/// Register the restart handler.  It blanks the backlight, queues
/// `Event::Shutdown` and holds the restart (bounded) until the main loop
/// has closed the transport.
#[cfg(target_os = "espidf")]
pub fn register_shutdown_hook() -> Result<(), HwInitError> {
    // SAFETY: on_shutdown is a static function with no captured state.
    let ret = unsafe { esp_register_shutdown_handler(Some(on_shutdown)) };
    if ret != ESP_OK { return Err(HwInitError::ShutdownHookFailed(ret)); }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn register_shutdown_hook() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): shutdown hook skipped");
    Ok(())
}
