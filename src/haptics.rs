//! Vibration motor driver.
//!
//! A single GPIO drives the motor through a transistor. Pulses are
//! fire-and-forget: the [`Haptics`] impl only raises a signal, and a
//! dedicated task turns the pin on for [`HAPTIC_PULSE_MS`] so the
//! state machine callback never blocks on the motor.

use crate::config::HAPTIC_PULSE_MS;
use crate::state::Haptics;
use embassy_nrf::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

/// Raised by the state machine, consumed by `motor_task`.
pub static PULSE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Zero-size handle implementing the haptics seam.
pub struct Motor;

impl Haptics for Motor {
    fn pulse(&mut self) {
        PULSE.signal(());
    }
}

/// Drive the motor pin whenever a pulse was requested.
///
/// Overlapping requests collapse into one pulse - good enough for a
/// notification buzz.
pub async fn motor_task(mut pin: Output<'static>) -> ! {
    loop {
        PULSE.wait().await;
        pin.set_high();
        Timer::after(Duration::from_millis(HAPTIC_PULSE_MS)).await;
        pin.set_low();
    }
}
