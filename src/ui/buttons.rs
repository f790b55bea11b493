//! Debounced button input.
//!
//! Each of the three tactile switches (active-low, internal pull-up)
//! runs its own task that turns level changes into at most one
//! [`ButtonId`] per physical press. The tasks carry no meaning of
//! their own - the state machine decides what a press does, and during
//! the splash it simply discards them.

use crate::codec::ButtonId;
use crate::config::{BUTTON_DEBOUNCE_MS, EVENT_QUEUE_DEPTH};
use defmt::info;
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::Timer;

/// Watch one switch and post a `ButtonId` per confirmed press.
pub async fn button_task(
    pin: AnyPin,
    id: ButtonId,
    tx: Sender<'static, CriticalSectionRawMutex, ButtonId, EVENT_QUEUE_DEPTH>,
) -> ! {
    let mut btn = Input::new(pin, Pull::Up);

    loop {
        btn.wait_for_low().await;
        if !settled_low(&mut btn).await {
            // Contact bounce, not a press.
            continue;
        }

        info!("Button pressed: {}", id);
        tx.send(id).await;

        // One event per press: hold here until the switch opens and
        // its contacts stop chattering.
        btn.wait_for_high().await;
        Timer::after_millis(BUTTON_DEBOUNCE_MS).await;
    }
}

/// Wait out the debounce window and confirm the switch is still closed.
async fn settled_low(btn: &mut Input<'_>) -> bool {
    Timer::after_millis(BUTTON_DEBOUNCE_MS).await;
    btn.is_low()
}
