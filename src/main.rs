//! wristlink firmware binary for the nRF52840 wrist unit.
//!
//! Wires the host-testable core (codec, state machine, record) to the
//! hardware: UART link to the paired phone's radio, SSD1306 OLED,
//! three buttons, vibration motor and internal-flash persistence.
//!
//! The main task is the single place application state is touched: it
//! owns the `App` instance and feeds it one event at a time (splash
//! deadline, inbound message, button press), then flushes dirty
//! storage and logs queued diagnostics. Callbacks never overlap.

#![no_std]
#![no_main]

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, select3, Either, Either3};
use embassy_nrf::gpio::{AnyPin, Level, Output, OutputDrive, Pin};
use embassy_nrf::peripherals::{TWISPI0, UARTE0};
use embassy_nrf::{bind_interrupts, twim, uarte};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use embassy_time::{Duration, Instant, Timer};
use {defmt_rtt as _, panic_probe as _};

use wristlink::codec::{ButtonId, OutboundMessage};
use wristlink::config::{EVENT_QUEUE_DEPTH, SPLASH_TIMEOUT_MS};
use wristlink::error::SendError;
use wristlink::haptics::{self, Motor};
use wristlink::link::{self, LinkEvent, LinkTx};
use wristlink::state::{App, Diagnostic, Screen, Transport};
use wristlink::store::FlashStore;
use wristlink::ui::{buttons, display, OledPresenter};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<TWISPI0>;
    UARTE0_UART0 => uarte::InterruptHandler<UARTE0>;
});

/// Debounced button presses from the three tactile switches.
static BUTTON_EVENTS: Channel<CriticalSectionRawMutex, ButtonId, EVENT_QUEUE_DEPTH> =
    Channel::new();

/// Inbound messages and drop notices from the host link.
static LINK_EVENTS: Channel<CriticalSectionRawMutex, LinkEvent, EVENT_QUEUE_DEPTH> =
    Channel::new();

/// Staging slot between the sync state machine and the async UART
/// writer; holding at most one message is what surfaces `OutboxBusy`.
#[derive(Default)]
struct Outbox {
    pending: Option<OutboundMessage>,
}

impl Transport for Outbox {
    fn send(&mut self, msg: &OutboundMessage) -> Result<(), SendError> {
        if self.pending.is_some() {
            return Err(SendError::OutboxBusy);
        }
        self.pending = Some(*msg);
        Ok(())
    }
}

#[embassy_executor::task(pool_size = 3)]
async fn button_task(
    pin: AnyPin,
    id: ButtonId,
    tx: Sender<'static, CriticalSectionRawMutex, ButtonId, EVENT_QUEUE_DEPTH>,
) {
    buttons::button_task(pin, id, tx).await
}

#[embassy_executor::task]
async fn link_reader_task(
    rx: uarte::UarteRx<'static, UARTE0>,
    tx: Sender<'static, CriticalSectionRawMutex, LinkEvent, EVENT_QUEUE_DEPTH>,
) {
    link::reader_task(rx, tx).await
}

#[embassy_executor::task]
async fn motor_task(pin: Output<'static>) {
    haptics::motor_task(pin).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("wristlink starting...");

    let p = embassy_nrf::init(Default::default());

    // OLED on TWISPI0, splash goes up immediately.
    let i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let mut ui = OledPresenter::new(display::init(i2c));

    // Contact record storage in internal flash.
    let nvmc = embassy_nrf::nvmc::Nvmc::new(p.NVMC);
    let mut flash = embassy_embedded_hal::adapter::BlockingAsync::new(nvmc);
    let mut store = FlashStore::new();
    store.load_from_flash(&mut flash).await;

    // UART link to the host radio.
    let mut uart_config = uarte::Config::default();
    uart_config.baudrate = uarte::Baudrate::BAUD115200;
    let uart = uarte::Uarte::new(p.UARTE0, Irqs, p.P0_07, p.P0_08, uart_config);
    let (link_tx, link_rx) = uart.split();
    let mut link_tx = LinkTx::new(link_tx);
    spawner.must_spawn(link_reader_task(link_rx, LINK_EVENTS.sender()));

    // Buttons.
    spawner.must_spawn(button_task(
        p.P0_11.degrade(),
        ButtonId::Up,
        BUTTON_EVENTS.sender(),
    ));
    spawner.must_spawn(button_task(
        p.P0_12.degrade(),
        ButtonId::Down,
        BUTTON_EVENTS.sender(),
    ));
    spawner.must_spawn(button_task(
        p.P0_24.degrade(),
        ButtonId::Select,
        BUTTON_EVENTS.sender(),
    ));

    // Vibration motor.
    let motor_pin = Output::new(p.P0_06.degrade(), Level::Low, OutputDrive::Standard);
    spawner.must_spawn(motor_task(motor_pin));
    let mut motor = Motor;

    let mut app = App::new();
    let mut outbox = Outbox::default();

    info!("Done initializing, showing splash");

    // Splash phase: the single-shot deadline races the event sources.
    // Messages arriving now are applied to in-memory state and rendered
    // lazily at Main entry; button presses are consumed and ignored.
    let deadline = Instant::now() + Duration::from_millis(SPLASH_TIMEOUT_MS);
    while app.screen() == Screen::Splash {
        match select3(
            Timer::at(deadline),
            LINK_EVENTS.receive(),
            BUTTON_EVENTS.receive(),
        )
        .await
        {
            Either3::First(()) => app.on_splash_timeout(&mut store, &mut ui),
            Either3::Second(event) => {
                handle_link_event(&mut app, event, &mut store, &mut ui, &mut motor)
            }
            Either3::Third(id) => app.on_button(id, &mut ui, &mut outbox),
        }
        store.save_to_flash(&mut flash).await;
        log_diagnostics(&mut app);
    }

    // Steady state.
    loop {
        match select(LINK_EVENTS.receive(), BUTTON_EVENTS.receive()).await {
            Either::First(event) => {
                handle_link_event(&mut app, event, &mut store, &mut ui, &mut motor)
            }
            Either::Second(id) => {
                app.on_button(id, &mut ui, &mut outbox);
                if let Some(msg) = outbox.pending.take() {
                    let result = link_tx.send(&msg).await;
                    app.on_outbox_result(result);
                }
            }
        }
        store.save_to_flash(&mut flash).await;
        log_diagnostics(&mut app);
    }
}

fn handle_link_event(
    app: &mut App,
    event: LinkEvent,
    store: &mut FlashStore,
    ui: &mut impl wristlink::state::Presenter,
    motor: &mut Motor,
) {
    match event {
        LinkEvent::Inbound(payload) => app.on_inbound(&payload, store, ui, motor),
        LinkEvent::InboxDropped => app.on_inbox_dropped(),
    }
}

/// Drain and log queued diagnostics. Observations only, no control flow.
fn log_diagnostics(app: &mut App) {
    while let Some(diagnostic) = app.take_diagnostic() {
        match diagnostic {
            Diagnostic::Truncated { key, original_len } => {
                warn!("Value for {} truncated from {} bytes", key, original_len)
            }
            Diagnostic::UnknownKey(raw) => info!("Unknown key: {}", raw),
            Diagnostic::BadValue(key) => warn!("Ignoring mismatched value for {}", key),
            Diagnostic::Decode(e) => warn!("Bad pair in inbound message: {}", e),
            Diagnostic::Store(e) => error!("Record write failed: {}", e),
            Diagnostic::Send(e) => error!("Message send failed: {}", e),
            Diagnostic::OutboxDelivered => info!("Outbox send success!"),
            Diagnostic::InboxDropped => error!("Message dropped!"),
        }
    }
}
