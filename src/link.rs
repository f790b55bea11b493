//! UART link to the host radio.
//!
//! The paired phone talks to a radio module wired to UARTE0; each
//! delivery event arrives as one frame:
//!
//! - SYNC (1 byte): 0x7E
//! - LENGTH (2 bytes, LE): payload length
//! - PAYLOAD: one key/value message for [`crate::codec::decode`]
//!
//! The reader task reassembles frames and posts them to the event
//! channel; frames that overflow [`INBOUND_MAX`] are dropped whole and
//! reported, matching the transport's inbox-dropped callback. The
//! firmware loop writes outbound frames through [`LinkTx`] and feeds
//! the outcome back to the state machine as an outbox result.

use crate::codec::OutboundMessage;
use crate::config::{EVENT_QUEUE_DEPTH, INBOUND_MAX};
use crate::error::SendError;
use defmt::{info, warn};
use embassy_nrf::uarte::{Instance, UarteRx, UarteTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use heapless::Vec;

/// Frame sync byte.
const FRAME_SYNC: u8 = 0x7E;

/// Events the link feeds into the firmware loop.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// One complete inbound message payload.
    Inbound(Vec<u8, INBOUND_MAX>),
    /// A frame was dropped before decoding (oversize or framing error).
    InboxDropped,
}

/// Read frames from the radio UART and post them to the event channel.
pub async fn reader_task<T: Instance>(
    mut rx: UarteRx<'static, T>,
    events: Sender<'static, CriticalSectionRawMutex, LinkEvent, EVENT_QUEUE_DEPTH>,
) -> ! {
    loop {
        // Hunt for the sync byte.
        let mut byte = [0u8; 1];
        if rx.read(&mut byte).await.is_err() || byte[0] != FRAME_SYNC {
            continue;
        }

        let mut len_bytes = [0u8; 2];
        if rx.read(&mut len_bytes).await.is_err() {
            continue;
        }
        let len = u16::from_le_bytes(len_bytes) as usize;

        if len > INBOUND_MAX {
            warn!("Dropping oversize frame ({} bytes)", len);
            drain(&mut rx, len).await;
            events.send(LinkEvent::InboxDropped).await;
            continue;
        }

        let mut payload: Vec<u8, INBOUND_MAX> = Vec::new();
        // Cannot fail: len was bounds-checked above.
        let _ = payload.resize_default(len);
        if rx.read(&mut payload).await.is_err() {
            events.send(LinkEvent::InboxDropped).await;
            continue;
        }

        info!("Link: inbound message, {} bytes", len);
        events.send(LinkEvent::Inbound(payload)).await;
    }
}

/// Discard `len` payload bytes of a frame we will not process.
async fn drain<T: Instance>(rx: &mut UarteRx<'static, T>, len: usize) {
    let mut sink = [0u8; 16];
    let mut remaining = len;
    while remaining > 0 {
        let chunk = remaining.min(sink.len());
        if rx.read(&mut sink[..chunk]).await.is_err() {
            return;
        }
        remaining -= chunk;
    }
}

/// Outbound half: frames and writes one message at a time.
pub struct LinkTx<T: Instance> {
    tx: UarteTx<'static, T>,
}

impl<T: Instance> LinkTx<T> {
    pub fn new(tx: UarteTx<'static, T>) -> Self {
        Self { tx }
    }

    /// Write one framed outbound message. The caller reports the
    /// returned outcome to the state machine as an outbox result.
    pub async fn send(&mut self, msg: &OutboundMessage) -> Result<(), SendError> {
        let payload = msg.as_bytes();
        let mut frame: Vec<u8, { INBOUND_MAX + 3 }> = Vec::new();
        let _ = frame.push(FRAME_SYNC);
        let _ = frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        let _ = frame.extend_from_slice(payload);

        self.tx
            .write(&frame)
            .await
            .map_err(|_| SendError::TransportFailed)
    }
}
