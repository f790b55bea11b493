//! wristlink - companion-device link logic.
//!
//! Exchanges short key/value messages with a paired phone, renders a
//! splash screen followed by a main screen with a status line and the
//! last received contact record, and persists that record across power
//! cycles.
//!
//! The crate splits along the hardware seam:
//!
//! - `codec`, `record`, `state`, `error`, `config` are pure logic,
//!   testable on the host (`cargo test`). The state machine talks to
//!   the outside world only through the traits in [`state`].
//! - `store`, `link`, `haptics`, `ui` and the `main.rs` binary are the
//!   nRF52840 implementations of those traits, built with
//!   `--features embedded`.
//!
//! The platform event loop invokes one callback at a time to
//! completion; nothing here blocks or suspends inside a callback.

#![cfg_attr(not(test), no_std)]

pub mod codec;
pub mod config;
pub mod error;
pub mod record;
pub mod state;

#[cfg(feature = "embedded")]
pub mod haptics;
#[cfg(feature = "embedded")]
pub mod link;
#[cfg(feature = "embedded")]
pub mod store;
#[cfg(feature = "embedded")]
pub mod ui;
