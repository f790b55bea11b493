//! Unified error taxonomy for wristlink.
//!
//! We avoid `alloc` - all variants carry only fixed-size data.
//! `defmt::Format` is derived behind the `defmt` feature so host tests
//! build without a global logger.
//!
//! None of these are fatal: decode and store errors are recovered
//! locally with best-effort partial state, send errors are surfaced as
//! passive diagnostics only.

/// Errors from decoding an inbound key/value message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// A tuple claims a length not actually present in the buffer.
    /// Iteration cannot resync past this point.
    Truncated,
    /// Unrecognized value kind byte; the tuple is skipped.
    Unknown(u8),
}

/// Errors from the contact record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Flash write (or cache serialization) failed.
    WriteFailed,
    /// Flash read returned unusable data.
    ReadFailed,
}

/// Errors from sending an outbound message to the paired host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// A previous outbound message has not completed yet.
    OutboxBusy,
    /// The host transport reported a delivery failure.
    TransportFailed,
}
