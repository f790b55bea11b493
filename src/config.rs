//! Application-wide constants and compile-time configuration.
//!
//! Field bounds, timing parameters, protocol constants and hardware
//! pin assignments live here so they can be tuned in one place.

// Contact record field bounds
//
// Buffer sizes include the terminator of the persisted C-style layout,
// so the visible capacity of each field is one byte less.

/// Persisted buffer size of the name field (bytes, incl. terminator).
pub const NAME_FIELD_BYTES: usize = 59;

/// Persisted buffer size of the email field (bytes, incl. terminator).
pub const EMAIL_FIELD_BYTES: usize = 59;

/// Persisted buffer size of the phone field (bytes, incl. terminator).
pub const PHONE_FIELD_BYTES: usize = 19;

/// Maximum visible bytes of the name field.
pub const NAME_MAX: usize = NAME_FIELD_BYTES - 1;

/// Maximum visible bytes of the email field.
pub const EMAIL_MAX: usize = EMAIL_FIELD_BYTES - 1;

/// Maximum visible bytes of the phone field.
pub const PHONE_MAX: usize = PHONE_FIELD_BYTES - 1;

/// Size of one serialized contact record (three NUL-padded blocks).
pub const RECORD_BYTES: usize = NAME_FIELD_BYTES + EMAIL_FIELD_BYTES + PHONE_FIELD_BYTES;

// UI timing

/// How long the splash screen stays up before Main is entered (ms).
pub const SPLASH_TIMEOUT_MS: u64 = 1000;

/// Status line capacity (longest label is "Establishing link . . .").
pub const STATUS_MAX: usize = 32;

// Host link

/// Largest inbound message we accept from the paired host (bytes).
/// Big enough for a full contact burst (three string tuples + headers).
pub const INBOUND_MAX: usize = 160;

/// Capacity of the firmware event channel.
pub const EVENT_QUEUE_DEPTH: usize = 8;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   Button UP       → P0.11
//   Button DOWN     → P0.12
//   Button SELECT   → P0.24
//   Vibration motor → P0.06
//   I²C SDA         → P0.26
//   I²C SCL         → P0.27
//   Link UART TX    → P0.08
//   Link UART RX    → P0.07

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;

/// Vibration motor pulse length (ms).
pub const HAPTIC_PULSE_MS: u64 = 120;

// Contact record storage

/// Flash page index where record storage starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for record storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 4;
