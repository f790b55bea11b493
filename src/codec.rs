//! Key/value message codec for the host link.
//!
//! Inbound and outbound messages are an ordered sequence of tuples:
//!
//! - KEY (4 bytes, LE): field identifier
//! - KIND (1 byte): 0 = signed integer, 1 = C string
//! - LENGTH (2 bytes, LE): value length in bytes
//! - VALUE (LENGTH bytes): integer (1, 2 or 4 bytes, LE, sign-extended)
//!   or string bytes (a trailing NUL is stripped)
//!
//! Decoding yields tuples in arrival order and never discards
//! information silently: unrecognized keys come back as
//! [`FieldKey::Unknown`] and string values that exceed their destination
//! field bound are truncated deterministically with the original length
//! reported in [`FieldStr::truncated_from`]. Callers decide what to log
//! and what to ignore.
//!
//! Pure, no I/O; see the byte-level fixtures in the test module.

use crate::config::{EMAIL_MAX, NAME_MAX, PHONE_MAX};
use crate::error::DecodeError;
use heapless::String;

// Wire keys shared with the phone-side app.
pub const KEY_BUTTON: u32 = 0;
pub const KEY_VIBRATE: u32 = 1;
pub const KEY_NAME: u32 = 2;
pub const KEY_EMAIL: u32 = 3;
pub const KEY_PHONE: u32 = 4;

// Value kinds.
const KIND_INT: u8 = 0;
const KIND_CSTRING: u8 = 1;

/// Tuple header size: key + kind + length.
pub const HEADER_BYTES: usize = 4 + 1 + 2;

/// Largest string value any field can carry (the name/email bound).
pub const VALUE_MAX: usize = NAME_MAX;

/// Encoded size of an outbound button message (header + 4-byte int).
pub const BUTTON_MSG_BYTES: usize = HEADER_BYTES + 4;

/// Typed field identifier of one key/value tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldKey {
    Button,
    Vibrate,
    Name,
    Email,
    Phone,
    /// Key this firmware does not understand. Surfaced, never dropped.
    Unknown(u32),
}

impl FieldKey {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            KEY_BUTTON => FieldKey::Button,
            KEY_VIBRATE => FieldKey::Vibrate,
            KEY_NAME => FieldKey::Name,
            KEY_EMAIL => FieldKey::Email,
            KEY_PHONE => FieldKey::Phone,
            other => FieldKey::Unknown(other),
        }
    }

    pub fn raw(&self) -> u32 {
        match self {
            FieldKey::Button => KEY_BUTTON,
            FieldKey::Vibrate => KEY_VIBRATE,
            FieldKey::Name => KEY_NAME,
            FieldKey::Email => KEY_EMAIL,
            FieldKey::Phone => KEY_PHONE,
            FieldKey::Unknown(raw) => *raw,
        }
    }

    /// Visible-byte bound of the destination field for string values.
    fn string_bound(&self) -> usize {
        match self {
            FieldKey::Name => NAME_MAX,
            FieldKey::Email => EMAIL_MAX,
            FieldKey::Phone => PHONE_MAX,
            _ => VALUE_MAX,
        }
    }
}

/// A decoded string value, truncated to its destination bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStr {
    text: String<VALUE_MAX>,
    /// Original value length in bytes when truncation was applied.
    pub truncated_from: Option<usize>,
}

impl FieldStr {
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }
}

/// A decoded value: integer or bounded string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(i32),
    Str(FieldStr),
}

/// One decoded key/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub key: FieldKey,
    pub value: FieldValue,
}

/// Decode an inbound message buffer into its tuple sequence.
///
/// The returned iterator preserves arrival order. A tuple with an
/// unrecognized value kind yields `Err(DecodeError::Unknown)` and is
/// skipped; a tuple whose claimed length runs past the buffer yields
/// `Err(DecodeError::Truncated)` and ends iteration (there is no way
/// to resync).
pub fn decode(buf: &[u8]) -> TupleIter<'_> {
    TupleIter { rest: buf }
}

/// Iterator over the tuples of one inbound message.
pub struct TupleIter<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for TupleIter<'a> {
    type Item = Result<Tuple, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        if self.rest.len() < HEADER_BYTES {
            self.rest = &[];
            return Some(Err(DecodeError::Truncated));
        }

        let raw_key = u32::from_le_bytes([self.rest[0], self.rest[1], self.rest[2], self.rest[3]]);
        let kind = self.rest[4];
        let len = u16::from_le_bytes([self.rest[5], self.rest[6]]) as usize;

        if self.rest.len() < HEADER_BYTES + len {
            self.rest = &[];
            return Some(Err(DecodeError::Truncated));
        }

        let value = &self.rest[HEADER_BYTES..HEADER_BYTES + len];
        self.rest = &self.rest[HEADER_BYTES + len..];

        let key = FieldKey::from_raw(raw_key);
        match kind {
            KIND_INT => match int_value(value) {
                Some(v) => Some(Ok(Tuple {
                    key,
                    value: FieldValue::Int(v),
                })),
                // Unsupported integer width is treated like an unknown kind.
                None => Some(Err(DecodeError::Unknown(kind))),
            },
            KIND_CSTRING => Some(Ok(Tuple {
                key,
                value: FieldValue::Str(string_value(key, value)),
            })),
            other => Some(Err(DecodeError::Unknown(other))),
        }
    }
}

/// Sign-extend a 1-, 2- or 4-byte little-endian integer.
fn int_value(value: &[u8]) -> Option<i32> {
    match value.len() {
        1 => Some(value[0] as i8 as i32),
        2 => Some(i16::from_le_bytes([value[0], value[1]]) as i32),
        4 => Some(i32::from_le_bytes([value[0], value[1], value[2], value[3]])),
        _ => None,
    }
}

/// Build a bounded string value for `key`, stripping a trailing NUL and
/// truncating on a character boundary at the destination field bound.
fn string_value(key: FieldKey, value: &[u8]) -> FieldStr {
    let raw = match value.iter().position(|&b| b == 0) {
        Some(nul) => &value[..nul],
        None => value,
    };

    // Keep the longest valid UTF-8 prefix; garbage past it is dropped.
    let text = match core::str::from_utf8(raw) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&raw[..e.valid_up_to()]).unwrap_or(""),
    };

    let bound = key.string_bound();
    let mut out: String<VALUE_MAX> = String::new();
    for ch in text.chars() {
        if out.len() + ch.len_utf8() > bound {
            break;
        }
        // Cannot fail: bound <= VALUE_MAX.
        let _ = out.push(ch);
    }

    let truncated_from = if out.len() < raw.len() {
        Some(raw.len())
    } else {
        None
    };

    FieldStr {
        text: out,
        truncated_from,
    }
}

/// Physical buttons reported to the paired host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonId {
    Up,
    Select,
    Down,
}

impl ButtonId {
    /// Wire value shared with the phone-side app.
    pub fn to_wire(self) -> i32 {
        match self {
            ButtonId::Up => 0,
            ButtonId::Select => 1,
            ButtonId::Down => 2,
        }
    }
}

/// An encoded outbound message: a single integer tuple keyed `BUTTON`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundMessage {
    bytes: [u8; BUTTON_MSG_BYTES],
}

impl OutboundMessage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Encode a button press for the host transport.
pub fn encode_button(id: ButtonId) -> OutboundMessage {
    let mut bytes = [0u8; BUTTON_MSG_BYTES];
    bytes[0..4].copy_from_slice(&KEY_BUTTON.to_le_bytes());
    bytes[4] = KIND_INT;
    bytes[5..7].copy_from_slice(&4u16.to_le_bytes());
    bytes[7..11].copy_from_slice(&id.to_wire().to_le_bytes());
    OutboundMessage { bytes }
}
