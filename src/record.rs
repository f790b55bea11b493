//! The contact record cached on the device.
//!
//! Fixed-capacity name/email/phone triple. Fields are always valid,
//! bounded strings; an absent field is an empty string. The persisted
//! layout is three NUL-padded blocks written as one unit, so a record
//! round-trips through flash byte-for-byte.

use crate::codec::{FieldKey, FieldStr};
use crate::config::{
    EMAIL_FIELD_BYTES, EMAIL_MAX, NAME_FIELD_BYTES, NAME_MAX, PHONE_FIELD_BYTES, PHONE_MAX,
    RECORD_BYTES,
};
use heapless::String;

/// Name/email/phone triple received from the paired host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContactRecord {
    pub name: String<NAME_MAX>,
    pub email: String<EMAIL_MAX>,
    pub phone: String<PHONE_MAX>,
}

impl ContactRecord {
    /// Empty record - the state before anything was ever received.
    pub const fn new() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
        }
    }

    /// Overwrite one field from a decoded string value.
    ///
    /// Returns `false` for keys that are not contact fields. The value
    /// was already truncated to the field bound by the codec, so the
    /// writes below cannot overflow.
    pub fn set_field(&mut self, key: FieldKey, value: &FieldStr) -> bool {
        match key {
            FieldKey::Name => copy_bounded(&mut self.name, value.as_str()),
            FieldKey::Email => copy_bounded(&mut self.email, value.as_str()),
            FieldKey::Phone => copy_bounded(&mut self.phone, value.as_str()),
            _ => return false,
        }
        true
    }

    /// Read one field; `None` for keys that are not contact fields.
    pub fn field(&self, key: FieldKey) -> Option<&str> {
        match key {
            FieldKey::Name => Some(self.name.as_str()),
            FieldKey::Email => Some(self.email.as_str()),
            FieldKey::Phone => Some(self.phone.as_str()),
            _ => None,
        }
    }

    /// Serialize to the fixed persisted layout.
    ///
    /// Returns the number of bytes written, 0 if `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < RECORD_BYTES {
            return 0;
        }

        write_block(&mut buf[..NAME_FIELD_BYTES], self.name.as_bytes());
        write_block(
            &mut buf[NAME_FIELD_BYTES..NAME_FIELD_BYTES + EMAIL_FIELD_BYTES],
            self.email.as_bytes(),
        );
        write_block(
            &mut buf[NAME_FIELD_BYTES + EMAIL_FIELD_BYTES..RECORD_BYTES],
            self.phone.as_bytes(),
        );
        RECORD_BYTES
    }

    /// Deserialize from the fixed persisted layout.
    pub fn deserialize(data: &[u8]) -> Option<Self> {
        if data.len() < RECORD_BYTES {
            return None;
        }

        let mut record = Self::new();
        read_block(&mut record.name, &data[..NAME_FIELD_BYTES]);
        read_block(
            &mut record.email,
            &data[NAME_FIELD_BYTES..NAME_FIELD_BYTES + EMAIL_FIELD_BYTES],
        );
        read_block(
            &mut record.phone,
            &data[NAME_FIELD_BYTES + EMAIL_FIELD_BYTES..RECORD_BYTES],
        );
        Some(record)
    }
}

/// Replace the contents of a bounded string, truncating on character
/// boundaries if the source is longer than the capacity.
fn copy_bounded<const N: usize>(dst: &mut String<N>, src: &str) {
    dst.clear();
    for ch in src.chars() {
        if dst.len() + ch.len_utf8() > N {
            break;
        }
        let _ = dst.push(ch);
    }
}

/// Write a string into a NUL-padded block. `block` is always one byte
/// larger than the field capacity, so the terminator always fits.
fn write_block(block: &mut [u8], src: &[u8]) {
    block.fill(0);
    block[..src.len()].copy_from_slice(src);
}

/// Read a NUL-terminated block back into a bounded string. Undecodable
/// bytes end the field early rather than poisoning the record.
fn read_block<const N: usize>(dst: &mut String<N>, block: &[u8]) {
    let end = block.iter().position(|&b| b == 0).unwrap_or(block.len());
    let raw = &block[..end];
    let text = match core::str::from_utf8(raw) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&raw[..e.valid_up_to()]).unwrap_or(""),
    };
    copy_bounded(dst, text);
}
