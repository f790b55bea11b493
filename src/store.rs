//! Persistent storage for the contact record.
//!
//! Uses the nRF52840's internal flash via the `sequential-storage`
//! crate, which handles wear levelling and GC over the reserved pages.
//! A single well-known key holds the one record; a save overwrites the
//! prior copy as one unit, so a later load never sees a partial write.
//!
//! Callbacks run synchronously, so the [`RecordStore`] impl works on an
//! in-memory cache with a dirty flag; the firmware loop flushes dirty
//! state to flash between callbacks.

use crate::config::{RECORD_BYTES, STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
use crate::error::StoreError;
use crate::record::ContactRecord;
use crate::state::RecordStore;
use defmt::{debug, error, info};

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Key for the contact record in the map storage.
const KEY_CONTACT_RECORD: u8 = 0x01;

/// Working buffer size for sequential-storage operations.
const MAX_ITEM_SIZE: usize = RECORD_BYTES + 16;

/// In-memory cache of the persisted record, synced with flash.
pub struct FlashStore {
    /// Cached record; `None` until something was loaded or saved.
    cached: Option<ContactRecord>,
    /// True if the boot-time read failed; reported once through
    /// [`RecordStore::load`] so the state machine can log it.
    read_failed: bool,
    /// Dirty flag - true if cache differs from flash.
    dirty: bool,
}

impl FlashStore {
    pub const fn new() -> Self {
        Self {
            cached: None,
            read_failed: false,
            dirty: false,
        }
    }

    /// Async load from flash at boot.
    pub async fn load_from_flash(
        &mut self,
        flash: &mut impl embedded_storage_async::nor_flash::NorFlash,
    ) {
        let flash_range = STORAGE_START..STORAGE_END;
        let mut buf = [0u8; MAX_ITEM_SIZE];

        match sequential_storage::map::fetch_item::<u8, &[u8], _>(
            flash,
            flash_range,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_CONTACT_RECORD,
        )
        .await
        {
            Ok(Some(data)) => match ContactRecord::deserialize(data) {
                Some(record) => {
                    info!("Loaded contact record from flash");
                    self.cached = Some(record);
                }
                None => {
                    error!("Stored record has unexpected size {}", data.len());
                    self.cached = None;
                    self.read_failed = true;
                }
            },
            Ok(None) => {
                info!("No contact record in flash");
                self.cached = None;
            }
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                self.cached = None;
                self.read_failed = true;
            }
        }
        self.dirty = false;
    }

    /// Flush the cached record to flash if a callback changed it.
    pub async fn save_to_flash(
        &mut self,
        flash: &mut impl embedded_storage_async::nor_flash::NorFlash,
    ) {
        if !self.dirty {
            debug!("FlashStore: no changes to save");
            return;
        }
        let Some(record) = &self.cached else {
            return;
        };

        let flash_range = STORAGE_START..STORAGE_END;
        let mut buf = [0u8; MAX_ITEM_SIZE];
        let mut data_buf = [0u8; RECORD_BYTES];

        let len = record.serialize(&mut data_buf);
        let item = &data_buf[..len];

        match sequential_storage::map::store_item::<u8, &[u8], _>(
            flash,
            flash_range,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_CONTACT_RECORD,
            &item,
        )
        .await
        {
            Ok(_) => {
                info!("Saved contact record to flash");
                self.dirty = false;
            }
            Err(e) => {
                error!("Flash write error: {:?}", defmt::Debug2Format(&e));
            }
        }
    }
}

impl RecordStore for FlashStore {
    fn load(&mut self) -> Result<Option<ContactRecord>, StoreError> {
        if self.read_failed {
            return Err(StoreError::ReadFailed);
        }
        Ok(self.cached.clone())
    }

    fn save(&mut self, record: &ContactRecord) -> Result<(), StoreError> {
        let mut scratch = [0u8; RECORD_BYTES];
        if record.serialize(&mut scratch) == 0 {
            return Err(StoreError::WriteFailed);
        }
        self.cached = Some(record.clone());
        // The cache is authoritative from here; the unreadable slot
        // gets rewritten on the next flush.
        self.read_failed = false;
        self.dirty = true;
        Ok(())
    }
}
