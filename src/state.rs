//! Application state machine.
//!
//! One `App` instance owns the current screen, the in-memory contact
//! record and the status line. The platform event loop feeds it one
//! callback at a time (inbound message, button press, splash timeout,
//! outbox result) and every callback runs to completion - the runtime
//! never overlaps them, so no locking is needed.
//!
//! Collaborators sit behind traits: the firmware passes its OLED
//! presenter, UART transport, flash store and vibration motor; host
//! tests pass mocks. The state machine drives them and never the other
//! way around.
//!
//! Diagnostics are non-fatal observations (unknown keys, truncated
//! values, failed writes). They are queued here and drained by the
//! caller, which logs them; they have no control-flow effect.

use crate::codec::{decode, encode_button, ButtonId, FieldKey, FieldValue, OutboundMessage};
use crate::config::STATUS_MAX;
use crate::error::{DecodeError, SendError, StoreError};
use crate::record::ContactRecord;
use heapless::{Deque, String};

/// Mutually-exclusive visible UI modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    /// Transient splash shown at boot.
    Splash,
    /// Steady state: status line plus the contact fields.
    Main,
}

/// Text fields the presenter can update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextField {
    Status,
    Name,
    Email,
    Phone,
}

/// Screen presenter boundary. Updates visuals, never drives logic.
pub trait Presenter {
    fn show_screen(&mut self, screen: Screen);
    fn hide_screen(&mut self, screen: Screen);
    fn set_text(&mut self, field: TextField, text: &str);
}

/// Outbound half of the host transport.
pub trait Transport {
    fn send(&mut self, msg: &OutboundMessage) -> Result<(), SendError>;
}

/// Persistence slot for the contact record.
pub trait RecordStore {
    /// `Ok(None)` if no record has ever been persisted; `Err` if a
    /// record may exist but could not be read back.
    fn load(&mut self) -> Result<Option<ContactRecord>, StoreError>;
    /// Overwrites any prior record as one unit.
    fn save(&mut self, record: &ContactRecord) -> Result<(), StoreError>;
}

/// Vibration motor. Fire-and-forget, no completion callback.
pub trait Haptics {
    fn pulse(&mut self);
}

/// A logged, non-fatal observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Diagnostic {
    /// A string value was cut down to its field bound.
    Truncated { key: FieldKey, original_len: usize },
    /// The host sent a key this firmware does not understand.
    UnknownKey(u32),
    /// Key and value kind do not go together (e.g. integer-valued NAME).
    BadValue(FieldKey),
    /// One pair of an inbound message could not be decoded.
    Decode(DecodeError),
    /// Persisting the record failed; in-memory state stays authoritative.
    Store(StoreError),
    /// Sending an outbound message failed; the UI is not reverted.
    Send(SendError),
    /// The host transport confirmed delivery.
    OutboxDelivered,
    /// The host transport dropped an inbound message.
    InboxDropped,
}

// Status line labels.
pub const STATUS_IDLE: &str = "Press any button";
pub const STATUS_VIBRATE: &str = "Vibrate Activated";
pub const STATUS_CONTACT: &str = "Contact Received.";
pub const STATUS_UP: &str = "Up";
pub const STATUS_DOWN: &str = "Down";
pub const STATUS_SELECT: &str = "Establishing link . . .";

/// Diagnostics kept between drains; oldest entries are dropped first.
const DIAG_DEPTH: usize = 8;

/// The application state machine.
pub struct App {
    screen: Screen,
    record: ContactRecord,
    status: String<STATUS_MAX>,
    /// True once an inbound message touched the record this session;
    /// entering Main must not clobber it with a stale flash copy then.
    record_touched: bool,
    diagnostics: Deque<Diagnostic, DIAG_DEPTH>,
}

impl App {
    /// Fresh boot state: splash screen, empty record.
    pub fn new() -> Self {
        Self {
            screen: Screen::Splash,
            record: ContactRecord::new(),
            status: String::new(),
            record_touched: false,
            diagnostics: Deque::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn record(&self) -> &ContactRecord {
        &self.record
    }

    pub fn status(&self) -> &str {
        self.status.as_str()
    }

    /// Drain one queued diagnostic, oldest first.
    pub fn take_diagnostic(&mut self) -> Option<Diagnostic> {
        self.diagnostics.pop_front()
    }

    /// Splash deadline expired: enter Main exactly once.
    ///
    /// Loads the persisted record unless an inbound burst already
    /// populated the in-memory one during the splash, then tears down
    /// the splash visuals and renders Main.
    pub fn on_splash_timeout(&mut self, store: &mut impl RecordStore, ui: &mut impl Presenter) {
        if self.screen != Screen::Splash {
            return;
        }

        if !self.record_touched {
            match store.load() {
                Ok(Some(record)) => self.record = record,
                Ok(None) => {}
                // Start from the empty record; the next save rewrites
                // the slot anyway.
                Err(e) => self.push_diagnostic(Diagnostic::Store(e)),
            }
        }
        if self.status.is_empty() {
            self.set_status(STATUS_IDLE);
        }
        self.screen = Screen::Main;

        ui.hide_screen(Screen::Splash);
        ui.show_screen(Screen::Main);
        self.render_main(ui);
    }

    /// An inbound message arrived from the paired host.
    ///
    /// Pairs are applied in arrival order; a pair that fails to decode
    /// is skipped, the rest of the message still goes through. When any
    /// contact field changed, the record is persisted as one unit and a
    /// single haptic pulse marks the whole message. During the splash
    /// the same state changes apply but rendering waits for Main entry.
    pub fn on_inbound(
        &mut self,
        data: &[u8],
        store: &mut impl RecordStore,
        ui: &mut impl Presenter,
        haptics: &mut impl Haptics,
    ) {
        let on_main = self.screen == Screen::Main;
        let mut contact_updated = false;

        for item in decode(data) {
            let tuple = match item {
                Ok(tuple) => tuple,
                Err(e) => {
                    self.push_diagnostic(Diagnostic::Decode(e));
                    continue;
                }
            };

            match (tuple.key, tuple.value) {
                (FieldKey::Vibrate, FieldValue::Int(_)) => {
                    self.set_status(STATUS_VIBRATE);
                    if on_main {
                        ui.set_text(TextField::Status, self.status.as_str());
                    }
                    haptics.pulse();
                }
                (key, FieldValue::Str(value))
                    if matches!(key, FieldKey::Name | FieldKey::Email | FieldKey::Phone) =>
                {
                    if let Some(original_len) = value.truncated_from {
                        self.push_diagnostic(Diagnostic::Truncated { key, original_len });
                    }
                    self.record.set_field(key, &value);
                    self.record_touched = true;
                    contact_updated = true;
                    if on_main {
                        ui.set_text(
                            text_field_for(key),
                            self.record.field(key).unwrap_or(""),
                        );
                    }
                }
                (FieldKey::Unknown(raw), _) => {
                    self.push_diagnostic(Diagnostic::UnknownKey(raw));
                }
                (key, _) => {
                    self.push_diagnostic(Diagnostic::BadValue(key));
                }
            }
        }

        if contact_updated {
            if let Err(e) = store.save(&self.record) {
                self.push_diagnostic(Diagnostic::Store(e));
            }
            self.set_status(STATUS_CONTACT);
            if on_main {
                ui.set_text(TextField::Status, self.status.as_str());
            }
            // One pulse for the whole burst, not one per field.
            haptics.pulse();
        }
    }

    /// A physical button was pressed.
    ///
    /// The status line is updated optimistically before the send; a
    /// failed or busy outbox only produces a diagnostic.
    pub fn on_button(
        &mut self,
        id: ButtonId,
        ui: &mut impl Presenter,
        transport: &mut impl Transport,
    ) {
        if self.screen != Screen::Main {
            return;
        }

        let label = match id {
            ButtonId::Up => STATUS_UP,
            ButtonId::Down => STATUS_DOWN,
            ButtonId::Select => STATUS_SELECT,
        };
        self.set_status(label);
        ui.set_text(TextField::Status, label);

        let msg = encode_button(id);
        if let Err(e) = transport.send(&msg) {
            self.push_diagnostic(Diagnostic::Send(e));
        }
    }

    /// The host transport reported the fate of the last outbound send.
    pub fn on_outbox_result(&mut self, result: Result<(), SendError>) {
        match result {
            Ok(()) => self.push_diagnostic(Diagnostic::OutboxDelivered),
            Err(e) => self.push_diagnostic(Diagnostic::Send(e)),
        }
    }

    /// The host transport dropped an inbound message before we saw it.
    pub fn on_inbox_dropped(&mut self) {
        self.push_diagnostic(Diagnostic::InboxDropped);
    }

    fn render_main(&self, ui: &mut impl Presenter) {
        ui.set_text(TextField::Status, self.status.as_str());
        ui.set_text(TextField::Name, self.record.name.as_str());
        ui.set_text(TextField::Email, self.record.email.as_str());
        ui.set_text(TextField::Phone, self.record.phone.as_str());
    }

    fn set_status(&mut self, label: &str) {
        self.status.clear();
        // All labels fit STATUS_MAX.
        let _ = self.status.push_str(label);
    }

    fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.is_full() {
            self.diagnostics.pop_front();
        }
        let _ = self.diagnostics.push_back(diagnostic);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn text_field_for(key: FieldKey) -> TextField {
    match key {
        FieldKey::Email => TextField::Email,
        FieldKey::Phone => TextField::Phone,
        _ => TextField::Name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{KEY_EMAIL, KEY_NAME, KEY_VIBRATE};
    use std::string::String as StdString;
    use std::vec::Vec as StdVec;

    // Small mock collaborators, one per trait seam.

    #[derive(Default)]
    struct TestUi {
        shown: StdVec<Screen>,
        hidden: StdVec<Screen>,
        texts: StdVec<(TextField, StdString)>,
    }

    impl TestUi {
        fn last_text(&self, field: TextField) -> Option<&str> {
            self.texts
                .iter()
                .rev()
                .find(|(f, _)| *f == field)
                .map(|(_, t)| t.as_str())
        }
    }

    impl Presenter for TestUi {
        fn show_screen(&mut self, screen: Screen) {
            self.shown.push(screen);
        }
        fn hide_screen(&mut self, screen: Screen) {
            self.hidden.push(screen);
        }
        fn set_text(&mut self, field: TextField, text: &str) {
            self.texts.push((field, text.into()));
        }
    }

    #[derive(Default)]
    struct TestStore {
        persisted: Option<ContactRecord>,
        fail_reads: bool,
        fail_writes: bool,
        saves: usize,
    }

    impl RecordStore for TestStore {
        fn load(&mut self) -> Result<Option<ContactRecord>, StoreError> {
            if self.fail_reads {
                return Err(StoreError::ReadFailed);
            }
            Ok(self.persisted.clone())
        }
        fn save(&mut self, record: &ContactRecord) -> Result<(), StoreError> {
            self.saves += 1;
            if self.fail_writes {
                return Err(StoreError::WriteFailed);
            }
            self.persisted = Some(record.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct TestTransport {
        sent: StdVec<StdVec<u8>>,
        reject: Option<SendError>,
    }

    impl Transport for TestTransport {
        fn send(&mut self, msg: &OutboundMessage) -> Result<(), SendError> {
            self.sent.push(msg.as_bytes().to_vec());
            match self.reject {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct TestHaptics {
        pulses: usize,
    }

    impl Haptics for TestHaptics {
        fn pulse(&mut self) {
            self.pulses += 1;
        }
    }

    // Message builders matching the wire format.

    fn str_tuple(key: u32, value: &[u8]) -> StdVec<u8> {
        let mut buf = key.to_le_bytes().to_vec();
        buf.push(1);
        buf.extend_from_slice(&(value.len() as u16).to_le_bytes());
        buf.extend_from_slice(value);
        buf
    }

    fn int_tuple(key: u32, value: i32) -> StdVec<u8> {
        let mut buf = key.to_le_bytes().to_vec();
        buf.push(0);
        buf.extend_from_slice(&4u16.to_le_bytes());
        buf.extend_from_slice(&value.to_le_bytes());
        buf
    }

    fn contact_burst() -> StdVec<u8> {
        let mut msg = str_tuple(KEY_NAME, b"Ann");
        msg.extend_from_slice(&str_tuple(KEY_EMAIL, b"a@x.com"));
        msg
    }

    fn app_on_main(store: &mut TestStore, ui: &mut TestUi) -> App {
        let mut app = App::new();
        app.on_splash_timeout(store, ui);
        app
    }

    fn drain(app: &mut App) -> StdVec<Diagnostic> {
        core::iter::from_fn(|| app.take_diagnostic()).collect()
    }

    #[test]
    fn splash_to_main_transitions_exactly_once() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut app = App::new();
        assert_eq!(app.screen(), Screen::Splash);

        app.on_splash_timeout(&mut store, &mut ui);
        assert_eq!(app.screen(), Screen::Main);
        assert_eq!(ui.hidden, [Screen::Splash]);
        assert_eq!(ui.shown, [Screen::Main]);

        // A stray second expiry must not redo the transition.
        app.on_splash_timeout(&mut store, &mut ui);
        assert_eq!(ui.shown, [Screen::Main]);
    }

    #[test]
    fn main_entry_loads_persisted_record() {
        let mut stored = ContactRecord::new();
        let _ = stored.name.push_str("Ann");
        let mut store = TestStore {
            persisted: Some(stored.clone()),
            ..Default::default()
        };
        let mut ui = TestUi::default();

        let app = app_on_main(&mut store, &mut ui);
        assert_eq!(app.record(), &stored);
        assert_eq!(ui.last_text(TextField::Name), Some("Ann"));
    }

    #[test]
    fn main_entry_with_empty_store_renders_empty_fields() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let app = app_on_main(&mut store, &mut ui);

        assert_eq!(app.record(), &ContactRecord::new());
        assert_eq!(ui.last_text(TextField::Name), Some(""));
        assert_eq!(ui.last_text(TextField::Email), Some(""));
        assert_eq!(ui.last_text(TextField::Phone), Some(""));
        assert_eq!(ui.last_text(TextField::Status), Some(STATUS_IDLE));
    }

    #[test]
    fn main_entry_with_unreadable_store_starts_empty_and_reports_it() {
        let mut store = TestStore {
            fail_reads: true,
            ..Default::default()
        };
        let mut ui = TestUi::default();

        let mut app = app_on_main(&mut store, &mut ui);

        assert_eq!(app.screen(), Screen::Main);
        assert_eq!(app.record(), &ContactRecord::new());
        assert_eq!(ui.last_text(TextField::Status), Some(STATUS_IDLE));
        assert_eq!(drain(&mut app), [Diagnostic::Store(StoreError::ReadFailed)]);
    }

    #[test]
    fn contact_burst_updates_persists_and_pulses_once() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut haptics = TestHaptics::default();
        let mut app = app_on_main(&mut store, &mut ui);

        app.on_inbound(&contact_burst(), &mut store, &mut ui, &mut haptics);

        assert_eq!(app.record().name.as_str(), "Ann");
        assert_eq!(app.record().email.as_str(), "a@x.com");
        assert_eq!(app.record().phone.as_str(), "");
        assert_eq!(app.status(), STATUS_CONTACT);
        assert_eq!(ui.last_text(TextField::Status), Some(STATUS_CONTACT));
        assert_eq!(store.persisted.as_ref(), Some(app.record()));
        assert_eq!(haptics.pulses, 1);
    }

    #[test]
    fn applying_the_same_message_twice_is_idempotent() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut haptics = TestHaptics::default();
        let mut app = app_on_main(&mut store, &mut ui);

        let msg = contact_burst();
        app.on_inbound(&msg, &mut store, &mut ui, &mut haptics);
        let once = app.record().clone();
        app.on_inbound(&msg, &mut store, &mut ui, &mut haptics);

        assert_eq!(app.record(), &once);
    }

    #[test]
    fn unknown_key_mutates_nothing() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut haptics = TestHaptics::default();
        let mut app = app_on_main(&mut store, &mut ui);
        let status_before = ui.texts.len();

        app.on_inbound(&int_tuple(99, 7), &mut store, &mut ui, &mut haptics);

        assert_eq!(app.record(), &ContactRecord::new());
        assert_eq!(app.status(), STATUS_IDLE);
        assert_eq!(ui.texts.len(), status_before);
        assert_eq!(store.saves, 0);
        assert_eq!(haptics.pulses, 0);
        assert_eq!(drain(&mut app), [Diagnostic::UnknownKey(99)]);
    }

    #[test]
    fn vibrate_message_pulses_without_persisting() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut haptics = TestHaptics::default();
        let mut app = app_on_main(&mut store, &mut ui);

        app.on_inbound(&int_tuple(KEY_VIBRATE, 1), &mut store, &mut ui, &mut haptics);

        assert_eq!(app.status(), STATUS_VIBRATE);
        assert_eq!(ui.last_text(TextField::Status), Some(STATUS_VIBRATE));
        assert_eq!(haptics.pulses, 1);
        assert_eq!(store.saves, 0);
    }

    #[test]
    fn truncated_name_reports_original_length() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut haptics = TestHaptics::default();
        let mut app = app_on_main(&mut store, &mut ui);

        let msg = str_tuple(KEY_NAME, &[b'x'; 100]);
        app.on_inbound(&msg, &mut store, &mut ui, &mut haptics);

        assert_eq!(app.record().name.len(), crate::config::NAME_MAX);
        assert!(drain(&mut app).contains(&Diagnostic::Truncated {
            key: FieldKey::Name,
            original_len: 100,
        }));
    }

    #[test]
    fn decode_error_skips_pair_but_keeps_earlier_fields() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut haptics = TestHaptics::default();
        let mut app = app_on_main(&mut store, &mut ui);

        // Valid NAME followed by a tuple cut off mid-value.
        let mut msg = str_tuple(KEY_NAME, b"Ann");
        let mut tail = str_tuple(KEY_EMAIL, b"a@x.com");
        tail.truncate(tail.len() - 2);
        msg.extend_from_slice(&tail);

        app.on_inbound(&msg, &mut store, &mut ui, &mut haptics);

        assert_eq!(app.record().name.as_str(), "Ann");
        assert_eq!(app.record().email.as_str(), "");
        // The partial update is still persisted.
        assert_eq!(store.saves, 1);
        assert!(drain(&mut app).contains(&Diagnostic::Decode(DecodeError::Truncated)));
    }

    #[test]
    fn integer_valued_contact_field_is_rejected() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut haptics = TestHaptics::default();
        let mut app = app_on_main(&mut store, &mut ui);

        app.on_inbound(&int_tuple(KEY_NAME, 5), &mut store, &mut ui, &mut haptics);

        assert_eq!(app.record(), &ContactRecord::new());
        assert_eq!(drain(&mut app), [Diagnostic::BadValue(FieldKey::Name)]);
    }

    #[test]
    fn inbound_during_splash_applies_lazily() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut haptics = TestHaptics::default();
        let mut app = App::new();

        app.on_inbound(&contact_burst(), &mut store, &mut ui, &mut haptics);

        // State changed and was persisted, but nothing rendered yet.
        assert_eq!(app.record().name.as_str(), "Ann");
        assert_eq!(store.saves, 1);
        assert!(ui.texts.is_empty());
        assert_eq!(haptics.pulses, 1);

        // Main entry renders the splash-time update and must not
        // clobber it with the flash copy.
        store.persisted = Some(ContactRecord::new());
        app.on_splash_timeout(&mut store, &mut ui);
        assert_eq!(app.record().name.as_str(), "Ann");
        assert_eq!(ui.last_text(TextField::Name), Some("Ann"));
        assert_eq!(ui.last_text(TextField::Status), Some(STATUS_CONTACT));
    }

    #[test]
    fn buttons_are_ignored_during_splash() {
        let mut ui = TestUi::default();
        let mut transport = TestTransport::default();
        let mut app = App::new();

        app.on_button(ButtonId::Select, &mut ui, &mut transport);

        assert!(transport.sent.is_empty());
        assert!(ui.texts.is_empty());
    }

    #[test]
    fn select_sends_exactly_one_message_with_optimistic_status() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut transport = TestTransport::default();
        let mut app = app_on_main(&mut store, &mut ui);

        app.on_button(ButtonId::Select, &mut ui, &mut transport);

        assert_eq!(app.status(), STATUS_SELECT);
        assert_eq!(ui.last_text(TextField::Status), Some(STATUS_SELECT));
        assert_eq!(transport.sent.len(), 1);
        assert_eq!(
            transport.sent[0],
            encode_button(ButtonId::Select).as_bytes().to_vec()
        );
    }

    #[test]
    fn up_and_down_set_their_labels() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut transport = TestTransport::default();
        let mut app = app_on_main(&mut store, &mut ui);

        app.on_button(ButtonId::Up, &mut ui, &mut transport);
        assert_eq!(app.status(), STATUS_UP);
        app.on_button(ButtonId::Down, &mut ui, &mut transport);
        assert_eq!(app.status(), STATUS_DOWN);
        assert_eq!(transport.sent.len(), 2);
    }

    #[test]
    fn busy_outbox_keeps_status_and_reports_diagnostic() {
        let mut store = TestStore::default();
        let mut ui = TestUi::default();
        let mut transport = TestTransport {
            reject: Some(SendError::OutboxBusy),
            ..Default::default()
        };
        let mut app = app_on_main(&mut store, &mut ui);

        app.on_button(ButtonId::Up, &mut ui, &mut transport);

        assert_eq!(app.status(), STATUS_UP);
        assert_eq!(drain(&mut app), [Diagnostic::Send(SendError::OutboxBusy)]);
    }

    #[test]
    fn outbox_results_become_diagnostics_only() {
        let mut app = App::new();
        app.on_outbox_result(Ok(()));
        app.on_outbox_result(Err(SendError::TransportFailed));
        app.on_inbox_dropped();

        assert_eq!(
            drain(&mut app),
            [
                Diagnostic::OutboxDelivered,
                Diagnostic::Send(SendError::TransportFailed),
                Diagnostic::InboxDropped,
            ]
        );
    }

    #[test]
    fn failed_write_keeps_in_memory_record_authoritative() {
        let mut store = TestStore {
            fail_writes: true,
            ..Default::default()
        };
        let mut ui = TestUi::default();
        let mut haptics = TestHaptics::default();
        let mut app = app_on_main(&mut store, &mut ui);

        app.on_inbound(&contact_burst(), &mut store, &mut ui, &mut haptics);

        assert_eq!(app.record().name.as_str(), "Ann");
        assert_eq!(app.status(), STATUS_CONTACT);
        assert!(drain(&mut app).contains(&Diagnostic::Store(StoreError::WriteFailed)));
    }
}
