//! Notification dispatch and shared fan state.
//!
//! The BLE link delivers notifications on its own task while callers send
//! commands from theirs. All state access goes through [`StateStore`], and
//! notification delivery, including the observer call, is serialized per fan.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ble::link::NotificationCallback;
use crate::data::DeviceState;
use crate::protocol::{decode_frame, ActionReport, FanEvent};
use crate::utils::to_hex;

/// Observer invoked with the updated state after each notification.
pub type StateObserver = Arc<dyn Fn(&DeviceState) + Send + Sync>;

/// Last-known fan state plus a single observer slot.
#[derive(Default)]
pub struct StateStore {
    state: Mutex<DeviceState>,
    /// At most one observer; registering replaces it.
    observer: Mutex<Option<StateObserver>>,
    /// Held for the whole of a notification delivery.
    delivery: Mutex<()>,
}

impl StateStore {
    /// Create a store holding the default state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> DeviceState {
        *self.state.lock()
    }

    /// Register the observer, replacing any previous one.
    ///
    /// Returns `true` if an observer was replaced.
    pub fn set_observer(&self, observer: StateObserver) -> bool {
        self.observer.lock().replace(observer).is_some()
    }

    /// Remove the observer.
    pub fn clear_observer(&self) {
        self.observer.lock().take();
    }

    /// Check whether an observer is registered.
    pub fn has_observer(&self) -> bool {
        self.observer.lock().is_some()
    }

    /// Apply a decoded notification and notify the observer.
    ///
    /// The observer runs after the mutation with no state lock held, so it
    /// may read the store.
    pub fn apply(&self, event: &FanEvent) -> DeviceState {
        let _delivery = self.delivery.lock();

        let updated = {
            let mut state = self.state.lock();
            state.apply(event);
            *state
        };

        let observer = self.observer.lock().clone();
        if let Some(observer) = observer {
            observer(&updated);
        }

        updated
    }

    /// Optimistically update the state after a delivered command.
    ///
    /// Waits for any notification delivery in progress, observer included.
    /// Does not notify the observer, so it must not be called from one.
    pub fn update(&self, f: impl FnOnce(&mut DeviceState)) -> DeviceState {
        let _delivery = self.delivery.lock();
        let mut state = self.state.lock();
        f(&mut state);
        *state
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("state", &self.snapshot())
            .field("has_observer", &self.has_observer())
            .finish()
    }
}

/// Routes raw notification frames into a [`StateStore`].
#[derive(Debug)]
pub struct NotificationDispatcher {
    /// Fan address, for log messages.
    address: String,
    store: Arc<StateStore>,
}

impl NotificationDispatcher {
    /// Create a dispatcher for one fan.
    pub fn new(address: impl Into<String>, store: Arc<StateStore>) -> Self {
        Self {
            address: address.into(),
            store,
        }
    }

    /// Handle one notification frame.
    ///
    /// Malformed frames are logged and dropped; nothing propagates back into
    /// the transport. Returns the decoded event when the frame was applied.
    pub fn dispatch(&self, data: &[u8]) -> Option<FanEvent> {
        let event = match decode_frame(data) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    "{}: dropping notification [{}]: {}",
                    self.address,
                    to_hex(data),
                    e
                );
                return None;
            }
        };

        if let FanEvent::Action(ActionReport::AlternateControl { code, .. }) = event {
            info!(
                "{}: Timer or thermostat button pressed (action {:#04x}). Alternate control selected.",
                self.address, code
            );
            info!(
                "{}: Please power cycle device to get app control back.",
                self.address
            );
        }

        let state = self.store.apply(&event);
        debug!("{}: {}", self.address, state);

        Some(event)
    }

    /// Wrap the dispatcher as a link subscription callback.
    pub fn callback(self: &Arc<Self>) -> NotificationCallback {
        let dispatcher = Arc::clone(self);
        Arc::new(move |data: &[u8]| {
            dispatcher.dispatch(data);
        })
    }
}
