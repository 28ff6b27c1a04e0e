//! BLE connection management.
//!
//! [`LinkSession`] owns the connection to one fan. It subscribes the
//! notification dispatcher, writes command frames, and reconnects once when
//! a write fails. Transport failures are logged and turned into state
//! transitions; they never reach the caller.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ble::link::{AdapterLease, BleLink, LinkConnection};
use crate::ble::uuids::{COMMAND_CHARACTERISTIC_UUID, NOTIFY_CHARACTERISTIC_UUID};
use crate::dispatcher::NotificationDispatcher;
use crate::error::{Error, Result};
use crate::protocol::Command;
use crate::utils::to_hex;

/// Connection state for a fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not connected to the fan.
    #[default]
    Disconnected,
    /// Currently attempting to connect.
    Connecting,
    /// Connected and subscribed to notifications.
    Connected,
    /// Currently disconnecting.
    Disconnecting,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if in a transitional state.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

/// Event for connection state changes.
#[derive(Debug, Clone)]
pub struct ConnectionEvent {
    /// The address of the fan.
    pub identifier: String,
    /// The new connection state.
    pub state: ConnectionState,
}

/// What happened to a command handed to [`LinkSession::send_command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Written, followed by a state request.
    Delivered,
    /// Not written. The link was re-established and the state requested
    /// again, so the stored state follows the fan.
    Resynced,
    /// Not written; the fan is unreachable.
    Lost,
}

impl CommandOutcome {
    /// Check if the command reached the fan.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// A live connection plus the adapter it runs on.
///
/// Fields drop in order: the connection first, then the lease, which stops
/// the adapter.
struct ActiveLink {
    connection: Box<dyn LinkConnection>,
    _lease: AdapterLease,
}

impl ActiveLink {
    async fn write(&self, command: Command) -> Result<()> {
        self.connection
            .write_characteristic(COMMAND_CHARACTERISTIC_UUID, command.frame())
            .await
    }

    /// Disconnect, then release the adapter whether or not that worked.
    async fn release(self, address: &str) {
        if let Err(e) = self.connection.disconnect().await {
            warn!("{}: Failed to disconnect: {}", address, e);
        }
    }
}

/// Session owning the BLE link to one fan.
pub struct LinkSession {
    /// Fan address.
    address: String,
    /// Transport used to open connections.
    link: Arc<dyn BleLink>,
    /// Subscription target for notifications.
    dispatcher: Arc<NotificationDispatcher>,
    /// The connection, if any. Held across transport calls.
    active: Mutex<Option<ActiveLink>>,
    /// Current connection state.
    state: Arc<RwLock<ConnectionState>>,
    /// Channel for connection events.
    event_tx: broadcast::Sender<ConnectionEvent>,
}

impl LinkSession {
    /// Create an unconnected session.
    pub fn new(
        address: impl Into<String>,
        link: Arc<dyn BleLink>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(16);

        Self {
            address: address.into(),
            link,
            dispatcher,
            active: Mutex::new(None),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            event_tx,
        }
    }

    /// Get the fan address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Subscribe to connection events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.event_tx.subscribe()
    }

    /// Connect, subscribe to notifications and request the fan's state.
    ///
    /// A failure is logged and leaves the session disconnected.
    pub async fn connect(&self) -> ConnectionState {
        let mut active = self.active.lock().await;
        self.connect_locked(&mut active).await;
        self.state()
    }

    /// Send a command, followed by a state request.
    ///
    /// Connects first if needed. A failed write drops the command and
    /// triggers exactly one reconnect followed by a state request.
    pub async fn send_command(&self, command: Command) -> CommandOutcome {
        let mut active = self.active.lock().await;

        if active.is_none() && !self.connect_locked(&mut active).await {
            warn!("{}: {} not sent, fan unreachable", self.address, command);
            return CommandOutcome::Lost;
        }

        match Self::deliver(&active, command).await {
            Ok(()) => {
                debug!(
                    "{}: sent {} [{}]",
                    self.address,
                    command,
                    to_hex(command.frame())
                );
                return CommandOutcome::Delivered;
            }
            Err(e) => {
                warn!("{}: {} failed: {}; reconnecting", self.address, command, e);
                self.release_locked(&mut active).await;
            }
        }

        if !self.connect_locked(&mut active).await {
            warn!("{}: {} lost, reconnect failed", self.address, command);
            return CommandOutcome::Lost;
        }

        match Self::deliver(&active, Command::RequestState).await {
            Ok(()) => {
                info!("{}: reconnected, state requested", self.address);
                CommandOutcome::Resynced
            }
            Err(e) => {
                warn!("{}: state request failed after reconnecting: {}", self.address, e);
                self.release_locked(&mut active).await;
                CommandOutcome::Lost
            }
        }
    }

    /// Disconnect from the fan. Does nothing when already disconnected.
    pub async fn disconnect(&self) {
        let mut active = self.active.lock().await;

        let Some(link) = active.take() else {
            debug!("{}: already disconnected", self.address);
            return;
        };

        self.set_state(ConnectionState::Disconnecting);
        link.release(&self.address).await;
        self.set_state(ConnectionState::Disconnected);

        info!("{}: disconnected", self.address);
    }

    /// Read a characteristic on the live connection.
    pub async fn read_characteristic(&self, uuid: Uuid) -> Result<Vec<u8>> {
        let active = self.active.lock().await;
        let link = (*active).as_ref().ok_or(Error::NotConnected)?;
        link.connection.read_characteristic(uuid).await
    }

    async fn connect_locked(&self, active: &mut Option<ActiveLink>) -> bool {
        if active.is_some() {
            debug!("{}: already connected", self.address);
            return true;
        }

        self.set_state(ConnectionState::Connecting);

        match self.establish().await {
            Ok(link) => {
                *active = Some(link);
                self.set_state(ConnectionState::Connected);
                true
            }
            Err(e) => {
                warn!("{}: Failed to connect: {}", self.address, e);
                self.set_state(ConnectionState::Disconnected);
                false
            }
        }
    }

    async fn establish(&self) -> Result<ActiveLink> {
        let lease = AdapterLease::acquire(self.link.clone()).await?;
        let connection = self.link.connect_by_address(&self.address).await?;
        info!("{}: connected", self.address);

        let link = ActiveLink {
            connection,
            _lease: lease,
        };

        match self.prepare(&link).await {
            Ok(()) => Ok(link),
            Err(e) => {
                link.release(&self.address).await;
                Err(e)
            }
        }
    }

    async fn prepare(&self, link: &ActiveLink) -> Result<()> {
        link.connection
            .subscribe(NOTIFY_CHARACTERISTIC_UUID, self.dispatcher.callback())
            .await?;
        info!("{}: subscribed to notification service", self.address);

        link.write(Command::RequestState).await
    }

    async fn deliver(active: &Option<ActiveLink>, command: Command) -> Result<()> {
        let link = active.as_ref().ok_or(Error::NotConnected)?;

        link.write(command).await?;
        if !command.is_state_request() {
            // The fan does not always notify after a command, so poll.
            link.write(Command::RequestState).await?;
        }
        Ok(())
    }

    async fn release_locked(&self, active: &mut Option<ActiveLink>) {
        if let Some(link) = active.take() {
            link.release(&self.address).await;
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// Update the connection state and emit an event.
    fn set_state(&self, new_state: ConnectionState) {
        let old_state = {
            let mut state = self.state.write();
            let old = *state;
            *state = new_state;
            old
        };

        if old_state != new_state {
            debug!(
                "{}: Connection state changed: {} -> {}",
                self.address, old_state, new_state
            );

            let _ = self.event_tx.send(ConnectionEvent {
                identifier: self.address.clone(),
                state: new_state,
            });
        }
    }
}

impl Drop for LinkSession {
    fn drop(&mut self) {
        let Some(link) = self.active.get_mut().take() else {
            return;
        };
        *self.state.write() = ConnectionState::Disconnected;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let address = self.address.clone();
                handle.spawn(async move {
                    link.release(&address).await;
                    debug!("{}: released on teardown", address);
                });
            }
            Err(_) => match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => {
                    runtime.block_on(link.release(&self.address));
                    debug!("{}: released on teardown", self.address);
                }
                Err(e) => {
                    warn!(
                        "{}: no runtime on teardown ({}), dropping link without disconnect",
                        self.address, e
                    );
                    drop(link);
                }
            },
        }
    }
}

impl std::fmt::Debug for LinkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSession")
            .field("address", &self.address)
            .field("state", &self.state())
            .finish()
    }
}
