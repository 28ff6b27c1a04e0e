//! End-to-end tests of `FanDevice` against a simulated fan.

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use lasko_fan_ble::ble::{
    COMMAND_CHARACTERISTIC_UUID, MANUFACTURER_NAME_UUID, MODEL_NUMBER_UUID,
    NOTIFY_CHARACTERISTIC_UUID,
};
use lasko_fan_ble::protocol::command::{
    DIRECTION_FORWARD_FRAME, DIRECTION_MIXED_FRAME, DIRECTION_REVERSE_FRAME, POWER_OFF_FRAME,
    POWER_ON_FRAME, REQUEST_STATE_FRAME, SPEED_HIGH_FRAME, SPEED_LOW_FRAME, SPEED_MEDIUM_FRAME,
};
use lasko_fan_ble::{
    BleLink, CommandOutcome, ConnectionState, DeviceState, Direction, Error, FanConfig, FanDevice,
    FanSpeed, LinkConnection, NotificationCallback, Result, Speed,
};

const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

/// A fan that answers state requests with full state reports.
struct SimFan {
    power_on: Mutex<bool>,
    speed: Mutex<u8>,
    direction: Mutex<u8>,
    temperature: u8,
    characteristics: HashMap<Uuid, Vec<u8>>,
    callback: Mutex<Option<NotificationCallback>>,
    writes: Mutex<Vec<Vec<u8>>>,
    /// Number of upcoming writes to reject.
    failing_writes: AtomicUsize,
    /// Number of upcoming connects to reject.
    failing_connects: AtomicUsize,
    connects: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl SimFan {
    fn new() -> Arc<Self> {
        let mut characteristics = HashMap::new();
        characteristics.insert(MANUFACTURER_NAME_UUID, b"Chipsea Tech".to_vec());
        characteristics.insert(MODEL_NUMBER_UUID, b"W9560".to_vec());

        Arc::new(Self {
            power_on: Mutex::new(true),
            speed: Mutex::new(3),
            direction: Mutex::new(1),
            temperature: 24,
            characteristics,
            callback: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            failing_writes: AtomicUsize::new(0),
            failing_connects: AtomicUsize::new(0),
            connects: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        })
    }

    fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    fn fail_next_connects(&self, count: usize) {
        self.failing_connects.store(count, Ordering::SeqCst);
    }

    fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().clone()
    }

    fn notify(&self, data: &[u8]) {
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            callback(data);
        }
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn handle(&self, frame: &[u8]) {
        match frame {
            f if f == POWER_ON_FRAME => *self.power_on.lock() = true,
            f if f == POWER_OFF_FRAME => *self.power_on.lock() = false,
            f if f == SPEED_LOW_FRAME => *self.speed.lock() = 1,
            f if f == SPEED_MEDIUM_FRAME => *self.speed.lock() = 2,
            f if f == SPEED_HIGH_FRAME => *self.speed.lock() = 3,
            f if f == DIRECTION_REVERSE_FRAME => *self.direction.lock() = 0,
            f if f == DIRECTION_FORWARD_FRAME => *self.direction.lock() = 1,
            f if f == DIRECTION_MIXED_FRAME => *self.direction.lock() = 2,
            f if f == REQUEST_STATE_FRAME => {
                let report = [
                    0x0B,
                    0x00,
                    0x00,
                    u8::from(*self.power_on.lock()),
                    0x00,
                    *self.speed.lock(),
                    0x00,
                    *self.direction.lock(),
                    0x00,
                    self.temperature,
                ];
                self.notify(&report);
            }
            _ => {}
        }
    }
}

struct SimLink(Arc<SimFan>);

#[async_trait]
impl BleLink for SimLink {
    async fn start_adapter(&self) -> Result<()> {
        self.0.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop_adapter(&self) {
        self.0.stops.fetch_add(1, Ordering::SeqCst);
    }

    async fn connect_by_address(&self, address: &str) -> Result<Box<dyn LinkConnection>> {
        assert_eq!(address, ADDRESS);
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        if SimFan::take(&self.0.failing_connects) {
            return Err(Error::DeviceNotFound {
                address: address.to_string(),
            });
        }
        Ok(Box::new(SimConnection(self.0.clone())))
    }
}

struct SimConnection(Arc<SimFan>);

#[async_trait]
impl LinkConnection for SimConnection {
    async fn subscribe(&self, characteristic: Uuid, callback: NotificationCallback) -> Result<()> {
        assert_eq!(characteristic, NOTIFY_CHARACTERISTIC_UUID);
        *self.0.callback.lock() = Some(callback);
        Ok(())
    }

    async fn write_characteristic(&self, characteristic: Uuid, data: &[u8]) -> Result<()> {
        assert_eq!(characteristic, COMMAND_CHARACTERISTIC_UUID);
        if SimFan::take(&self.0.failing_writes) {
            return Err(Error::ConnectionFailed {
                reason: "link dropped".to_string(),
            });
        }
        self.0.writes.lock().push(data.to_vec());
        self.0.handle(data);
        Ok(())
    }

    async fn read_characteristic(&self, characteristic: Uuid) -> Result<Vec<u8>> {
        self.0
            .characteristics
            .get(&characteristic)
            .cloned()
            .ok_or(Error::CharacteristicNotFound {
                uuid: characteristic.to_string(),
            })
    }

    async fn disconnect(&self) -> Result<()> {
        self.0.callback.lock().take();
        Ok(())
    }
}

fn fan() -> (Arc<SimFan>, FanDevice) {
    let sim = SimFan::new();
    let fan = FanDevice::with_link(FanConfig::new(ADDRESS), Arc::new(SimLink(sim.clone())));
    (sim, fan)
}

#[tokio::test]
async fn test_connect_synchronizes_state() {
    let (sim, fan) = fan();

    assert_eq!(fan.connect().await, ConnectionState::Connected);
    assert_eq!(sim.writes(), vec![REQUEST_STATE_FRAME.to_vec()]);
    assert_eq!(
        fan.state(),
        DeviceState {
            power_on: true,
            speed: Speed::High,
            direction: Direction::Forward,
            temperature: 24,
            alternate_control: false,
        }
    );
}

#[tokio::test]
async fn test_turn_off_reports_speed_off() {
    let (_sim, fan) = fan();
    fan.connect().await;

    assert_eq!(fan.turn_off().await, CommandOutcome::Delivered);
    assert!(!fan.power_on());
    assert_eq!(fan.speed(), FanSpeed::Off);
    assert_eq!(fan.stored_speed(), Speed::High);

    assert_eq!(fan.turn_on_at(Speed::Low).await, CommandOutcome::Delivered);
    assert!(fan.power_on());
    assert_eq!(fan.speed(), FanSpeed::Low);
}

#[tokio::test]
async fn test_set_speed_writes_command_then_state_request() {
    let (sim, fan) = fan();

    assert_eq!(fan.set_speed(FanSpeed::Medium).await, CommandOutcome::Delivered);
    assert_eq!(
        sim.writes(),
        vec![
            REQUEST_STATE_FRAME.to_vec(),
            SPEED_MEDIUM_FRAME.to_vec(),
            REQUEST_STATE_FRAME.to_vec(),
        ]
    );
    assert_eq!(fan.speed(), FanSpeed::Medium);

    fan.set_speed(FanSpeed::Off).await;
    assert_eq!(sim.writes()[3], POWER_OFF_FRAME.to_vec());
    assert_eq!(fan.speed(), FanSpeed::Off);
}

#[tokio::test]
async fn test_refresh_state_is_not_doubled() {
    let (sim, fan) = fan();
    fan.connect().await;

    assert_eq!(fan.refresh_state().await, CommandOutcome::Delivered);
    assert_eq!(sim.writes().len(), 2);
}

#[tokio::test]
async fn test_only_latest_observer_fires() {
    let (sim, fan) = fan();
    fan.connect().await;

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(Mutex::new(Vec::new()));

    let count = first.clone();
    fan.register_observer(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    });
    let seen = second.clone();
    fan.register_observer(move |state| seen.lock().push(*state));

    sim.notify(&[0x06, 0x00, 0x00, 0x00, 30]);

    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.lock().len(), 1);
    assert_eq!(second.lock()[0].temperature, 30);
    assert_eq!(fan.temperature(), 30);
}

#[tokio::test]
async fn test_malformed_notification_is_dropped() {
    let (sim, fan) = fan();
    fan.connect().await;
    let before = fan.state();

    sim.notify(&[0x0B, 0x00]);
    sim.notify(&[0x42, 0x00, 0x00, 0x00]);

    assert_eq!(fan.state(), before);
    assert!(fan.is_connected());
}

#[tokio::test]
async fn test_alternate_control_notification() {
    let (sim, fan) = fan();
    fan.connect().await;

    sim.notify(&[0x04, 0x03, 0x0C, 0x01]);
    assert!(fan.alternate_control());

    sim.notify(&[0x04, 0x03, 0x04, 0x00]);
    assert!(!fan.alternate_control());
}

#[tokio::test]
async fn test_failed_write_reconnects_and_resyncs() {
    let (sim, fan) = fan();
    fan.connect().await;
    sim.fail_next_writes(1);

    assert_eq!(
        fan.set_direction(Direction::Mixed).await,
        CommandOutcome::Resynced
    );
    assert_eq!(sim.connects.load(Ordering::SeqCst), 2);
    assert_eq!(sim.stops.load(Ordering::SeqCst), 1);
    assert!(fan.is_connected());

    // Only state requests follow the failure; the direction frame is dropped.
    assert_eq!(sim.writes(), vec![REQUEST_STATE_FRAME.to_vec(); 3]);
    // No optimistic update: the state mirrors what the fan reported.
    assert_eq!(fan.direction(), Direction::Forward);
}

#[tokio::test]
async fn test_persistent_failure_drops_command() {
    let (sim, fan) = fan();
    fan.connect().await;
    let before = fan.state();
    sim.fail_next_writes(2);

    assert_eq!(fan.set_speed(FanSpeed::Low).await, CommandOutcome::Lost);
    assert_eq!(fan.connection_state(), ConnectionState::Disconnected);
    assert_eq!(fan.state(), before);
    assert_eq!(
        sim.starts.load(Ordering::SeqCst),
        sim.stops.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn test_unreachable_fan_sends_nothing() {
    let (sim, fan) = fan();
    sim.fail_next_connects(1);

    assert_eq!(fan.turn_off().await, CommandOutcome::Lost);
    assert!(sim.writes().is_empty());
    assert_eq!(sim.connects.load(Ordering::SeqCst), 1);
    assert_eq!(fan.state(), DeviceState::default());
    assert_eq!(fan.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_read_device_info_keeps_defaults_for_missing_fields() {
    let (_sim, fan) = fan();

    let info = fan.read_device_info().await.unwrap();
    assert_eq!(info.manufacturer, "Chipsea Tech");
    assert_eq!(info.model_number, "W9560");
    assert_eq!(info.serial_number, "com3");
    assert!(info.is_supported_fan());
    assert_eq!(fan.device_info(), info);
    assert!(fan.to_string().ends_with("Mac:AA:BB:CC:DD:EE:FF"));
}

#[tokio::test]
async fn test_read_device_info_unreachable() {
    let (sim, fan) = fan();
    sim.fail_next_connects(1);

    assert!(matches!(
        fan.read_device_info().await,
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn test_disconnect_releases_adapter() {
    let (sim, fan) = fan();
    let mut events = fan.subscribe_connection_events();
    fan.connect().await;
    fan.disconnect().await;

    assert_eq!(sim.stops.load(Ordering::SeqCst), 1);
    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        states.push(event.state);
    }
    assert_eq!(
        states,
        vec![
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Disconnecting,
            ConnectionState::Disconnected,
        ]
    );

    // Disconnecting twice is a no-op.
    fan.disconnect().await;
    assert_eq!(sim.stops.load(Ordering::SeqCst), 1);
}
