use std::sync::{Arc, Once};
use std::time::Duration;

use groundlink::consts::DEFAULT_HANDSHAKE_TIMEOUT;
use groundlink::core::event::{DeviceEvent, Event};
use groundlink::core::io::Credentials;
use groundlink::core::scheduler::ManualScheduler;
use groundlink::core::storage::{Dictionary, MemoryStore, Store};
use groundlink::engine::Engine;
use groundlink::engine::EngineConf;
use groundlink::protocol::{CommonMessage, RawCommand};
use groundlink::test_utils::{EventLog, MockBackend, MockProvider, ProbeCall, ProbeFactory};

use groundlink::prelude::*;

static INIT: Once = Once::new();
static INIT_LOGGER: Once = Once::new();
pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Debug;

fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::builder()
            // Suppress everything below `warn` for third-party modules
            .filter_level(log::LevelFilter::Warn)
            // Allow everything above `LOG_LEVEL` from current package
            .filter_module(env!("CARGO_PKG_NAME"), LOG_LEVEL)
            .init();
    });
}

fn initialize() {
    INIT.call_once(|| init_logger());
}

struct Harness {
    engine: Engine,
    scheduler: Arc<ManualScheduler>,
    sink: Arc<EventLog>,
    probes: Arc<ProbeFactory>,
}

impl Harness {
    fn new(store: Arc<MemoryStore>) -> Self {
        initialize();

        let scheduler = Arc::new(ManualScheduler::new());
        let sink = Arc::new(EventLog::new());
        let probes = Arc::new(ProbeFactory::new());
        let mut engine = EngineConf::builder()
            .scheduler(scheduler.clone())
            .store(store)
            .sink(sink.clone())
            .components(probes.clone())
            .build();
        engine.start();

        Self {
            engine,
            scheduler,
            sink,
            probes,
        }
    }

    fn appear(&mut self, device: &DeviceId, provider: Arc<MockProvider>) {
        self.engine
            .handle(Event::DeviceAppeared {
                device: device.clone(),
                model: DeviceModel::AnafiThermal,
                name: "Thermal".to_string(),
                provider,
            })
            .unwrap();
    }

    fn command(&mut self, device: &DeviceId, command: CommonMessage) {
        self.engine
            .handle(Event::CommandReceived {
                device: device.clone(),
                command: Command::Common(command),
            })
            .unwrap();
    }

    fn complete_handshake(&mut self, device: &DeviceId, backend: Arc<MockBackend>) {
        self.engine
            .handle(Event::LinkConnected {
                device: device.clone(),
                connector: "wifi".to_string(),
                backend,
            })
            .unwrap();
        self.engine
            .handle(Event::ProxyChannelOpened {
                device: device.clone(),
                endpoint: None,
            })
            .unwrap();
        self.command(device, CommonMessage::AllSettingsChanged);
        self.command(device, CommonMessage::AllStatesChanged);
    }

    fn advance(&mut self, by: Duration) {
        for event in self.scheduler.advance(by) {
            self.engine.handle(event).unwrap();
        }
    }
}

#[test]
fn appeared_device_connects_through_handshake() {
    let mut harness = Harness::new(Arc::new(MemoryStore::new()));
    let drone = DeviceId::new("thermal");
    let wifi = Arc::new(MockProvider::local("wifi"));
    harness.appear(&drone, wifi.clone());

    assert_eq!(
        harness.sink.drain().first(),
        Some(&DeviceEvent::Added {
            device: drone.clone(),
            model: DeviceModel::AnafiThermal,
        })
    );

    let credentials = Credentials::new("secret");
    assert!(harness
        .engine
        .connect(&drone, None, Some(&credentials))
        .unwrap());
    assert_eq!(wifi.last_credentials(), Some(credentials));
    assert_eq!(harness.engine.state(&drone), Some(ConnectionState::Connecting));

    harness.complete_handshake(&drone, Arc::new(MockBackend::new()));
    assert_eq!(harness.engine.state(&drone), Some(ConnectionState::Connected));
    assert_eq!(harness.probes.count(&drone, &ProbeCall::Connected), 1);
}

#[test]
fn handshake_timeout_through_scheduler() {
    let mut harness = Harness::new(Arc::new(MemoryStore::new()));
    let drone = DeviceId::new("thermal");
    let wifi = Arc::new(MockProvider::local("wifi"));
    harness.appear(&drone, wifi.clone());
    harness.engine.connect(&drone, Some("wifi"), None).unwrap();
    harness
        .engine
        .handle(Event::LinkConnected {
            device: drone.clone(),
            connector: "wifi".to_string(),
            backend: Arc::new(MockBackend::new()),
        })
        .unwrap();

    harness.advance(DEFAULT_HANDSHAKE_TIMEOUT);
    assert_eq!(wifi.disconnects(), vec![drone.clone()]);

    harness
        .engine
        .handle(Event::LinkDisconnected {
            device: drone.clone(),
            removing: false,
        })
        .unwrap();
    let controller = harness.engine.drone(&drone).unwrap();
    assert_eq!(controller.state(), ConnectionState::Disconnected);
    assert_eq!(controller.cause(), ConnectionCause::Timeout);
    assert_eq!(harness.scheduler.pending(), 0);
}

#[test]
fn canceled_link_reports_cause() {
    let mut harness = Harness::new(Arc::new(MemoryStore::new()));
    let drone = DeviceId::new("thermal");
    harness.appear(&drone, Arc::new(MockProvider::local("wifi")));
    harness.engine.connect(&drone, None, None).unwrap();

    harness
        .engine
        .handle(Event::LinkCanceled {
            device: drone.clone(),
            cause: ConnectionCause::BadPassword,
            removing: false,
        })
        .unwrap();
    assert_eq!(
        harness.sink.states_of(&drone).last(),
        Some(&(ConnectionState::Disconnected, ConnectionCause::BadPassword))
    );
}

#[test]
fn vanished_unknown_device_is_removed() {
    let mut harness = Harness::new(Arc::new(MemoryStore::new()));
    let drone = DeviceId::new("thermal");
    harness.appear(&drone, Arc::new(MockProvider::local("wifi")));

    harness
        .engine
        .handle(Event::DeviceVanished {
            device: drone.clone(),
            connector: "wifi".to_string(),
        })
        .unwrap();
    assert!(harness.engine.drone(&drone).is_none());
    assert!(harness.engine.registry().is_empty());
    assert!(harness
        .sink
        .drain()
        .contains(&DeviceEvent::Removed { device: drone }));
}

#[test]
fn persisted_devices_are_restored() {
    let store = Arc::new(MemoryStore::new());
    let drone = DeviceId::new("thermal");
    {
        let mut harness = Harness::new(store.clone());
        harness.appear(&drone, Arc::new(MockProvider::local("wifi")));
        harness.engine.connect(&drone, None, None).unwrap();
        harness.complete_handshake(&drone, Arc::new(MockBackend::new()));
        harness.command(&drone, CommonMessage::ProductName("Night owl".to_string()));
        harness.engine.stop();
        assert!(harness.engine.drone(&drone).is_none());
    }
    assert_eq!(store.devices(), vec![drone.clone()]);

    let harness = Harness::new(store);
    let restored = harness.engine.drone(&drone).unwrap();
    assert_eq!(restored.identity().model(), DeviceModel::AnafiThermal);
    assert_eq!(restored.identity().name(), "Night owl");
    assert!(restored.identity().is_persisted());
    assert_eq!(restored.lifecycle(), ControllerLifecycle::Idle);
    assert_eq!(restored.providers().count(), 0);
}

#[test]
fn corrupted_model_is_not_restored() {
    let store = Arc::new(MemoryStore::new());
    let dictionary = store.device(&DeviceId::new("broken"));
    dictionary.put("model", "not a model".to_string());
    dictionary.commit().unwrap();

    let harness = Harness::new(store);
    assert!(harness.engine.registry().is_empty());
}

#[test]
fn unknown_targets_are_errors() {
    let mut harness = Harness::new(Arc::new(MemoryStore::new()));
    let drone = DeviceId::new("thermal");
    let nobody = DeviceId::new("nobody");

    assert!(matches!(
        harness.engine.handle(Event::LinkLost { device: nobody.clone() }),
        Err(Error::Device(DeviceError::Unknown(_)))
    ));
    assert!(harness.engine.forget(&nobody).is_err());

    harness.appear(&drone, Arc::new(MockProvider::local("wifi")));
    assert!(matches!(
        harness.engine.connect(&drone, Some("usb"), None),
        Err(Error::Device(DeviceError::UnknownConnector { .. }))
    ));
    assert!(matches!(
        harness.engine.handle(Event::DeviceVanished {
            device: drone.clone(),
            connector: "usb".to_string(),
        }),
        Err(Error::Device(DeviceError::UnknownConnector { .. }))
    ));
    assert!(!harness.engine.disconnect(&drone).unwrap());
}

#[test]
fn preset_commit_is_delivered_with_next_event() {
    let mut harness = Harness::new(Arc::new(MemoryStore::new()));
    let drone = DeviceId::new("thermal");
    harness.appear(&drone, Arc::new(MockProvider::local("wifi")));

    let preset = harness.engine.drone(&drone).unwrap().preset().clone();
    assert_eq!(preset.key(), DeviceModel::AnafiThermal.default_preset_key());
    preset.put("max_tilt", "20".to_string());
    preset.commit().unwrap();
    assert_eq!(harness.probes.count(&drone, &ProbeCall::PresetChange), 0);

    harness
        .engine
        .handle(Event::CommandReceived {
            device: drone.clone(),
            command: Command::Raw(RawCommand {
                feature: 0,
                class: 0,
                id: 0,
                payload: Vec::new(),
            }),
        })
        .unwrap();
    assert_eq!(harness.probes.count(&drone, &ProbeCall::PresetChange), 1);
}

#[test]
fn forget_removes_unreachable_device() {
    let mut harness = Harness::new(Arc::new(MemoryStore::new()));
    let drone = DeviceId::new("thermal");
    let wifi = Arc::new(MockProvider::local("wifi"));
    harness.appear(&drone, wifi.clone());
    harness.engine.connect(&drone, None, None).unwrap();
    harness.complete_handshake(&drone, Arc::new(MockBackend::new()));

    assert!(harness.engine.forget(&drone).unwrap());
    assert_eq!(wifi.forgotten(), vec![drone.clone()]);
    assert_eq!(harness.engine.state(&drone), Some(ConnectionState::Disconnecting));

    harness
        .engine
        .handle(Event::LinkDisconnected {
            device: drone.clone(),
            removing: false,
        })
        .unwrap();
    harness
        .engine
        .handle(Event::DeviceVanished {
            device: drone.clone(),
            connector: "wifi".to_string(),
        })
        .unwrap();
    assert!(harness.engine.drone(&drone).is_none());
}

#[test]
fn stop_discards_every_controller() {
    let mut harness = Harness::new(Arc::new(MemoryStore::new()));
    let drone = DeviceId::new("thermal");
    harness.appear(&drone, Arc::new(MockProvider::local("wifi")));
    harness.engine.connect(&drone, None, None).unwrap();

    harness.engine.stop();
    assert!(!harness.engine.is_started());
    assert!(harness.engine.registry().is_empty());
    assert_eq!(harness.probes.count(&drone, &ProbeCall::Dispose), 1);
}
