use std::sync::{Arc, Once};

use groundlink::core::event::{DeviceEvent, Event};
use groundlink::core::io::{Connector, Credentials, Technology};
use groundlink::core::scheduler::ManualScheduler;
use groundlink::core::storage::{Dictionary, MemoryStore};
use groundlink::engine::{Engine, EngineConf};
use groundlink::protocol::{
    CommonMessage, DroneManagerMessage, FlyingState, ListFlags, PilotingMessage,
    ProxiedLinkState, SkyControllerMessage,
};
use groundlink::proxy::ProxiedState;
use groundlink::test_utils::{EventLog, MockBackend, MockProvider, MockRecorder};

use groundlink::prelude::*;

static INIT: Once = Once::new();
static INIT_LOGGER: Once = Once::new();
pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Debug;

const REMOTE: &str = "sc3";
const DRONE: &str = "anafi";
const OTHER_DRONE: &str = "thermal";

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

fn remote() -> DeviceId {
    DeviceId::new(REMOTE)
}

fn drone() -> DeviceId {
    DeviceId::new(DRONE)
}

struct Harness {
    engine: Engine,
    sink: Arc<EventLog>,
    recorder: Arc<MockRecorder>,
    backend: Arc<MockBackend>,
}

impl Harness {
    /// Engine with a remote control connected through USB.
    fn connected() -> Self {
        initialize();

        let sink = Arc::new(EventLog::new());
        let recorder = Arc::new(MockRecorder::new());
        let mut engine = EngineConf::builder()
            .scheduler(Arc::new(ManualScheduler::new()))
            .store(Arc::new(MemoryStore::new()))
            .sink(sink.clone())
            .recorder(recorder.clone())
            .build();
        engine.start();

        let mut harness = Self {
            engine,
            sink,
            recorder,
            backend: Arc::new(MockBackend::new()),
        };

        harness
            .engine
            .handle(Event::DeviceAppeared {
                device: remote(),
                model: DeviceModel::SkyController3,
                name: "Skycontroller 3".to_string(),
                provider: Arc::new(MockProvider::new(Connector::local("usb", Technology::Usb))),
            })
            .unwrap();
        assert!(harness.engine.connect(&remote(), Some("usb"), None).unwrap());
        harness.handshake(&remote(), harness.backend.clone(), |settings| {
            if settings {
                Command::SkyController(SkyControllerMessage::AllSettingsChanged)
            } else {
                Command::SkyController(SkyControllerMessage::AllStatesChanged)
            }
        });
        assert_eq!(harness.engine.state(&remote()), Some(ConnectionState::Connected));
        harness
    }

    fn handshake(
        &mut self,
        device: &DeviceId,
        backend: Arc<MockBackend>,
        signal: impl Fn(bool) -> Command,
    ) {
        if self.engine.drone(device).is_none() {
            self.engine
                .handle(Event::LinkConnected {
                    device: device.clone(),
                    connector: "usb".to_string(),
                    backend,
                })
                .unwrap();
        }
        self.engine
            .handle(Event::ProxyChannelOpened {
                device: device.clone(),
                endpoint: None,
            })
            .unwrap();
        self.receive(device, signal(true));
        self.receive(device, signal(false));
    }

    fn receive(&mut self, device: &DeviceId, command: Command) {
        self.engine
            .handle(Event::CommandReceived {
                device: device.clone(),
                command,
            })
            .unwrap();
    }

    fn drone_manager(&mut self, message: DroneManagerMessage) {
        self.receive(&remote(), Command::DroneManager(message));
    }

    fn relay_state(&mut self, state: ProxiedLinkState, device: &DeviceId) {
        self.drone_manager(DroneManagerMessage::ConnectionState {
            state,
            device: device.clone(),
            model: DeviceModel::Anafi4k.id(),
            name: "Anafi".to_string(),
        });
    }

    fn known(&mut self, device: &DeviceId, flags: ListFlags) {
        self.drone_manager(DroneManagerMessage::KnownDroneItem {
            device: device.clone(),
            model: DeviceModel::Anafi4k.id(),
            name: "Anafi".to_string(),
            flags,
        });
    }

    /// Relays a drone until its handshake completes.
    fn relay_connected_drone(&mut self) -> Arc<MockBackend> {
        self.relay_state(ProxiedLinkState::Connecting, &drone());
        assert_eq!(self.engine.state(&drone()), Some(ConnectionState::Connecting));
        self.relay_state(ProxiedLinkState::Connected, &drone());

        let backend = self.backend.proxied(&drone()).unwrap();
        self.handshake(&drone(), backend.clone(), |settings| {
            if settings {
                Command::Common(CommonMessage::AllSettingsChanged)
            } else {
                Command::Common(CommonMessage::AllStatesChanged)
            }
        });
        assert_eq!(self.engine.state(&drone()), Some(ConnectionState::Connected));
        backend
    }

    fn relays(&self, device: &DeviceId) -> bool {
        self.engine
            .drone(device)
            .is_some_and(|drone| drone.provider(REMOTE).is_some())
    }
}

#[test]
fn known_drones_get_relay_provider() {
    let mut harness = Harness::connected();

    harness.known(&drone(), ListFlags::FIRST);
    harness.known(&DeviceId::new(OTHER_DRONE), ListFlags::LAST);
    assert!(harness.relays(&drone()));
    assert!(harness.relays(&DeviceId::new(OTHER_DRONE)));
    assert!(harness
        .sink
        .drain()
        .contains(&DeviceEvent::Added {
            device: drone(),
            model: DeviceModel::Anafi4k,
        }));

    let coordinator = harness.engine.remote(&remote()).unwrap();
    assert!(coordinator.translator().is_known(&drone()));
    assert_eq!(
        coordinator.translator().entry(&drone()).map(|entry| entry.state()),
        Some(ProxiedState::Idle)
    );

    harness.known(&DeviceId::new(OTHER_DRONE), ListFlags::REMOVE);
    assert!(harness.engine.drone(&DeviceId::new(OTHER_DRONE)).is_none());
    assert!(harness.relays(&drone()));

    harness.known(&drone(), ListFlags::FIRST);
    harness.known(&drone(), ListFlags::EMPTY);
    assert!(harness.engine.drone(&drone()).is_none());
    assert!(harness
        .sink
        .drain()
        .contains(&DeviceEvent::Removed { device: drone() }));
}

#[test]
fn new_known_list_replaces_previous() {
    let mut harness = Harness::connected();
    harness.known(&drone(), ListFlags::FIRST | ListFlags::LAST);
    harness.known(&DeviceId::new(OTHER_DRONE), ListFlags::FIRST | ListFlags::LAST);

    assert!(harness.engine.drone(&drone()).is_none());
    assert!(harness.relays(&DeviceId::new(OTHER_DRONE)));
}

#[test]
fn active_drone_connects_through_remote() {
    let mut harness = Harness::connected();
    let backend = harness.relay_connected_drone();

    let coordinator = harness.engine.remote(&remote()).unwrap();
    assert_eq!(coordinator.link().active_device(), Some(drone()));
    assert!(coordinator.is_attached(&drone()));

    let relayed = harness.engine.drone(&drone()).unwrap();
    assert_eq!(relayed.local_technology(), Some(Technology::Usb));
    assert_eq!(relayed.active_provider().map(|p| p.connector().uid()), Some(REMOTE));
    assert!(backend.has_sent(&Command::Common(CommonMessage::AllSettings)));

    // remote control backs off while the drone synchronizes
    assert!(relayed.is_data_sync_allowed());
    assert!(coordinator.link().is_active_syncing());
    assert!(!coordinator.controller().is_data_sync_allowed());

    harness.receive(
        &drone(),
        Command::Piloting(PilotingMessage::FlyingStateChanged(FlyingState::Flying)),
    );
    let coordinator = harness.engine.remote(&remote()).unwrap();
    assert!(!coordinator.link().is_active_syncing());
    assert!(coordinator.controller().is_data_sync_allowed());
}

#[test]
fn idle_remote_disconnects_active_drone() {
    let mut harness = Harness::connected();
    harness.relay_connected_drone();

    harness.relay_state(ProxiedLinkState::Searching, &drone());
    let relayed = harness.engine.drone(&drone()).unwrap();
    assert_eq!(relayed.state(), ConnectionState::Disconnected);
    assert!(relayed.identity().is_persisted());
    // neither known nor active
    assert!(!harness.relays(&drone()));
    assert_eq!(harness.engine.remote(&remote()).unwrap().link().active_device(), None);
}

#[test]
fn active_drone_switch_disconnects_previous() {
    let mut harness = Harness::connected();
    harness.known(&drone(), ListFlags::FIRST | ListFlags::LAST);
    harness.relay_connected_drone();

    let other = DeviceId::new(OTHER_DRONE);
    harness.relay_state(ProxiedLinkState::Connecting, &other);
    assert_eq!(harness.engine.state(&drone()), Some(ConnectionState::Disconnected));
    assert_eq!(harness.engine.state(&other), Some(ConnectionState::Connecting));
    assert!(harness.relays(&drone()));
    assert!(harness.relays(&other));
}

#[test]
fn remote_disconnection_resets_relayed_drones() {
    let mut harness = Harness::connected();
    harness.known(&drone(), ListFlags::FIRST | ListFlags::LAST);
    harness.relay_connected_drone();
    assert_eq!(harness.backend.active_recordings(), 1);

    harness
        .engine
        .handle(Event::LinkDisconnected {
            device: remote(),
            removing: false,
        })
        .unwrap();

    assert_eq!(harness.engine.state(&remote()), Some(ConnectionState::Disconnected));
    assert_eq!(harness.engine.state(&drone()), Some(ConnectionState::Disconnected));
    assert!(!harness.relays(&drone()));
    assert_eq!(harness.backend.active_recordings(), 0);

    let coordinator = harness.engine.remote(&remote()).unwrap();
    assert_eq!(coordinator.translator().known().count(), 0);
    assert!(coordinator.link().backend().is_none());
    assert!(harness
        .recorder
        .last_session(&remote())
        .is_some_and(|session| session.provider().is_none() && session.is_closed()));
}

#[test]
fn discovered_drone_fails_authentication() {
    let mut harness = Harness::connected();
    let credentials = Credentials::new("wrong");

    assert!(harness
        .engine
        .connect_discovered_drone(&remote(), &drone(), DeviceModel::Anafi4k, "Anafi", Some(&credentials))
        .unwrap());
    assert!(harness
        .backend
        .has_sent(&Command::DroneManager(DroneManagerMessage::Connect {
            device: drone(),
            credentials: Some(credentials),
        })));
    assert_eq!(harness.engine.state(&drone()), Some(ConnectionState::Connecting));
    assert!(harness.relays(&drone()));

    harness.relay_state(ProxiedLinkState::Connecting, &drone());
    harness.drone_manager(DroneManagerMessage::AuthenticationFailed {
        device: drone(),
        model: DeviceModel::Anafi4k.id(),
        name: "Anafi".to_string(),
    });
    assert_eq!(
        harness.sink.states_of(&drone()).last(),
        Some(&(ConnectionState::Disconnected, ConnectionCause::BadPassword))
    );

    harness.relay_state(ProxiedLinkState::Idle, &drone());
    let coordinator = harness.engine.remote(&remote()).unwrap();
    assert!(coordinator.link().is_auth_failed(&drone()));
    assert!(harness.relays(&drone()));

    harness.engine.forget_remote_drone(&remote(), &drone()).unwrap();
    assert!(harness
        .backend
        .has_sent(&Command::DroneManager(DroneManagerMessage::Forget { device: drone() })));
    assert!(!harness.engine.remote(&remote()).unwrap().link().is_auth_failed(&drone()));
    assert!(harness.engine.drone(&drone()).is_none());
}

#[test]
fn authentication_failure_of_inactive_drone_is_ignored() {
    let mut harness = Harness::connected();
    let ghost = DeviceId::new("ghost");
    let failed = |device: &DeviceId| DroneManagerMessage::AuthenticationFailed {
        device: device.clone(),
        model: DeviceModel::Anafi4k.id(),
        name: "Ghost".to_string(),
    };

    harness.drone_manager(failed(&ghost));
    assert!(harness.engine.drone(&ghost).is_none());
    assert!(!harness.engine.remote(&remote()).unwrap().link().is_auth_failed(&ghost));

    harness.relay_state(ProxiedLinkState::Connecting, &drone());
    harness.drone_manager(failed(&ghost));
    assert!(harness.engine.drone(&ghost).is_none());
    assert!(!harness.relays(&ghost));
    assert_eq!(harness.engine.state(&drone()), Some(ConnectionState::Connecting));
}

#[test]
fn connecting_unrelayed_drones() {
    let mut harness = Harness::connected();

    assert!(!harness
        .engine
        .connect_remote_drone(&remote(), &drone(), None)
        .unwrap());

    harness.known(&drone(), ListFlags::FIRST | ListFlags::LAST);
    assert!(harness
        .engine
        .connect_remote_drone(&remote(), &drone(), None)
        .unwrap());

    assert!(matches!(
        harness.engine.connect_remote_drone(&drone(), &remote(), None),
        Err(Error::Device(DeviceError::NotProxying(_)))
    ));
    assert!(matches!(
        harness
            .engine
            .connect_remote_drone(&DeviceId::new("nobody"), &drone(), None),
        Err(Error::Device(DeviceError::Unknown(_)))
    ));
}

#[test]
fn forget_through_engine_uses_relay() {
    let mut harness = Harness::connected();
    harness.known(&drone(), ListFlags::FIRST | ListFlags::LAST);

    assert!(harness.engine.forget(&drone()).unwrap());
    assert!(harness
        .backend
        .has_sent(&Command::DroneManager(DroneManagerMessage::Forget { device: drone() })));

    // the remote control confirms by updating its list
    harness.known(&drone(), ListFlags::REMOVE);
    assert!(harness.engine.drone(&drone()).is_none());
}

#[test]
fn forgetting_through_remote_keeps_local_data() {
    let mut harness = Harness::connected();
    let wifi = Arc::new(MockProvider::local("wifi"));
    harness
        .engine
        .handle(Event::DeviceAppeared {
            device: drone(),
            model: DeviceModel::Anafi4k,
            name: "Anafi".to_string(),
            provider: wifi.clone(),
        })
        .unwrap();
    harness.known(&drone(), ListFlags::FIRST | ListFlags::LAST);
    assert!(harness.relays(&drone()));

    let dictionary = harness.engine.drone(&drone()).unwrap().dictionary().clone();
    dictionary.put("nickname", "scout".to_string());
    dictionary.commit().unwrap();

    harness.engine.forget_remote_drone(&remote(), &drone()).unwrap();
    assert!(harness
        .backend
        .has_sent(&Command::DroneManager(DroneManagerMessage::Forget { device: drone() })));
    assert!(wifi.forgotten().is_empty());
    assert_eq!(dictionary.get("nickname"), Some("scout".to_string()));

    // the remote control confirms, the drone stays reachable over wifi
    harness.known(&drone(), ListFlags::REMOVE);
    let controller = harness.engine.drone(&drone()).unwrap();
    assert!(controller.provider(REMOTE).is_none());
    assert!(controller.provider("wifi").is_some());
    assert_eq!(dictionary.get("nickname"), Some("scout".to_string()));
}

#[test]
fn remote_power_off_disarms_reconnection() {
    let mut harness = Harness::connected();
    harness.receive(
        &remote(),
        Command::SkyController(SkyControllerMessage::Shutdown(
            groundlink::protocol::ShutdownReason::PowerOffButton,
        )),
    );

    let coordinator = harness.engine.remote(&remote()).unwrap();
    assert_eq!(coordinator.controller().state(), ConnectionState::Disconnecting);
    assert_eq!(coordinator.controller().cause(), ConnectionCause::UserRequested);
    assert!(!coordinator.controller().is_auto_reconnect_armed());
}
