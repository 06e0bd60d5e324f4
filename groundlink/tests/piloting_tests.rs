use std::sync::{Arc, Once};

use groundlink::core::event::{DeviceEvent, Event};
use groundlink::core::scheduler::ManualScheduler;
use groundlink::engine::{Engine, EngineConf};
use groundlink::piloting::{ActivationState, InterfaceKind, PilotingCommand};
use groundlink::protocol::{CommonMessage, FlyingState, PilotingMessage, ReturnHomeState};
use groundlink::test_utils::{EventLog, MockBackend, MockProvider, MockRecorder, ProbeFactory};

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

fn drone() -> DeviceId {
    DeviceId::new("usa")
}

struct Harness {
    engine: Engine,
    sink: Arc<EventLog>,
    recorder: Arc<MockRecorder>,
    backend: Arc<MockBackend>,
}

impl Harness {
    /// Engine with a connected drone supporting return home and follow me.
    fn connected() -> Self {
        initialize();

        let sink = Arc::new(EventLog::new());
        let recorder = Arc::new(MockRecorder::new());
        let mut engine = EngineConf::builder()
            .scheduler(Arc::new(ManualScheduler::new()))
            .sink(sink.clone())
            .recorder(recorder.clone())
            .components(Arc::new(
                ProbeFactory::new().with_interfaces([InterfaceKind::FollowMe]),
            ))
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
                device: drone(),
                model: DeviceModel::AnafiUsa,
                name: "USA".to_string(),
                provider: Arc::new(MockProvider::local("wifi")),
            })
            .unwrap();
        harness.engine.connect(&drone(), None, None).unwrap();
        harness
            .engine
            .handle(Event::LinkConnected {
                device: drone(),
                connector: "wifi".to_string(),
                backend: harness.backend.clone(),
            })
            .unwrap();
        harness
            .engine
            .handle(Event::ProxyChannelOpened {
                device: drone(),
                endpoint: None,
            })
            .unwrap();
        harness.receive(Command::Common(CommonMessage::AllSettingsChanged));
        harness.receive(Command::Common(CommonMessage::AllStatesChanged));
        harness
    }

    fn receive(&mut self, command: Command) {
        self.engine
            .handle(Event::CommandReceived {
                device: drone(),
                command,
            })
            .unwrap();
    }

    fn return_home_state(&mut self, state: ReturnHomeState) {
        self.receive(Command::Piloting(PilotingMessage::ReturnHomeStateChanged(state)));
    }

    fn current(&self) -> Option<InterfaceKind> {
        self.engine.piloting(&drone()).unwrap().current()
    }
}

#[test]
fn manual_piloting_is_default() {
    let harness = Harness::connected();
    let arbiter = harness.engine.piloting(&drone()).unwrap();

    assert!(arbiter.is_connected());
    assert_eq!(arbiter.current(), Some(InterfaceKind::Manual));
    assert!(arbiter.is_command_loop_running());
    assert_eq!(harness.backend.encoders(), 1);
    assert_eq!(
        arbiter.kinds().collect::<Vec<_>>(),
        vec![
            InterfaceKind::Manual,
            InterfaceKind::ReturnHome,
            InterfaceKind::FollowMe
        ]
    );
    assert_eq!(arbiter.state(InterfaceKind::ReturnHome), Some(ActivationState::Unavailable));
}

#[test]
fn return_home_round_trip() {
    let mut harness = Harness::connected();
    harness.return_home_state(ReturnHomeState::Available);
    assert_eq!(
        harness.engine.piloting(&drone()).unwrap().state(InterfaceKind::ReturnHome),
        Some(ActivationState::Idle)
    );

    assert!(harness
        .engine
        .activate_piloting(&drone(), InterfaceKind::ReturnHome)
        .unwrap());
    assert!(harness
        .backend
        .has_sent(&Command::Piloting(PilotingMessage::NavigateHome { start: true })));
    // pending until the drone reports it
    assert_eq!(harness.current(), None);

    harness.return_home_state(ReturnHomeState::InProgress);
    assert_eq!(harness.current(), Some(InterfaceKind::ReturnHome));
    assert_eq!(harness.backend.encoders(), 0);

    assert!(harness
        .engine
        .deactivate_piloting(&drone(), InterfaceKind::ReturnHome)
        .unwrap());
    assert!(harness
        .backend
        .has_sent(&Command::Piloting(PilotingMessage::NavigateHome { start: false })));

    harness.return_home_state(ReturnHomeState::Available);
    assert_eq!(harness.current(), Some(InterfaceKind::Manual));
    assert_eq!(harness.backend.encoders(), 1);
}

#[test]
fn reported_states_drive_interfaces() {
    let mut harness = Harness::connected();

    assert!(harness
        .engine
        .activate_piloting(&drone(), InterfaceKind::FollowMe)
        .unwrap());
    let arbiter = harness.engine.piloting(&drone()).unwrap();
    assert_eq!(arbiter.current(), None);
    assert_eq!(arbiter.next(), None);

    harness
        .engine
        .report_piloting_state(&drone(), InterfaceKind::FollowMe, ActivationState::Active)
        .unwrap();
    assert_eq!(harness.current(), Some(InterfaceKind::FollowMe));
    assert!(!harness
        .engine
        .activate_piloting(&drone(), InterfaceKind::FollowMe)
        .unwrap());

    harness
        .engine
        .handle(Event::LinkDisconnected {
            device: drone(),
            removing: false,
        })
        .unwrap();
    let arbiter = harness.engine.piloting(&drone()).unwrap();
    assert_eq!(arbiter.current(), None);
    assert!(!arbiter.is_connected());
    assert_eq!(arbiter.state(InterfaceKind::FollowMe), Some(ActivationState::Unavailable));
}

#[test]
fn command_values_follow_active_interface() {
    let mut harness = Harness::connected();
    let command = PilotingCommand::new(10, -20, 0, 5);

    assert!(harness
        .engine
        .set_piloting_command(&drone(), InterfaceKind::Manual, command)
        .unwrap());
    assert!(!harness
        .engine
        .set_piloting_command(&drone(), InterfaceKind::Manual, command)
        .unwrap());
    assert!(!harness
        .engine
        .set_piloting_command(&drone(), InterfaceKind::FollowMe, PilotingCommand::default())
        .unwrap());
    assert_eq!(harness.engine.piloting(&drone()).unwrap().command(), command);

    assert_eq!(
        harness.backend.tick(),
        vec![Command::Piloting(PilotingMessage::Pcmd {
            flag: 1,
            roll: 10,
            pitch: 20,
            yaw: 0,
            gaz: 5,
            seq: 1,
        })]
    );

    let session = harness.recorder.last_session(&drone()).unwrap();
    assert_eq!(session.piloting(), vec![command]);
}

#[test]
fn piloting_errors() {
    let mut harness = Harness::connected();

    assert!(matches!(
        harness.engine.activate_piloting(&drone(), InterfaceKind::Guided),
        Err(Error::Device(DeviceError::UnknownInterface { .. }))
    ));
    assert!(matches!(
        harness.engine.piloting(&DeviceId::new("nobody")),
        Err(Error::Device(DeviceError::Unknown(_)))
    ));
    assert!(!harness
        .engine
        .deactivate_piloting(&drone(), InterfaceKind::Manual)
        .unwrap());
}

#[test]
fn flying_drone_disallows_data_sync() {
    let mut harness = Harness::connected();
    assert!(harness.engine.drone(&drone()).unwrap().is_data_sync_allowed());

    harness.receive(Command::Piloting(PilotingMessage::FlyingStateChanged(FlyingState::Hovering)));
    harness.receive(Command::Piloting(PilotingMessage::FlyingStateChanged(FlyingState::Landing)));
    harness.receive(Command::Piloting(PilotingMessage::FlyingStateChanged(FlyingState::Landed)));

    let sync: Vec<bool> = harness
        .sink
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            DeviceEvent::DataSyncChanged { allowed, .. } => Some(allowed),
            _ => None,
        })
        .collect();
    assert_eq!(sync, vec![true, false, true]);
}
