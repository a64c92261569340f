// src/engine.rs
use crate::config::PanelConfig;
use crate::drivers::{
    dispatch, DeviceCommand, PollOutcome, SerialTransport, Session, SimulatedDevice, Transport,
};
use crate::types::*;
use log::{debug, error, info, warn};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Opens a transport for the chosen mode.
pub type Connector = Box<dyn FnMut(ConnectionMode) -> anyhow::Result<Box<dyn Transport>> + Send>;
/// Called after every message so an idle GUI wakes up and drains its channel.
pub type Waker = Box<dyn Fn() + Send>;

// 每轮最多处理的 GUI 命令数
const COMMANDS_PER_TURN: usize = 10;
const IDLE_SLEEP: Duration = Duration::from_millis(50);

pub fn spawn_thread(
    tx: Sender<PanelMessage>,
    rx_cmd: Receiver<GuiCommand>,
    config: PanelConfig,
    waker: Waker,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let max_partial = config.max_partial_line_bytes;
        let mut engine =
            Engine::new(tx, default_connector(config), max_partial).with_waker(waker);
        engine.log("Engine ready.");
        engine.run(&rx_cmd);
        info!("Engine stopped.");
    })
}

fn default_connector(config: PanelConfig) -> Connector {
    Box::new(move |mode: ConnectionMode| -> anyhow::Result<Box<dyn Transport>> {
        match mode {
            ConnectionMode::Simulation => Ok(Box::new(SimulatedDevice::new(config.simulated_noise))),
            ConnectionMode::Hardware => Ok(Box::new(SerialTransport::open(&config)?)),
        }
    })
}

/// The single read loop. Owns the session; the GUI only talks to it through
/// the two channels.
pub struct Engine {
    tx: Sender<PanelMessage>,
    connector: Connector,
    waker: Waker,
    session: Option<Session>,
    max_partial_line_bytes: usize,
}

impl Engine {
    pub fn new(tx: Sender<PanelMessage>, connector: Connector, max_partial_line_bytes: usize) -> Self {
        Self {
            tx,
            connector,
            waker: Box::new(|| {}),
            session: None,
            max_partial_line_bytes,
        }
    }

    pub fn with_waker(mut self, waker: Waker) -> Self {
        self.waker = waker;
        self
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Runs until the GUI drops its command sender.
    pub fn run(&mut self, rx_cmd: &Receiver<GuiCommand>) {
        loop {
            // 1. 消息处理 (处理 GUI 发来的命令)
            for _ in 0..COMMANDS_PER_TURN {
                match rx_cmd.try_recv() {
                    Ok(cmd) => self.handle_command(cmd),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if self.session.take().is_some() {
                            info!("GUI closed, dropping session.");
                        }
                        return;
                    }
                }
            }
            // 2. 数据流
            if !self.pump_once() {
                thread::sleep(IDLE_SLEEP);
            }
        }
    }

    pub fn handle_command(&mut self, cmd: GuiCommand) {
        match cmd {
            GuiCommand::Connect(mode) => self.connect(mode),
            GuiCommand::Disconnect => {
                if self.session.take().is_some() {
                    self.log("Disconnected.");
                }
                self.status(SessionState::Disconnected);
            }
            GuiCommand::Send(command) => self.send(command),
        }
    }

    /// One read on the active session. Returns false when there is none.
    pub fn pump_once(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        match session.poll() {
            Ok(PollOutcome::Samples(0)) | Ok(PollOutcome::Idle) => {}
            Ok(PollOutcome::Samples(n)) => {
                let store = session.store();
                debug!(
                    "{} new samples, {} retained, latest {:?}.",
                    n,
                    store.len(),
                    store.latest()
                );
                if let Some(frame) = session.frame() {
                    self.emit(PanelMessage::Frame(frame));
                }
            }
            Ok(PollOutcome::Ended) => self.end_session("Device closed the stream."),
            Err(e) => {
                error!("{e}");
                self.end_session(&format!("Stream error: {e}"));
            }
        }
        true
    }

    fn connect(&mut self, mode: ConnectionMode) {
        if let Some(session) = &self.session {
            warn!("Connect requested while connected to {}.", session.describe());
            return;
        }
        self.status(SessionState::Connecting);
        match (self.connector)(mode) {
            Ok(transport) => {
                let session = Session::new(transport, self.max_partial_line_bytes);
                self.log(&format!("Connected to {}.", session.describe()));
                self.session = Some(session);
                self.status(SessionState::Connected);
            }
            Err(e) => {
                error!("Error connecting to serial port: {e:#}");
                self.log(&format!("Connect failed: {e:#}"));
                self.status(SessionState::Disconnected);
            }
        }
    }

    fn send(&mut self, command: DeviceCommand) {
        if let Err(e) = dispatch(self.session.as_mut(), command) {
            warn!("{e}");
            self.end_session(&format!("Write failed: {e}"));
        }
    }

    fn end_session(&mut self, reason: &str) {
        self.session = None;
        self.log(reason);
        self.status(SessionState::Disconnected);
    }

    fn emit(&self, msg: PanelMessage) {
        if self.tx.send(msg).is_ok() {
            (self.waker)();
        }
    }

    fn status(&self, state: SessionState) {
        self.emit(PanelMessage::Status(state));
    }

    fn log(&self, msg: &str) {
        info!("{msg}");
        self.emit(PanelMessage::Log(msg.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::transport::scripted::{ScriptedTransport, Step};
    use std::sync::mpsc::channel;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn connector_from(slot: Arc<Mutex<Option<ScriptedTransport>>>) -> Connector {
        Box::new(move |_mode: ConnectionMode| -> anyhow::Result<Box<dyn Transport>> {
            slot.lock()
                .unwrap()
                .take()
                .map(|t| Box::new(t) as Box<dyn Transport>)
                .ok_or_else(|| anyhow::anyhow!("no device"))
        })
    }

    fn engine_with(transport: ScriptedTransport) -> (Engine, Receiver<PanelMessage>) {
        let (tx, rx) = channel();
        let slot = Arc::new(Mutex::new(Some(transport)));
        (Engine::new(tx, connector_from(slot), 256), rx)
    }

    fn statuses(rx: &Receiver<PanelMessage>) -> Vec<SessionState> {
        rx.try_iter()
            .filter_map(|m| match m {
                PanelMessage::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn connect_streams_frames_until_end_of_stream() {
        let (mut engine, rx) = engine_with(ScriptedTransport::text(&["1\n2\n", "noise\n", "3\n"]));
        engine.handle_command(GuiCommand::Connect(ConnectionMode::Hardware));
        assert!(engine.is_connected());
        assert_eq!(
            statuses(&rx),
            vec![SessionState::Connecting, SessionState::Connected]
        );
        assert!(engine.pump_once());
        assert!(engine.pump_once());
        assert!(engine.pump_once());
        let frames: Vec<_> = rx
            .try_iter()
            .filter_map(|m| match m {
                PanelMessage::Frame(f) => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(frames.len(), 2);
        let values: Vec<f64> = frames[1].points.iter().map(|p| p[1]).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert!(engine.pump_once());
        assert!(!engine.is_connected());
        assert_eq!(statuses(&rx), vec![SessionState::Disconnected]);
        assert!(!engine.pump_once());
    }

    #[test]
    fn failed_connect_leaves_controls_disabled() {
        let (tx, rx) = channel();
        let mut engine = Engine::new(tx, connector_from(Arc::default()), 256);
        engine.handle_command(GuiCommand::Connect(ConnectionMode::Hardware));
        assert!(!engine.is_connected());
        assert_eq!(
            statuses(&rx),
            vec![SessionState::Connecting, SessionState::Disconnected]
        );
    }

    #[test]
    fn write_failure_ends_session() {
        let (mut engine, rx) = engine_with(ScriptedTransport::new([Step::Idle]).failing_writes());
        engine.handle_command(GuiCommand::Connect(ConnectionMode::Hardware));
        rx.try_iter().count();
        engine.handle_command(GuiCommand::Send(DeviceCommand::Gain8));
        assert!(!engine.is_connected());
        assert_eq!(statuses(&rx), vec![SessionState::Disconnected]);
    }

    #[test]
    fn read_error_ends_session() {
        let (mut engine, rx) = engine_with(ScriptedTransport::new([Step::Fail]));
        engine.handle_command(GuiCommand::Connect(ConnectionMode::Hardware));
        rx.try_iter().count();
        engine.pump_once();
        assert!(!engine.is_connected());
        assert_eq!(statuses(&rx), vec![SessionState::Disconnected]);
    }

    #[test]
    fn commands_without_session_do_nothing() {
        let (mut engine, rx) = engine_with(ScriptedTransport::text(&[]));
        for command in DeviceCommand::ALL {
            engine.handle_command(GuiCommand::Send(command));
        }
        assert!(rx.try_iter().next().is_none());
    }

    #[test]
    fn commands_reach_the_device() {
        let transport = ScriptedTransport::text(&[]);
        let written = transport.written();
        let (mut engine, _rx) = engine_with(transport);
        engine.handle_command(GuiCommand::Connect(ConnectionMode::Hardware));
        engine.handle_command(GuiCommand::Send(DeviceCommand::Sps100));
        engine.handle_command(GuiCommand::Send(DeviceCommand::Input1));
        assert_eq!(*written.lock().unwrap(), vec!["c", "x"]);
    }

    #[test]
    fn reconnect_starts_with_a_fresh_buffer() {
        let (tx, rx) = channel();
        let slot = Arc::new(Mutex::new(Some(ScriptedTransport::text(&["5\n"]))));
        let mut engine = Engine::new(tx, connector_from(slot.clone()), 256);
        engine.handle_command(GuiCommand::Connect(ConnectionMode::Hardware));
        engine.pump_once();
        engine.handle_command(GuiCommand::Disconnect);
        *slot.lock().unwrap() = Some(ScriptedTransport::text(&["6\n"]));
        engine.handle_command(GuiCommand::Connect(ConnectionMode::Hardware));
        engine.pump_once();
        let last = rx
            .try_iter()
            .filter_map(|m| match m {
                PanelMessage::Frame(f) => Some(f),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(last.points.len(), 1);
        assert_eq!(last.points[0][1], 6.0);
    }

    #[test]
    fn every_message_wakes_the_gui() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let (tx, rx) = channel();
        let slot = Arc::new(Mutex::new(Some(ScriptedTransport::text(&["1\n"]))));
        let mut engine = Engine::new(tx, connector_from(slot), 256).with_waker(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        engine.handle_command(GuiCommand::Connect(ConnectionMode::Hardware));
        engine.pump_once();
        let sent = rx.try_iter().count();
        assert_eq!(sent, 4);
        assert_eq!(wakes.load(Ordering::SeqCst), sent);
    }

    #[test]
    fn failed_connect_wakes_the_gui() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let (tx, rx) = channel();
        let mut engine = Engine::new(tx, connector_from(Arc::default()), 256).with_waker(
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        engine.handle_command(GuiCommand::Connect(ConnectionMode::Simulation));
        assert_eq!(statuses(&rx).last(), Some(&SessionState::Disconnected));
        assert!(wakes.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn run_exits_when_gui_goes_away() {
        let (mut engine, _rx) = engine_with(ScriptedTransport::text(&[]));
        let (tx_cmd, rx_cmd) = channel();
        tx_cmd.send(GuiCommand::Connect(ConnectionMode::Hardware)).unwrap();
        drop(tx_cmd);
        engine.run(&rx_cmd);
        assert!(!engine.is_connected());
    }
}
