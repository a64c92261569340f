use std::time::{SystemTime, UNIX_EPOCH};
use log::{debug, trace};
use crate::drivers::transport::{ReadOutcome, Transport};
use crate::drivers::{
    ChartFrame, DeviceCommand, LineDecoder, Sample, SeriesStore, SessionError,
};
const READ_BUFFER_BYTES: usize = 1024;
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// A chunk arrived and produced this many samples (possibly zero).
    Samples(usize),
    Idle,
    /// End of stream; the session is finished.
    Ended,
}
/// One connection to the device. Owns the transport, the decoder state and
/// the series buffer; dropping it ends the connection.
pub struct Session {
    transport: Box<dyn Transport>,
    decoder: LineDecoder,
    store: SeriesStore,
    read_buf: Vec<u8>,
}
impl Session {
    pub fn new(transport: Box<dyn Transport>, max_partial_line_bytes: usize) -> Self {
        Self {
            transport,
            decoder: LineDecoder::with_max_partial(max_partial_line_bytes),
            store: SeriesStore::new(),
            read_buf: vec![0; READ_BUFFER_BYTES],
        }
    }
    pub fn describe(&self) -> String {
        self.transport.describe()
    }
    pub fn store(&self) -> &SeriesStore {
        &self.store
    }
    pub fn frame(&self) -> Option<ChartFrame> {
        self.store.frame()
    }
    /// Reads once and stamps every decoded sample with the current time.
    pub fn poll(&mut self) -> Result<PollOutcome, SessionError> {
        self.poll_at(now_seconds())
    }
    pub fn poll_at(&mut self, now: f64) -> Result<PollOutcome, SessionError> {
        match self
            .transport
            .read_chunk(&mut self.read_buf)
            .map_err(SessionError::Read)?
        {
            ReadOutcome::Data(n) => {
                let values = self.decoder.feed_bytes(&self.read_buf[..n]);
                trace!("Decoded {} samples from {} bytes.", values.len(), n);
                for &value in &values {
                    self.store.append(Sample::new(now, value));
                }
                Ok(PollOutcome::Samples(values.len()))
            }
            ReadOutcome::Idle => Ok(PollOutcome::Idle),
            ReadOutcome::Closed => Ok(PollOutcome::Ended),
        }
    }
    pub fn send(&mut self, command: DeviceCommand) -> Result<(), SessionError> {
        self.transport
            .write_payload(command.payload().as_bytes())
            .map_err(|source| SessionError::Write {
                command: command.payload(),
                source,
            })?;
        debug!("Sent {}.", command);
        Ok(())
    }
}
/// Sends `command` if a session is active; without one this does nothing.
pub fn dispatch(session: Option<&mut Session>, command: DeviceCommand) -> Result<(), SessionError> {
    match session {
        Some(session) => session.send(command),
        None => {
            debug!("No active session, ignoring {}.", command);
            Ok(())
        }
    }
}
pub fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::transport::scripted::{ScriptedTransport, Step};
    #[test]
    fn chunks_flow_into_the_store() {
        let transport = ScriptedTransport::text(&["12.5\n7", "\nabc\n", "-3\n"]);
        let mut session = Session::new(Box::new(transport), 64);
        assert_eq!(session.poll_at(100.0).unwrap(), PollOutcome::Samples(1));
        assert_eq!(session.poll_at(101.0).unwrap(), PollOutcome::Samples(1));
        assert_eq!(session.poll_at(102.0).unwrap(), PollOutcome::Samples(1));
        assert_eq!(session.poll_at(103.0).unwrap(), PollOutcome::Ended);
        let frame = session.frame().unwrap();
        assert_eq!(frame.points, vec![[100.0, 12.5], [101.0, 7.0], [102.0, -3.0]]);
        assert_eq!(frame.bounds.x_min, 92.0);
        assert_eq!(frame.bounds.y_max, 250.0);
    }
    #[test]
    fn idle_and_read_errors() {
        let transport = ScriptedTransport::new([Step::Idle, Step::Fail]);
        let mut session = Session::new(Box::new(transport), 64);
        assert_eq!(session.poll().unwrap(), PollOutcome::Idle);
        assert!(matches!(session.poll(), Err(SessionError::Read(_))));
        assert!(session.store().is_empty());
    }
    #[test]
    fn commands_are_written_verbatim() {
        let transport = ScriptedTransport::text(&[]);
        let written = transport.written();
        let mut session = Session::new(Box::new(transport), 64);
        dispatch(Some(&mut session), DeviceCommand::Gain16).unwrap();
        dispatch(Some(&mut session), DeviceCommand::Zero).unwrap();
        dispatch(Some(&mut session), DeviceCommand::Bootloader).unwrap();
        assert_eq!(*written.lock().unwrap(), vec!["16", "z", "r"]);
    }
    #[test]
    fn dispatch_without_session_is_a_no_op() {
        for command in DeviceCommand::ALL {
            assert!(dispatch(None, command).is_ok());
        }
    }
    #[test]
    fn write_failure_names_the_command() {
        let transport = ScriptedTransport::text(&[]).failing_writes();
        let mut session = Session::new(Box::new(transport), 64);
        let err = session.send(DeviceCommand::Input2).unwrap_err();
        assert!(matches!(err, SessionError::Write { command: "y", .. }));
    }
}
