use std::collections::VecDeque;
use std::f64::consts::PI;
use std::thread;
use std::time::{Duration, Instant};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use crate::drivers::transport::{ReadOutcome, Transport};
use crate::drivers::{DeviceCommand, TransportError};
/// Longest a simulated read waits for the next sample, like a serial timeout.
const READ_TIMEOUT: Duration = Duration::from_millis(20);
/// Stand-in for the real device. Emits one decimal sample per line at the
/// selected rate and reacts to the same command payloads.
pub struct SimulatedDevice {
    rng: StdRng,
    outbound: VecDeque<u8>,
    last_emit: Instant,
    sample_rate_hz: f64,
    gain: f64,
    offset: f64,
    input: u8,
    noise: f64,
    emitted: u64,
    last_raw: f64,
    closed: bool,
}
impl SimulatedDevice {
    pub fn new(noise: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), noise)
    }
    #[cfg(test)]
    pub fn with_seed(seed: u64, noise: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), noise)
    }
    fn with_rng(rng: StdRng, noise: f64) -> Self {
        Self {
            rng,
            outbound: VecDeque::new(),
            last_emit: Instant::now(),
            sample_rate_hz: 25.0,
            gain: 1.0,
            offset: 0.0,
            input: 1,
            noise: noise.abs(),
            emitted: 0,
            last_raw: 0.0,
            closed: false,
        }
    }
    #[cfg(test)]
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }
    #[cfg(test)]
    pub fn gain(&self) -> f64 {
        self.gain
    }
    /// Queues `count` sample lines for the next reads.
    pub fn queue_samples(&mut self, count: usize) {
        for _ in 0..count {
            let value = self.next_value();
            self.push_line(&format!("{value:.3}"));
        }
    }
    fn next_value(&mut self) -> f64 {
        let t = self.emitted as f64 / self.sample_rate_hz;
        self.emitted += 1;
        let signal = match self.input {
            1 => 40.0 * (2.0 * PI * 1.5 * t).sin(),
            _ => 120.0 * (2.0 * PI * 0.25 * t).sin().signum() + 15.0 * (2.0 * PI * 4.0 * t).sin(),
        };
        let noise = if self.noise > 0.0 {
            self.rng.gen_range(-self.noise..self.noise)
        } else {
            0.0
        };
        self.last_raw = self.gain * (signal + noise);
        self.last_raw - self.offset
    }
    fn push_line(&mut self, line: &str) {
        self.outbound.extend(line.as_bytes());
        self.outbound.push_back(b'\n');
    }
    fn apply(&mut self, command: DeviceCommand) {
        match command {
            DeviceCommand::Zero => self.offset = self.last_raw,
            DeviceCommand::Gain1 => self.gain = 1.0,
            DeviceCommand::Gain2 => self.gain = 2.0,
            DeviceCommand::Gain4 => self.gain = 4.0,
            DeviceCommand::Gain8 => self.gain = 8.0,
            DeviceCommand::Gain16 => self.gain = 16.0,
            DeviceCommand::Sps25 => self.sample_rate_hz = 25.0,
            DeviceCommand::Sps50 => self.sample_rate_hz = 50.0,
            DeviceCommand::Sps100 => self.sample_rate_hz = 100.0,
            DeviceCommand::Input1 => self.input = 1,
            DeviceCommand::Input2 => self.input = 2,
            DeviceCommand::Bootloader => {
                info!("Simulated device rebooting into bootloader.");
                self.closed = true;
            }
        }
    }
    /// Samples owed at `now`. The emit clock only advances by the samples
    /// actually produced, so the fractional remainder carries to the next read.
    fn samples_due_at(&mut self, now: Instant) -> usize {
        let elapsed = now.saturating_duration_since(self.last_emit).as_secs_f64();
        let owed = (elapsed * self.sample_rate_hz).floor();
        // Never burst more than a second of backlog.
        if owed > self.sample_rate_hz {
            self.last_emit = now;
            return self.sample_rate_hz as usize;
        }
        let due = owed as usize;
        if due > 0 {
            self.last_emit += Duration::from_secs_f64(due as f64 / self.sample_rate_hz);
        }
        due
    }
}
impl Transport for SimulatedDevice {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
        if self.outbound.is_empty() {
            if self.closed {
                return Ok(ReadOutcome::Closed);
            }
            let due = self.samples_due_at(Instant::now());
            if due == 0 {
                thread::sleep(READ_TIMEOUT);
                return Ok(ReadOutcome::Idle);
            }
            self.queue_samples(due);
        }
        let n = self.outbound.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(self.outbound.drain(..n)) {
            *slot = byte;
        }
        Ok(ReadOutcome::Data(n))
    }
    fn write_payload(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let text = String::from_utf8_lossy(payload);
        match DeviceCommand::from_payload(&text) {
            Some(command) => {
                self.push_line(&format!("# ack {}", command.payload()));
                self.apply(command);
            }
            None => self.push_line(&format!("# unknown command {text:?}")),
        }
        Ok(())
    }
    fn describe(&self) -> String {
        "simulated device".to_owned()
    }
}
