use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use anyhow::{Context, Result};
use log::{debug, info, trace};
use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use crate::config::PanelConfig;
use crate::drivers::TransportError;
/// Result of a single read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were written to the front of the buffer.
    Data(usize),
    /// The read timed out with nothing to deliver.
    Idle,
    /// The device ended the stream.
    Closed,
}
/// Byte stream to and from the device.
pub trait Transport: Send {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError>;
    fn write_payload(&mut self, payload: &[u8]) -> Result<(), TransportError>;
    fn describe(&self) -> String;
}
/// The real device behind a serial port.
pub struct SerialTransport {
    port_name: String,
    port: Box<dyn SerialPort>,
}
impl SerialTransport {
    /// Opens the configured port, or the first USB port matching the
    /// configured vendor/product id.
    pub fn open(config: &PanelConfig) -> Result<Self> {
        let port_name = match &config.port_name {
            Some(name) => name.clone(),
            None => find_device_port(config.usb_vendor_id, config.usb_product_id)?.port_name,
        };
        info!("Opening {} at {} baud.", port_name, config.baud_rate);
        let port = serialport::new(&port_name, config.baud_rate)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()
            .with_context(|| format!("failed to open serial port {port_name}"))?;
        Ok(Self { port_name, port })
    }
}
impl Transport for SerialTransport {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
        match self.port.read(buf) {
            Ok(0) => Ok(ReadOutcome::Closed),
            Ok(n) => {
                trace!("Received {} bytes", n);
                Ok(ReadOutcome::Data(n))
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                Ok(ReadOutcome::Idle)
            }
            Err(e) => Err(e.into()),
        }
    }
    fn write_payload(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(payload)?;
        self.port.flush()?;
        debug!("Wrote {} bytes to {}.", payload.len(), self.port_name);
        Ok(())
    }
    fn describe(&self) -> String {
        format!("serial {}", self.port_name)
    }
}
fn find_device_port(vendor_id: u16, product_id: u16) -> Result<SerialPortInfo, TransportError> {
    let ports = serialport::available_ports()?;
    trace!("Found {} ports to check.", ports.len());
    ports
        .into_iter()
        .find(|port| is_device_port(&port.port_type, vendor_id, product_id))
        .ok_or(TransportError::NoMatchingPort {
            vendor_id,
            product_id,
        })
}
fn is_device_port(port_type: &SerialPortType, vendor_id: u16, product_id: u16) -> bool {
    match port_type {
        SerialPortType::UsbPort(usb) => usb.vid == vendor_id && usb.pid == product_id,
        _ => false,
    }
}
