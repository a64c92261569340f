use thiserror::Error;
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no serial port matches usb id {vendor_id:04x}:{product_id:04x}")]
    NoMatchingPort { vendor_id: u16, product_id: u16 },
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("i/o error on transport: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport is closed")]
    Closed,
}
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("read from device failed: {0}")]
    Read(#[source] TransportError),
    #[error("write of command {command:?} failed: {source}")]
    Write {
        command: &'static str,
        #[source]
        source: TransportError,
    },
}
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
