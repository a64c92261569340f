// src/config.rs
use crate::drivers::decoder::DEFAULT_MAX_PARTIAL_LINE_BYTES;
use crate::drivers::ConfigError;
use log::info;
use serde::Deserialize;
use std::path::Path;
/// Env var naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SEISMIC_PANEL_CONFIG";
/// Picked up from the working directory when the env var is unset.
pub const DEFAULT_CONFIG_FILE: &str = "seismic_panel.json";
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    /// Fixed port name; when unset the port is found by USB id.
    pub port_name: Option<String>,
    pub baud_rate: u32,
    pub usb_vendor_id: u16,
    pub usb_product_id: u16,
    pub read_timeout_ms: u64,
    pub max_partial_line_bytes: usize,
    /// Noise amplitude of the simulated device.
    pub simulated_noise: f64,
}
impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            port_name: None,
            baud_rate: 115_200,
            usb_vendor_id: 0x2E8A,
            usb_product_id: 0x000A,
            read_timeout_ms: 50,
            max_partial_line_bytes: DEFAULT_MAX_PARTIAL_LINE_BYTES,
            simulated_noise: 8.0,
        }
    }
}
impl PanelConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
    /// Env var path, else `seismic_panel.json` if present, else defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            info!("Loading config from {path} ({CONFIG_ENV_VAR}).");
            return Self::from_file(Path::new(&path));
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            info!("Loading config from {}.", fallback.display());
            return Self::from_file(fallback);
        }
        Ok(Self::default())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    #[test]
    fn missing_fields_take_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port_name": "/dev/ttyACM1", "baud_rate": 9600}}"#).unwrap();
        let config = PanelConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port_name.as_deref(), Some("/dev/ttyACM1"));
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.usb_vendor_id, 0x2E8A);
        assert_eq!(config.usb_product_id, 0x000A);
        assert_eq!(config.max_partial_line_bytes, DEFAULT_MAX_PARTIAL_LINE_BYTES);
    }
    #[test]
    fn unknown_field_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"window_seconds": 30}}"#).unwrap();
        let err = PanelConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PanelConfig::from_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
