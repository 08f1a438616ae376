// Bus addressing, command codes, topics and board calibration
use serde::{Deserialize, Serialize};
use std::path::Path;

// I2C device node the T'Rex is wired to (Raspberry Pi bus 1)
pub const I2C_DEVICE: &str = "/dev/i2c-1";

// 7-bit slave address of the T'Rex controller
pub const TREX_ADDRESS: u8 = 0x07;

// Command code for writing the full register block
pub const REGISTER_COMMAND: u8 = 15;

// Command code for reading the status block
pub const STATUS_COMMAND: u8 = 240;

// Status publishing frequency
pub const PUBLISH_HZ: u64 = 50;

// Zenoh topics
pub const TOPIC_STATUS: &str = "trex/state/status"; // telemetry lines
pub const TOPIC_HEALTH: &str = "trex/state/health"; // publisher health

/// Battery reference written to registers 22-23 unless overridden (2, 38)
pub const DEFAULT_BATTERY_REFERENCE: u16 = 550;

/// Error loading a calibration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read calibration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid calibration file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-board calibration.
///
/// Boards disagree on the battery reference and on a fixed error in the
/// reported voltage, so both are settable instead of baked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Value packed into the battery-voltage reference registers
    pub battery_reference: u16,
    /// Added to every decoded battery voltage reading
    pub voltage_offset: i32,
    /// Report the previous-command status byte with each reading
    pub command_echo: bool,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            battery_reference: DEFAULT_BATTERY_REFERENCE,
            voltage_offset: 0,
            command_echo: true,
        }
    }
}

impl Calibration {
    /// Load calibration from a JSON file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_calibration_keeps_defaults() {
        let cal = Calibration::from_json(r#"{ "voltage_offset": 8 }"#).unwrap();
        assert_eq!(cal.voltage_offset, 8);
        assert_eq!(cal.battery_reference, DEFAULT_BATTERY_REFERENCE);
        assert!(cal.command_echo);
    }

    #[test]
    fn test_full_calibration() {
        let cal = Calibration::from_json(
            r#"{ "battery_reference": 600, "voltage_offset": -3, "command_echo": false }"#,
        )
        .unwrap();
        assert_eq!(
            cal,
            Calibration {
                battery_reference: 600,
                voltage_offset: -3,
                command_echo: false,
            }
        );
    }

    #[test]
    fn test_malformed_calibration() {
        let err = Calibration::from_json("{ battery_reference: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_calibration_file() {
        let err = Calibration::load(Path::new("/nonexistent/trex-calibration.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
