// Message types published by the status loop

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::trex::Telemetry;

/// Payload encoding for published telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusFormat {
    /// Comma-separated readings
    #[default]
    Csv,
    /// JSON object
    Json,
}

impl StatusFormat {
    pub fn encode(self, telemetry: &Telemetry) -> Result<String, serde_json::Error> {
        match self {
            StatusFormat::Csv => Ok(telemetry.to_delimited_line()),
            StatusFormat::Json => serde_json::to_string(telemetry),
        }
    }
}

/// Health status published alongside telemetry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PublisherHealth {
    Ok,
    ReadFailed,
}
