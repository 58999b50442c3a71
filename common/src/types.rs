use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    devices::{ControlMode, Device},
    schedule::Schedule,
};

pub type DeviceStates = BTreeMap<Device, bool>;

pub fn all_off() -> DeviceStates {
    Device::ALL.into_iter().map(|device| (device, false)).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusPayload(pub HashMap<String, i64>);

impl StatusPayload {
    pub fn to_states(&self) -> DeviceStates {
        Device::ALL
            .into_iter()
            .map(|device| (device, self.0.get(device.channel()) == Some(&1)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModePayload {
    pub mode: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default, alias = "soilHumidity")]
    pub soil_moisture: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraToggle {
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraServiceStatus {
    pub status: String,
    pub camera: bool,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub connected_clients: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlStatus {
    pub mode: ControlMode,
    pub mode_confirmed: bool,
    pub devices: DeviceStates,
    pub schedule: Schedule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_schedule: Option<Schedule>,
    pub sensor: Option<SensorSnapshot>,
    pub last_synced_at: Option<DateTime<Utc>>,
}
