use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
    #[error("unknown mode code: {0}")]
    UnknownModeCode(i64),
    #[error("unknown mode: {0}")]
    UnknownMode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Device {
    #[serde(rename = "Đèn sợi đốt")]
    Lamp,
    #[serde(rename = "Máy bơm nước")]
    WaterPump,
    #[serde(rename = "Máy phun sương")]
    Mister,
    #[serde(rename = "Camera")]
    Camera,
}

impl Device {
    pub const ALL: [Device; 4] = [Self::Lamp, Self::WaterPump, Self::Mister, Self::Camera];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Lamp => "Đèn sợi đốt",
            Self::WaterPump => "Máy bơm nước",
            Self::Mister => "Máy phun sương",
            Self::Camera => "Camera",
        }
    }

    pub fn channel(self) -> &'static str {
        match self {
            Self::Lamp => "led1",
            Self::WaterPump => "led2",
            Self::Mister => "led3",
            Self::Camera => "led4",
        }
    }

    pub fn schedule_id(self) -> u8 {
        match self {
            Self::Lamp => 1,
            Self::WaterPump => 2,
            Self::Mister => 3,
            Self::Camera => 4,
        }
    }

    pub fn from_channel(channel: &str) -> Result<Self, RegistryError> {
        Self::ALL
            .into_iter()
            .find(|device| device.channel() == channel)
            .ok_or_else(|| RegistryError::UnknownChannel(channel.to_string()))
    }

    pub fn from_display_name(name: &str) -> Result<Self, RegistryError> {
        Self::ALL
            .into_iter()
            .find(|device| device.display_name() == name)
            .ok_or_else(|| RegistryError::UnknownDevice(name.to_string()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Device {
    type Err = RegistryError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::from_display_name(text)
            .or_else(|_| Self::from_channel(text))
            .map_err(|_| RegistryError::UnknownDevice(text.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    #[default]
    Manual,
    Schedule,
    Sensor,
}

impl ControlMode {
    pub const ALL: [ControlMode; 3] = [Self::Manual, Self::Schedule, Self::Sensor];

    pub fn code(self) -> u8 {
        match self {
            Self::Manual => 0,
            Self::Schedule => 1,
            Self::Sensor => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, RegistryError> {
        match code {
            0 => Ok(Self::Manual),
            1 => Ok(Self::Schedule),
            2 => Ok(Self::Sensor),
            other => Err(RegistryError::UnknownModeCode(other)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Schedule => "schedule",
            Self::Sensor => "sensor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Schedule => "Schedule",
            Self::Sensor => "Sensor",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlMode {
    type Err = RegistryError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return Self::from_code(code);
        }
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RegistryError::UnknownMode(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_mapping_is_bidirectional() {
        for device in Device::ALL {
            assert_eq!(Device::from_channel(device.channel()), Ok(device));
            assert_eq!(Device::from_display_name(device.display_name()), Ok(device));
        }
        assert_eq!(Device::Camera.channel(), "led4");
        assert_eq!(Device::from_channel("led1"), Ok(Device::Lamp));
    }

    #[test]
    fn schedule_ids_follow_registry_order() {
        let ids: Vec<u8> = Device::ALL.iter().map(|device| device.schedule_id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert_eq!(
            Device::from_channel("led9"),
            Err(RegistryError::UnknownChannel("led9".to_string()))
        );
        assert_eq!(
            "Heater".parse::<Device>(),
            Err(RegistryError::UnknownDevice("Heater".to_string()))
        );
        assert_eq!(ControlMode::from_code(3), Err(RegistryError::UnknownModeCode(3)));
    }

    #[test]
    fn device_parses_from_name_or_channel() {
        assert_eq!("Máy bơm nước".parse::<Device>(), Ok(Device::WaterPump));
        assert_eq!("led3".parse::<Device>(), Ok(Device::Mister));
    }

    #[test]
    fn mode_codes_round_trip() {
        for mode in ControlMode::ALL {
            assert_eq!(ControlMode::from_code(mode.code() as i64), Ok(mode));
        }
        assert_eq!(ControlMode::from_code(1), Ok(ControlMode::Schedule));
        assert_eq!(ControlMode::from_code(2), Ok(ControlMode::Sensor));
        assert_eq!("SENSOR".parse::<ControlMode>(), Ok(ControlMode::Sensor));
        assert_eq!("0".parse::<ControlMode>(), Ok(ControlMode::Manual));
    }

    #[test]
    fn device_serializes_by_display_name() {
        assert_eq!(
            serde_json::to_string(&Device::Lamp).unwrap(),
            "\"Đèn sợi đốt\""
        );
    }
}
