use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    devices::{Device, RegistryError},
    time::{self, TimeError, WallTime},
};

/// Daily on/off window for one device.
///
/// `on > off` is stored as given. Whether that means an overnight window or
/// a mistake is not decided here; see [`ScheduleWindow::crosses_midnight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub on: WallTime,
    pub off: WallTime,
}

impl ScheduleWindow {
    pub fn new(on: WallTime, off: WallTime) -> Self {
        Self { on, off }
    }

    pub fn from_display(on: &str, off: &str) -> Result<Self, TimeError> {
        Ok(Self {
            on: time::normalize(on)?,
            off: time::normalize(off)?,
        })
    }

    pub fn crosses_midnight(&self) -> bool {
        self.on > self.off
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    windows: BTreeMap<Device, ScheduleWindow>,
}

impl Default for Schedule {
    fn default() -> Self {
        let window = |on: (u32, u32), off: (u32, u32)| {
            ScheduleWindow::new(
                WallTime::new(on.0, on.1).unwrap_or(WallTime::MIDNIGHT),
                WallTime::new(off.0, off.1).unwrap_or(WallTime::MIDNIGHT),
            )
        };

        Self {
            windows: BTreeMap::from([
                (Device::Lamp, window((8, 42), (23, 46))),
                (Device::WaterPump, window((16, 31), (18, 29))),
                (Device::Mister, window((4, 0), (5, 0))),
                (Device::Camera, window((12, 0), (23, 59))),
            ]),
        }
    }
}

impl Schedule {
    pub fn normalize(&mut self) {
        let defaults = Schedule::default();
        for device in Device::ALL {
            if !self.windows.contains_key(&device) {
                if let Some(window) = defaults.windows.get(&device) {
                    self.windows.insert(device, *window);
                }
            }
        }
    }

    pub fn window(&self, device: Device) -> Option<ScheduleWindow> {
        self.windows.get(&device).copied()
    }

    pub fn set_window(&mut self, device: Device, window: ScheduleWindow) {
        self.windows.insert(device, window);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Device, ScheduleWindow)> + '_ {
        self.windows.iter().map(|(device, window)| (*device, *window))
    }

    // Devices the listing does not mention keep their current window.
    // Undecodable times become 00:00 and are reported, not fatal.
    pub fn apply_records(&mut self, records: Vec<LedScheduleRecord>) -> Vec<ScheduleIssue> {
        let mut issues = Vec::new();

        for record in records {
            let device = match Device::from_channel(&record.led_name) {
                Ok(device) => device,
                Err(err) => {
                    issues.push(ScheduleIssue::Registry(err));
                    continue;
                }
            };

            let mut decode = |field: &'static str, repr: &TimeRepresentation| {
                repr.decode().unwrap_or_else(|source| {
                    issues.push(ScheduleIssue::Time {
                        device,
                        field,
                        source,
                    });
                    WallTime::MIDNIGHT
                })
            };

            let on = decode("turnOnTime", &record.turn_on_time);
            let off = decode("turnOffTime", &record.turn_off_time);
            self.windows.insert(device, ScheduleWindow::new(on, off));
        }

        issues
    }

    pub fn updates(&self) -> Vec<ScheduleUpdate> {
        Device::ALL
            .into_iter()
            .filter_map(|device| {
                self.window(device)
                    .map(|window| ScheduleUpdate::new(device, window))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleIssue {
    #[error("schedule entry for unmapped channel: {0}")]
    Registry(RegistryError),
    #[error("undecodable {field} for {device}: {source}")]
    Time {
        device: Device,
        field: &'static str,
        source: TimeError,
    },
}

/// The backend has been seen returning `[hour, minute]`,
/// `[hour, minute, second]` and `"HH:MM:SS"` for schedule times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeRepresentation {
    Pair(i64, i64),
    Triple(i64, i64, i64),
    Text(String),
    Other(serde_json::Value),
}

impl TimeRepresentation {
    pub fn decode(&self) -> Result<WallTime, TimeError> {
        match self {
            Self::Pair(hour, minute) => u32::try_from(*hour)
                .ok()
                .zip(u32::try_from(*minute).ok())
                .and_then(|(hour, minute)| WallTime::new(hour, minute))
                .ok_or_else(|| TimeError::InvalidTimeFormat(format!("[{hour}, {minute}]"))),
            Self::Triple(hour, minute, second)
                if (0..=59).contains(second) && (*hour != 24 || *second == 0) =>
            {
                Self::Pair(*hour, *minute).decode()
            }
            Self::Triple(hour, minute, second) => Err(TimeError::InvalidTimeFormat(format!(
                "[{hour}, {minute}, {second}]"
            ))),
            Self::Text(text) => text.parse(),
            Self::Other(value) => Err(TimeError::InvalidTimeFormat(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedScheduleRecord {
    pub led_name: String,
    pub turn_on_time: TimeRepresentation,
    pub turn_off_time: TimeRepresentation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    pub id: u8,
    pub led_name: String,
    pub turn_on_time: WallTime,
    pub turn_off_time: WallTime,
}

impl ScheduleUpdate {
    pub fn new(device: Device, window: ScheduleWindow) -> Self {
        Self {
            id: device.schedule_id(),
            led_name: device.channel().to_string(),
            turn_on_time: window.on,
            turn_off_time: window.off,
        }
    }
}
