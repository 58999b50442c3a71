use chrono::{DateTime, Utc};

use crate::{
    devices::{ControlMode, Device},
    schedule::{LedScheduleRecord, Schedule, ScheduleIssue, ScheduleWindow},
    types::{all_off, ControlStatus, DeviceStates, SensorSnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceChange {
    pub device: Device,
    pub is_on: bool,
    pub mode: ControlMode,
}

impl DeviceChange {
    pub fn describe(&self) -> String {
        let verb = if self.is_on { "turned on" } else { "turned off" };
        format!("[{}] {verb} {}", self.mode.label(), self.device)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingToggle {
    pub device: Device,
    pub previous: bool,
    pub requested: bool,
}

// Mode only changes from a poll or a confirmed update. Schedule edits go to
// `draft`, which polls never touch.
#[derive(Debug, Clone)]
pub struct ControlState {
    mode: ControlMode,
    mode_confirmed: bool,
    devices: DeviceStates,
    schedule: Schedule,
    draft: Option<Schedule>,
    sensor: Option<SensorSnapshot>,
    last_synced_at: Option<DateTime<Utc>>,
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new(all_off(), Schedule::default())
    }
}

impl ControlState {
    pub fn new(cached_devices: DeviceStates, mut cached_schedule: Schedule) -> Self {
        let mut devices = all_off();
        for (device, is_on) in cached_devices {
            devices.insert(device, is_on);
        }
        cached_schedule.normalize();

        Self {
            mode: ControlMode::default(),
            mode_confirmed: false,
            devices,
            schedule: cached_schedule,
            draft: None,
            sensor: None,
            last_synced_at: None,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn mode_confirmed(&self) -> bool {
        self.mode_confirmed
    }

    pub fn devices(&self) -> &DeviceStates {
        &self.devices
    }

    pub fn is_on(&self, device: Device) -> bool {
        self.devices.get(&device).copied().unwrap_or(false)
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn draft(&self) -> Option<&Schedule> {
        self.draft.as_ref()
    }

    pub fn editable_schedule(&self) -> &Schedule {
        self.draft.as_ref().unwrap_or(&self.schedule)
    }

    pub fn sensor(&self) -> Option<SensorSnapshot> {
        self.sensor
    }

    pub fn apply_status(&mut self, states: DeviceStates, now: DateTime<Utc>) -> Vec<DeviceChange> {
        let mut changes = Vec::new();
        for device in Device::ALL {
            let is_on = states.get(&device).copied().unwrap_or(false);
            if self.is_on(device) != is_on {
                changes.push(DeviceChange {
                    device,
                    is_on,
                    mode: self.mode,
                });
            }
            self.devices.insert(device, is_on);
        }
        self.last_synced_at = Some(now);
        changes
    }

    pub fn apply_mode(&mut self, mode: ControlMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        self.mode_confirmed = true;
        if mode != ControlMode::Sensor {
            self.sensor = None;
        }
        changed
    }

    pub fn begin_toggle(&mut self, device: Device) -> PendingToggle {
        let previous = self.is_on(device);
        let requested = !previous;
        self.devices.insert(device, requested);
        PendingToggle {
            device,
            previous,
            requested,
        }
    }

    /// Restores the pre-toggle value unless a poll has already overwritten
    /// the optimistic one.
    pub fn rollback(&mut self, pending: PendingToggle) -> bool {
        if self.is_on(pending.device) != pending.requested {
            return false;
        }
        self.devices.insert(pending.device, pending.previous);
        true
    }

    pub fn apply_schedule_records(&mut self, records: Vec<LedScheduleRecord>) -> Vec<ScheduleIssue> {
        self.schedule.apply_records(records)
    }

    pub fn set_window(&mut self, device: Device, window: ScheduleWindow) {
        let confirmed = &self.schedule;
        self.draft
            .get_or_insert_with(|| confirmed.clone())
            .set_window(device, window);
    }

    /// Records a schedule the backend has accepted. The draft is dropped
    /// only if nothing was edited while it was being sent.
    pub fn commit_schedule(&mut self, sent: Schedule) {
        if self.draft.as_ref() == Some(&sent) {
            self.draft = None;
        }
        self.schedule = sent;
    }

    pub fn update_sensor(&mut self, snapshot: SensorSnapshot) {
        self.sensor = Some(snapshot);
    }

    pub fn status(&self) -> ControlStatus {
        ControlStatus {
            mode: self.mode,
            mode_confirmed: self.mode_confirmed,
            devices: self.devices.clone(),
            schedule: self.schedule.clone(),
            draft_schedule: self.draft.clone(),
            sensor: self.sensor,
            last_synced_at: self.last_synced_at,
        }
    }
}
