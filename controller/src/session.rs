use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use plantcare_common::{
    CameraServiceStatus, ControlMode, ControlState, ControlStatus, Device, DeviceChange,
    Notification, Schedule, ScheduleUpdate, ScheduleWindow, SensorSnapshot,
    TimeError,
};

use crate::{
    backend::{BackendError, CameraService, ControlBackend},
    notify::Notifier,
    store::{Cache, CacheStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub device: Device,
    pub is_on: bool,
    pub camera_synced: Option<bool>,
}

#[derive(Debug, Error)]
#[error("schedule update for {device} failed after {committed}/{total} devices: {source}")]
pub struct ScheduleSaveError {
    pub device: Device,
    pub committed: usize,
    pub total: usize,
    #[source]
    pub source: BackendError,
}

// The state lock is never held across a backend request. Cache writes happen
// under it so the files always match the latest state.
pub struct Session {
    backend: Arc<dyn ControlBackend>,
    camera: Arc<dyn CameraService>,
    state: Mutex<ControlState>,
    store: CacheStore,
    notifier: Notifier,
}

impl Session {
    pub fn new(
        backend: Arc<dyn ControlBackend>,
        camera: Arc<dyn CameraService>,
        store: CacheStore,
        notifier: Notifier,
        cache: Cache,
    ) -> Self {
        Self {
            backend,
            camera,
            state: Mutex::new(ControlState::new(cache.devices, cache.schedule)),
            store,
            notifier,
        }
    }

    pub async fn status(&self) -> ControlStatus {
        self.state.lock().await.status()
    }

    pub async fn mode(&self) -> ControlMode {
        self.state.lock().await.mode()
    }

    pub async fn schedule(&self) -> Schedule {
        self.state.lock().await.editable_schedule().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifier.recent()
    }

    pub async fn camera_status(&self) -> Result<CameraServiceStatus, BackendError> {
        self.camera.status().await
    }

    // Mode goes first so change notifications carry the mode in force.
    pub async fn sync(&self, include_schedule: bool) -> ControlStatus {
        let _ = self.poll_mode().await;
        let _ = self.poll_device_status().await;
        if include_schedule {
            let _ = self.poll_schedule().await;
        }
        let _ = self.poll_sensor().await;
        self.status().await
    }

    pub async fn poll_device_status(&self) -> Result<Vec<DeviceChange>, BackendError> {
        let payload = match self.backend.device_status().await {
            Ok(payload) => payload,
            Err(err) => {
                self.notifier
                    .error(format!("Failed to fetch device status: {err}"));
                return Err(err);
            }
        };

        let changes = {
            let mut state = self.state.lock().await;
            let changes = state.apply_status(payload.to_states(), Utc::now());
            self.persist_devices(&state).await;
            changes
        };

        for change in &changes {
            self.notifier.info(change.describe());
        }
        Ok(changes)
    }

    pub async fn poll_mode(&self) -> Result<ControlMode, BackendError> {
        let fetched = match self.backend.mode().await {
            Ok(payload) => ControlMode::from_code(payload.mode).map_err(BackendError::from),
            Err(err) => Err(err),
        };

        match fetched {
            Ok(mode) => {
                let changed = self.state.lock().await.apply_mode(mode);
                if changed {
                    info!("backend mode is now {mode}");
                }
                Ok(mode)
            }
            Err(err) => {
                self.notifier.error(format!("Failed to fetch mode: {err}"));
                Err(err)
            }
        }
    }

    pub async fn poll_schedule(&self) -> Result<Schedule, BackendError> {
        let records = match self.backend.schedule().await {
            Ok(records) => records,
            Err(err) => {
                self.notifier
                    .error(format!("Failed to fetch schedule: {err}"));
                return Err(err);
            }
        };

        let (issues, schedule) = {
            let mut state = self.state.lock().await;
            let issues = state.apply_schedule_records(records);
            self.persist_schedule(&state).await;
            (issues, state.schedule().clone())
        };

        for issue in &issues {
            error!("schedule listing: {issue}");
        }
        Ok(schedule)
    }

    pub async fn poll_sensor(&self) -> Result<Option<SensorSnapshot>, BackendError> {
        if self.mode().await != ControlMode::Sensor {
            return Ok(None);
        }

        match self.backend.latest_sensor_reading().await {
            Ok(Some(snapshot)) => {
                let mut state = self.state.lock().await;
                // The mode may have moved on while the request was in flight.
                if state.mode() == ControlMode::Sensor {
                    state.update_sensor(snapshot);
                }
                Ok(Some(snapshot))
            }
            Ok(None) => {
                debug!("backend has no sensor readings yet");
                Ok(None)
            }
            Err(err) => {
                warn!("sensor reading failed: {err}");
                Err(err)
            }
        }
    }

    pub async fn request_mode_change(&self, target: ControlMode) -> Result<ControlMode, BackendError> {
        if let Err(err) = self.backend.set_mode(target).await {
            self.notifier
                .error(format!("Failed to switch to {} mode: {err}", target.label()));
            return Err(err);
        }

        self.state.lock().await.apply_mode(target);
        self.notifier
            .success(format!("Switched to {} mode", target.label()));
        Ok(target)
    }

    pub async fn toggle_device(&self, device: Device) -> Result<ToggleOutcome, BackendError> {
        let pending = {
            let mut state = self.state.lock().await;
            let pending = state.begin_toggle(device);
            self.persist_devices(&state).await;
            pending
        };

        if let Err(err) = self.backend.set_device_status(device, pending.requested).await {
            {
                let mut state = self.state.lock().await;
                if state.rollback(pending) {
                    self.persist_devices(&state).await;
                }
            }
            self.notifier
                .error(format!("Failed to {} {device}: {err}", switch_verb(pending.requested)));
            return Err(err);
        }

        self.notifier.success(format!(
            "{device} {}",
            if pending.requested { "turned on" } else { "turned off" }
        ));

        let camera_synced = if device == Device::Camera {
            match self.camera.toggle(pending.requested).await {
                Ok(()) => Some(true),
                Err(err) => {
                    self.notifier
                        .warning(format!("Camera service did not follow the toggle: {err}"));
                    Some(false)
                }
            }
        } else {
            None
        };

        Ok(ToggleOutcome {
            device,
            is_on: pending.requested,
            camera_synced,
        })
    }

    /// Edits the draft schedule only; nothing is sent until
    /// [`Session::save_schedule`].
    pub async fn edit_window(
        &self,
        device: Device,
        on: &str,
        off: &str,
    ) -> Result<ScheduleWindow, TimeError> {
        let window = ScheduleWindow::from_display(on, off)?;
        if window.crosses_midnight() {
            debug!("{device} window {} - {} ends before it starts", window.on, window.off);
        }
        self.state.lock().await.set_window(device, window);
        Ok(window)
    }

    /// Sends one update per device, in registry order, one at a time. Stops
    /// at the first failure without undoing earlier updates.
    pub async fn save_schedule(&self) -> Result<Schedule, ScheduleSaveError> {
        let schedule = self.schedule().await;
        let total = Device::ALL.len();

        for (committed, device) in Device::ALL.into_iter().enumerate() {
            let Some(window) = schedule.window(device) else {
                continue;
            };
            let update = ScheduleUpdate::new(device, window);
            if let Err(source) = self.backend.update_schedule(&update).await {
                let err = ScheduleSaveError {
                    device,
                    committed,
                    total,
                    source,
                };
                self.notifier
                    .error(format!("Failed to save schedule: {err}"));
                return Err(err);
            }
        }

        {
            let mut state = self.state.lock().await;
            state.commit_schedule(schedule.clone());
            self.persist_schedule(&state).await;
        }
        self.notifier.success("Schedule saved");

        match self.poll_schedule().await {
            Ok(confirmed) => Ok(confirmed),
            Err(_) => Ok(schedule),
        }
    }

    async fn persist_devices(&self, state: &ControlState) {
        if let Err(err) = self.store.save_devices(state.devices()).await {
            warn!("failed to persist device states: {err:#}");
        }
    }

    async fn persist_schedule(&self, state: &ControlState) {
        if let Err(err) = self.store.save_schedule(state.schedule()).await {
            warn!("failed to persist schedule: {err:#}");
        }
    }
}

fn switch_verb(on: bool) -> &'static str {
    if on {
        "turn on"
    } else {
        "turn off"
    }
}
