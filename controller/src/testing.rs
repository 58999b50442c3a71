use std::sync::Mutex as StdMutex;

use async_trait::async_trait;

use plantcare_common::{
    CameraServiceStatus, ControlMode, Device, LedScheduleRecord, ModePayload, ScheduleUpdate,
    SensorSnapshot, StatusPayload,
};

use crate::backend::{BackendError, CameraService, ControlBackend};

#[derive(Default)]
pub struct FakeBackend {
    pub calls: StdMutex<Vec<String>>,
    pub status: StdMutex<serde_json::Value>,
    pub mode_code: StdMutex<Option<i64>>,
    pub schedule: StdMutex<serde_json::Value>,
    pub sensor: StdMutex<Option<SensorSnapshot>>,
    pub fail_toggle: bool,
    pub fail_set_mode: bool,
    pub fail_schedule_for: Option<&'static str>,
}

impl FakeBackend {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn unavailable(url: &str) -> BackendError {
        BackendError::Status {
            url: url.to_string(),
            status: 503,
        }
    }
}

#[async_trait]
impl ControlBackend for FakeBackend {
    async fn device_status(&self) -> Result<StatusPayload, BackendError> {
        self.record("GET status");
        serde_json::from_value(self.status.lock().unwrap().clone()).map_err(|err| {
            BackendError::Decode {
                url: "status".to_string(),
                message: err.to_string(),
            }
        })
    }

    async fn set_device_status(&self, device: Device, on: bool) -> Result<(), BackendError> {
        self.record(format!("PUT led={}&status={}", device.channel(), u8::from(on)));
        if self.fail_toggle {
            return Err(Self::unavailable("status"));
        }
        Ok(())
    }

    async fn mode(&self) -> Result<ModePayload, BackendError> {
        self.record("GET mode");
        match *self.mode_code.lock().unwrap() {
            Some(mode) => Ok(ModePayload { mode }),
            None => Err(Self::unavailable("mode")),
        }
    }

    async fn set_mode(&self, mode: ControlMode) -> Result<(), BackendError> {
        self.record(format!("PUT mode={}", mode.code()));
        if self.fail_set_mode {
            return Err(Self::unavailable("mode"));
        }
        *self.mode_code.lock().unwrap() = Some(i64::from(mode.code()));
        Ok(())
    }

    async fn schedule(&self) -> Result<Vec<LedScheduleRecord>, BackendError> {
        self.record("GET schedule");
        serde_json::from_value(self.schedule.lock().unwrap().clone()).map_err(|err| {
            BackendError::Decode {
                url: "schedule".to_string(),
                message: err.to_string(),
            }
        })
    }

    async fn update_schedule(&self, update: &ScheduleUpdate) -> Result<(), BackendError> {
        self.record(format!(
            "PUT schedule {} {}-{}",
            update.led_name, update.turn_on_time, update.turn_off_time
        ));
        if self.fail_schedule_for == Some(update.led_name.as_str()) {
            return Err(Self::unavailable("schedule"));
        }
        Ok(())
    }

    async fn latest_sensor_reading(&self) -> Result<Option<SensorSnapshot>, BackendError> {
        self.record("GET sensor");
        Ok(*self.sensor.lock().unwrap())
    }
}

#[derive(Default)]
pub struct FakeCamera {
    pub calls: StdMutex<Vec<bool>>,
    pub fail: bool,
}

#[async_trait]
impl CameraService for FakeCamera {
    async fn toggle(&self, on: bool) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(on);
        if self.fail {
            return Err(BackendError::Status {
                url: "camera".to_string(),
                status: 500,
            });
        }
        Ok(())
    }

    async fn status(&self) -> Result<CameraServiceStatus, BackendError> {
        Ok(CameraServiceStatus {
            status: "ok".to_string(),
            camera: false,
            model_loaded: true,
            connected_clients: 0,
        })
    }
}
