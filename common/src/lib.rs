pub mod config;
pub mod control;
pub mod devices;
pub mod endpoints;
pub mod schedule;
pub mod time;
pub mod types;

pub use config::{ApiConfig, BackendConfig, PollingConfig, RuntimeConfig};
pub use control::{ControlState, DeviceChange, PendingToggle};
pub use devices::{ControlMode, Device, RegistryError};
pub use endpoints::*;
pub use schedule::{
    LedScheduleRecord, Schedule, ScheduleIssue, ScheduleUpdate, ScheduleWindow, TimeRepresentation,
};
pub use time::{TimeError, WallTime};
pub use types::{
    CameraServiceStatus, CameraToggle, ControlStatus, DeviceStates, ModePayload, Notification,
    SensorSnapshot, Severity, StatusPayload,
};
