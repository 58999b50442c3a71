pub const PATH_LED_STATUS: &str = "/api/ledStatus";
pub const PATH_LED_STATUS_UPDATE: &str = "/api/ledStatus/update";

pub const PATH_MODE_SETTING: &str = "/api/modeSetting";
pub const PATH_MODE_SETTING_UPDATE: &str = "/api/modeSetting/updateMode";

pub const PATH_LED_CONTROL: &str = "/api/ledControl";
pub const PATH_LED_CONTROL_UPDATE: &str = "/api/ledControl/update";

pub const PATH_SENSOR_READING: &str = "/api/sensorReading";

pub const PATH_CAMERA_TOGGLE: &str = "/toggle_camera";
pub const PATH_CAMERA_STATUS: &str = "/status";
