use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub camera_url: String,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            camera_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    pub status_interval_ms: u64,
    pub schedule_interval_ms: u64,
    pub sensor_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: 5_000,
            schedule_interval_ms: 60_000,
            sensor_interval_ms: 5_000,
        }
    }
}

impl PollingConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_millis(self.schedule_interval_ms)
    }

    pub fn sensor_interval(&self) -> Duration {
        Duration::from_millis(self.sensor_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub http_port: u16,
    pub notification_history: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            http_port: 8090,
            notification_history: 50,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

const MIN_POLL_INTERVAL_MS: u64 = 1_000;

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.backend.base_url = self.backend.base_url.trim_end_matches('/').to_string();
        self.backend.camera_url = self.backend.camera_url.trim_end_matches('/').to_string();
        self.backend.request_timeout_ms = self.backend.request_timeout_ms.max(500);
        self.backend.connect_timeout_ms = self.backend.connect_timeout_ms.max(500);

        self.polling.status_interval_ms = self.polling.status_interval_ms.max(MIN_POLL_INTERVAL_MS);
        self.polling.schedule_interval_ms =
            self.polling.schedule_interval_ms.max(MIN_POLL_INTERVAL_MS);
        self.polling.sensor_interval_ms = self.polling.sensor_interval_ms.max(MIN_POLL_INTERVAL_MS);

        self.api.notification_history = self.api.notification_history.clamp(1, 500);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_intervals_and_trims_urls() {
        let mut config = RuntimeConfig::default();
        config.backend.base_url = "http://backend:8080/".to_string();
        config.polling.status_interval_ms = 10;
        config.api.notification_history = 0;

        config.sanitize();

        assert_eq!(config.backend.base_url, "http://backend:8080");
        assert_eq!(config.polling.status_interval_ms, 1_000);
        assert_eq!(config.polling.schedule_interval_ms, 60_000);
        assert_eq!(config.api.notification_history, 1);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{"polling": {"status_interval_ms": 2000}, "api": {"http_port": 9000}}"#)
                .unwrap();

        assert_eq!(config.polling.status_interval_ms, 2_000);
        assert_eq!(config.polling.schedule_interval_ms, 60_000);
        assert_eq!(config.api.notification_history, 50);
        assert_eq!(config.api.http_port, 9000);
        assert_eq!(config.backend, BackendConfig::default());
    }
}
