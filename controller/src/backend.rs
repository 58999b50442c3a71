use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use plantcare_common::{
    BackendConfig, CameraServiceStatus, CameraToggle, ControlMode, Device, LedScheduleRecord,
    ModePayload, RegistryError, ScheduleUpdate, SensorSnapshot, StatusPayload,
    PATH_CAMERA_STATUS, PATH_CAMERA_TOGGLE, PATH_LED_CONTROL, PATH_LED_CONTROL_UPDATE,
    PATH_LED_STATUS, PATH_LED_STATUS_UPDATE, PATH_MODE_SETTING, PATH_MODE_SETTING_UPDATE,
    PATH_SENSOR_READING,
};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("unexpected payload from {url}: {message}")]
    Decode { url: String, message: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[async_trait]
pub trait ControlBackend: Send + Sync {
    async fn device_status(&self) -> Result<StatusPayload, BackendError>;
    async fn set_device_status(&self, device: Device, on: bool) -> Result<(), BackendError>;
    async fn mode(&self) -> Result<ModePayload, BackendError>;
    async fn set_mode(&self, mode: ControlMode) -> Result<(), BackendError>;
    async fn schedule(&self) -> Result<Vec<LedScheduleRecord>, BackendError>;
    async fn update_schedule(&self, update: &ScheduleUpdate) -> Result<(), BackendError>;
    async fn latest_sensor_reading(&self) -> Result<Option<SensorSnapshot>, BackendError>;
}

#[async_trait]
pub trait CameraService: Send + Sync {
    async fn toggle(&self, on: bool) -> Result<(), BackendError>;
    async fn status(&self) -> Result<CameraServiceStatus, BackendError>;
}

pub fn build_client(config: &BackendConfig) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .build()
}

#[derive(Clone)]
struct Endpoint {
    client: Client,
    base_url: String,
}

impl Endpoint {
    fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = request.send().await.map_err(|source| BackendError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        debug!("{url} -> {status}");
        if !status.is_success() {
            return Err(BackendError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.url(path);
        let response = self.send(&url, self.client.get(&url)).await?;
        let body = response
            .bytes()
            .await
            .map_err(|source| BackendError::Transport {
                url: url.clone(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|err| BackendError::Decode {
            url,
            message: err.to_string(),
        })
    }
}

pub struct HttpBackend {
    endpoint: Endpoint,
}

impl HttpBackend {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            endpoint: Endpoint::new(client, base_url),
        }
    }
}

#[async_trait]
impl ControlBackend for HttpBackend {
    async fn device_status(&self) -> Result<StatusPayload, BackendError> {
        self.endpoint.get_json(PATH_LED_STATUS).await
    }

    async fn set_device_status(&self, device: Device, on: bool) -> Result<(), BackendError> {
        let url = self.endpoint.url(PATH_LED_STATUS_UPDATE);
        let status = if on { "1" } else { "0" };
        let request = self
            .endpoint
            .client
            .put(&url)
            .query(&[("led", device.channel()), ("status", status)]);
        self.endpoint.send(&url, request).await?;
        Ok(())
    }

    async fn mode(&self) -> Result<ModePayload, BackendError> {
        self.endpoint.get_json(PATH_MODE_SETTING).await
    }

    async fn set_mode(&self, mode: ControlMode) -> Result<(), BackendError> {
        let url = self.endpoint.url(PATH_MODE_SETTING_UPDATE);
        let request = self
            .endpoint
            .client
            .put(&url)
            .query(&[("mode", mode.code())]);
        self.endpoint.send(&url, request).await?;
        Ok(())
    }

    async fn schedule(&self) -> Result<Vec<LedScheduleRecord>, BackendError> {
        self.endpoint.get_json(PATH_LED_CONTROL).await
    }

    async fn update_schedule(&self, update: &ScheduleUpdate) -> Result<(), BackendError> {
        let url = self.endpoint.url(PATH_LED_CONTROL_UPDATE);
        let request = self.endpoint.client.put(&url).json(update);
        self.endpoint.send(&url, request).await?;
        Ok(())
    }

    async fn latest_sensor_reading(&self) -> Result<Option<SensorSnapshot>, BackendError> {
        let readings: Vec<SensorSnapshot> = self.endpoint.get_json(PATH_SENSOR_READING).await?;
        Ok(readings.into_iter().next())
    }
}

pub struct HttpCamera {
    endpoint: Endpoint,
}

impl HttpCamera {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            endpoint: Endpoint::new(client, base_url),
        }
    }
}

#[async_trait]
impl CameraService for HttpCamera {
    async fn toggle(&self, on: bool) -> Result<(), BackendError> {
        let url = self.endpoint.url(PATH_CAMERA_TOGGLE);
        let request = self
            .endpoint
            .client
            .post(&url)
            .json(&CameraToggle { status: on });
        self.endpoint.send(&url, request).await?;
        Ok(())
    }

    async fn status(&self) -> Result<CameraServiceStatus, BackendError> {
        self.endpoint.get_json(PATH_CAMERA_STATUS).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        net::SocketAddr,
        sync::{Arc, Mutex},
    };

    use axum::{
        extract::{Query, State},
        http::StatusCode,
        routing::{get, post, put},
        Json, Router,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::*;
    use plantcare_common::WallTime;

    type Recorded = Arc<Mutex<Vec<String>>>;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn client() -> Client {
        build_client(&BackendConfig::default()).unwrap()
    }

    async fn mock_backend(recorded: Recorded) -> String {
        async fn record_query(
            State(recorded): State<Recorded>,
            Query(params): Query<HashMap<String, String>>,
        ) -> StatusCode {
            let mut pairs: Vec<_> = params.into_iter().map(|(k, v)| format!("{k}={v}")).collect();
            pairs.sort();
            recorded.lock().unwrap().push(pairs.join("&"));
            StatusCode::OK
        }

        async fn record_body(State(recorded): State<Recorded>, Json(body): Json<Value>) -> StatusCode {
            recorded.lock().unwrap().push(body.to_string());
            StatusCode::OK
        }

        let router = Router::new()
            .route(
                PATH_LED_STATUS,
                get(|| async { Json(json!({"led1": 1, "led2": 0, "led3": 0, "led4": 1})) }),
            )
            .route(PATH_LED_STATUS_UPDATE, put(record_query))
            .route(
                PATH_MODE_SETTING,
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .route(PATH_MODE_SETTING_UPDATE, put(record_query))
            .route(
                PATH_LED_CONTROL,
                get(|| async {
                    Json(json!([
                        {"ledName": "led1", "turnOnTime": [8, 42], "turnOffTime": "23:46:00"}
                    ]))
                }),
            )
            .route(PATH_LED_CONTROL_UPDATE, put(record_body))
            .route(
                PATH_SENSOR_READING,
                get(|| async {
                    Json(json!([
                        {"temperature": 28.5, "humidity": 65.0, "soilMoisture": 41.0, "soilPH": 6.5},
                        {"temperature": 20.0, "humidity": 50.0, "soilMoisture": 30.0}
                    ]))
                }),
            )
            .route(PATH_CAMERA_TOGGLE, post(record_body))
            .with_state(recorded);

        format!("http://{}", serve(router).await)
    }

    #[tokio::test]
    async fn device_commands_use_query_parameters() {
        let recorded = Recorded::default();
        let base = mock_backend(recorded.clone()).await;
        let backend = HttpBackend::new(client(), &base);

        backend.set_device_status(Device::Camera, true).await.unwrap();
        backend.set_device_status(Device::Lamp, false).await.unwrap();
        backend.set_mode(ControlMode::Sensor).await.unwrap();

        assert_eq!(
            *recorded.lock().unwrap(),
            vec!["led=led4&status=1", "led=led1&status=0", "mode=2"]
        );
    }

    #[tokio::test]
    async fn reads_status_schedule_and_latest_sensor() {
        let base = mock_backend(Recorded::default()).await;
        let backend = HttpBackend::new(client(), &format!("{base}/"));

        let status = backend.device_status().await.unwrap();
        assert!(status.to_states()[&Device::Camera]);

        let records = backend.schedule().await.unwrap();
        assert_eq!(records[0].turn_on_time.decode().unwrap().to_string(), "08:42");
        assert_eq!(records[0].turn_off_time.decode().unwrap().to_string(), "23:46");

        let sensor = backend.latest_sensor_reading().await.unwrap().unwrap();
        assert_eq!(sensor.temperature, 28.5);
        assert_eq!(sensor.soil_moisture, 41.0);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base = mock_backend(Recorded::default()).await;
        let backend = HttpBackend::new(client(), &base);

        let err = backend.mode().await.unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn schedule_update_and_camera_toggle_send_json() {
        let recorded = Recorded::default();
        let base = mock_backend(recorded.clone()).await;
        let backend = HttpBackend::new(client(), &base);
        let camera = HttpCamera::new(client(), &base);

        backend
            .update_schedule(&ScheduleUpdate {
                id: 4,
                led_name: "led4".to_string(),
                turn_on_time: WallTime::new(12, 0).unwrap(),
                turn_off_time: WallTime::new(24, 0).unwrap(),
            })
            .await
            .unwrap();
        camera.toggle(true).await.unwrap();

        let recorded = recorded.lock().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&recorded[0]).unwrap(),
            json!({"id": 4, "ledName": "led4", "turnOnTime": "12:00", "turnOffTime": "23:59"})
        );
        assert_eq!(
            serde_json::from_str::<Value>(&recorded[1]).unwrap(),
            json!({"status": true})
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let camera = HttpCamera::new(client(), "http://127.0.0.1:9");
        let err = camera.toggle(false).await.unwrap_err();
        assert!(matches!(err, BackendError::Transport { .. }));
    }
}
