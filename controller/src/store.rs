use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;

use plantcare_common::{types::all_off, DeviceStates, RuntimeConfig, Schedule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    pub devices: DeviceStates,
    pub schedule: Schedule,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            devices: all_off(),
            schedule: Schedule::default(),
        }
    }
}

#[derive(Clone)]
pub struct CacheStore {
    runtime_path: Arc<PathBuf>,
    devices_path: Arc<PathBuf>,
    schedule_path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl CacheStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            runtime_path: Arc::new(data_dir.join("runtime.json")),
            devices_path: Arc::new(data_dir.join("devices.json")),
            schedule_path: Arc::new(data_dir.join("schedule.json")),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load_runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        let _guard = self.lock.lock().await;
        read_or_default(&self.runtime_path).await
    }

    pub async fn load(&self) -> anyhow::Result<Cache> {
        let _guard = self.lock.lock().await;
        let mut schedule: Schedule = read_or_default(&self.schedule_path).await?;
        schedule.normalize();

        let mut devices = all_off();
        let cached: DeviceStates = read_or_default(&self.devices_path).await?;
        devices.extend(cached);

        Ok(Cache { devices, schedule })
    }

    pub async fn save_devices(&self, devices: &DeviceStates) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        write_json(&self.devices_path, devices).await
    }

    pub async fn save_schedule(&self, schedule: &Schedule) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        write_json(&self.schedule_path, schedule).await
    }
}

async fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> anyhow::Result<T> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(serde_json::from_slice::<T>(&raw)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(err) => Err(err.into()),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use plantcare_common::{Device, ScheduleWindow};

    #[tokio::test]
    async fn missing_files_load_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());

        assert_eq!(store.load().await.unwrap(), Cache::default());
        assert_eq!(
            store.load_runtime_config().await.unwrap(),
            RuntimeConfig::default()
        );
    }

    #[tokio::test]
    async fn saved_entries_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(&dir.path().join("nested"));

        let mut devices = all_off();
        devices.insert(Device::Mister, true);
        let mut schedule = Schedule::default();
        schedule.set_window(
            Device::Camera,
            ScheduleWindow::from_display("06:00 AM", "06:30 PM").unwrap(),
        );

        store.save_devices(&devices).await.unwrap();
        store.save_schedule(&schedule).await.unwrap();

        let cache = store.load().await.unwrap();
        assert_eq!(cache.devices, devices);
        assert_eq!(cache.schedule, schedule);
    }

    #[tokio::test]
    async fn cache_files_are_keyed_by_display_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        store.save_devices(&all_off()).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("devices.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["Máy bơm nước"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("devices.json"), b"not json").unwrap();
        let store = CacheStore::new(dir.path());

        assert!(store.load().await.is_err());
    }
}
