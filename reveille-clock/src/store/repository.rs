//! Persistence seam for the alarm collection.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::alarm::AlarmDefinition;
use crate::error::Result;

/// Durable storage for the whole alarm collection.
///
/// One document, last write wins, no schema versioning. Callers treat
/// both operations as best-effort: failures are logged at the call
/// site and never propagate past the store.
#[async_trait]
pub trait AlarmRepository: Send + Sync {
    async fn load(&self) -> Result<Vec<AlarmDefinition>>;
    async fn save(&self, alarms: &[AlarmDefinition]) -> Result<()>;
}

/// JSON file holding a single array of alarm definitions.
///
/// A missing file loads as an empty collection (first run).
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AlarmRepository for JsonFileRepository {
    async fn load(&self) -> Result<Vec<AlarmDefinition>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, alarms: &[AlarmDefinition]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(alarms)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

/// In-memory repository for tests and tools.
///
/// Clones share storage, so a test can hand one clone to a store and
/// inspect what was saved through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    alarms: Vec<AlarmDefinition>,
    save_count: usize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alarms(alarms: Vec<AlarmDefinition>) -> Self {
        let repo = Self::new();
        repo.lock().alarms = alarms;
        repo
    }

    /// The most recently saved collection.
    pub fn saved(&self) -> Vec<AlarmDefinition> {
        self.lock().alarms.clone()
    }

    /// How many times `save` has been called.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AlarmRepository for MemoryRepository {
    async fn load(&self) -> Result<Vec<AlarmDefinition>> {
        Ok(self.lock().alarms.clone())
    }

    async fn save(&self, alarms: &[AlarmDefinition]) -> Result<()> {
        let mut inner = self.lock();
        inner.alarms = alarms.to_vec();
        inner.save_count += 1;
        Ok(())
    }
}

/// Repository whose operations always fail, for exercising the
/// fails-soft paths.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FailingRepository;

#[cfg(test)]
#[async_trait]
impl AlarmRepository for FailingRepository {
    async fn load(&self) -> Result<Vec<AlarmDefinition>> {
        Err(std::io::Error::other("injected load failure").into())
    }

    async fn save(&self, _alarms: &[AlarmDefinition]) -> Result<()> {
        Err(std::io::Error::other("injected save failure").into())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;
    use crate::alarm::{AlarmDraft, AlarmId, AlarmTime};

    fn temp_file(name: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(1);
        std::env::temp_dir().join(format!("reveille-store-{name}-{suffix}.json"))
    }

    fn alarm(id: u64, hour: u8) -> AlarmDefinition {
        AlarmDefinition::from_draft(
            AlarmId::new(id),
            AlarmDraft::at(AlarmTime::new(hour, 0).unwrap()),
        )
    }

    #[tokio::test]
    async fn file_round_trip() {
        let path = temp_file("roundtrip");
        let repo = JsonFileRepository::new(&path);

        let alarms = vec![alarm(1, 7), alarm(2, 8)];
        repo.save(&alarms).await.unwrap();
        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded, alarms);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let repo = JsonFileRepository::new(temp_file("missing"));
        assert!(repo.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let path = temp_file("corrupt");
        std::fs::write(&path, b"{ not an array").unwrap();

        let repo = JsonFileRepository::new(&path);
        assert!(repo.load().await.is_err());

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = temp_file("nested");
        let path = dir.join("alarms.json");

        let repo = JsonFileRepository::new(&path);
        repo.save(&[alarm(1, 7)]).await.unwrap();
        assert_eq!(repo.load().await.unwrap().len(), 1);

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(dir);
    }

    #[tokio::test]
    async fn memory_clones_share_state() {
        let repo = MemoryRepository::new();
        let observer = repo.clone();

        repo.save(&[alarm(1, 7)]).await.unwrap();
        assert_eq!(observer.saved().len(), 1);
        assert_eq!(observer.save_count(), 1);
    }
}
