//! File-backed reading store.
//!
//! Reads a JSON file holding either an array of readings or a saved
//! list-documents response (`{"total": .., "documents": [..]}`).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;

use aquawatch_adapters::store::select_newest;
use aquawatch_adapters::{AdapterError, ReadingStore};
use aquawatch_types::Reading;

/// Accepted file layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum FileContents {
    List(Vec<Reading>),
    Documents { documents: Vec<Reading> },
}

impl FileContents {
    fn into_readings(self) -> Vec<Reading> {
        match self {
            FileContents::List(readings) => readings,
            FileContents::Documents { documents } => documents,
        }
    }
}

#[derive(Debug, Default)]
struct Cache {
    modified: Option<SystemTime>,
    readings: Arc<Vec<Reading>>,
}

/// A store that reads sensor readings from a JSON file.
///
/// The store tracks the file's modification time and only re-parses the
/// file when it has been updated. A missing or malformed file is reported as
/// a store error on every query until it is fixed.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    description: String,
    cache: Mutex<Cache>,
}

impl FileStore {
    /// Create a new file store for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            cache: Mutex::new(Cache::default()),
        }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load readings, re-reading the file only if its mtime changed.
    async fn load(&self) -> Result<Arc<Vec<Reading>>, AdapterError> {
        let modified = tokio::fs::metadata(&self.path)
            .await
            .and_then(|m| m.modified())
            .map_err(|e| AdapterError::Unavailable(format!("Read error: {}", e)))?;

        {
            let cache = self.cache.lock();
            if cache.modified == Some(modified) {
                return Ok(Arc::clone(&cache.readings));
            }
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| AdapterError::Unavailable(format!("Read error: {}", e)))?;
        let contents: FileContents = serde_json::from_str(&content)
            .map_err(|e| AdapterError::Parse(format!("Parse error: {}", e)))?;
        let readings = Arc::new(contents.into_readings());

        tracing::debug!(path = %self.path.display(), count = readings.len(), "loaded readings file");

        let mut cache = self.cache.lock();
        cache.modified = Some(modified);
        cache.readings = Arc::clone(&readings);
        Ok(readings)
    }
}

#[async_trait]
impl ReadingStore for FileStore {
    async fn latest(&self, limit: usize) -> Result<Vec<Reading>, AdapterError> {
        let readings = self.load().await?;
        Ok(select_newest(&readings, None, limit))
    }

    async fn created_after(
        &self,
        after: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Reading>, AdapterError> {
        let readings = self.load().await?;
        Ok(select_newest(&readings, Some(after), limit))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"[
            {"id": "a", "created_at": "2024-05-01T12:00:00Z",
             "ph": 7.0, "temperature": 22.0, "turbidity": 0.5, "tds": 300.0},
            {"id": "b", "created_at": "2024-05-01T12:05:00Z",
             "ph": 7.2, "temperature": 22.5, "turbidity": 0.6, "tds": 310.0}
        ]"#
    }

    #[test]
    fn test_file_store_new() {
        let store = FileStore::new("/tmp/readings.json");
        assert_eq!(store.path(), Path::new("/tmp/readings.json"));
        assert_eq!(store.description(), "file: /tmp/readings.json");
    }

    #[tokio::test]
    async fn test_reads_array_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let store = FileStore::new(file.path());
        let latest = store.latest(1).await.unwrap();
        assert_eq!(latest[0].id, "b");

        let all = store.latest(10).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_reads_documents_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"total": 1, "documents": [
                {{"$id": "x", "$createdAt": "2024-05-01T12:00:00.000+00:00",
                  "ph": 7.0, "temperature": 22.0, "turbidity": 0.5, "tds": 300.0}}
            ]}}"#
        )
        .unwrap();

        let store = FileStore::new(file.path());
        let latest = store.latest(1).await.unwrap();
        assert_eq!(latest[0].id, "x");
    }

    #[tokio::test]
    async fn test_created_after_filters() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let store = FileStore::new(file.path());
        let after = "2024-05-01T12:01:00Z".parse::<DateTime<Utc>>().unwrap();
        let readings = store.created_after(after, 100).await.unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].id, "b");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let store = FileStore::new("/nonexistent/path/readings.json");
        let err = store.latest(1).await.unwrap_err();
        assert!(matches!(err, AdapterError::Unavailable(_)));
        assert!(err.to_string().contains("Read error"));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let store = FileStore::new(file.path());
        let err = store.latest(1).await.unwrap_err();
        assert!(matches!(err, AdapterError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unchanged_file_is_served_from_cache() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let store = FileStore::new(file.path());
        let first = store.load().await.unwrap();
        let second = store.load().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
