use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::GalleryError;

pub const DATA_FILE: &str = "data.json";

/// Contents of the data file: compressed drawings keyed by `/`-separated relative image path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawingData {
    #[serde(default, deserialize_with = "skip_null_drawings")]
    pub drawings: BTreeMap<String, String>,
}

fn skip_null_drawings<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    let raw = Option::<BTreeMap<String, Option<String>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect())
}

impl DrawingData {
    pub fn get(&self, key: &str) -> Option<&String> {
        self.drawings.get(key)
    }

    pub fn set(&mut self, key: String, data: String) {
        self.drawings.insert(key, data);
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.drawings.remove(key).is_some()
    }

    /// Moves a drawing to a new key. Returns false when there was none.
    pub fn rename(&mut self, from: &str, to: String) -> bool {
        match self.drawings.remove(from) {
            Some(data) => {
                self.drawings.insert(to, data);
                true
            }
            None => false,
        }
    }

    /// Drops drawings whose image no longer exists and returns their keys.
    pub fn prune(&mut self, exists: impl Fn(&str) -> bool) -> Vec<String> {
        let missing: Vec<String> = self
            .drawings
            .keys()
            .filter(|key| !exists(key))
            .cloned()
            .collect();
        for key in &missing {
            self.drawings.remove(key);
        }
        missing
    }
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn load(&self) -> Result<DrawingData, GalleryError>;
    async fn save(&self, data: &DrawingData);
}

pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn load(&self) -> Result<DrawingData, GalleryError> {
        match tokio::fs::read(&self.path).await {
            Ok(payload) => Ok(serde_json::from_slice(&payload)?),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                let data = DrawingData::default();
                self.save(&data).await;
                Ok(data)
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn save(&self, data: &DrawingData) {
        let payload = serde_json::to_vec(data).unwrap_or_default();
        if let Err(error) = tokio::fs::write(&self.path, payload).await {
            tracing::error!("Failed to save {}: {error}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATA_FILE);
        let storage = JsonFileStorage::new(path.clone());
        assert_eq!(storage.load().await.unwrap(), DrawingData::default());
        assert_eq!(std::fs::read_to_string(path).unwrap(), r#"{"drawings":{}}"#);
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join(DATA_FILE));
        let mut data = DrawingData::default();
        data.set("trips/rome.jpg".into(), "\u{4e00}compressed".into());
        storage.save(&data).await;
        assert_eq!(storage.load().await.unwrap(), data);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATA_FILE);
        std::fs::write(&path, "{not json").unwrap();
        let storage = JsonFileStorage::new(path);
        assert!(matches!(storage.load().await, Err(GalleryError::Json(_))));
    }

    #[test]
    fn null_entries_and_extra_keys_are_tolerated() {
        let data: DrawingData =
            serde_json::from_str(r#"{"drawings":{"a.png":"x","b.png":null},"other":1}"#).unwrap();
        assert_eq!(data.drawings.len(), 1);
        assert_eq!(data.get("a.png").map(String::as_str), Some("x"));
    }

    #[test]
    fn rename_and_prune() {
        let mut data = DrawingData::default();
        data.set("a.png".into(), "1".into());
        data.set("b.png".into(), "2".into());
        assert!(data.rename("a.png", "dir/a.png".into()));
        assert!(!data.rename("missing.png", "x".into()));
        let removed = data.prune(|key| key == "dir/a.png");
        assert_eq!(removed, vec!["b.png".to_string()]);
        assert_eq!(data.drawings.keys().collect::<Vec<_>>(), vec!["dir/a.png"]);
        assert!(data.remove("dir/a.png"));
    }
}
