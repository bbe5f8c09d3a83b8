//! Model store over the asset directory
//!
//! Parsed models are cached by name and re-parsed when the file's
//! modification time changes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::obj::loader::read_model_text;
use crate::obj::{parse_with, LoadError, ObjError, ParseOptions, ParsedObject};

const MODEL_EXTENSION: &str = "obj";

/// Model file listed in the asset directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelEntry {
    pub name: String,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
struct CachedModel {
    modified: Option<SystemTime>,
    objects: Arc<Vec<ParsedObject>>,
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid model name: {0}")]
    InvalidName(String),

    #[error("Model not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Parse failed: {0}")]
    Parse(#[from] ObjError),

    #[error("Asset directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse task failed: {0}")]
    Task(String),
}

/// Lists, loads and caches the `.obj` models under one directory
pub struct ModelStore {
    root: PathBuf,
    options: ParseOptions,
    max_bytes: u64,
    cache: DashMap<String, CachedModel>,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>, options: ParseOptions, max_bytes: u64) -> Self {
        Self {
            root: root.into(),
            options,
            max_bytes,
            cache: DashMap::new(),
        }
    }

    /// Number of parsed models currently cached
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// All `.obj` files directly under the root, sorted by name
    pub async fn list(&self) -> Result<Vec<ModelEntry>, StoreError> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MODEL_EXTENSION) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                entries.push(ModelEntry {
                    name: name.to_string(),
                    bytes: metadata.len(),
                });
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Parsed objects of `<root>/<name>.obj`
    pub async fn get(&self, name: &str) -> Result<Arc<Vec<ParsedObject>>, StoreError> {
        validate_name(name)?;
        let path = self.root.join(format!("{}.{}", name, MODEL_EXTENSION));

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(StoreError::NotFound(name.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let modified = metadata.modified().ok();

        if let Some(cached) = self.cache.get(name) {
            if cached.modified.is_some() && cached.modified == modified {
                debug!(model = %name, "Model cache hit");
                return Ok(cached.objects.clone());
            }
        }

        let text = read_model_text(&path, self.max_bytes).await?;
        let objects = Arc::new(self.parse_blocking(text).await.map_err(|e| match e {
            StoreError::Parse(source) => StoreError::Load(LoadError::Parse { path, source }),
            other => other,
        })?);

        info!(model = %name, objects = objects.len(), "Parsed model");

        self.cache.insert(
            name.to_string(),
            CachedModel {
                modified,
                objects: objects.clone(),
            },
        );

        Ok(objects)
    }

    /// Parse uploaded text with the store's options, bypassing the cache
    pub async fn parse_text(&self, text: String) -> Result<Vec<ParsedObject>, StoreError> {
        self.parse_blocking(text).await
    }

    async fn parse_blocking(&self, text: String) -> Result<Vec<ParsedObject>, StoreError> {
        let options = self.options;
        tokio::task::spawn_blocking(move || parse_with(&text, &options))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
            .map_err(StoreError::from)
    }
}

/// A bare file stem: no separators, no parent references
fn validate_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(|c: char| c == '/' || c == '\\' || c == '\0');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}
