// ABOUTME: State store mapping presentation names to JSON documents on disk
// ABOUTME: Provides create/load/save with atomic writes and per-name locking

use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::schema::{validate_document, validate_name, PresentationDocument};
use log::{debug, info};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Process-wide map from presentation name to its mutex. Held across the
/// load-mutate-save span of every mutating tool so concurrent calls against
/// one name cannot lose updates.
static NAME_LOCKS: Lazy<Mutex<HashMap<String, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Fetch the mutex guarding a presentation name.
pub fn name_lock(name: &str) -> Arc<Mutex<()>> {
    NAME_LOCKS
        .lock()
        .entry(name.to_string())
        .or_default()
        .clone()
}

/// Durable storage for presentation documents, one JSON file per name under
/// the `.state` subdirectory of the storage root.
pub struct StateStore {
    state_dir: PathBuf,
}

impl StateStore {
    pub fn new(config: &Config) -> Self {
        Self {
            state_dir: config.storage_dir.join(".state"),
        }
    }

    pub fn state_file_path(&self, name: &str) -> PathBuf {
        self.state_dir.join(format!("{}.json", name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.state_file_path(name).exists()
    }

    fn ensure_state_dir(&self) -> Result<()> {
        if !self.state_dir.exists() {
            fs::create_dir_all(&self.state_dir)?;
        }
        Ok(())
    }

    /// Build a fresh document with empty slides and persist it. Fails with
    /// `AlreadyExists` unless `overwrite` is set.
    pub fn create(
        &self,
        name: &str,
        title: Option<String>,
        subject: Option<String>,
        overwrite: bool,
    ) -> Result<PresentationDocument> {
        validate_name(name).map_err(|reason| DeckError::Validation(vec![reason]))?;

        if self.exists(name) && !overwrite {
            return Err(DeckError::AlreadyExists(name.to_string()));
        }

        let doc = PresentationDocument::new(name, title, subject);
        self.save(&doc)?;
        info!("Created presentation {:?}", name);
        Ok(doc)
    }

    /// Load a document by name. A missing file is `NotFound`; bytes that
    /// fail to parse or violate the schema are `Corrupt`.
    pub fn load(&self, name: &str) -> Result<PresentationDocument> {
        validate_name(name).map_err(|reason| DeckError::Validation(vec![reason]))?;
        let path = self.state_file_path(name);
        if !path.exists() {
            return Err(DeckError::NotFound(name.to_string()));
        }

        let bytes = fs::read_to_string(&path)?;
        let doc: PresentationDocument =
            serde_json::from_str(&bytes).map_err(|e| DeckError::Corrupt {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        validate_document(&doc).map_err(|e| DeckError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Loaded presentation {:?} ({} slides)", name, doc.slides.len());
        Ok(doc)
    }

    /// Persist a document, overwriting any prior version. The JSON is
    /// written to a temporary path and renamed into place so a crash
    /// mid-write never leaves a parseable-but-wrong file.
    pub fn save(&self, doc: &PresentationDocument) -> Result<PathBuf> {
        self.ensure_state_dir()?;

        let path = self.state_file_path(&doc.metadata.name);
        let tmp_path = self
            .state_dir
            .join(format!("{}.json.tmp-{}", doc.metadata.name, uuid::Uuid::new_v4()));

        let json = serde_json::to_string_pretty(doc)?;
        fs::write(&tmp_path, json)?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!("Saved presentation {:?} to {:?}", doc.metadata.name, path);
        Ok(path)
    }
}
