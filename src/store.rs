use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::error::TrainError;
use crate::model::{ModelMetadata, Snapshot, TrainedModel};

const MODEL_SUFFIX: &str = ".model.json";
const META_SUFFIX: &str = ".meta.json";
const MANIFEST_FILE: &str = "manifest.json";

/// Filesystem store for trained models and named snapshots.
///
/// Layout under the root:
///   models/<key>.model.json + models/<key>.meta.json   (live models)
///   snapshots/<uuid>/manifest.json + copied pairs      (immutable copies)
///
/// Every operation is a short, self-contained read or write; nothing holds
/// a lock across calls, and all operations are idempotent per storage key.
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn models_dir(&self) -> PathBuf {
        self.root.join("models")
    }

    fn snapshots_dir(&self) -> PathBuf {
        self.root.join("snapshots")
    }

    fn model_path(&self, key: &str) -> PathBuf {
        self.models_dir().join(format!("{key}{MODEL_SUFFIX}"))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.models_dir().join(format!("{key}{META_SUFFIX}"))
    }

    /// Overwrites any existing pair for the target id.
    pub fn save(
        &self,
        target_id: &str,
        model: &TrainedModel,
        metadata: &ModelMetadata,
    ) -> Result<(), TrainError> {
        let key = sanitize_key(target_id);
        fs::create_dir_all(self.models_dir())?;
        fs::write(self.model_path(&key), serde_json::to_vec_pretty(model)?)?;
        fs::write(self.meta_path(&key), serde_json::to_vec_pretty(metadata)?)?;
        tracing::info!(target_id = %target_id, kind = %model.kind(), "Model saved");
        Ok(())
    }

    /// `None` when either file is missing or unparsable; a corrupt model on
    /// disk reads the same as "not yet trained".
    pub fn load(&self, target_id: &str) -> Option<(TrainedModel, ModelMetadata)> {
        let key = sanitize_key(target_id);
        let model = read_json::<TrainedModel>(&self.model_path(&key))?;
        let metadata = read_json::<ModelMetadata>(&self.meta_path(&key))?;
        Some((model, metadata))
    }

    pub fn delete(&self, target_id: &str) -> Result<(), TrainError> {
        let key = sanitize_key(target_id);
        remove_if_present(&self.model_path(&key))?;
        remove_if_present(&self.meta_path(&key))?;
        Ok(())
    }

    pub fn delete_all(&self) -> Result<(), TrainError> {
        let dir = self.models_dir();
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// All snapshot manifests, newest first.
    pub fn list_snapshots(&self) -> Result<Vec<Snapshot>, TrainError> {
        let dir = self.snapshots_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if let Some(manifest) = read_json::<Snapshot>(&entry.path().join(MANIFEST_FILE)) {
                snapshots.push(manifest);
            }
        }
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(snapshots)
    }

    /// Copy the current model+metadata pair for each target id into a new
    /// snapshot folder. Targets with no live model are skipped, and the
    /// manifest lists only what was actually copied.
    pub fn save_snapshot(
        &self,
        name: &str,
        target_ids: &[String],
    ) -> Result<Snapshot, TrainError> {
        let id = Uuid::new_v4().to_string();
        let dir = self.snapshots_dir().join(&id);
        fs::create_dir_all(&dir)?;

        let mut included = Vec::new();
        for target_id in target_ids {
            let key = sanitize_key(target_id);
            let model_path = self.model_path(&key);
            let meta_path = self.meta_path(&key);
            if !model_path.exists() || !meta_path.exists() {
                continue;
            }
            fs::copy(&model_path, dir.join(format!("{key}{MODEL_SUFFIX}")))?;
            fs::copy(&meta_path, dir.join(format!("{key}{META_SUFFIX}")))?;
            included.push(target_id.clone());
        }

        let snapshot = Snapshot {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
            target_ids: included,
        };
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&snapshot)?,
        )?;
        tracing::info!(
            snapshot_id = %snapshot.id,
            name = %snapshot.name,
            targets = snapshot.target_ids.len(),
            "Snapshot saved"
        );
        Ok(snapshot)
    }

    /// Copy a snapshot's files back over the live model store. Returns
    /// `Ok(false)` when no snapshot with that id exists.
    pub fn restore_snapshot(&self, id: &str) -> Result<bool, TrainError> {
        let dir = self.snapshots_dir().join(id);
        let Some(manifest) = read_json::<Snapshot>(&dir.join(MANIFEST_FILE)) else {
            return Ok(false);
        };
        fs::create_dir_all(self.models_dir())?;
        for target_id in &manifest.target_ids {
            let key = sanitize_key(target_id);
            for suffix in [MODEL_SUFFIX, META_SUFFIX] {
                let src = dir.join(format!("{key}{suffix}"));
                if src.exists() {
                    fs::copy(&src, self.models_dir().join(format!("{key}{suffix}")))?;
                }
            }
        }
        tracing::info!(snapshot_id = %id, "Snapshot restored over live models");
        Ok(true)
    }

    pub fn delete_snapshot(&self, id: &str) -> Result<(), TrainError> {
        let dir = self.snapshots_dir().join(id);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// Target ids become storage keys; anything path-unsafe collapses to '_'.
fn sanitize_key(target_id: &str) -> String {
    target_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
