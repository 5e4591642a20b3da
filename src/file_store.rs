use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use crate::cipher::VaultCipher;
use crate::error::{AppError, StoreError};
use crate::models::secret::{NewSecret, SecretRecord};
use crate::repository::{RemoveOutcome, SecretRepository};
use crate::util::{now_iso, now_millis};

pub const STORE_FILE_NAME: &str = "secrets.enc";

/// Secret store backed by a single encrypted file. Every mutation reads,
/// re-encrypts and overwrites the whole file in place.
pub struct FileSecretStore {
    data_dir: PathBuf,
    path: PathBuf,
    cipher: VaultCipher,
    // Serializes read-modify-write cycles inside this process only.
    write_lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(data_dir: impl Into<PathBuf>, cipher: VaultCipher) -> Self {
        let data_dir = data_dir.into();
        let path = data_dir.join(STORE_FILE_NAME);
        Self {
            data_dir,
            path,
            cipher,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_data_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    /// `None` when the store file does not exist.
    async fn load(&self) -> Result<Option<Vec<SecretRecord>>, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "store: file absent");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(self.decode(&bytes)))
    }

    /// Corruption of any kind reads as an empty store.
    fn decode(&self, bytes: &[u8]) -> Vec<SecretRecord> {
        let envelope = match std::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(_) => {
                tracing::warn!(path = %self.path.display(), "store: file is not text, treating as empty");
                return Vec::new();
            }
        };
        let plaintext = match self.cipher.open(envelope) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "store: decrypt failed, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_slice(&plaintext) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "store: parse failed, treating as empty");
                Vec::new()
            }
        }
    }

    async fn write(&self, records: &[SecretRecord]) -> Result<(), StoreError> {
        let plaintext = serde_json::to_vec(records)?;
        let envelope = self.cipher.seal(&plaintext)?;
        fs::write(&self.path, envelope).await?;
        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            "store: file rewritten"
        );
        Ok(())
    }
}

/// Millisecond timestamp id, bumped past the newest stored id on collision.
fn next_id(existing: &[SecretRecord], now: i64) -> String {
    let newest = existing
        .iter()
        .filter_map(|r| r.id.parse::<i64>().ok())
        .max();
    match newest {
        Some(newest) if newest >= now => newest.saturating_add(1).to_string(),
        _ => now.to_string(),
    }
}

#[async_trait]
impl SecretRepository for FileSecretStore {
    async fn list(&self) -> Result<Vec<SecretRecord>, AppError> {
        self.ensure_data_dir().await?;
        let records = self.load().await?.unwrap_or_default();
        tracing::debug!(records = records.len(), "store: list");
        Ok(records)
    }

    async fn append(&self, secret: NewSecret) -> Result<SecretRecord, AppError> {
        secret.validate().map_err(AppError::BadRequest)?;

        let _guard = self.write_lock.lock().await;
        self.ensure_data_dir().await?;

        let mut records = self.load().await?.unwrap_or_default();
        let record = SecretRecord {
            id: next_id(&records, now_millis()),
            email: secret.email.unwrap_or_default(),
            password: secret.password.unwrap_or_default(),
            description: secret.description.unwrap_or_default(),
            created_at: now_iso(),
        };
        tracing::debug!(id = %record.id, existing = records.len(), "store: append");

        records.push(record.clone());
        self.write(&records).await?;

        Ok(record)
    }

    async fn remove_by_id(&self, id: &str) -> Result<RemoveOutcome, AppError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_data_dir().await?;

        let Some(mut records) = self.load().await? else {
            return Ok(RemoveOutcome::StoreMissing);
        };

        let before = records.len();
        records.retain(|r| r.id != id);
        let removed = records.len() < before;
        tracing::debug!(id = %id, removed, remaining = records.len(), "store: remove");

        self.write(&records).await?;

        Ok(if removed {
            RemoveOutcome::Removed
        } else {
            RemoveOutcome::NotPresent
        })
    }

    /// The data directory is usable and the store file, when present, is a
    /// readable regular file.
    async fn health_check(&self) -> Result<(), AppError> {
        self.ensure_data_dir().await?;
        match fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => {
                fs::File::open(&self.path).await.map_err(StoreError::from)?;
            }
            Ok(_) => {
                let e = std::io::Error::new(ErrorKind::Other, "store path is not a regular file");
                return Err(StoreError::from(e).into());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::from(e).into()),
        }
        tracing::debug!(path = %self.path.display(), "store: health ok");
        Ok(())
    }
}
