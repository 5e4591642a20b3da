use async_trait::async_trait;

use crate::error::AppError;
use crate::models::secret::{NewSecret, SecretRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The store exists but held no record with that id.
    NotPresent,
    /// There is no store file at all.
    StoreMissing,
}

#[async_trait]
pub trait SecretRepository: Send + Sync {
    /// Records in insertion order. An absent or undecryptable store reads as empty.
    async fn list(&self) -> Result<Vec<SecretRecord>, AppError>;
    async fn append(&self, secret: NewSecret) -> Result<SecretRecord, AppError>;
    async fn remove_by_id(&self, id: &str) -> Result<RemoveOutcome, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}
