/// Why a submitted master key was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Master key is required")]
    Missing,
    #[error("Invalid master key")]
    Invalid,
}

/// Single-key gate in front of the vault. Comparison ignores letter case.
#[derive(Clone)]
pub struct AuthGate {
    master_key: String,
}

impl AuthGate {
    pub fn new(master_key: impl AsRef<str>) -> Self {
        Self {
            master_key: master_key.as_ref().to_lowercase(),
        }
    }

    pub fn authenticate(&self, submitted: Option<&str>) -> Result<(), AuthError> {
        match submitted {
            None | Some("") => Err(AuthError::Missing),
            Some(key) if key.to_lowercase() == self.master_key => Ok(()),
            Some(_) => Err(AuthError::Invalid),
        }
    }
}
