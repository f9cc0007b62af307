//! Error types for the storage layer.
//!
//! All errors are propagated via [`StoreError`]. A [`StoreError::NotFound`]
//! from a mutator means the entity vanished between read and write; the
//! simulators treat that as "skip this entity" via
//! [`StoreResultExt::skip_missing`]. Every other variant is fatal to the
//! current tick.

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The entity a mutator targeted does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"agent"`.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// A uniqueness constraint was violated.
    #[error("{entity} conflict: {reason}")]
    Conflict {
        /// Entity kind, e.g. `"vote"`.
        entity: &'static str,
        /// Which constraint was violated.
        reason: String,
    },

    /// Reading or writing a snapshot file failed.
    #[error("snapshot I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A serialization or deserialization error.
    #[error("serialization error: {source}")]
    Serialization {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Build a [`StoreError::NotFound`] for the given entity kind and id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Build a [`StoreError::Conflict`].
    pub fn conflict(entity: &'static str, reason: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            reason: reason.into(),
        }
    }

    /// Whether this error only signals a vanished entity.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Converts vanished-entity errors into a skip.
pub trait StoreResultExt<T> {
    /// `Ok(Some(v))` on success, `Ok(None)` on [`StoreError::NotFound`],
    /// and the error for anything else.
    fn skip_missing(self) -> Result<Option<T>, StoreError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn skip_missing(self) -> Result<Option<T>, StoreError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.is_not_found() => {
                tracing::warn!(error = %e, "entity vanished during tick, skipping");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
