//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities.
//! All entities must have a unique ID and be thread-safe.

use thiserror::Error;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Clone + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> &Self::Id;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
///
/// None of these are fatal: every failure degrades to "the requested move
/// did not take effect".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A move or lookup referenced an id that is not in the snapshot
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    /// A move targeted a container id that is not an existing group
    #[error("Container not found: {0}")]
    ContainerNotFound(String),
    /// The remote write was rejected, timed out or could not be reached
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Storage-level failure inside the item store (SQL, serialization)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Fold any error into a persistence failure, keeping the message.
    pub fn into_persistence(self) -> DomainError {
        match self {
            DomainError::PersistenceFailure(_) => self,
            other => DomainError::PersistenceFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::ItemNotFound("t1".to_string());
        assert_eq!(err.to_string(), "Item not found: t1");
    }

    #[test]
    fn test_into_persistence_keeps_message() {
        let err = DomainError::Storage("disk full".to_string()).into_persistence();
        assert_eq!(
            err,
            DomainError::PersistenceFailure("Storage error: disk full".to_string())
        );

        let already = DomainError::PersistenceFailure("timeout".to_string());
        assert_eq!(already.clone().into_persistence(), already);
    }
}
