//! Error kinds returned by the persistence collaborators.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Backend cannot be reached or was never configured.
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be turned back into a model.
    #[error("failed to decode stored record: {0}")]
    Decode(String),
}

impl RepositoryError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RepositoryError::Unavailable(_) => true,
            RepositoryError::Decode(_) => false,
            RepositoryError::Database(e) => match e {
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => true,
                sqlx::Error::Database(db) => {
                    // serialization_failure, deadlock_detected, too_many_connections
                    matches!(db.code().as_deref(), Some("40001") | Some("40P01") | Some("53300"))
                }
                other => {
                    let msg = other.to_string().to_lowercase();
                    msg.contains("connection")
                        || msg.contains("timeout")
                        || msg.contains("broken pipe")
                }
            },
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        RepositoryError::Decode(e.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RepositoryError::Unavailable("down".into()).is_transient());
        assert!(RepositoryError::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!RepositoryError::Decode("bad row".into()).is_transient());
        assert!(!RepositoryError::Database(sqlx::Error::RowNotFound).is_transient());
    }

    #[test]
    fn test_display() {
        let e = RepositoryError::Unavailable("no DATABASE_URL".into());
        assert_eq!(e.to_string(), "repository unavailable: no DATABASE_URL");
    }
}
