//! Failures raised by the MongoDB-backed stores. None of them reach a
//! client verbatim; handlers replace them with a fixed message outside
//! development.

use mongodb::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Server selection, network or authentication failure
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A document did not map to or from BSON
    #[error("document mapping failed: {0}")]
    Mapping(String),
    /// The server accepted the connection but refused the operation
    #[error("store rejected the operation: {0}")]
    Rejected(String),
}

impl RepositoryError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        RepositoryError::Unavailable(msg.into())
    }

    /// Whether retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}

impl From<mongodb::error::Error> for RepositoryError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::Authentication { .. } => {
                RepositoryError::Unavailable(err.to_string())
            }
            ErrorKind::BsonDeserialization(_) | ErrorKind::BsonSerialization(_) => {
                RepositoryError::Mapping(err.to_string())
            }
            _ => RepositoryError::Rejected(err.to_string()),
        }
    }
}

impl From<bson::ser::Error> for RepositoryError {
    fn from(err: bson::ser::Error) -> Self {
        RepositoryError::Mapping(err.to_string())
    }
}

impl From<bson::de::Error> for RepositoryError {
    fn from(err: bson::de::Error) -> Self {
        RepositoryError::Mapping(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_transient() {
        assert!(RepositoryError::unavailable("timeout").is_transient());
        assert!(!RepositoryError::Mapping("bad date".to_string()).is_transient());
        assert!(!RepositoryError::Rejected("duplicate key".to_string()).is_transient());
    }

    #[test]
    fn test_bson_errors_are_mapping_failures() {
        let err = bson::from_document::<crate::model::user::User>(bson::doc! { "email": 5 }).unwrap_err();
        assert!(matches!(RepositoryError::from(err), RepositoryError::Mapping(_)));
    }
}
