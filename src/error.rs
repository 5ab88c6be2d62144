use crate::redmine::transport::TransportError;

/// A write was refused before anything was sent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing mandatory parameters for {resource}: {}", .missing.join(", "))]
    MissingFields {
        resource: String,
        missing: Vec<String>,
    },

    /// Field names become element names, so they must be valid XML names
    #[error("invalid field name for {resource}: {name:?}")]
    InvalidFieldName { resource: String, name: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
