use provenance_store::StorageError;
use provenance_types::{KeyError, LabelError, ParseError};

/// Result alias for graph operations.
pub type ProvenanceResult<T> = Result<T, ProvenanceError>;

/// Errors from provenance graph operations.
#[derive(Debug, thiserror::Error)]
pub enum ProvenanceError {
    /// Wrong kind of object for the call, e.g. an unknown node handle or
    /// sealing a data node.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Illegal link topology, label or degree, or an otherwise invalid
    /// argument.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Mutation of state that is immutable in the node's lifecycle stage.
    #[error("modification not allowed: {0}")]
    ModificationNotAllowed(String),

    /// Access to or deletion of an attribute or extra that does not exist.
    #[error("no such key: {0}")]
    MissingKey(String),

    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    #[error("hashing failed: {0}")]
    Hashing(#[from] HashingError),

    #[error("multiple objects found: {0}")]
    MultipleObjects(String),

    #[error("not existent: {0}")]
    NotExistent(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<ParseError> for ProvenanceError {
    fn from(e: ParseError) -> Self {
        Self::TypeMismatch(e.to_string())
    }
}

impl From<LabelError> for ProvenanceError {
    fn from(e: LabelError) -> Self {
        Self::InvalidValue(format!("invalid link label: {}", e))
    }
}

/// Errors raised while computing a content hash.
#[derive(Debug, thiserror::Error)]
pub enum HashingError {
    /// NaN and infinities have no canonical encoding.
    #[error("non-finite float at `{path}`")]
    NonFinite { path: String },

    #[error("repository object for `{path}` is missing from the object store")]
    MissingObject { path: String },

    #[error("storage error while hashing: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from loading or resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid caching identifier `{0}`")]
    InvalidIdentifier(String),

    /// The identifier is matched by equally specific patterns in both the
    /// enabled and the disabled list.
    #[error("identifier `{identifier}` matches both `{enabled}` (enabled) and `{disabled}` (disabled)")]
    AmbiguousCaching {
        identifier: String,
        enabled: String,
        disabled: String,
    },
}
