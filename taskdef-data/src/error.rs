use crate::config::ConfigError;
use crate::query::QueryError;

/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    /// A caller-supplied argument is missing or malformed.
    InvalidArgument(String),
    /// A definition with the same name is already registered.
    DuplicateKey(String),
    /// The caller has no resolvable identity and the policy forbids anonymous access.
    Unauthenticated(String),
    NotFound(String),
    /// Any failure reported by the underlying store, propagated unchanged.
    Database(Box<dyn std::error::Error + Send + Sync>),
    Config(ConfigError),
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by backend crates (e.g. `taskdef-data-sqlx`) to wrap
    /// driver-specific errors.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    /// The error raised when `name` is already registered.
    pub fn duplicate_task(name: &str) -> Self {
        DataError::DuplicateKey(format!(
            "Cannot register task {name} because another one has already been registered with the same name"
        ))
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        DataError::InvalidArgument(msg.into())
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, DataError::DuplicateKey(_))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            DataError::DuplicateKey(msg) => write!(f, "Duplicate key: {msg}"),
            DataError::Unauthenticated(msg) => write!(f, "Unauthenticated: {msg}"),
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::Database(err) => write!(f, "Database error: {err}"),
            DataError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            DataError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QueryError> for DataError {
    fn from(err: QueryError) -> Self {
        DataError::InvalidArgument(err.to_string())
    }
}

impl From<ConfigError> for DataError {
    fn from(err: ConfigError) -> Self {
        DataError::Config(err)
    }
}
