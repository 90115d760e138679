//! Error types for myorm

use thiserror::Error;

/// Result type alias for myorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error type for a failed executor call.
///
/// Executors box their own error type so it can be propagated unchanged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for condition building, statement assembly and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Unsupported condition input or malformed predicate key
    #[error("Condition shape error: {0}")]
    Shape(String),

    /// IN / BETWEEN given the wrong number of values
    #[error("Operator {op} expects {expected} value(s), got {got}")]
    Arity {
        op: String,
        expected: &'static str,
        got: usize,
    },

    /// Refused to emit an unconditional UPDATE/DELETE or an empty statement
    #[error("Policy violation: {0}")]
    Policy(String),

    /// The entity's declared table does not match the managed kind
    #[error("Entity identity mismatch: expected table '{expected}', found '{found}'")]
    Identity { expected: String, found: String },

    /// Sharding is disabled or the shard key is invalid
    #[error("Sharding error: {0}")]
    Sharding(String),

    /// A raw query failed syntax checking or is not a read
    #[error("Syntax check failed: {0}")]
    SyntaxCheck(String),

    /// Executor failure, propagated unchanged
    #[error("Query error: {0}")]
    Query(#[source] BoxError),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Querier assembly error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Options could not be loaded
    #[error("Config error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a shape error
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// Create an arity error for an operator
    pub fn arity(op: impl Into<String>, expected: &'static str, got: usize) -> Self {
        Self::Arity {
            op: op.into(),
            expected,
            got,
        }
    }

    /// Create a policy error
    pub fn policy(message: impl Into<String>) -> Self {
        Self::Policy(message.into())
    }

    /// Create an identity error
    pub fn identity(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::Identity {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a sharding error
    pub fn sharding(message: impl Into<String>) -> Self {
        Self::Sharding(message.into())
    }

    /// Create a syntax check error
    pub fn syntax_check(message: impl Into<String>) -> Self {
        Self::SyntaxCheck(message.into())
    }

    /// Wrap an executor error
    pub fn query(err: impl Into<BoxError>) -> Self {
        Self::Query(err.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a shape error
    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Shape(_))
    }

    /// Check if this is an arity error
    pub fn is_arity(&self) -> bool {
        matches!(self, Self::Arity { .. })
    }

    /// Check if this is a policy error
    pub fn is_policy(&self) -> bool {
        matches!(self, Self::Policy(_))
    }

    /// Check if this is an identity error
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity { .. })
    }

    /// Check if this is a sharding error
    pub fn is_sharding(&self) -> bool {
        matches!(self, Self::Sharding(_))
    }

    /// Check if this is a syntax check error
    pub fn is_syntax_check(&self) -> bool {
        matches!(self, Self::SyntaxCheck(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from the executor
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
