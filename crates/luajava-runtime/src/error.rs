//! Error types for the bridge.

use thiserror::Error;

/// Errors surfaced to the VM trampolines and to embedders loading policy.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The sandbox rejected a class name. The message format is matched by
    /// script-side error handlers and must not change.
    #[error("luajava forbidden > {0}")]
    Forbidden(String),

    /// Failure reported by the resolver, passed through untouched.
    #[error(transparent)]
    Resolver(#[from] ResolverError),

    /// Policy configuration was parsed but is not acceptable.
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BridgeError {
    /// Whether this error is a sandbox denial.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, BridgeError::Forbidden(_))
    }

    /// The class name a sandbox denial was raised for.
    pub fn forbidden_name(&self) -> Option<&str> {
        match self {
            BridgeError::Forbidden(name) => Some(name),
            _ => None,
        }
    }
}

/// Failures raised by the reflective resolver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// No host class with this name could be loaded.
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// The target has no field with this name.
    #[error("No field '{field}' on {owner}")]
    NoSuchField { owner: String, field: String },

    /// The target has no method with this name.
    #[error("No method '{method}' on {owner}")]
    NoSuchMethod { owner: String, method: String },

    /// More than one overload accepts the supplied arguments.
    #[error("Ambiguous call to '{method}' on {owner}")]
    AmbiguousOverload { owner: String, method: String },

    /// Script index outside `1..=len`.
    #[error("Index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    /// Array access on a value that is not an array.
    #[error("Object is not an array: {0}")]
    NotAnArray(String),

    /// The host method or constructor raised.
    #[error("Invocation failed: {0}")]
    Invocation(String),

    /// Anything else the resolver wants to report.
    #[error("{0}")]
    Other(String),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Result type for resolver operations.
pub type ResolveResult<T> = std::result::Result<T, ResolverError>;
