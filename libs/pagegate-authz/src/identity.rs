//! Identity types for resolved handlers and operations.

use std::fmt;
use std::sync::Arc;

/// Opaque identifier of a concrete handler type, typically a
/// fully-qualified type name. Immutable once resolved; compared by
/// equality. Cheap to clone — resolution chains copy these per request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerIdentity(Arc<str>);

impl HandlerIdentity {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for HandlerIdentity {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

/// Name of an operation exposed by a handler, as invoked by the request.
/// Not every request targets an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationIdentity(String);

impl OperationIdentity {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for OperationIdentity {
    fn from(name: String) -> Self {
        Self(name)
    }
}
