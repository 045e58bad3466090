//! Write-once annotation store: which handler types and operations carry
//! the "requires authenticated session" marker.
//!
//! The model is opt-in, never opt-out: absence of a marker means no
//! authentication required, and a lookup for an unknown identity simply
//! yields `false`. The store is populated once at startup and read-only at
//! request time — no I/O, no locking.

use std::collections::HashSet;

use crate::identity::{HandlerIdentity, OperationIdentity};
use crate::registry::HandlerRegistry;

/// Read-only marker table built by [`AnnotationStoreBuilder`].
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    marked_types: HashSet<HandlerIdentity>,
    marked_operations: HashSet<(HandlerIdentity, String)>,
}

impl AnnotationStore {
    #[must_use]
    pub fn builder() -> AnnotationStoreBuilder {
        AnnotationStoreBuilder::default()
    }

    /// Whether the handler type itself carries the marker.
    #[must_use]
    pub fn requires_authentication(&self, identity: &HandlerIdentity) -> bool {
        self.marked_types.contains(identity)
    }

    /// Whether the named operation, as invoked through `identity`, carries
    /// the marker. Inherited markers were flattened onto `identity` at
    /// build time, so this is an exact-key lookup.
    #[must_use]
    pub fn operation_requires_authentication(
        &self,
        identity: &HandlerIdentity,
        operation: &OperationIdentity,
    ) -> bool {
        self.marked_operations
            .contains(&(identity.clone(), operation.as_str().to_owned()))
    }
}

/// Collects marker registrations, then builds the flattened store.
#[derive(Debug, Default)]
pub struct AnnotationStoreBuilder {
    marked_types: HashSet<HandlerIdentity>,
    marked_operations: HashSet<(HandlerIdentity, String)>,
}

impl AnnotationStoreBuilder {
    /// Mark a handler type as requiring an authenticated session.
    #[must_use]
    pub fn require_authentication(mut self, identity: impl Into<HandlerIdentity>) -> Self {
        self.marked_types.insert(identity.into());
        self
    }

    /// Mark one operation of a handler type as requiring an authenticated
    /// session. The identity is the type *declaring* the operation.
    #[must_use]
    pub fn require_authentication_for(
        mut self,
        identity: impl Into<HandlerIdentity>,
        operation: &str,
    ) -> Self {
        self.marked_operations
            .insert((identity.into(), operation.to_owned()));
        self
    }

    /// Build the store, flattening operation markers down the registry's
    /// inheritance chains: a marker on a base-declared operation applies
    /// through every derived type, unless a nearer re-declaration shadows
    /// it.
    #[must_use]
    pub fn build(self, registry: &HandlerRegistry) -> AnnotationStore {
        let mut marked_operations = self.marked_operations.clone();

        for identity in registry.registered_types() {
            for (owner, operation) in &self.marked_operations {
                if owner == identity {
                    continue;
                }
                // The marker applies only when the inherited declaration is
                // the one a flattened lookup through `identity` would find.
                if registry.operation_declared_on(identity, operation) == Some(owner) {
                    marked_operations.insert((identity.clone(), operation.clone()));
                }
            }
        }

        AnnotationStore {
            marked_types: self.marked_types,
            marked_operations,
        }
    }
}
