//! Startup-built registry of handler types, page routes, and location
//! bindings.
//!
//! The registry replaces any runtime reflection over the host's compiled
//! handlers: everything the resolver needs to know about a deployment is
//! registered explicitly before the pipeline starts serving, and the
//! resulting structure is read-only thereafter.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::identity::HandlerIdentity;

/// Metadata for one registered handler type.
#[derive(Debug, Clone, Default)]
struct TypeEntry {
    base: Option<HandlerIdentity>,
    operations: HashSet<String>,
}

/// A page route binding: the page's concrete type plus the markup location
/// used for template-chain resolution.
#[derive(Debug, Clone)]
struct PageBinding {
    identity: HandlerIdentity,
    markup_location: Option<String>,
}

/// Result of matching a request path against the registered page routes.
#[derive(Debug, Clone)]
pub struct PageMatch {
    /// The routed page type.
    pub identity: HandlerIdentity,
    /// Where the page's markup lives, when it has any.
    pub markup_location: Option<String>,
    /// Extra path segment trailing the page's own route, if the request
    /// carried one (candidate operation name).
    pub trailing_segment: Option<String>,
}

/// Errors raised while building a [`HandlerRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A page route could not be inserted into the route matcher.
    #[error("failed to insert page route '{route}': {source}")]
    Route {
        route: String,
        #[source]
        source: matchit::InsertError,
    },
}

/// Read-only lookup structure over the deployed handler set.
pub struct HandlerRegistry {
    types: HashMap<HandlerIdentity, TypeEntry>,
    locations: HashMap<String, HandlerIdentity>,
    pages: matchit::Router<PageBinding>,
    case_insensitive: bool,
}

impl HandlerRegistry {
    #[must_use]
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Whether path and location matching folds case.
    #[must_use]
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    fn normalize(&self, value: &str) -> String {
        if self.case_insensitive {
            value.to_ascii_lowercase()
        } else {
            value.to_owned()
        }
    }

    /// Match a request path against the registered page routes.
    ///
    /// A path extending a page route by extra segments still matches that
    /// page; the first extra segment is surfaced as `trailing_segment`.
    #[must_use]
    pub fn page_at(&self, path: &str) -> Option<PageMatch> {
        let normalized = self.normalize(path);
        let matched = self.pages.at(&normalized).ok()?;
        let trailing_segment = matched.params.get("trailing").and_then(|rest| {
            let first = rest.split('/').next().unwrap_or_default();
            (!first.is_empty()).then(|| first.to_owned())
        });

        Some(PageMatch {
            identity: matched.value.identity.clone(),
            markup_location: matched.value.markup_location.clone(),
            trailing_segment,
        })
    }

    /// Resolve a declared location string (template path, service path) to
    /// its registered handler type.
    #[must_use]
    pub fn type_at_location(&self, location: &str) -> Option<&HandlerIdentity> {
        self.locations.get(&self.normalize(location))
    }

    /// Nearest type in `identity`'s inheritance chain (self first) that
    /// declares `operation`. Mirrors flattened method lookup: a
    /// re-declaration on a derived type shadows the base declaration.
    #[must_use]
    pub fn operation_declared_on(
        &self,
        identity: &HandlerIdentity,
        operation: &str,
    ) -> Option<&HandlerIdentity> {
        let mut current = self.types.get_key_value(identity);
        // Bounded walk; a malformed base cycle cannot loop forever.
        for _ in 0..=self.types.len() {
            let (id, entry) = current?;
            if entry.operations.contains(operation) {
                return Some(id);
            }
            current = entry
                .base
                .as_ref()
                .and_then(|base| self.types.get_key_value(base));
        }
        None
    }

    /// Whether `operation` is visible on `identity`, declared directly or
    /// inherited from a base type.
    #[must_use]
    pub fn operation_visible(&self, identity: &HandlerIdentity, operation: &str) -> bool {
        self.operation_declared_on(identity, operation).is_some()
    }

    pub(crate) fn registered_types(&self) -> impl Iterator<Item = &HandlerIdentity> {
        self.types.keys()
    }
}

/// Builder for [`HandlerRegistry`]. Registration order does not matter;
/// base types may be registered after their derived types.
#[derive(Debug)]
pub struct HandlerRegistryBuilder {
    types: HashMap<HandlerIdentity, TypeEntry>,
    locations: Vec<(String, HandlerIdentity)>,
    pages: Vec<(String, PageBinding)>,
    case_insensitive: bool,
}

impl Default for HandlerRegistryBuilder {
    fn default() -> Self {
        Self {
            types: HashMap::new(),
            locations: Vec::new(),
            pages: Vec::new(),
            case_insensitive: true,
        }
    }
}

impl HandlerRegistryBuilder {
    /// Fold case when matching paths and locations. Defaults to `true`.
    #[must_use]
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    /// Register a handler type with no base.
    #[must_use]
    pub fn register_type(mut self, identity: impl Into<HandlerIdentity>) -> Self {
        self.types.entry(identity.into()).or_default();
        self
    }

    /// Register a handler type deriving from `base`.
    #[must_use]
    pub fn register_type_with_base(
        mut self,
        identity: impl Into<HandlerIdentity>,
        base: impl Into<HandlerIdentity>,
    ) -> Self {
        let base = base.into();
        self.types.entry(identity.into()).or_default().base = Some(base.clone());
        self.types.entry(base).or_default();
        self
    }

    /// Declare a publicly invocable operation on a handler type.
    #[must_use]
    pub fn register_operation(
        mut self,
        identity: impl Into<HandlerIdentity>,
        operation: &str,
    ) -> Self {
        self.types
            .entry(identity.into())
            .or_default()
            .operations
            .insert(operation.to_owned());
        self
    }

    /// Bind a page route to its handler type, with an optional markup
    /// location used for template-chain resolution.
    #[must_use]
    pub fn register_page(
        mut self,
        route: &str,
        identity: impl Into<HandlerIdentity>,
        markup_location: Option<&str>,
    ) -> Self {
        let identity = identity.into();
        self.types.entry(identity.clone()).or_default();
        self.pages.push((
            route.to_owned(),
            PageBinding {
                identity,
                markup_location: markup_location.map(str::to_owned),
            },
        ));
        self
    }

    /// Bind a declared location string (template path, service path) to a
    /// handler type.
    #[must_use]
    pub fn register_location(
        mut self,
        location: &str,
        identity: impl Into<HandlerIdentity>,
    ) -> Self {
        let identity = identity.into();
        self.types.entry(identity.clone()).or_default();
        self.locations.push((location.to_owned(), identity));
        self
    }

    /// Build the read-only registry.
    ///
    /// # Errors
    /// Returns [`RegistryError::Route`] when a page route conflicts with an
    /// already-registered one.
    pub fn build(self) -> Result<HandlerRegistry, RegistryError> {
        let normalize = |value: &str| {
            if self.case_insensitive {
                value.to_ascii_lowercase()
            } else {
                value.to_owned()
            }
        };

        let mut pages = matchit::Router::new();
        for (route, binding) in self.pages {
            let normalized = normalize(&route);
            pages
                .insert(normalized.clone(), binding.clone())
                .map_err(|source| RegistryError::Route {
                    route: route.clone(),
                    source,
                })?;
            // Also match requests that append extra segments to the page
            // route (operation invocations). Routes already ending in a
            // separator (the site root) take no trailing form.
            if !normalized.ends_with('/') {
                pages
                    .insert(format!("{normalized}/{{*trailing}}"), binding)
                    .map_err(|source| RegistryError::Route { route, source })?;
            }
        }

        let locations = self
            .locations
            .into_iter()
            .map(|(location, identity)| (normalize(&location), identity))
            .collect();

        Ok(HandlerRegistry {
            types: self.types,
            locations,
            pages,
            case_insensitive: self.case_insensitive,
        })
    }
}
