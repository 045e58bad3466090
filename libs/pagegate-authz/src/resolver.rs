//! Target resolution: mapping a request to the handler type and operation
//! that will actually execute.
//!
//! Three strategies, tried in fixed order, first match wins:
//!
//! 1. a registered page route, optionally extended with its declared
//!    template as chain ancestor;
//! 2. an operation invoked on a routed page via an extra trailing path
//!    segment (write-style methods only);
//! 3. an RPC-style endpoint addressed by the marker segment in the path.
//!
//! A request matching none of the shapes resolves to `None`, and the
//! policy engine treats that as implicitly allowed — only recognized
//! shapes are ever restricted.

use std::sync::Arc;

use http::{Method, Uri};

use crate::dispatch::RpcDispatch;
use crate::identity::{HandlerIdentity, OperationIdentity};
use crate::markup::{self, MarkupInspector};
use crate::registry::{HandlerRegistry, PageMatch};

/// The handler chain and operation a request resolved to.
///
/// The chain is root-first; the most-derived element is the handler that
/// actually runs and always exists. Constructed fresh per request and
/// discarded with it — never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    ancestors: Vec<HandlerIdentity>,
    handler: HandlerIdentity,
    operation: Option<OperationIdentity>,
}

impl ResolvedTarget {
    #[must_use]
    pub fn new(handler: impl Into<HandlerIdentity>) -> Self {
        Self {
            ancestors: Vec::new(),
            handler: handler.into(),
            operation: None,
        }
    }

    /// Append a chain ancestor (root-first order).
    #[must_use]
    pub fn with_ancestor(mut self, ancestor: impl Into<HandlerIdentity>) -> Self {
        self.ancestors.push(ancestor.into());
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: OperationIdentity) -> Self {
        self.operation = Some(operation);
        self
    }

    /// The whole resolution chain, root-first ancestor to invoked handler.
    pub fn chain(&self) -> impl Iterator<Item = &HandlerIdentity> {
        self.ancestors.iter().chain(std::iter::once(&self.handler))
    }

    /// The most-derived, actually-invoked handler.
    #[must_use]
    pub fn handler(&self) -> &HandlerIdentity {
        &self.handler
    }

    #[must_use]
    pub fn ancestors(&self) -> &[HandlerIdentity] {
        &self.ancestors
    }

    #[must_use]
    pub fn operation(&self) -> Option<&OperationIdentity> {
        self.operation.as_ref()
    }
}

/// Resolution tunables. The defaults are the conventional markers of the
/// legacy deployments this gateway fronts.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Path segment marking an RPC-style endpoint: everything before it
    /// is the service location, the next segment after it the operation.
    pub rpc_path_marker: String,
    /// Requests whose URI contains any of these markers skip template
    /// resolution (resource endpoints that reuse page routes).
    pub template_skip_markers: Vec<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            rpc_path_marker: ".asmx/".to_owned(),
            template_skip_markers: vec![".axd?".to_owned()],
        }
    }
}

/// Per-request target resolution over the startup-built registry.
pub struct TargetResolver {
    registry: Arc<HandlerRegistry>,
    markup: Arc<dyn MarkupInspector>,
    options: ResolverOptions,
}

impl TargetResolver {
    #[must_use]
    pub fn new(
        registry: Arc<HandlerRegistry>,
        markup: Arc<dyn MarkupInspector>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            registry,
            markup,
            options,
        }
    }

    /// Resolve a request to its target, or `None` for unrecognized shapes.
    #[must_use]
    pub fn resolve(
        &self,
        method: &Method,
        uri: &Uri,
        dispatch: Option<&RpcDispatch>,
    ) -> Option<ResolvedTarget> {
        if let Some(page) = self.registry.page_at(uri.path()) {
            return Some(self.resolve_page(method, uri, &page));
        }
        self.resolve_rpc(uri.path(), dispatch)
    }

    fn resolve_page(&self, method: &Method, uri: &Uri, page: &PageMatch) -> ResolvedTarget {
        let mut target = ResolvedTarget::new(page.identity.clone());

        if let Some(template) = self.template_ancestor(uri, page) {
            target = target.with_ancestor(template);
        }

        if is_write_method(method) {
            if let Some(name) = page.trailing_segment.as_deref() {
                if self.registry.operation_visible(&page.identity, name) {
                    target = target.with_operation(OperationIdentity::new(name));
                }
            }
        }

        target
    }

    /// One level of template chaining: the page's declared template type,
    /// when the declaration exists and resolves. Everything that can go
    /// missing here fails open to "no template in the chain"; only the
    /// markup read failure is worth a log line.
    fn template_ancestor(&self, uri: &Uri, page: &PageMatch) -> Option<HandlerIdentity> {
        let markup_location = page.markup_location.as_deref()?;
        if self.skip_template_lookup(uri) {
            return None;
        }

        let reference = match self.markup.template_reference(markup_location) {
            Ok(Some(reference)) => reference,
            Ok(None) => return None,
            Err(err) => {
                tracing::debug!(
                    location = markup_location,
                    error = %err,
                    "markup read failed; dropping template link"
                );
                return None;
            }
        };

        let combined = markup::combine_reference(markup_location, &reference);
        self.registry.type_at_location(&combined).cloned()
    }

    fn skip_template_lookup(&self, uri: &Uri) -> bool {
        if self.options.template_skip_markers.is_empty() {
            return false;
        }
        let full = uri
            .path_and_query()
            .map_or_else(|| uri.path().to_owned(), |pq| pq.as_str().to_owned());
        let lowered = full.to_ascii_lowercase();
        // An empty marker matches every URI; treat it as not configured.
        self.options
            .template_skip_markers
            .iter()
            .filter(|marker| !marker.is_empty())
            .any(|marker| lowered.contains(&marker.to_ascii_lowercase()))
    }

    fn resolve_rpc(&self, path: &str, dispatch: Option<&RpcDispatch>) -> Option<ResolvedTarget> {
        let marker = &self.options.rpc_path_marker;
        let idx = if self.registry.is_case_insensitive() {
            path.to_ascii_lowercase()
                .find(&marker.to_ascii_lowercase())?
        } else {
            path.find(marker.as_str())?
        };

        // Markers without a trailing separator (".svc") leave `after`
        // starting at the separator itself.
        let after = path[idx + marker.len()..].trim_start_matches('/');
        let operation = after.split('/').next().unwrap_or_default();
        if operation.is_empty() {
            return None;
        }

        // The service location keeps the marker's file segment but not its
        // trailing separator.
        let location_end = if marker.ends_with('/') {
            idx + marker.len() - 1
        } else {
            idx + marker.len()
        };
        let location = &path[..location_end];

        let identity = self
            .registry
            .type_at_location(location)
            .cloned()
            .or_else(|| dispatch.and_then(|graph| graph.actual_type().cloned()))?;

        Some(ResolvedTarget::new(identity).with_operation(OperationIdentity::new(operation)))
    }
}

fn is_write_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
