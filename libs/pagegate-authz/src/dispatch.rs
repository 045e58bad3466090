//! RPC dispatch metadata, as attached to a request by a legacy adapter.
//!
//! RPC-style endpoints are served through adapters whose public handler
//! object does not expose the concrete implementing type. The adapter
//! instead attaches this graph to the request; the resolver walks
//! original handler, dispatch data, owner, type data, actual type, in
//! that order. Every link is capability-dependent and may be absent —
//! any gap terminates the walk with "no target resolved", which the
//! policy treats as an implicit allow.

use crate::identity::HandlerIdentity;

/// Root of the dispatch metadata graph for one RPC request.
#[derive(Debug, Clone, Default)]
pub struct RpcDispatch {
    /// The originally constructed handler, before any wrapping.
    pub original_handler: Option<OriginalHandler>,
}

/// The adapter's handler object.
///
/// Session-enabled deployments route operations through a wrapper
/// subtype; for those the walk restarts one level up, on the base
/// handler.
#[derive(Debug, Clone, Default)]
pub struct OriginalHandler {
    /// Set when this handler is the session-enabled wrapper subtype.
    pub session_wrapper: bool,
    /// Base handler, one level up from a wrapper.
    pub base: Option<Box<OriginalHandler>>,
    /// Per-operation dispatch data.
    pub dispatch_data: Option<DispatchData>,
}

/// Operation-dispatch data held by a handler.
#[derive(Debug, Clone, Default)]
pub struct DispatchData {
    /// The owner the operation dispatches through.
    pub owner: Option<DispatchOwner>,
}

/// Owner of an operation's dispatch data.
#[derive(Debug, Clone, Default)]
pub struct DispatchOwner {
    /// Type metadata for the owner.
    pub type_data: Option<TypeData>,
}

/// Type metadata carried by a dispatch owner.
#[derive(Debug, Clone, Default)]
pub struct TypeData {
    /// The concrete implementing type.
    pub actual_type: Option<HandlerIdentity>,
}

impl RpcDispatch {
    /// Walk the graph to the concrete implementing type, or `None` when
    /// any link is missing.
    #[must_use]
    pub fn actual_type(&self) -> Option<&HandlerIdentity> {
        let handler = self.original_handler.as_ref()?;
        let handler = if handler.session_wrapper {
            handler.base.as_deref()?
        } else {
            handler
        };
        handler
            .dispatch_data
            .as_ref()?
            .owner
            .as_ref()?
            .type_data
            .as_ref()?
            .actual_type
            .as_ref()
    }
}
