#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Target resolution and authorization policy for PageGate.
//!
//! Given an inbound request, the [`resolver::TargetResolver`] determines
//! which handler type (and, for write requests, which operation) will
//! actually execute, across the three dispatch shapes the host exposes:
//! a directly-routed page, a page behind a declared template, and an
//! RPC-style operation addressed by path suffix. The
//! [`policy::PolicyEngine`] then gates the request on the startup-built
//! [`annotations::AnnotationStore`].
//!
//! Everything here is read-only after startup; per-request state lives on
//! the stack and is discarded when the request completes.

pub mod annotations;
pub mod dispatch;
pub mod identity;
pub mod markup;
pub mod policy;
pub mod registry;
pub mod resolver;

pub use annotations::{AnnotationStore, AnnotationStoreBuilder};
pub use dispatch::{DispatchData, DispatchOwner, OriginalHandler, RpcDispatch, TypeData};
pub use identity::{HandlerIdentity, OperationIdentity};
pub use markup::{FsMarkupInspector, MarkupError, MarkupInspector};
pub use policy::{AuthenticationState, Decision, PolicyEngine};
pub use registry::{HandlerRegistry, HandlerRegistryBuilder, RegistryError};
pub use resolver::{ResolvedTarget, ResolverOptions, TargetResolver};
