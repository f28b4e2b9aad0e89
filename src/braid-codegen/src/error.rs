use snafu::prelude::*;

use crate::binding::{Key, RequestKind};

/// Failures raised while synthesizing code for a component.
///
/// Every variant is an internal defect: the graph resolver is supposed to
/// uphold the violated invariant before anything reaches this crate, so the
/// surrounding compiler should report these as internal-error diagnostics
/// rather than user-facing ones. Exceeding a shard's member ceiling is not an
/// error at all; a new shard is opened instead.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum CodegenError {
    /// A request kind was routed to a binding that cannot satisfy it, e.g. an
    /// instance request against a members-injection binding.
    #[snafu(display("binding {key} does not satisfy {kind} requests"))]
    #[non_exhaustive]
    IllegalRequest { key: Key, kind: RequestKind },
    /// The scoping decorator was applied to a binding without a scope. Scope
    /// assignment is the resolver's responsibility.
    #[snafu(display("binding {key} carries no scope to apply"))]
    #[non_exhaustive]
    UnscopedBinding { key: Key },
    /// A request named a key no registered binding produces.
    #[snafu(display("no binding produces {key}"))]
    #[non_exhaustive]
    MissingBinding { key: Key },
    /// The collaborator producing the raw value expression for a binding
    /// failed. The selector is public because [`InstanceSupplier`] is an open
    /// seam: implementors outside this crate raise their failures through
    /// [`RawExpressionSnafu`].
    ///
    /// [`InstanceSupplier`]: crate::expr::InstanceSupplier
    #[snafu(display("could not produce the raw value expression for {key}: {message}"))]
    #[snafu(visibility(pub))]
    #[non_exhaustive]
    RawExpression { key: Key, message: String },
}
