//! Ordered chain of dispatch members.
//!
//! # Responsibilities
//! - Hold the members in execution order
//! - Advance a request through them with explicit "pass to next" control
//! - Reset per-request traversal state on every exit path
//!
//! # Design Decisions
//! - The chain is immutable and shared; the cursor lives in the
//!   [`RequestContext`], so concurrent requests never interfere
//! - The cursor moves past a member *before* that member runs, so a member
//!   calling [`DispatchChain::next`] reentrantly reaches its successor
//! - There is no stop signal: a member ends traversal by not calling `next`
//! - A member may call `next` and keep working after it returns
//!   (after-next interceptors)
//! - `next` past the end does nothing
//! - Errors propagate unchanged to the caller of [`DispatchChain::run`]

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::dispatch::context::RequestContext;
use crate::dispatch::handler::BoxError;
use crate::http::Response;

/// Failure raised while a request travels the chain.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A matched route handler returned an error.
    #[error("handler for route `{route}` failed: {source}")]
    Handler { route: String, source: BoxError },

    /// A chain member failed outside of any route handler.
    #[error("chain member `{member}` failed: {source}")]
    Member { member: String, source: BoxError },
}

impl DispatchError {
    /// Wrap a handler error. Errors that already are dispatch errors (raised
    /// further down the chain and passed back up through `next`) are
    /// returned as-is instead of being nested.
    pub fn handler(route: impl Into<String>, error: BoxError) -> Self {
        match error.downcast::<DispatchError>() {
            Ok(inner) => *inner,
            Err(source) => DispatchError::Handler {
                route: route.into(),
                source,
            },
        }
    }

    pub fn member(member: impl Into<String>, error: BoxError) -> Self {
        match error.downcast::<DispatchError>() {
            Ok(inner) => *inner,
            Err(source) => DispatchError::Member {
                member: member.into(),
                source,
            },
        }
    }
}

/// Position class of a member. The engine orders members by stage first and
/// registration order second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    BeforeInterceptor,
    Content,
    AfterInterceptor,
    Fallback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::BeforeInterceptor => "before-interceptor",
            Stage::Content => "content",
            Stage::AfterInterceptor => "after-interceptor",
            Stage::Fallback => "fallback",
        })
    }
}

/// A participant in the dispatch chain.
pub trait ChainMember: Send + Sync {
    fn name(&self) -> &str;

    fn stage(&self) -> Stage {
        Stage::Content
    }

    /// Handle the request. Call `chain.next(ctx, response)` to hand over to
    /// the following member; return without calling it to end traversal.
    fn process(
        &self,
        ctx: &mut RequestContext,
        response: &mut Response,
        chain: &DispatchChain,
    ) -> Result<(), DispatchError>;
}

#[derive(Clone, Default)]
pub struct DispatchChain {
    members: Vec<Arc<dyn ChainMember>>,
}

impl DispatchChain {
    pub fn new(members: Vec<Arc<dyn ChainMember>>) -> Self {
        Self { members }
    }

    pub fn push(&mut self, member: Arc<dyn ChainMember>) {
        self.members.push(member);
    }

    /// Run the member at the cursor, advancing the cursor first.
    /// Does nothing once every member has been claimed.
    pub fn next(&self, ctx: &mut RequestContext, response: &mut Response) -> Result<(), DispatchError> {
        let Some(index) = ctx.advance(self.members.len()) else {
            tracing::trace!(path = %ctx.path(), "Dispatch chain exhausted");
            return Ok(());
        };
        let member = &self.members[index];
        tracing::trace!(index, member = member.name(), stage = %member.stage(), "Invoking chain member");
        member.process(ctx, response, self)
    }

    /// Send a request through the chain from the first member.
    ///
    /// The cursor and dynamic bindings are reset afterwards whether or not a
    /// member failed, so the context can be sent through again.
    pub fn run(&self, ctx: &mut RequestContext, response: &mut Response) -> Result<(), DispatchError> {
        ctx.reset_cursor();
        let result = self.next(ctx, response);
        ctx.reset_cursor();
        ctx.clear_dynamic();
        result
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }
}

impl fmt::Debug for DispatchChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchChain")
            .field("members", &self.member_names())
            .finish()
    }
}
