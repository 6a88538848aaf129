//! Environments: ambient context attached to receivers and senders.
//!
//! An [`Env`] answers a small, fixed set of queries. Adaptors that add context
//! for their children layer a new environment over their receiver's, and the
//! nearest answer wins.

use crate::context::{AnyScheduler, Scheduler};
use crate::signatures::Disposition;
use crate::stop::StopToken;

/// How much progress an execution context guarantees for its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ForwardProgressGuarantee {
    /// Each agent eventually makes progress, independently.
    Concurrent,
    /// An agent makes progress once it has started.
    Parallel,
    /// Progress only when nothing else runs.
    #[default]
    WeaklyParallel,
}

/// Allocation strategy available to operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Allocator {
    /// The global allocator.
    #[default]
    Global,
}

/// Customization domain tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Domain {
    #[default]
    Default,
    Named(&'static str),
}

/// A queryable environment.
///
/// ```rust
/// use senders::{Env, InlineScheduler, StopSource, get_stop_token, get_scheduler};
///
/// let source = StopSource::new();
/// let parent = Env::new().with_scheduler(InlineScheduler);
/// let env = Env::new().with_stop_token(source.token()).layered(&parent);
///
/// assert!(get_scheduler(&env).is_some());
/// assert!(get_stop_token(&env).stop_possible());
/// ```
#[derive(Clone, Default)]
pub struct Env {
    scheduler: Option<AnyScheduler>,
    delegatee_scheduler: Option<AnyScheduler>,
    completion_schedulers: [Option<AnyScheduler>; 3],
    stop_token: Option<StopToken>,
    allocator: Option<Allocator>,
    forward_progress: Option<ForwardProgressGuarantee>,
    domain: Option<Domain>,
}

impl Env {
    /// An environment answering every query with its default.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scheduler<S: Scheduler>(mut self, scheduler: S) -> Self {
        self.scheduler = Some(scheduler.erase());
        self
    }

    pub fn with_delegatee_scheduler<S: Scheduler>(mut self, scheduler: S) -> Self {
        self.delegatee_scheduler = Some(scheduler.erase());
        self
    }

    pub fn with_completion_scheduler<S: Scheduler>(mut self, disposition: Disposition, scheduler: S) -> Self {
        self.completion_schedulers[disposition.index()] = Some(scheduler.erase());
        self
    }

    /// Forget the completion scheduler for `disposition`.
    pub fn without_completion_scheduler(mut self, disposition: Disposition) -> Self {
        self.completion_schedulers[disposition.index()] = None;
        self
    }

    pub fn with_stop_token(mut self, token: impl Into<StopToken>) -> Self {
        self.stop_token = Some(token.into());
        self
    }

    pub fn with_allocator(mut self, allocator: Allocator) -> Self {
        self.allocator = Some(allocator);
        self
    }

    pub fn with_forward_progress_guarantee(mut self, guarantee: ForwardProgressGuarantee) -> Self {
        self.forward_progress = Some(guarantee);
        self
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Put `self` in front of `parent`: each query is answered by `self` when it
    /// can, by `parent` otherwise.
    pub fn layered(self, parent: &Env) -> Env {
        let [v, e, s] = self.completion_schedulers;
        let [pv, pe, ps] = &parent.completion_schedulers;
        Env {
            scheduler: self.scheduler.or_else(|| parent.scheduler.clone()),
            delegatee_scheduler: self
                .delegatee_scheduler
                .or_else(|| parent.delegatee_scheduler.clone()),
            completion_schedulers: [
                v.or_else(|| pv.clone()),
                e.or_else(|| pe.clone()),
                s.or_else(|| ps.clone()),
            ],
            stop_token: self.stop_token.or_else(|| parent.stop_token.clone()),
            allocator: self.allocator.or(parent.allocator),
            forward_progress: self.forward_progress.or(parent.forward_progress),
            domain: self.domain.or(parent.domain),
        }
    }

    /// Answer `query`.
    pub fn query<Q: Query>(&self, query: Q) -> Q::Output {
        query.query(self)
    }
}

/// A key that can be looked up in an [`Env`].
pub trait Query: Copy + Send + 'static {
    /// The answer type.
    type Output: Send + 'static;

    fn query(self, env: &Env) -> Self::Output;
}

/// The scheduler the operation is running on, if known.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetScheduler;

/// A scheduler that may be used to delegate work back to the waiting thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetDelegateeScheduler;

/// The scheduler a sender completes on, for one disposition.
#[derive(Debug, Clone, Copy)]
pub struct GetCompletionScheduler(pub Disposition);

/// The stop token to observe; the never-stop token when none is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetStopToken;

#[derive(Debug, Clone, Copy, Default)]
pub struct GetAllocator;

#[derive(Debug, Clone, Copy, Default)]
pub struct GetForwardProgressGuarantee;

#[derive(Debug, Clone, Copy, Default)]
pub struct GetDomain;

impl Query for GetScheduler {
    type Output = Option<AnyScheduler>;

    fn query(self, env: &Env) -> Self::Output {
        env.scheduler.clone()
    }
}

impl Query for GetDelegateeScheduler {
    type Output = Option<AnyScheduler>;

    fn query(self, env: &Env) -> Self::Output {
        env.delegatee_scheduler.clone()
    }
}

impl Query for GetCompletionScheduler {
    type Output = Option<AnyScheduler>;

    fn query(self, env: &Env) -> Self::Output {
        env.completion_schedulers[self.0.index()].clone()
    }
}

impl Query for GetStopToken {
    type Output = StopToken;

    fn query(self, env: &Env) -> Self::Output {
        env.stop_token.clone().unwrap_or_else(StopToken::never)
    }
}

impl Query for GetAllocator {
    type Output = Allocator;

    fn query(self, env: &Env) -> Self::Output {
        env.allocator.unwrap_or_default()
    }
}

impl Query for GetForwardProgressGuarantee {
    type Output = ForwardProgressGuarantee;

    fn query(self, env: &Env) -> Self::Output {
        env.forward_progress.unwrap_or_default()
    }
}

impl Query for GetDomain {
    type Output = Domain;

    fn query(self, env: &Env) -> Self::Output {
        env.domain.unwrap_or_default()
    }
}

pub fn get_scheduler(env: &Env) -> Option<AnyScheduler> {
    GetScheduler.query(env)
}

pub fn get_delegatee_scheduler(env: &Env) -> Option<AnyScheduler> {
    GetDelegateeScheduler.query(env)
}

pub fn get_completion_scheduler(env: &Env, disposition: Disposition) -> Option<AnyScheduler> {
    GetCompletionScheduler(disposition).query(env)
}

pub fn get_stop_token(env: &Env) -> StopToken {
    GetStopToken.query(env)
}

pub fn get_allocator(env: &Env) -> Allocator {
    GetAllocator.query(env)
}

pub fn get_forward_progress_guarantee(env: &Env) -> ForwardProgressGuarantee {
    GetForwardProgressGuarantee.query(env)
}

pub fn get_domain(env: &Env) -> Domain {
    GetDomain.query(env)
}
