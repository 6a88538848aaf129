//! The sender / receiver / operation-state protocol.
//!
//! A [`Sender`] describes work without running it. Connecting it to a
//! [`Receiver`] produces an [`OperationState`]; starting that runs the work,
//! which eventually completes the receiver exactly once with a value, an error
//! or a stop.
//!
//! Completion methods and `start` take `self` by value, so "at most once" is
//! checked by the compiler rather than by convention.
//!
//! ```rust
//! use senders::prelude::*;
//!
//! let work = just((6,)).then(|x: i32| (x * 7,));
//! assert_eq!(work.sync_wait().unwrap(), Some((42,)));
//! ```

use either::Either;

use crate::adaptors::{
    Conditional, ContinuesOn, ErrorTag, Let, Sequence, StoppedTag, Upon, ValueTag, WriteEnv,
};
use crate::context::Scheduler;
use crate::env::Env;
use crate::error::Error;
use crate::factories::Just;
use crate::panic::MayPanic;
use crate::signatures::{CompletionSignatures, SignatureError};
use crate::tuple::{Invoke, Predicate, Tuple};

/// Completion handlers for one operation, plus its environment.
///
/// Exactly one completion method is called, once.
pub trait Receiver<V>: Send + 'static {
    /// The operation succeeded.
    fn set_value(self, value: V);

    /// The operation failed.
    fn set_error(self, error: Error);

    /// The operation honoured a stop request.
    fn set_stopped(self);

    /// The environment the operation runs in. Must be cheap and side-effect free.
    fn get_env(&self) -> Env {
        Env::default()
    }
}

/// A connected, not yet started operation.
pub trait OperationState {
    /// Begin the operation.
    fn start(self);
}

/// A description of asynchronous work.
pub trait Sender: Sized {
    /// The payload of the value completion.
    type Value: Tuple;

    /// The state produced by connecting to a receiver `R`.
    type Operation<R>: OperationState
    where
        R: Receiver<Self::Value>;

    /// Bind this sender to `receiver`.
    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Self::Value>;

    /// Every way this sender can complete when connected in `env`.
    ///
    /// `None` asks for the answer independent of any environment.
    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError>;

    /// Attributes of the sender itself, such as its completion schedulers.
    fn get_env(&self) -> Env {
        Env::default()
    }
}

pub fn connect<S, R>(sender: S, receiver: R) -> S::Operation<R>
where
    S: Sender,
    R: Receiver<S::Value>,
{
    sender.connect(receiver)
}

pub fn start<O: OperationState>(operation: O) {
    operation.start()
}

pub fn set_value<V, R: Receiver<V>>(receiver: R, value: V) {
    receiver.set_value(value)
}

pub fn set_error<V, R: Receiver<V>>(receiver: R, error: impl Into<Error>) {
    receiver.set_error(error.into())
}

pub fn set_stopped<V, R: Receiver<V>>(receiver: R) {
    receiver.set_stopped()
}

pub fn get_env<V, R: Receiver<V>>(receiver: &R) -> Env {
    receiver.get_env()
}

pub fn get_sender_env<S: Sender>(sender: &S) -> Env {
    sender.get_env()
}

impl<L, R> Sender for Either<L, R>
where
    L: Sender,
    R: Sender<Value = L::Value>,
{
    type Value = L::Value;
    type Operation<Rcv> = Either<L::Operation<Rcv>, R::Operation<Rcv>>
    where
        Rcv: Receiver<Self::Value>;

    fn connect<Rcv>(self, receiver: Rcv) -> Self::Operation<Rcv>
    where
        Rcv: Receiver<Self::Value>,
    {
        match self {
            Either::Left(l) => Either::Left(l.connect(receiver)),
            Either::Right(r) => Either::Right(r.connect(receiver)),
        }
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        Ok(L::completion_signatures(env)?.concat(&R::completion_signatures(env)?))
    }

    fn get_env(&self) -> Env {
        match self {
            Either::Left(l) => l.get_env(),
            Either::Right(r) => r.get_env(),
        }
    }
}

impl<L, R> OperationState for Either<L, R>
where
    L: OperationState,
    R: OperationState,
{
    fn start(self) {
        match self {
            Either::Left(l) => l.start(),
            Either::Right(r) => r.start(),
        }
    }
}

/// Method-call forms of the adaptors and consumers.
pub trait SenderExt: Sender {
    /// Transform the value payload with `f`.
    fn then<F>(self, f: F) -> Upon<Self, F, ValueTag, MayPanic>
    where
        F: Invoke<Self::Value>,
    {
        crate::adaptors::then(self, f)
    }

    /// Turn an error into a value.
    fn upon_error<F>(self, f: F) -> Upon<Self, F, ErrorTag, MayPanic>
    where
        F: FnOnce(Error) -> Self::Value,
    {
        crate::adaptors::upon_error(self, f)
    }

    /// Turn a stop into a value.
    fn upon_stopped<F>(self, f: F) -> Upon<Self, F, StoppedTag, MayPanic>
    where
        F: FnOnce() -> Self::Value,
    {
        crate::adaptors::upon_stopped(self, f)
    }

    /// Continue with the sender `f` builds from the value payload.
    fn let_value<F>(self, f: F) -> Let<Self, F, ValueTag, MayPanic>
    where
        F: Invoke<Self::Value>,
        F::Output: Sender,
    {
        crate::adaptors::let_value(self, f)
    }

    /// Continue with the sender `f` builds from the error.
    fn let_error<F, S2>(self, f: F) -> Let<Self, F, ErrorTag, MayPanic>
    where
        F: FnOnce(Error) -> S2,
        S2: Sender<Value = Self::Value>,
    {
        crate::adaptors::let_error(self, f)
    }

    /// Continue with the sender `f` builds after a stop.
    fn let_stopped<F, S2>(self, f: F) -> Let<Self, F, StoppedTag, MayPanic>
    where
        F: FnOnce() -> S2,
        S2: Sender<Value = Self::Value>,
    {
        crate::adaptors::let_stopped(self, f)
    }

    /// Run `next` after this sender succeeds, discarding this sender's value.
    fn sequence<S2: Sender>(self, next: S2) -> Sequence<Self, S2> {
        crate::adaptors::sequence(self, next)
    }

    /// Branch on the value payload.
    fn conditional<P, T, E, TS, ES>(self, pred: P, then: T, otherwise: E) -> Conditional<Self, P, T, E>
    where
        P: Predicate<Self::Value>,
        T: FnOnce(Just<Self::Value>) -> TS,
        E: FnOnce(Just<Self::Value>) -> ES,
        TS: Sender,
        ES: Sender<Value = TS::Value>,
    {
        crate::adaptors::conditional(self, pred, then, otherwise)
    }

    /// Deliver this sender's completion from `scheduler`.
    fn continues_on<Sch: Scheduler>(self, scheduler: Sch) -> ContinuesOn<Self, Sch> {
        crate::adaptors::continues_on(self, scheduler)
    }

    /// Layer `env` over the receiver's environment for this sender.
    fn write_env(self, env: Env) -> WriteEnv<Self> {
        crate::adaptors::write_env(self, env)
    }

    /// Block until the sender completes; see [`sync_wait`](crate::sync_wait).
    fn sync_wait(self) -> Result<Option<Self::Value>, Error> {
        crate::consumers::sync_wait(self)
    }

    /// Start the sender and forget about it.
    fn start_detached(self) {
        crate::consumers::start_detached(self)
    }
}

impl<S: Sender> SenderExt for S {}
