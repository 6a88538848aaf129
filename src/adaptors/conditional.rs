use either::Either;

use crate::adaptors::retain_completion_schedulers;
use crate::env::Env;
use crate::error::Error;
use crate::factories::{Just, just};
use crate::panic::{MayPanic, PanicPolicy};
use crate::sender::{OperationState, Receiver, Sender};
use crate::signatures::{CompletionSignatures, Disposition, SignatureError};
use crate::tuple::{Predicate, Tuple};

/// Picks one of two continuations from the value payload.
///
/// `pred` borrows the payload elements; the chosen branch receives it as a [`Just`]
/// sender and returns the sender to run next. Exactly one branch runs. A
/// panic in the predicate or while building a branch becomes an
/// `error(ExceptionPtr)` completion.
///
/// ```rust
/// use senders::prelude::*;
///
/// let parity = just((7,)).conditional(
///     |n: &i32| n % 2 == 0,
///     |s| s.then(|_: i32| ("even",)),
///     |s| s.then(|_: i32| ("odd",)),
/// );
/// assert_eq!(parity.sync_wait().unwrap(), Some(("odd",)));
/// ```
pub struct Conditional<S, P, T, E> {
    sender: S,
    branches: Branches<P, T, E>,
}

struct Branches<P, T, E> {
    pred: P,
    then: T,
    otherwise: E,
}

pub fn conditional<S, P, T, E, TS, ES>(sender: S, pred: P, then: T, otherwise: E) -> Conditional<S, P, T, E>
where
    S: Sender,
    P: Predicate<S::Value>,
    T: FnOnce(Just<S::Value>) -> TS,
    E: FnOnce(Just<S::Value>) -> ES,
    TS: Sender,
    ES: Sender<Value = TS::Value>,
{
    Conditional {
        sender,
        branches: Branches { pred, then, otherwise },
    }
}

pub struct ConditionalReceiver<P, T, E, R> {
    branches: Branches<P, T, E>,
    receiver: R,
}

impl<V, P, T, E, TS, ES, R> Receiver<V> for ConditionalReceiver<P, T, E, R>
where
    V: Tuple,
    P: Predicate<V> + Send + 'static,
    T: FnOnce(Just<V>) -> TS + Send + 'static,
    E: FnOnce(Just<V>) -> ES + Send + 'static,
    TS: Sender,
    ES: Sender<Value = TS::Value>,
    R: Receiver<TS::Value>,
{
    fn set_value(self, value: V) {
        let Branches { pred, then, otherwise } = self.branches;
        let chosen = MayPanic::guard(move || {
            if pred.test(&value) {
                Either::Left(then(just(value)))
            } else {
                Either::Right(otherwise(just(value)))
            }
        });
        match chosen {
            Ok(branch) => branch.connect(self.receiver).start(),
            Err(error) => self.receiver.set_error(error),
        }
    }

    fn set_error(self, error: Error) {
        self.receiver.set_error(error)
    }

    fn set_stopped(self) {
        self.receiver.set_stopped()
    }

    fn get_env(&self) -> Env {
        self.receiver.get_env()
    }
}

impl<S, P, T, E, TS, ES> Sender for Conditional<S, P, T, E>
where
    S: Sender,
    P: Predicate<S::Value> + Send + 'static,
    T: FnOnce(Just<S::Value>) -> TS + Send + 'static,
    E: FnOnce(Just<S::Value>) -> ES + Send + 'static,
    TS: Sender,
    ES: Sender<Value = TS::Value>,
{
    type Value = TS::Value;
    type Operation<R> = S::Operation<ConditionalReceiver<P, T, E, R>>
    where
        R: Receiver<Self::Value>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Self::Value>,
    {
        self.sender.connect(ConditionalReceiver {
            branches: self.branches,
            receiver,
        })
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        let sigs = S::completion_signatures(env)?;
        if sigs.count(Disposition::Value) == 0 {
            return Ok(sigs);
        }
        let branches = <Either<TS, ES>>::completion_signatures(env)?;
        Ok(sigs
            .without(Disposition::Value)
            .concat(&branches)
            .with_exception_if(MayPanic::MAY_PANIC))
    }

    fn get_env(&self) -> Env {
        retain_completion_schedulers::<Either<TS, ES>>(self.sender.get_env(), &Disposition::ALL)
    }
}
