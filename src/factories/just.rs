use std::marker::PhantomData;

use crate::env::Env;
use crate::error::Error;
use crate::panic::{MayPanic, NoPanic, PanicPolicy};
use crate::sender::{OperationState, Receiver, Sender};
use crate::signatures::{CompletionSignatures, SignatureError};
use crate::tuple::Tuple;

/// Completes with a fixed value payload.
///
/// ```rust
/// use senders::prelude::*;
///
/// assert_eq!(just((1, 2, 3)).sync_wait().unwrap(), Some((1, 2, 3)));
/// assert_eq!(just(()).sync_wait().unwrap(), Some(()));
/// ```
#[derive(Debug, Clone)]
pub struct Just<V> {
    value: V,
}

pub fn just<V: Tuple>(value: V) -> Just<V> {
    Just { value }
}

impl<V: Tuple> Just<V> {
    pub fn into_inner(self) -> V {
        self.value
    }
}

pub struct JustOp<V, R> {
    value: V,
    receiver: R,
}

impl<V: Tuple> Sender for Just<V> {
    type Value = V;
    type Operation<R> = JustOp<V, R>
    where
        R: Receiver<V>;

    fn connect<R>(self, receiver: R) -> JustOp<V, R>
    where
        R: Receiver<V>,
    {
        JustOp {
            value: self.value,
            receiver,
        }
    }

    fn completion_signatures(_env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        Ok(CompletionSignatures::value_of::<V>())
    }
}

impl<V: Tuple, R: Receiver<V>> OperationState for JustOp<V, R> {
    fn start(self) {
        self.receiver.set_value(self.value)
    }
}

/// Completes with an error.
///
/// `V` is the value type the sender claims, so it can stand in for a sender
/// that would otherwise have produced `V`.
pub struct JustError<E, V = ()> {
    error: E,
    _value: PhantomData<fn() -> V>,
}

/// An error sender with no value payload.
pub fn just_error<E: Send + 'static>(error: E) -> JustError<E> {
    JustError::new(error)
}

impl<E: Send + 'static, V: Tuple> JustError<E, V> {
    pub fn new(error: E) -> Self {
        JustError {
            error,
            _value: PhantomData,
        }
    }
}

impl<E: std::fmt::Debug, V> std::fmt::Debug for JustError<E, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("JustError").field(&self.error).finish()
    }
}

pub struct JustErrorOp<E, V, R> {
    error: E,
    receiver: R,
    _value: PhantomData<fn() -> V>,
}

impl<E: Send + 'static, V: Tuple> Sender for JustError<E, V> {
    type Value = V;
    type Operation<R> = JustErrorOp<E, V, R>
    where
        R: Receiver<V>;

    fn connect<R>(self, receiver: R) -> JustErrorOp<E, V, R>
    where
        R: Receiver<V>,
    {
        JustErrorOp {
            error: self.error,
            receiver,
            _value: PhantomData,
        }
    }

    fn completion_signatures(_env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        Ok(CompletionSignatures::error_of::<E>())
    }
}

impl<E: Send + 'static, V, R: Receiver<V>> OperationState for JustErrorOp<E, V, R> {
    fn start(self) {
        self.receiver.set_error(Error::new(self.error))
    }
}

/// Completes with stopped.
pub struct JustStopped<V = ()> {
    _value: PhantomData<fn() -> V>,
}

pub fn just_stopped() -> JustStopped {
    JustStopped::new()
}

impl<V: Tuple> JustStopped<V> {
    pub fn new() -> Self {
        JustStopped { _value: PhantomData }
    }
}

impl<V: Tuple> Default for JustStopped<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for JustStopped<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JustStopped")
    }
}

pub struct JustStoppedOp<V, R>(R, PhantomData<fn() -> V>);

impl<V: Tuple> Sender for JustStopped<V> {
    type Value = V;
    type Operation<R> = JustStoppedOp<V, R>
    where
        R: Receiver<V>;

    fn connect<R>(self, receiver: R) -> JustStoppedOp<V, R>
    where
        R: Receiver<V>,
    {
        JustStoppedOp(receiver, PhantomData)
    }

    fn completion_signatures(_env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        Ok(CompletionSignatures::stopped())
    }
}

impl<V, R: Receiver<V>> OperationState for JustStoppedOp<V, R> {
    fn start(self) {
        self.0.set_stopped()
    }
}

/// Computes its value payload when started.
///
/// A panic inside `f` becomes an `error(ExceptionPtr)` completion unless the
/// sender was made with [`nothrow`](Self::nothrow).
///
/// ```rust
/// use senders::prelude::*;
///
/// let lazy = just_from(|| (String::from("computed"),));
/// assert_eq!(lazy.sync_wait().unwrap(), Some((String::from("computed"),)));
/// ```
pub struct JustFrom<F, P = MayPanic> {
    f: F,
    _policy: PhantomData<P>,
}

pub fn just_from<F, V>(f: F) -> JustFrom<F>
where
    F: FnOnce() -> V + Send + 'static,
    V: Tuple,
{
    JustFrom {
        f,
        _policy: PhantomData,
    }
}

impl<F> JustFrom<F, MayPanic> {
    /// Promise that `f` does not panic.
    pub fn nothrow(self) -> JustFrom<F, NoPanic> {
        JustFrom {
            f: self.f,
            _policy: PhantomData,
        }
    }
}

pub struct JustFromOp<F, P, R> {
    f: F,
    receiver: R,
    _policy: PhantomData<P>,
}

impl<F, V, P> Sender for JustFrom<F, P>
where
    F: FnOnce() -> V + Send + 'static,
    V: Tuple,
    P: PanicPolicy,
{
    type Value = V;
    type Operation<R> = JustFromOp<F, P, R>
    where
        R: Receiver<V>;

    fn connect<R>(self, receiver: R) -> JustFromOp<F, P, R>
    where
        R: Receiver<V>,
    {
        JustFromOp {
            f: self.f,
            receiver,
            _policy: PhantomData,
        }
    }

    fn completion_signatures(_env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        Ok(CompletionSignatures::value_of::<V>().with_exception_if(P::MAY_PANIC))
    }
}

impl<F, V, P, R> OperationState for JustFromOp<F, P, R>
where
    F: FnOnce() -> V,
    P: PanicPolicy,
    R: Receiver<V>,
{
    fn start(self) {
        match P::guard(self.f) {
            Ok(value) => self.receiver.set_value(value),
            Err(error) => self.receiver.set_error(error),
        }
    }
}
