use std::marker::PhantomData;

use crate::adaptors::{DispositionTag, ErrorTag, StoppedTag, ValueTag, replace_disposition};
use crate::env::Env;
use crate::error::Error;
use crate::panic::{MayPanic, NoPanic, PanicPolicy};
use crate::sender::{Receiver, Sender};
use crate::signatures::{CompletionSignatures, SignatureError};
use crate::tuple::{Invoke, Tuple};

/// Runs a function on one disposition of a sender and completes with its
/// result as the value payload.
///
/// Built by [`then`], [`upon_error`] and [`upon_stopped`]. A panic in the
/// function becomes an `error(ExceptionPtr)` completion; after
/// [`nothrow`](Self::nothrow) that completion is dropped from the signatures
/// and a panic aborts the process instead.
///
/// ```rust
/// use senders::prelude::*;
///
/// let recovered = just_error("boom").upon_error(|_| ());
/// assert_eq!(recovered.sync_wait().unwrap(), Some(()));
/// ```
pub struct Upon<S, F, D, P = MayPanic> {
    sender: S,
    f: F,
    _tag: PhantomData<fn() -> (D, P)>,
}

impl<S, F, D> Upon<S, F, D, MayPanic> {
    fn new(sender: S, f: F) -> Self {
        Upon {
            sender,
            f,
            _tag: PhantomData,
        }
    }

    /// Promise that the function does not panic.
    pub fn nothrow(self) -> Upon<S, F, D, NoPanic> {
        Upon {
            sender: self.sender,
            f: self.f,
            _tag: PhantomData,
        }
    }
}

/// Transform the value payload.
pub fn then<S, F>(sender: S, f: F) -> Upon<S, F, ValueTag>
where
    S: Sender,
    F: Invoke<S::Value>,
{
    Upon::new(sender, f)
}

/// Map an error to a value.
pub fn upon_error<S, F>(sender: S, f: F) -> Upon<S, F, ErrorTag>
where
    S: Sender,
    F: FnOnce(Error) -> S::Value,
{
    Upon::new(sender, f)
}

/// Map a stop to a value.
pub fn upon_stopped<S, F>(sender: S, f: F) -> Upon<S, F, StoppedTag>
where
    S: Sender,
    F: FnOnce() -> S::Value,
{
    Upon::new(sender, f)
}

pub struct UponReceiver<R, F, D, P> {
    receiver: R,
    f: F,
    _tag: PhantomData<fn() -> (D, P)>,
}

impl<R, F, D, P> UponReceiver<R, F, D, P> {
    fn new(receiver: R, f: F) -> Self {
        UponReceiver {
            receiver,
            f,
            _tag: PhantomData,
        }
    }
}

fn deliver<V, R: Receiver<V>>(receiver: R, result: Result<V, Error>) {
    match result {
        Ok(value) => receiver.set_value(value),
        Err(error) => receiver.set_error(error),
    }
}

impl<V, R, F, P> Receiver<V> for UponReceiver<R, F, ValueTag, P>
where
    V: Send + 'static,
    F: Invoke<V> + Send + 'static,
    F::Output: Tuple,
    R: Receiver<F::Output>,
    P: PanicPolicy,
{
    fn set_value(self, value: V) {
        let f = self.f;
        deliver(self.receiver, P::guard(move || f.invoke(value)))
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

impl<V, R, F, P> Receiver<V> for UponReceiver<R, F, ErrorTag, P>
where
    F: FnOnce(Error) -> V + Send + 'static,
    R: Receiver<V>,
    P: PanicPolicy,
{
    fn set_value(self, value: V) {
        self.receiver.set_value(value)
    }

    fn set_error(self, error: Error) {
        let f = self.f;
        deliver(self.receiver, P::guard(move || f(error)))
    }

    fn set_stopped(self) {
        self.receiver.set_stopped()
    }

    fn get_env(&self) -> Env {
        self.receiver.get_env()
    }
}

impl<V, R, F, P> Receiver<V> for UponReceiver<R, F, StoppedTag, P>
where
    F: FnOnce() -> V + Send + 'static,
    R: Receiver<V>,
    P: PanicPolicy,
{
    fn set_value(self, value: V) {
        self.receiver.set_value(value)
    }

    fn set_error(self, error: Error) {
        self.receiver.set_error(error)
    }

    fn set_stopped(self) {
        deliver(self.receiver, P::guard(self.f))
    }

    fn get_env(&self) -> Env {
        self.receiver.get_env()
    }
}

fn upon_signatures<S, D, P, V>(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError>
where
    S: Sender,
    D: DispositionTag,
    P: PanicPolicy,
    V: Tuple,
{
    replace_disposition(
        &S::completion_signatures(env)?,
        D::DISPOSITION,
        &CompletionSignatures::value_of::<V>(),
        P::MAY_PANIC,
    )
}

impl<S, F, P> Sender for Upon<S, F, ValueTag, P>
where
    S: Sender,
    F: Invoke<S::Value> + Send + 'static,
    F::Output: Tuple,
    P: PanicPolicy,
{
    type Value = F::Output;
    type Operation<R> = S::Operation<UponReceiver<R, F, ValueTag, P>>
    where
        R: Receiver<F::Output>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<F::Output>,
    {
        self.sender.connect(UponReceiver::new(receiver, self.f))
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        upon_signatures::<S, ValueTag, P, F::Output>(env)
    }

    fn get_env(&self) -> Env {
        self.sender.get_env()
    }
}

impl<S, F, P> Sender for Upon<S, F, ErrorTag, P>
where
    S: Sender,
    F: FnOnce(Error) -> S::Value + Send + 'static,
    P: PanicPolicy,
{
    type Value = S::Value;
    type Operation<R> = S::Operation<UponReceiver<R, F, ErrorTag, P>>
    where
        R: Receiver<S::Value>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<S::Value>,
    {
        self.sender.connect(UponReceiver::new(receiver, self.f))
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        upon_signatures::<S, ErrorTag, P, S::Value>(env)
    }

    fn get_env(&self) -> Env {
        self.sender.get_env()
    }
}

impl<S, F, P> Sender for Upon<S, F, StoppedTag, P>
where
    S: Sender,
    F: FnOnce() -> S::Value + Send + 'static,
    P: PanicPolicy,
{
    type Value = S::Value;
    type Operation<R> = S::Operation<UponReceiver<R, F, StoppedTag, P>>
    where
        R: Receiver<S::Value>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<S::Value>,
    {
        self.sender.connect(UponReceiver::new(receiver, self.f))
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        upon_signatures::<S, StoppedTag, P, S::Value>(env)
    }

    fn get_env(&self) -> Env {
        self.sender.get_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExceptionPtr;
    use crate::factories::{JustError, JustStopped, just, just_error, just_stopped};
    use crate::sender::SenderExt;
    use crate::signatures::{Disposition, Signature};

    fn sigs_of<S: Sender>(_: &S) -> CompletionSignatures {
        S::completion_signatures(None).unwrap()
    }

    #[test]
    fn test_then_transforms_value() {
        let out = just((3, 0.5)).then(|a: i32, b: f64| (f64::from(a) * b,)).sync_wait();
        assert_eq!(out.unwrap(), Some((1.5,)));
    }

    #[test]
    fn test_then_signatures_include_exception_unless_nothrow() {
        let may = just((1, 2.0)).then(|a: i32, _b: f64| (a,));
        assert_eq!(
            sigs_of(&may),
            CompletionSignatures::from_iter([
                Signature::value_of::<(i32,)>(),
                Signature::error_of::<ExceptionPtr>()
            ])
        );

        let never = just((1, 2.0)).then(|a: i32, _b: f64| (a,)).nothrow();
        assert_eq!(sigs_of(&never), CompletionSignatures::value_of::<(i32,)>());
    }

    #[test]
    fn test_then_unit_result_is_empty_payload() {
        let out = just((9,)).then(|_: i32| ()).sync_wait();
        assert_eq!(out.unwrap(), Some(()));
    }

    #[test]
    fn test_then_forwards_error_and_stop() {
        let err = just_error(5u32).then(|| (1,)).sync_wait().unwrap_err();
        assert_eq!(err.downcast::<u32>().unwrap(), 5);
        assert_eq!(just_stopped().then(|| (1,)).sync_wait().unwrap(), None);
    }

    #[test]
    fn test_then_panic_becomes_exception_error() {
        let sender = just((1,)).then(|_: i32| -> (i32,) { panic!("bad then") });
        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sender.sync_wait()));
        let payload = caught.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"bad then"));
    }

    #[test]
    fn test_upon_error_recovers() {
        let out = JustError::<_, (i32,)>::new("lost")
            .upon_error(|e| (e.downcast::<&str>().map(str::len).unwrap_or(0) as i32,))
            .sync_wait();
        assert_eq!(out.unwrap(), Some((4,)));
    }

    #[test]
    fn test_upon_error_signatures_replace_error() {
        let sender = JustError::<u8, (i32,)>::new(1).upon_error(|_| (0,)).nothrow();
        assert_eq!(sigs_of(&sender), CompletionSignatures::value_of::<(i32,)>());
    }

    #[test]
    fn test_upon_stopped_recovers() {
        let sender = JustStopped::<(&str,)>::new().upon_stopped(|| ("resumed",));
        let sigs = sigs_of(&sender);
        assert!(!sigs.sends_stopped());
        assert_eq!(sigs.count(Disposition::Value), 1);
        assert_eq!(sender.sync_wait().unwrap(), Some(("resumed",)));
    }

    #[test]
    fn test_upon_leaves_unrelated_disposition_untouched() {
        let sender = just((1,)).upon_stopped(|| (0,));
        assert_eq!(sigs_of(&sender), CompletionSignatures::value_of::<(i32,)>());
        assert_eq!(sender.sync_wait().unwrap(), Some((1,)));
    }
}
