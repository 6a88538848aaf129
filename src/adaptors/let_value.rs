use std::marker::PhantomData;

use crate::adaptors::{DispositionTag, ErrorTag, StoppedTag, ValueTag, retain_completion_schedulers};
use crate::env::Env;
use crate::error::Error;
use crate::panic::{MayPanic, NoPanic, PanicPolicy};
use crate::sender::{OperationState, Receiver, Sender};
use crate::signatures::{CompletionSignatures, Disposition, SignatureError};
use crate::tuple::Invoke;

/// Continues with a sender built from one disposition's payload.
///
/// The payload is moved into the function, and the sender it returns is
/// connected to the downstream receiver and started in place of the original
/// completion. Other dispositions pass through.
///
/// ```rust
/// use senders::prelude::*;
///
/// let chained = just((20,)).let_value(|x: i32| just((x + 1, x * 2)));
/// assert_eq!(chained.sync_wait().unwrap(), Some((21, 40)));
/// ```
pub struct Let<S, F, D, P = MayPanic> {
    sender: S,
    f: F,
    _tag: PhantomData<fn() -> (D, P)>,
}

impl<S, F, D> Let<S, F, D, MayPanic> {
    fn new(sender: S, f: F) -> Self {
        Let {
            sender,
            f,
            _tag: PhantomData,
        }
    }

    /// Promise that the function does not panic.
    pub fn nothrow(self) -> Let<S, F, D, NoPanic> {
        Let {
            sender: self.sender,
            f: self.f,
            _tag: PhantomData,
        }
    }
}

pub fn let_value<S, F>(sender: S, f: F) -> Let<S, F, ValueTag>
where
    S: Sender,
    F: Invoke<S::Value>,
    F::Output: Sender,
{
    Let::new(sender, f)
}

pub fn let_error<S, F, S2>(sender: S, f: F) -> Let<S, F, ErrorTag>
where
    S: Sender,
    F: FnOnce(Error) -> S2,
    S2: Sender<Value = S::Value>,
{
    Let::new(sender, f)
}

pub fn let_stopped<S, F, S2>(sender: S, f: F) -> Let<S, F, StoppedTag>
where
    S: Sender,
    F: FnOnce() -> S2,
    S2: Sender<Value = S::Value>,
{
    Let::new(sender, f)
}

pub struct LetReceiver<R, F, D, P> {
    receiver: R,
    f: F,
    _tag: PhantomData<fn() -> (D, P)>,
}

impl<R, F, D, P: PanicPolicy> LetReceiver<R, F, D, P> {
    fn new(receiver: R, f: F) -> Self {
        LetReceiver {
            receiver,
            f,
            _tag: PhantomData,
        }
    }

    fn continue_with<S2, G>(receiver: R, build: G)
    where
        S2: Sender,
        R: Receiver<S2::Value>,
        G: FnOnce() -> S2,
    {
        match P::guard(build) {
            Ok(next) => next.connect(receiver).start(),
            Err(error) => receiver.set_error(error),
        }
    }
}

impl<V, R, F, P> Receiver<V> for LetReceiver<R, F, ValueTag, P>
where
    V: Send + 'static,
    F: Invoke<V> + Send + 'static,
    F::Output: Sender,
    R: Receiver<<F::Output as Sender>::Value>,
    P: PanicPolicy,
{
    fn set_value(self, value: V) {
        let f = self.f;
        Self::continue_with(self.receiver, move || f.invoke(value))
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

impl<V, R, F, S2, P> Receiver<V> for LetReceiver<R, F, ErrorTag, P>
where
    F: FnOnce(Error) -> S2 + Send + 'static,
    S2: Sender<Value = V>,
    R: Receiver<V>,
    P: PanicPolicy,
{
    fn set_value(self, value: V) {
        self.receiver.set_value(value)
    }

    fn set_error(self, error: Error) {
        let f = self.f;
        Self::continue_with(self.receiver, move || f(error))
    }

    fn set_stopped(self) {
        self.receiver.set_stopped()
    }

    fn get_env(&self) -> Env {
        self.receiver.get_env()
    }
}

impl<V, R, F, S2, P> Receiver<V> for LetReceiver<R, F, StoppedTag, P>
where
    F: FnOnce() -> S2 + Send + 'static,
    S2: Sender<Value = V>,
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
        Self::continue_with(self.receiver, self.f)
    }

    fn get_env(&self) -> Env {
        self.receiver.get_env()
    }
}

fn let_signatures<S, S2, D, P>(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError>
where
    S: Sender,
    S2: Sender,
    D: DispositionTag,
    P: PanicPolicy,
{
    let sigs = S::completion_signatures(env)?;
    if sigs.count(D::DISPOSITION) == 0 {
        return Ok(sigs);
    }
    let next = S2::completion_signatures(env)?;
    Ok(sigs.without(D::DISPOSITION).concat(&next).with_exception_if(P::MAY_PANIC))
}

impl<S, F, P> Sender for Let<S, F, ValueTag, P>
where
    S: Sender,
    F: Invoke<S::Value> + Send + 'static,
    F::Output: Sender,
    P: PanicPolicy,
{
    type Value = <F::Output as Sender>::Value;
    type Operation<R> = S::Operation<LetReceiver<R, F, ValueTag, P>>
    where
        R: Receiver<Self::Value>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Self::Value>,
    {
        self.sender.connect(LetReceiver::new(receiver, self.f))
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        let_signatures::<S, F::Output, ValueTag, P>(env)
    }

    fn get_env(&self) -> Env {
        retain_completion_schedulers::<F::Output>(self.sender.get_env(), &Disposition::ALL)
    }
}

impl<S, F, S2, P> Sender for Let<S, F, ErrorTag, P>
where
    S: Sender,
    F: FnOnce(Error) -> S2 + Send + 'static,
    S2: Sender<Value = S::Value>,
    P: PanicPolicy,
{
    type Value = S::Value;
    type Operation<R> = S::Operation<LetReceiver<R, F, ErrorTag, P>>
    where
        R: Receiver<Self::Value>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Self::Value>,
    {
        self.sender.connect(LetReceiver::new(receiver, self.f))
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        let_signatures::<S, S2, ErrorTag, P>(env)
    }

    fn get_env(&self) -> Env {
        retain_completion_schedulers::<S2>(self.sender.get_env(), &Disposition::ALL)
    }
}

impl<S, F, S2, P> Sender for Let<S, F, StoppedTag, P>
where
    S: Sender,
    F: FnOnce() -> S2 + Send + 'static,
    S2: Sender<Value = S::Value>,
    P: PanicPolicy,
{
    type Value = S::Value;
    type Operation<R> = S::Operation<LetReceiver<R, F, StoppedTag, P>>
    where
        R: Receiver<Self::Value>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Self::Value>,
    {
        self.sender.connect(LetReceiver::new(receiver, self.f))
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        let_signatures::<S, S2, StoppedTag, P>(env)
    }

    fn get_env(&self) -> Env {
        retain_completion_schedulers::<S2>(self.sender.get_env(), &Disposition::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InlineScheduler;
    use crate::env::get_completion_scheduler;
    use crate::error::ExceptionPtr;
    use crate::factories::{JustError, JustStopped, just, just_error, just_stopped};
    use crate::sender::SenderExt;
    use crate::signatures::Signature;

    #[test]
    fn test_let_value_signatures_come_from_inner_sender() {
        type Chained = Let<
            crate::factories::Just<(i32,)>,
            fn(i32) -> JustError<String, (u8,)>,
            ValueTag,
        >;
        let sigs = Chained::completion_signatures(None).unwrap();
        assert_eq!(
            sigs,
            CompletionSignatures::from_iter([
                Signature::error_of::<String>(),
                Signature::error_of::<ExceptionPtr>()
            ])
        );
    }

    #[test]
    fn test_let_value_inner_error_reaches_receiver() {
        let err = just((1,))
            .let_value(|x: i32| JustError::<_, ()>::new(x + 1))
            .sync_wait()
            .unwrap_err();
        assert_eq!(err.downcast::<i32>().unwrap(), 2);
    }

    #[test]
    fn test_let_value_skips_on_stop() {
        let out = just_stopped().let_value(|| -> crate::factories::Just<(i32,)> { panic!("not called") });
        assert_eq!(out.sync_wait().unwrap(), None);
    }

    #[test]
    fn test_let_error_replaces_failure() {
        let out = just_error(13u8)
            .let_error(|e| {
                let code = e.downcast::<u8>().unwrap_or(0);
                crate::factories::just_from(move || {
                    assert_eq!(code, 13);
                })
            })
            .sync_wait();
        assert_eq!(out.unwrap(), Some(()));
    }

    #[test]
    fn test_let_stopped_restarts_work() {
        let out = JustStopped::<(&str,)>::new()
            .let_stopped(|| just(("fallback",)))
            .nothrow()
            .sync_wait();
        assert_eq!(out.unwrap(), Some(("fallback",)));
    }

    #[test]
    fn test_let_stopped_signatures() {
        type Fallback = Let<JustStopped<(i32,)>, fn() -> JustError<u16, (i32,)>, StoppedTag, NoPanic>;
        assert_eq!(
            Fallback::completion_signatures(None).unwrap(),
            CompletionSignatures::error_of::<u16>()
        );
    }

    #[test]
    fn test_env_keeps_schedulers_the_continuation_never_completes_on() {
        let chained = just((1,))
            .continues_on(InlineScheduler)
            .let_value(|x: i32| just((x + 1,)));
        let env = Sender::get_env(&chained);
        assert!(get_completion_scheduler(&env, Disposition::Value).is_none());
        assert!(get_completion_scheduler(&env, Disposition::Error).is_some());
        assert!(get_completion_scheduler(&env, Disposition::Stopped).is_some());

        let recovered = just_stopped()
            .continues_on(InlineScheduler)
            .let_stopped(|| just_error(1_u8));
        let env = Sender::get_env(&recovered);
        assert!(get_completion_scheduler(&env, Disposition::Value).is_some());
        assert!(get_completion_scheduler(&env, Disposition::Error).is_none());
        assert!(get_completion_scheduler(&env, Disposition::Stopped).is_some());
    }
}
