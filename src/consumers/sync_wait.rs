use std::sync::Arc;

use crate::completion::Completion;
use crate::context::RunLoop;
use crate::env::Env;
use crate::error::{Error, ProtocolError};
use crate::sender::{OperationState, Receiver, Sender};
use crate::signatures::{Disposition, SignatureError};

type Outcome<V> = Arc<spin::Mutex<Option<Completion<V>>>>;

struct SyncWaitReceiver<V> {
    outcome: Outcome<V>,
    run_loop: RunLoop,
    env: Env,
}

impl<V: Send + 'static> Receiver<V> for SyncWaitReceiver<V> {
    fn set_value(self, value: V) {
        *self.outcome.lock() = Some(Completion::Value(value));
    }

    fn set_error(self, error: Error) {
        *self.outcome.lock() = Some(Completion::Error(error));
    }

    fn set_stopped(self) {
        *self.outcome.lock() = Some(Completion::Stopped);
    }

    fn get_env(&self) -> Env {
        self.env.clone()
    }
}

impl<V> Drop for SyncWaitReceiver<V> {
    fn drop(&mut self) {
        self.run_loop.finish();
    }
}

/// Run `sender` to completion, blocking the calling thread.
///
/// The calling thread drives a fresh [`RunLoop`] whose scheduler is offered
/// to the operation as both `get_scheduler` and `get_delegatee_scheduler`,
/// so work scheduled there runs here.
///
/// Returns `Ok(Some(value))` on a value completion and `Ok(None)` when the
/// operation was stopped. An `error(ExceptionPtr)` completion resumes the
/// captured panic; any other error is returned as `Err`. A sender declaring
/// more than one value shape is rejected with
/// [`SignatureError::AmbiguousValue`] before anything runs.
///
/// ```rust
/// use senders::prelude::*;
///
/// assert_eq!(sync_wait(just((1, 2, 3))).unwrap(), Some((1, 2, 3)));
/// assert_eq!(sync_wait(just_stopped()).unwrap(), None);
/// assert!(sync_wait(just_error("x")).unwrap_err().is::<&str>());
/// ```
pub fn sync_wait<S: Sender>(sender: S) -> Result<Option<S::Value>, Error> {
    let run_loop = RunLoop::new();
    let scheduler = run_loop.scheduler();
    let env = Env::new()
        .with_scheduler(scheduler.clone())
        .with_delegatee_scheduler(scheduler);

    let sigs = S::completion_signatures(Some(&env))?;
    let values = sigs.count(Disposition::Value);
    if values > 1 {
        return Err(SignatureError::AmbiguousValue { count: values }.into());
    }

    let outcome: Outcome<S::Value> = Arc::new(spin::Mutex::new(None));
    sender
        .connect(SyncWaitReceiver {
            outcome: Arc::clone(&outcome),
            run_loop: run_loop.clone(),
            env,
        })
        .start();
    run_loop.run();

    let completion = outcome.lock().take();
    match completion {
        Some(completion) => completion.into_result().map_err(Error::rethrow_if_exception),
        None => Err(ProtocolError::Abandoned.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptors::starts_on;
    use crate::context::{AnyScheduler, Scheduler, ThreadContext};
    use crate::env::GetDelegateeScheduler;
    use crate::factories::{just, just_error, read_env};
    use crate::sender::SenderExt;
    use crate::signatures::CompletionSignatures;

    struct Ambiguous;

    pub struct Never<R>(R);

    impl<R> OperationState for Never<R> {
        fn start(self) {}
    }

    impl Sender for Ambiguous {
        type Value = (i32,);
        type Operation<R> = Never<R>
        where
            R: Receiver<(i32,)>;

        fn connect<R: Receiver<(i32,)>>(self, receiver: R) -> Never<R> {
            Never(receiver)
        }

        fn completion_signatures(_env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
            Ok(CompletionSignatures::value_of::<(i32,)>().concat(&CompletionSignatures::value_of::<(u8,)>()))
        }
    }

    struct Dropping;

    impl Sender for Dropping {
        type Value = ();
        type Operation<R> = Never<R>
        where
            R: Receiver<()>;

        fn connect<R: Receiver<()>>(self, receiver: R) -> Never<R> {
            Never(receiver)
        }

        fn completion_signatures(_env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
            Ok(CompletionSignatures::value_of::<()>())
        }
    }

    #[test]
    fn test_ambiguous_value_rejected() {
        let err = sync_wait(Ambiguous).unwrap_err();
        assert_eq!(
            err.downcast::<SignatureError>().unwrap(),
            SignatureError::AmbiguousValue { count: 2 }
        );
    }

    #[test]
    fn test_abandoned_operation_reported() {
        let err = sync_wait(Dropping).unwrap_err();
        assert!(matches!(err.downcast::<ProtocolError>(), Ok(ProtocolError::Abandoned)));
    }

    #[test]
    fn test_error_value_returned() {
        let err = sync_wait(just_error(404_u16)).unwrap_err();
        assert_eq!(err.downcast::<u16>().unwrap(), 404);
    }

    #[test]
    #[should_panic(expected = "inside")]
    fn test_exception_rethrown() {
        let _ = sync_wait(just(()).then(|| -> () { panic!("inside") }));
    }

    #[test]
    fn test_delegatee_scheduler_runs_on_caller() {
        let context = ThreadContext::new().unwrap();
        let here = std::thread::current().id();
        let out = starts_on(context.scheduler(), read_env(GetDelegateeScheduler))
            .let_value(move |delegatee: Option<AnyScheduler>| {
                assert_ne!(std::thread::current().id(), here);
                delegatee
                    .expect("sync_wait provides a delegatee")
                    .schedule()
                    .then(|| (std::thread::current().id(),))
            })
            .sync_wait()
            .unwrap();
        assert_eq!(out, Some((here,)));
    }

    #[test]
    fn test_completion_from_other_thread() {
        let context = ThreadContext::new().unwrap();
        let out = context.scheduler().schedule().then(|| (7,)).sync_wait();
        assert_eq!(out.unwrap(), Some((7,)));
    }
}
