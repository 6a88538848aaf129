use crate::adaptors::retain_completion_schedulers;
use crate::env::Env;
use crate::error::Error;
use crate::sender::{OperationState, Receiver, Sender};
use crate::signatures::{CompletionSignatures, Disposition, SignatureError};

/// Runs `first` for its effect, then `second`.
///
/// An error or stop from `first` is forwarded and `second` never starts.
///
/// ```rust
/// use senders::prelude::*;
///
/// let both = sequence(just((1,)), just(("second",)));
/// assert_eq!(both.sync_wait().unwrap(), Some(("second",)));
/// ```
#[derive(Debug, Clone)]
pub struct Sequence<A, B> {
    first: A,
    second: B,
}

pub fn sequence<A: Sender, B: Sender>(first: A, second: B) -> Sequence<A, B> {
    Sequence { first, second }
}

pub struct SequenceReceiver<B, R> {
    next: B,
    receiver: R,
}

impl<V, B, R> Receiver<V> for SequenceReceiver<B, R>
where
    B: Sender + Send + 'static,
    R: Receiver<B::Value>,
{
    fn set_value(self, _value: V) {
        self.next.connect(self.receiver).start()
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

impl<A, B> Sender for Sequence<A, B>
where
    A: Sender,
    B: Sender + Send + 'static,
{
    type Value = B::Value;
    type Operation<R> = A::Operation<SequenceReceiver<B, R>>
    where
        R: Receiver<Self::Value>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Self::Value>,
    {
        self.first.connect(SequenceReceiver {
            next: self.second,
            receiver,
        })
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        let first = A::completion_signatures(env)?;
        if first.count(Disposition::Value) == 0 {
            return Ok(first);
        }
        Ok(first.without(Disposition::Value).concat(&B::completion_signatures(env)?))
    }

    /// The value always comes from `second`; an error or stop may come from either.
    fn get_env(&self) -> Env {
        retain_completion_schedulers::<A>(
            self.second.get_env(),
            &[Disposition::Error, Disposition::Stopped],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InlineScheduler;
    use crate::env::get_completion_scheduler;
    use crate::factories::{JustError, just, just_error, just_from, just_stopped};
    use crate::sender::SenderExt;
    use crate::signatures::Signature;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(count: &Arc<AtomicUsize>) -> impl Sender<Value = (&'static str,)> + Send + 'static {
        let count = Arc::clone(count);
        just_from(move || {
            count.fetch_add(1, Ordering::SeqCst);
            ("ran",)
        })
    }

    #[test]
    fn test_second_skipped_after_error() {
        let count = Arc::new(AtomicUsize::new(0));
        let err = sequence(just_error(1_u8), counting(&count)).sync_wait().unwrap_err();
        assert!(err.is::<u8>());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_second_skipped_after_stop() {
        let count = Arc::new(AtomicUsize::new(0));
        let out = sequence(just_stopped(), counting(&count)).sync_wait();
        assert_eq!(out.unwrap(), None);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_second_runs_once_and_decides_outcome() {
        let count = Arc::new(AtomicUsize::new(0));
        let out = sequence(just((1, 2)), counting(&count)).sync_wait();
        assert_eq!(out.unwrap(), Some(("ran",)));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let err = sequence(just(()), just_error("second failed")).sync_wait().unwrap_err();
        assert_eq!(err.downcast::<&str>().unwrap(), "second failed");
    }

    #[test]
    fn test_signatures_drop_first_value() {
        type Seq = Sequence<JustError<u8, (i32,)>, crate::factories::Just<(bool,)>>;
        assert_eq!(
            Seq::completion_signatures(None).unwrap(),
            CompletionSignatures::error_of::<u8>()
        );

        type Both = Sequence<crate::factories::Just<(i32,)>, JustError<u16, (bool,)>>;
        assert_eq!(
            Both::completion_signatures(None).unwrap(),
            CompletionSignatures::from_iter([Signature::error_of::<u16>()])
        );
    }

    #[test]
    fn test_macro_folds_left() {
        let count = Arc::new(AtomicUsize::new(0));
        let out = crate::sequence!(counting(&count), counting(&count), just((3,))).sync_wait();
        assert_eq!(out.unwrap(), Some((3,)));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_env_value_scheduler_comes_from_second() {
        let quiet = sequence(just(()), just((2,)).continues_on(InlineScheduler));
        let env = Sender::get_env(&quiet);
        for disposition in Disposition::ALL {
            assert!(get_completion_scheduler(&env, disposition).is_some());
        }

        let failing = sequence(just_error(1_u8), just((2,)).continues_on(InlineScheduler));
        let env = Sender::get_env(&failing);
        assert!(get_completion_scheduler(&env, Disposition::Value).is_some());
        assert!(get_completion_scheduler(&env, Disposition::Error).is_none());
        assert!(get_completion_scheduler(&env, Disposition::Stopped).is_some());
    }
}
