use crate::context::Scheduler;
use crate::env::Env;
use crate::sender::{OperationState, Receiver, Sender};
use crate::signatures::{CompletionSignatures, Disposition, SignatureError};

/// Runs scheduled work immediately, on the thread that starts it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    type Sender = InlineSchedule;

    fn schedule(&self) -> InlineSchedule {
        InlineSchedule
    }
}

/// Sender returned by [`InlineScheduler::schedule`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineSchedule;

pub struct InlineOp<R>(R);

impl Sender for InlineSchedule {
    type Value = ();
    type Operation<R> = InlineOp<R>
    where
        R: Receiver<()>;

    fn connect<R>(self, receiver: R) -> InlineOp<R>
    where
        R: Receiver<()>,
    {
        InlineOp(receiver)
    }

    fn completion_signatures(_env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        Ok(CompletionSignatures::value_of::<()>())
    }

    fn get_env(&self) -> Env {
        Env::new().with_completion_scheduler(Disposition::Value, InlineScheduler)
    }
}

impl<R: Receiver<()>> OperationState for InlineOp<R> {
    fn start(self) {
        self.0.set_value(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::SenderExt;

    #[test]
    fn test_schedule_completes_inline() {
        let here = std::thread::current().id();
        let (there,) = InlineScheduler
            .schedule()
            .then(|| (std::thread::current().id(),))
            .sync_wait()
            .unwrap()
            .unwrap();
        assert_eq!(here, there);
    }

    #[test]
    fn test_never_stops() {
        let sigs = InlineSchedule::completion_signatures(None).unwrap();
        assert!(!sigs.sends_stopped());
        assert_eq!(sigs.count(Disposition::Value), 1);
    }
}
