use std::fmt;
use std::sync::Arc;

use crate::completion::Completion;
use crate::env::{Env, ForwardProgressGuarantee};
use crate::error::Error;
use crate::sender::{OperationState, Receiver, Sender};
use crate::signatures::{CompletionSignatures, Disposition, SignatureError};

/// A handle to an execution context.
///
/// `schedule()` returns a sender that completes with an empty value once it is
/// running on the context.
pub trait Scheduler: Clone + Send + Sync + 'static {
    /// The sender returned by [`schedule`](Self::schedule).
    type Sender: Sender<Value = ()> + Send + 'static;

    fn schedule(&self) -> Self::Sender;

    fn forward_progress_guarantee(&self) -> ForwardProgressGuarantee {
        ForwardProgressGuarantee::WeaklyParallel
    }

    /// Erase the scheduler type.
    fn erase(self) -> AnyScheduler {
        AnyScheduler::new(self)
    }
}

pub fn schedule<S: Scheduler>(scheduler: &S) -> S::Sender {
    scheduler.schedule()
}

type Task = Box<dyn FnOnce(Completion<()>) + Send>;

trait DynScheduler: Send + Sync {
    fn submit(&self, task: Task, env: Env);

    fn forward_progress_guarantee(&self) -> ForwardProgressGuarantee;

    fn type_name(&self) -> &'static str;
}

struct Erased<S>(S);

impl<S: Scheduler> DynScheduler for Erased<S> {
    fn submit(&self, task: Task, env: Env) {
        self.0.schedule().connect(TaskReceiver { task, env }).start();
    }

    fn forward_progress_guarantee(&self) -> ForwardProgressGuarantee {
        self.0.forward_progress_guarantee()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<S>()
    }
}

struct TaskReceiver {
    task: Task,
    env: Env,
}

impl Receiver<()> for TaskReceiver {
    fn set_value(self, value: ()) {
        (self.task)(Completion::Value(value))
    }

    fn set_error(self, error: Error) {
        (self.task)(Completion::Error(error))
    }

    fn set_stopped(self) {
        (self.task)(Completion::Stopped)
    }

    fn get_env(&self) -> Env {
        self.env.clone()
    }
}

/// A scheduler of any type.
///
/// Clones refer to the same underlying scheduler.
#[derive(Clone)]
pub struct AnyScheduler {
    inner: Arc<dyn DynScheduler>,
}

impl AnyScheduler {
    pub fn new<S: Scheduler>(scheduler: S) -> Self {
        AnyScheduler {
            inner: Arc::new(Erased(scheduler)),
        }
    }

    /// Whether both handles erase the same scheduler value.
    pub fn same_as(&self, other: &AnyScheduler) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Scheduler for AnyScheduler {
    type Sender = AnySchedule;

    fn schedule(&self) -> AnySchedule {
        AnySchedule {
            scheduler: self.clone(),
        }
    }

    fn forward_progress_guarantee(&self) -> ForwardProgressGuarantee {
        self.inner.forward_progress_guarantee()
    }

    fn erase(self) -> AnyScheduler {
        self
    }
}

impl fmt::Debug for AnyScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyScheduler").field(&self.inner.type_name()).finish()
    }
}

/// Sender returned by [`AnyScheduler::schedule`].
pub struct AnySchedule {
    scheduler: AnyScheduler,
}

pub struct AnyScheduleOp<R> {
    scheduler: AnyScheduler,
    receiver: R,
}

impl Sender for AnySchedule {
    type Value = ();
    type Operation<R> = AnyScheduleOp<R>
    where
        R: Receiver<()>;

    fn connect<R>(self, receiver: R) -> AnyScheduleOp<R>
    where
        R: Receiver<()>,
    {
        AnyScheduleOp {
            scheduler: self.scheduler,
            receiver,
        }
    }

    fn completion_signatures(_env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        Ok(CompletionSignatures::value_of::<()>().concat(&CompletionSignatures::stopped()))
    }

    fn get_env(&self) -> Env {
        Env::new().with_completion_scheduler(Disposition::Value, self.scheduler.clone())
    }
}

impl<R: Receiver<()>> OperationState for AnyScheduleOp<R> {
    fn start(self) {
        let env = self.receiver.get_env();
        let receiver = self.receiver;
        self.scheduler
            .inner
            .submit(Box::new(move |completion| completion.deliver(receiver)), env);
    }
}
