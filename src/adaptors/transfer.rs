use crate::adaptors::write_env::EnvReceiver;
use crate::completion::Completion;
use crate::context::Scheduler;
use crate::env::Env;
use crate::error::Error;
use crate::sender::{OperationState, Receiver, Sender};
use crate::signatures::{CompletionSignatures, Disposition, SignatureError};

/// The schedule sender's error and stop completions; its value only means
/// "now running there".
fn scheduling_signatures<Sch: Scheduler>(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
    Ok(<Sch::Sender as Sender>::completion_signatures(env)?.without(Disposition::Value))
}

/// Runs a sender, then re-delivers its completion from another scheduler.
///
/// ```rust
/// use senders::prelude::*;
/// use senders::ThreadContext;
///
/// let worker = ThreadContext::new().unwrap();
/// let hopped = just((1,))
///     .continues_on(worker.scheduler())
///     .then(|x: i32| (x, std::thread::current().id()));
/// let (x, id) = hopped.sync_wait().unwrap().unwrap();
/// assert_eq!((x, id), (1, worker.thread_id()));
/// ```
#[derive(Debug, Clone)]
pub struct ContinuesOn<S, Sch> {
    sender: S,
    scheduler: Sch,
}

pub fn continues_on<S: Sender, Sch: Scheduler>(sender: S, scheduler: Sch) -> ContinuesOn<S, Sch> {
    ContinuesOn { sender, scheduler }
}

pub struct HopReceiver<Sch, R> {
    scheduler: Sch,
    receiver: R,
}

impl<Sch: Scheduler, R> HopReceiver<Sch, R> {
    fn hop<V>(self, completion: Completion<V>)
    where
        V: Send + 'static,
        R: Receiver<V>,
    {
        self.scheduler
            .schedule()
            .connect(DeliverReceiver {
                completion,
                receiver: self.receiver,
            })
            .start()
    }
}

impl<V, Sch, R> Receiver<V> for HopReceiver<Sch, R>
where
    V: Send + 'static,
    Sch: Scheduler,
    R: Receiver<V>,
{
    fn set_value(self, value: V) {
        self.hop(Completion::Value(value))
    }

    fn set_error(self, error: Error) {
        self.hop(Completion::Error(error))
    }

    fn set_stopped(self) {
        self.hop(Completion::Stopped)
    }

    fn get_env(&self) -> Env {
        self.receiver.get_env()
    }
}

/// Delivers a captured completion once the schedule sender has run.
pub struct DeliverReceiver<V, R> {
    completion: Completion<V>,
    receiver: R,
}

impl<V, R> Receiver<()> for DeliverReceiver<V, R>
where
    V: Send + 'static,
    R: Receiver<V>,
{
    fn set_value(self, (): ()) {
        self.completion.deliver(self.receiver)
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

impl<S, Sch> Sender for ContinuesOn<S, Sch>
where
    S: Sender,
    Sch: Scheduler,
{
    type Value = S::Value;
    type Operation<R> = S::Operation<HopReceiver<Sch, R>>
    where
        R: Receiver<Self::Value>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Self::Value>,
    {
        self.sender.connect(HopReceiver {
            scheduler: self.scheduler,
            receiver,
        })
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        Ok(S::completion_signatures(env)?.concat(&scheduling_signatures::<Sch>(env)?))
    }

    fn get_env(&self) -> Env {
        Disposition::ALL
            .into_iter()
            .fold(Env::new(), |env, disposition| {
                env.with_completion_scheduler(disposition, self.scheduler.clone())
            })
    }
}

/// Moves to a scheduler, then starts a sender there.
///
/// The sender sees the scheduler through `get_scheduler` in its environment.
///
/// ```rust
/// use senders::prelude::*;
/// use senders::ThreadContext;
///
/// let worker = ThreadContext::new().unwrap();
/// let there = starts_on(worker.scheduler(), just_from(|| (std::thread::current().id(),)));
/// assert_eq!(there.sync_wait().unwrap(), Some((worker.thread_id(),)));
/// ```
#[derive(Debug, Clone)]
pub struct StartsOn<Sch, S> {
    scheduler: Sch,
    sender: S,
}

pub fn starts_on<Sch: Scheduler, S: Sender>(scheduler: Sch, sender: S) -> StartsOn<Sch, S> {
    StartsOn { scheduler, sender }
}

pub struct StartReceiver<Sch, S, R> {
    scheduler: Sch,
    sender: S,
    receiver: R,
}

impl<Sch, S, R> Receiver<()> for StartReceiver<Sch, S, R>
where
    Sch: Scheduler,
    S: Sender + Send + 'static,
    R: Receiver<S::Value>,
{
    fn set_value(self, (): ()) {
        let env = Env::new().with_scheduler(self.scheduler);
        self.sender
            .connect(EnvReceiver::new(self.receiver, env))
            .start()
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

impl<Sch, S> Sender for StartsOn<Sch, S>
where
    Sch: Scheduler,
    S: Sender + Send + 'static,
{
    type Value = S::Value;
    type Operation<R> = <Sch::Sender as Sender>::Operation<StartReceiver<Sch, S, R>>
    where
        R: Receiver<Self::Value>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Self::Value>,
    {
        let schedule = self.scheduler.schedule();
        schedule.connect(StartReceiver {
            scheduler: self.scheduler,
            sender: self.sender,
            receiver,
        })
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        Ok(S::completion_signatures(env)?.concat(&scheduling_signatures::<Sch>(env)?))
    }
}
