use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::context::Scheduler;
use crate::env::{Env, ForwardProgressGuarantee, get_stop_token};
use crate::sender::{OperationState, Receiver, Sender};
use crate::signatures::{CompletionSignatures, Disposition, SignatureError};

type Task = Box<dyn FnOnce() + Send>;

struct Queue {
    tasks: VecDeque<Task>,
    finishing: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    ready: Condvar,
}

impl Shared {
    fn push(&self, task: Task) {
        let mut queue = self.queue.lock();
        queue.tasks.push_back(task);
        tracing::trace!(queued = queue.tasks.len(), "run loop task pushed");
        drop(queue);
        self.ready.notify_one();
    }

    /// Next task, or `None` once finishing and drained.
    fn pop(&self) -> Option<Task> {
        let mut queue = self.queue.lock();
        loop {
            if let Some(task) = queue.tasks.pop_front() {
                return Some(task);
            }
            if queue.finishing {
                return None;
            }
            self.ready.wait(&mut queue);
        }
    }
}

/// A single-threaded FIFO work queue.
///
/// Work scheduled onto the loop runs when some thread calls [`run`](Self::run),
/// one task at a time in submission order. `run` returns once
/// [`finish`](Self::finish) has been called and the queue is empty.
///
/// ```rust
/// use std::thread;
/// use senders::prelude::*;
/// use senders::RunLoop;
///
/// let run_loop = RunLoop::new();
/// let scheduler = run_loop.scheduler();
/// let finisher = run_loop.clone();
///
/// let worker = thread::spawn(move || {
///     let out = starts_on(scheduler, just((2,)).then(|x: i32| (x + 1,))).sync_wait();
///     finisher.finish();
///     out
/// });
/// run_loop.run();
/// assert_eq!(worker.join().unwrap().unwrap(), Some((3,)));
/// ```
#[derive(Clone)]
pub struct RunLoop {
    shared: Arc<Shared>,
}

impl RunLoop {
    pub fn new() -> Self {
        RunLoop {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue {
                    tasks: VecDeque::new(),
                    finishing: false,
                }),
                ready: Condvar::new(),
            }),
        }
    }

    pub fn scheduler(&self) -> RunLoopScheduler {
        RunLoopScheduler {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Execute tasks on the calling thread until finished and drained.
    pub fn run(&self) {
        tracing::trace!("run loop started");
        while let Some(task) = self.shared.pop() {
            task();
        }
        tracing::trace!("run loop drained");
    }

    /// Ask `run` to return once the queue is empty, waking it if it is idle.
    pub fn finish(&self) {
        let mut queue = self.shared.queue.lock();
        queue.finishing = true;
        drop(queue);
        self.shared.ready.notify_all();
    }

    pub fn is_finishing(&self) -> bool {
        self.shared.queue.lock().finishing
    }
}

impl Default for RunLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RunLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.shared.queue.lock();
        f.debug_struct("RunLoop")
            .field("queued", &queue.tasks.len())
            .field("finishing", &queue.finishing)
            .finish()
    }
}

/// Scheduler handing work to a [`RunLoop`].
#[derive(Clone)]
pub struct RunLoopScheduler {
    shared: Arc<Shared>,
}

impl PartialEq for RunLoopScheduler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for RunLoopScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLoopScheduler").finish_non_exhaustive()
    }
}

impl Scheduler for RunLoopScheduler {
    type Sender = RunLoopSchedule;

    fn schedule(&self) -> RunLoopSchedule {
        RunLoopSchedule {
            scheduler: self.clone(),
        }
    }

    fn forward_progress_guarantee(&self) -> ForwardProgressGuarantee {
        ForwardProgressGuarantee::Parallel
    }
}

/// Sender returned by [`RunLoopScheduler::schedule`].
///
/// Completes with a value when the loop runs it, or stopped if the receiver's
/// stop token was triggered by then.
pub struct RunLoopSchedule {
    scheduler: RunLoopScheduler,
}

pub struct RunLoopOp<R> {
    shared: Arc<Shared>,
    receiver: R,
}

impl Sender for RunLoopSchedule {
    type Value = ();
    type Operation<R> = RunLoopOp<R>
    where
        R: Receiver<()>;

    fn connect<R>(self, receiver: R) -> RunLoopOp<R>
    where
        R: Receiver<()>,
    {
        RunLoopOp {
            shared: self.scheduler.shared,
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

impl<R: Receiver<()>> OperationState for RunLoopOp<R> {
    fn start(self) {
        let receiver = self.receiver;
        self.shared.push(Box::new(move || {
            if get_stop_token(&receiver.get_env()).stop_requested() {
                receiver.set_stopped();
            } else {
                receiver.set_value(());
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Completion;
    use crate::error::Error;
    use crate::stop::StopSource;
    use std::sync::Mutex as StdMutex;
    use std::thread;

    struct Log {
        entries: Arc<StdMutex<Vec<&'static str>>>,
        name: &'static str,
        env: Env,
    }

    impl Receiver<()> for Log {
        fn set_value(self, _: ()) {
            self.entries.lock().unwrap().push(self.name);
        }
        fn set_error(self, _: Error) {
            self.entries.lock().unwrap().push("error");
        }
        fn set_stopped(self) {
            self.entries.lock().unwrap().push("stopped");
        }
        fn get_env(&self) -> Env {
            self.env.clone()
        }
    }

    #[test]
    fn test_tasks_run_in_fifo_order() {
        let run_loop = RunLoop::new();
        let entries = Arc::new(StdMutex::new(Vec::new()));
        for name in ["a", "b", "c"] {
            run_loop
                .scheduler()
                .schedule()
                .connect(Log {
                    entries: Arc::clone(&entries),
                    name,
                    env: Env::new(),
                })
                .start();
        }
        assert!(entries.lock().unwrap().is_empty());
        run_loop.finish();
        run_loop.run();
        assert_eq!(*entries.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_stop_requested_before_execution_completes_stopped() {
        let run_loop = RunLoop::new();
        let source = StopSource::new();
        let entries = Arc::new(StdMutex::new(Vec::new()));
        run_loop
            .scheduler()
            .schedule()
            .connect(Log {
                entries: Arc::clone(&entries),
                name: "value",
                env: Env::new().with_stop_token(source.token()),
            })
            .start();
        source.request_stop();
        run_loop.finish();
        run_loop.run();
        assert_eq!(*entries.lock().unwrap(), vec!["stopped"]);
    }

    #[test]
    fn test_finish_wakes_idle_run() {
        let run_loop = RunLoop::new();
        let runner = thread::spawn({
            let run_loop = run_loop.clone();
            move || run_loop.run()
        });
        run_loop.finish();
        runner.join().unwrap();
        assert!(run_loop.is_finishing());
    }

    #[test]
    fn test_work_pushed_from_other_thread_runs_here() {
        let run_loop = RunLoop::new();
        let scheduler = run_loop.scheduler();
        let result = Arc::new(StdMutex::new(None));
        let pusher = thread::spawn({
            let result = Arc::clone(&result);
            let finisher = run_loop.clone();
            move || {
                struct Done(Arc<StdMutex<Option<Completion<()>>>>, RunLoop);
                impl Receiver<()> for Done {
                    fn set_value(self, v: ()) {
                        *self.0.lock().unwrap() = Some(Completion::Value(v));
                        self.1.finish();
                    }
                    fn set_error(self, e: Error) {
                        *self.0.lock().unwrap() = Some(Completion::Error(e));
                        self.1.finish();
                    }
                    fn set_stopped(self) {
                        *self.0.lock().unwrap() = Some(Completion::Stopped);
                        self.1.finish();
                    }
                }
                scheduler.schedule().connect(Done(result, finisher)).start();
            }
        });
        run_loop.run();
        pusher.join().unwrap();
        assert!(result.lock().unwrap().take().unwrap().is_value());
    }

    #[test]
    fn test_scheduler_identity_and_progress() {
        let run_loop = RunLoop::new();
        assert_eq!(run_loop.scheduler(), run_loop.scheduler());
        assert_ne!(run_loop.scheduler(), RunLoop::new().scheduler());
        assert_eq!(
            run_loop.scheduler().forward_progress_guarantee(),
            ForwardProgressGuarantee::Parallel
        );
    }
}
