use std::io;
use std::thread::{self, JoinHandle, ThreadId};

use crate::context::{RunLoop, RunLoopScheduler};

/// A [`RunLoop`] driven by a dedicated worker thread.
///
/// Dropping the context finishes the loop, lets it drain and joins the worker.
pub struct ThreadContext {
    run_loop: RunLoop,
    thread_id: ThreadId,
    worker: Option<JoinHandle<()>>,
}

impl ThreadContext {
    /// Start a worker with the default thread configuration.
    pub fn new() -> io::Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ThreadContextBuilder {
        ThreadContextBuilder::default()
    }

    pub fn scheduler(&self) -> RunLoopScheduler {
        self.run_loop.scheduler()
    }

    /// Id of the worker thread.
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Finish the loop and wait for the worker to exit.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.run_loop.finish();
            if worker.join().is_err() {
                tracing::error!(thread = ?self.thread_id, "thread context worker panicked");
            }
        }
    }
}

impl Drop for ThreadContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ThreadContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadContext")
            .field("thread_id", &self.thread_id)
            .field("run_loop", &self.run_loop)
            .finish()
    }
}

/// Worker thread configuration for a [`ThreadContext`].
#[derive(Debug, Default, Clone)]
pub struct ThreadContextBuilder {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl ThreadContextBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Spawn the worker thread.
    pub fn build(self) -> io::Result<ThreadContext> {
        let mut builder = thread::Builder::new();
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        let run_loop = RunLoop::new();
        let worker = builder.spawn({
            let run_loop = run_loop.clone();
            move || {
                tracing::debug!(thread = ?thread::current().name(), "thread context worker started");
                run_loop.run();
                tracing::debug!(thread = ?thread::current().name(), "thread context worker stopped");
            }
        })?;

        Ok(ThreadContext {
            run_loop,
            thread_id: worker.thread().id(),
            worker: Some(worker),
        })
    }
}
