//! Execution contexts and the schedulers that hand work to them.
//!
//! - [`InlineScheduler`] runs scheduled work immediately on the starting thread.
//! - [`RunLoop`] is a FIFO queue drained by whichever thread calls `run`.
//! - [`ThreadContext`] owns a run loop and a worker thread that drains it.
//! - [`AnyScheduler`] erases the scheduler type so it can live in an `Env`.

mod inline;
mod run_loop;
mod scheduler;
mod thread_context;

pub use inline::{InlineSchedule, InlineScheduler};
pub use run_loop::{RunLoop, RunLoopSchedule, RunLoopScheduler};
pub use scheduler::{AnySchedule, AnyScheduler, Scheduler, schedule};
pub use thread_context::{ThreadContext, ThreadContextBuilder};
