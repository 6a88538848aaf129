//! Senders in, results out: the ways to actually run a pipeline.

mod start_detached;
mod sync_wait;

pub use start_detached::start_detached;
pub use sync_wait::sync_wait;
