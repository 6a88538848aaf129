use crate::error::Error;
use crate::sender::{OperationState, Receiver, Sender};

struct DetachedReceiver;

impl<V: Send + 'static> Receiver<V> for DetachedReceiver {
    fn set_value(self, _value: V) {}

    fn set_error(self, error: Error) {
        tracing::error!(%error, "detached operation failed");
    }

    fn set_stopped(self) {
        tracing::debug!("detached operation stopped");
    }
}

/// Start `sender` without waiting for it.
///
/// The value is discarded. Errors are logged rather than propagated, since
/// nobody is left to receive them.
///
/// ```rust
/// use std::sync::mpsc;
/// use senders::prelude::*;
/// use senders::ThreadContext;
///
/// let worker = ThreadContext::new().unwrap();
/// let (tx, rx) = mpsc::channel();
/// worker
///     .scheduler()
///     .schedule()
///     .then(move || tx.send(42).unwrap())
///     .start_detached();
/// assert_eq!(rx.recv().unwrap(), 42);
/// ```
pub fn start_detached<S: Sender>(sender: S) {
    sender.connect(DetachedReceiver).start()
}
