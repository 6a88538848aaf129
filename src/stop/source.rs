use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, ThreadId};

use spin::Mutex;

use crate::stop::StopToken;

pub(crate) type Callback = Box<dyn FnOnce() + Send>;

/// Identifier of a registered callback.
pub(crate) type CallbackId = u64;

/// Shared state behind a stop source and its tokens.
pub(crate) struct StopState {
    stop_requested: AtomicBool,
    sources: AtomicUsize,
    registry: Mutex<Registry>,
}

struct Registry {
    next_id: CallbackId,
    callbacks: VecDeque<(CallbackId, Callback)>,
    /// Callback currently run by `request_stop`, with the lock released.
    executing: Option<CallbackId>,
    notifier: Option<ThreadId>,
}

impl StopState {
    fn new() -> Self {
        StopState {
            stop_requested: AtomicBool::new(false),
            sources: AtomicUsize::new(1),
            registry: Mutex::new(Registry {
                next_id: 0,
                callbacks: VecDeque::new(),
                executing: None,
                notifier: None,
            }),
        }
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub(crate) fn stop_possible(&self) -> bool {
        self.stop_requested() || self.sources.load(Ordering::Acquire) > 0
    }

    /// Returns whether stop had already been requested.
    fn request_stop(&self) -> bool {
        let mut registry = self.registry.lock();
        if self.stop_requested.swap(true, Ordering::AcqRel) {
            return true;
        }
        registry.notifier = Some(thread::current().id());
        tracing::trace!(callbacks = registry.callbacks.len(), "stop requested");

        while let Some((id, callback)) = registry.callbacks.pop_front() {
            registry.executing = Some(id);
            drop(registry);

            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(callback)).is_err() {
                tracing::error!(id, "stop callback panicked");
            }

            registry = self.registry.lock();
            registry.executing = None;
        }
        registry.notifier = None;
        false
    }

    /// Register `callback`, or run it right away if stop was already requested.
    pub(crate) fn try_add_callback(&self, callback: Callback) -> Option<CallbackId> {
        let mut registry = self.registry.lock();
        if self.stop_requested() {
            drop(registry);
            callback();
            return None;
        }
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push_back((id, callback));
        Some(id)
    }

    /// Deregister `id`.
    ///
    /// If the callback is running on another thread this waits for it to return.
    /// If it is running on this thread (it is removing itself) this returns at once.
    pub(crate) fn remove_callback(&self, id: CallbackId) {
        let mut registry = self.registry.lock();
        if let Some(pos) = registry.callbacks.iter().position(|(queued, _)| *queued == id) {
            let removed = registry.callbacks.remove(pos);
            drop(registry);
            drop(removed);
            return;
        }
        if registry.executing != Some(id) {
            return;
        }
        // A callback deregistering itself: the notifier owns it until it returns.
        if registry.notifier == Some(thread::current().id()) {
            return;
        }
        drop(registry);
        loop {
            std::hint::spin_loop();
            if self.registry.lock().executing != Some(id) {
                return;
            }
            thread::yield_now();
        }
    }
}

/// Owner of a stop state.
///
/// Clones share the same state. Stop is possible as long as at least one
/// source is alive, or once it has been requested.
pub struct StopSource {
    state: Arc<StopState>,
}

impl StopSource {
    pub fn new() -> Self {
        StopSource {
            state: Arc::new(StopState::new()),
        }
    }

    /// A token observing this source.
    pub fn token(&self) -> StopToken {
        StopToken::from_state(Arc::clone(&self.state))
    }

    pub fn stop_requested(&self) -> bool {
        self.state.stop_requested()
    }

    /// Request stop, running every registered callback on this thread.
    ///
    /// Returns `true` if stop had already been requested, in which case
    /// nothing runs.
    pub fn request_stop(&self) -> bool {
        self.state.request_stop()
    }
}

impl Default for StopSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StopSource {
    fn clone(&self) -> Self {
        self.state.sources.fetch_add(1, Ordering::AcqRel);
        StopSource {
            state: Arc::clone(&self.state),
        }
    }
}

impl Drop for StopSource {
    fn drop(&mut self) {
        self.state.sources.fetch_sub(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for StopSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSource")
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_request_stop_reports_previous_state() {
        let source = StopSource::new();
        assert!(!source.stop_requested());
        assert!(!source.request_stop());
        assert!(source.stop_requested());
        assert!(source.request_stop());
    }

    #[test]
    fn test_callbacks_run_once_in_registration_order() {
        let state = StopState::new();
        let order = Arc::new(spin::Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            state.try_add_callback(Box::new(move || order.lock().push(i)));
        }
        state.request_stop();
        state.request_stop();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_removed_callback_never_runs() {
        let state = StopState::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = state
            .try_add_callback(Box::new({
                let hits = Arc::clone(&hits);
                move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                }
            }))
            .unwrap();
        state.remove_callback(id);
        state.request_stop();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_self_removal_keeps_later_callbacks() {
        let state = Arc::new(StopState::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let first = state
            .try_add_callback(Box::new({
                let state = Arc::clone(&state);
                let hits = Arc::clone(&hits);
                move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                    state.remove_callback(0);
                }
            }))
            .unwrap();
        assert_eq!(first, 0);
        state
            .try_add_callback(Box::new({
                let hits = Arc::clone(&hits);
                move || {
                    hits.fetch_add(10, Ordering::SeqCst);
                }
            }))
            .unwrap();
        state.request_stop();
        assert_eq!(hits.load(Ordering::SeqCst), 11);
        assert!(state.registry.lock().executing.is_none());
    }

    #[test]
    fn test_late_registration_runs_inline() {
        let state = StopState::new();
        state.request_stop();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = state.try_add_callback(Box::new({
            let hits = Arc::clone(&hits);
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        }));
        assert!(id.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_possible_tracks_sources() {
        let source = StopSource::new();
        let token = source.token();
        let second = source.clone();
        drop(source);
        assert!(token.stop_possible());
        drop(second);
        assert!(!token.stop_possible());
    }
}
