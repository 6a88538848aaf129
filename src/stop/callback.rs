use std::sync::Arc;

use crate::stop::StopToken;
use crate::stop::source::{CallbackId, StopState};

/// A function registered to run when stop is requested.
///
/// If stop was already requested the function runs inside [`StopCallback::new`].
/// Otherwise it runs on the thread calling `request_stop`, at most once.
/// Dropping the callback deregisters it; if the function is running on another
/// thread at that moment, the drop waits until it returns. A callback may drop
/// its own registration from inside the function without deadlocking.
#[must_use = "the callback is deregistered when dropped"]
pub struct StopCallback {
    registration: Option<(Arc<StopState>, CallbackId)>,
}

impl StopCallback {
    pub fn new<F>(token: &StopToken, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let registration = token.state().and_then(|state| {
            state
                .try_add_callback(Box::new(callback))
                .map(|id| (Arc::clone(state), id))
        });
        StopCallback { registration }
    }

    /// Whether the callback is still waiting in the registry.
    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }
}

impl Drop for StopCallback {
    fn drop(&mut self) {
        if let Some((state, id)) = self.registration.take() {
            state.remove_callback(id);
        }
    }
}

impl std::fmt::Debug for StopCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopCallback")
            .field("registered", &self.is_registered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stop::StopSource;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let f = {
            let hits = Arc::clone(&hits);
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        };
        (hits, f)
    }

    #[test]
    fn test_runs_on_request_stop() {
        let source = StopSource::new();
        let (hits, f) = counter();
        let callback = StopCallback::new(&source.token(), f);
        assert!(callback.is_registered());
        source.request_stop();
        source.request_stop();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_after_stop_runs_immediately_once() {
        let source = StopSource::new();
        source.request_stop();
        let (hits, f) = counter();
        let callback = StopCallback::new(&source.token(), f);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!callback.is_registered());
        drop(callback);
        source.request_stop();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_never_token_never_runs() {
        let (hits, f) = counter();
        let callback = StopCallback::new(&StopToken::never(), f);
        assert!(!callback.is_registered());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dropped_callback_does_not_run() {
        let source = StopSource::new();
        let (hits, f) = counter();
        drop(StopCallback::new(&source.token(), f));
        source.request_stop();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_self_removal_during_callback_does_not_deadlock() {
        let source = StopSource::new();
        let slot: Arc<spin::Mutex<Option<StopCallback>>> = Arc::new(spin::Mutex::new(None));
        let ran = Arc::new(AtomicBool::new(false));
        let callback = StopCallback::new(&source.token(), {
            let slot = Arc::clone(&slot);
            let ran = Arc::clone(&ran);
            move || {
                ran.store(true, Ordering::SeqCst);
                let own = slot.lock().take();
                drop(own);
            }
        });
        *slot.lock() = Some(callback);
        source.request_stop();
        assert!(ran.load(Ordering::SeqCst));
        assert!(slot.lock().is_none());
    }

    #[test]
    fn test_concurrent_removal_waits_for_running_callback() {
        let source = StopSource::new();
        let (entered_tx, entered_rx) = mpsc::channel();
        let finished = Arc::new(AtomicBool::new(false));
        let callback = StopCallback::new(&source.token(), {
            let finished = Arc::clone(&finished);
            move || {
                entered_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(50));
                finished.store(true, Ordering::SeqCst);
            }
        });

        let stopper = thread::spawn(move || source.request_stop());
        entered_rx.recv().unwrap();
        drop(callback);
        assert!(finished.load(Ordering::SeqCst));
        assert!(!stopper.join().unwrap());
    }

    #[test]
    fn test_concurrent_registration_and_stop_runs_every_callback_once() {
        for _ in 0..50 {
            let source = StopSource::new();
            let hits = Arc::new(AtomicUsize::new(0));
            let token = source.token();
            let registrar = thread::spawn({
                let hits = Arc::clone(&hits);
                move || {
                    (0..16)
                        .map(|_| {
                            let hits = Arc::clone(&hits);
                            StopCallback::new(&token, move || {
                                hits.fetch_add(1, Ordering::SeqCst);
                            })
                        })
                        .collect::<Vec<_>>()
                }
            });
            source.request_stop();
            let callbacks = registrar.join().unwrap();
            assert_eq!(hits.load(Ordering::SeqCst), 16);
            drop(callbacks);
        }
    }
}
