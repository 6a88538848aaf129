//! Cooperative cancellation.
//!
//! A [`StopSource`] owns the shared stop state, a [`StopToken`] observes it and
//! a [`StopCallback`] runs a function when stop is requested. Cancellation is
//! only ever a request: operations observe their token and finish on their own,
//! typically with a stopped completion.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use senders::{StopCallback, StopSource};
//!
//! let source = StopSource::new();
//! let fired = Arc::new(AtomicBool::new(false));
//! let _callback = StopCallback::new(&source.token(), {
//!     let fired = Arc::clone(&fired);
//!     move || fired.store(true, Ordering::SeqCst)
//! });
//!
//! assert!(!source.request_stop());
//! assert!(fired.load(Ordering::SeqCst));
//! ```

mod callback;
mod source;
mod token;

pub use callback::StopCallback;
pub use source::StopSource;
pub use token::{NeverStopToken, StopToken, StoppableToken};
