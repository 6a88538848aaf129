//! Guarding user callbacks.
//!
//! Adaptors that run user code catch panics and turn them into an
//! `error(ExceptionPtr)` completion. An adaptor can instead be declared
//! non-panicking, which drops that completion from its signatures; a panic
//! there is a broken promise and aborts the process.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::Error;

/// Type-level choice between the two guarding behaviours.
pub trait PanicPolicy: Send + 'static {
    /// Whether the adaptor may complete with `error(ExceptionPtr)`.
    const MAY_PANIC: bool;

    /// Run `f`, converting a panic according to the policy.
    fn guard<T, F: FnOnce() -> T>(f: F) -> Result<T, Error>;
}

/// Panics become `error(ExceptionPtr)` completions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MayPanic;

/// The callback promises not to panic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPanic;

impl PanicPolicy for MayPanic {
    const MAY_PANIC: bool = true;

    fn guard<T, F: FnOnce() -> T>(f: F) -> Result<T, Error> {
        catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
            let error = Error::from_panic(payload);
            tracing::debug!(%error, "user callback panicked");
            error
        })
    }
}

impl PanicPolicy for NoPanic {
    const MAY_PANIC: bool = false;

    fn guard<T, F: FnOnce() -> T>(f: F) -> Result<T, Error> {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Ok(value),
            Err(payload) => {
                let error = Error::from_panic(payload);
                tracing::error!(%error, "callback declared non-panicking panicked");
                std::process::abort()
            }
        }
    }
}
