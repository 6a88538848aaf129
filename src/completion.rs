//! Captured outcome of an operation.

use crate::error::Error;
use crate::sender::Receiver;
use crate::signatures::Disposition;

/// How an operation finished, with its payload.
///
/// `Completion` is what an adaptor stores when it has to hold on to an
/// outcome before re-delivering it, for example across a scheduler hop.
///
/// ```rust
/// use senders::Completion;
///
/// let done: Completion<(i32,)> = Completion::Value((42,));
/// assert!(done.is_value());
/// assert_eq!(done.map_value(|(x,)| (x * 2,)).into_value(), Some((84,)));
/// ```
#[derive(Debug)]
pub enum Completion<V> {
    /// Finished successfully.
    Value(V),
    /// Finished with an error.
    Error(Error),
    /// Finished by honouring a stop request.
    Stopped,
}

impl<V> Completion<V> {
    pub fn disposition(&self) -> Disposition {
        match self {
            Completion::Value(_) => Disposition::Value,
            Completion::Error(_) => Disposition::Error,
            Completion::Stopped => Disposition::Stopped,
        }
    }

    #[inline]
    pub const fn is_value(&self) -> bool {
        matches!(self, Completion::Value(_))
    }

    #[inline]
    pub const fn is_error(&self) -> bool {
        matches!(self, Completion::Error(_))
    }

    #[inline]
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Completion::Stopped)
    }

    /// The value payload, discarding any other outcome.
    pub fn into_value(self) -> Option<V> {
        match self {
            Completion::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The error payload, discarding any other outcome.
    pub fn into_error(self) -> Option<Error> {
        match self {
            Completion::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn map_value<V2, F>(self, f: F) -> Completion<V2>
    where
        F: FnOnce(V) -> V2,
    {
        match self {
            Completion::Value(v) => Completion::Value(f(v)),
            Completion::Error(e) => Completion::Error(e),
            Completion::Stopped => Completion::Stopped,
        }
    }

    /// Convert into `Ok(Some(v))`, `Ok(None)` for stopped, or `Err`.
    pub fn into_result(self) -> Result<Option<V>, Error> {
        match self {
            Completion::Value(v) => Ok(Some(v)),
            Completion::Error(e) => Err(e),
            Completion::Stopped => Ok(None),
        }
    }

    /// Complete `receiver` with this outcome.
    pub fn deliver<R>(self, receiver: R)
    where
        R: Receiver<V>,
    {
        match self {
            Completion::Value(v) => receiver.set_value(v),
            Completion::Error(e) => receiver.set_error(e),
            Completion::Stopped => receiver.set_stopped(),
        }
    }
}

impl<V> From<Result<Option<V>, Error>> for Completion<V> {
    fn from(result: Result<Option<V>, Error>) -> Self {
        match result {
            Ok(Some(v)) => Completion::Value(v),
            Ok(None) => Completion::Stopped,
            Err(e) => Completion::Error(e),
        }
    }
}
