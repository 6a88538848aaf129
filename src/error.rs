//! Runtime error payloads.
//!
//! The error channel of every receiver carries an [`Error`]: an owned,
//! type-erased value that remembers what it was built from. A captured panic
//! travels through the same channel as an [`ExceptionPtr`].

use std::any::Any;
use std::fmt;

use crate::signatures::{SignatureError, TypeDesc};

/// An error completion payload.
///
/// ```rust
/// use senders::Error;
///
/// let err = Error::new("disk on fire");
/// assert!(err.is::<&str>());
/// assert_eq!(err.downcast_ref::<&str>(), Some(&"disk on fire"));
/// ```
pub struct Error {
    payload: Box<dyn Any + Send>,
    ty: TypeDesc,
}

impl Error {
    /// Wrap any sendable value. Wrapping an `Error` returns it unchanged.
    pub fn new<E: Send + 'static>(error: E) -> Self {
        let boxed: Box<dyn Any + Send> = Box::new(error);
        match boxed.downcast::<Error>() {
            Ok(inner) => *inner,
            Err(payload) => Error {
                payload,
                ty: TypeDesc::of::<E>(),
            },
        }
    }

    /// Wrap a panic payload caught by `catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Error::new(ExceptionPtr(payload))
    }

    /// Descriptor of the wrapped type.
    pub fn type_desc(&self) -> TypeDesc {
        self.ty
    }

    pub fn is<E: 'static>(&self) -> bool {
        self.payload.is::<E>()
    }

    /// Whether this error is a captured panic.
    pub fn is_exception(&self) -> bool {
        self.is::<ExceptionPtr>()
    }

    pub fn downcast_ref<E: 'static>(&self) -> Option<&E> {
        self.payload.downcast_ref::<E>()
    }

    /// Recover the wrapped value, or get `self` back if it is not an `E`.
    pub fn downcast<E: 'static>(self) -> Result<E, Self> {
        let ty = self.ty;
        match self.payload.downcast::<E>() {
            Ok(error) => Ok(*error),
            Err(payload) => Err(Error { payload, ty }),
        }
    }

    /// If this is a captured panic, resume unwinding with it.
    pub fn rethrow_if_exception(self) -> Self {
        match self.downcast::<ExceptionPtr>() {
            Ok(exception) => exception.rethrow(),
            Err(error) => error,
        }
    }

    fn message(&self) -> Option<String> {
        if let Some(s) = self.downcast_ref::<&'static str>() {
            return Some((*s).to_owned());
        }
        if let Some(s) = self.downcast_ref::<String>() {
            return Some(s.clone());
        }
        if let Some(e) = self.downcast_ref::<SignatureError>() {
            return Some(e.to_string());
        }
        if let Some(e) = self.downcast_ref::<ProtocolError>() {
            return Some(e.to_string());
        }
        if let Some(e) = self.downcast_ref::<ExceptionPtr>() {
            return e.message().map(|m| format!("panicked: {m}"));
        }
        None
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "Error<{}>({message:?})", self.ty.name()),
            None => write!(f, "Error<{}>", self.ty.name()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => f.write_str(&message),
            None => write!(f, "error of type {}", self.ty.name()),
        }
    }
}

impl From<SignatureError> for Error {
    fn from(error: SignatureError) -> Self {
        Error::new(error)
    }
}

impl From<ProtocolError> for Error {
    fn from(error: ProtocolError) -> Self {
        Error::new(error)
    }
}

/// A captured panic payload, the generic "something threw" error.
pub struct ExceptionPtr(Box<dyn Any + Send>);

impl ExceptionPtr {
    /// The panic message, when the payload is a string.
    pub fn message(&self) -> Option<&str> {
        if let Some(s) = self.0.downcast_ref::<&'static str>() {
            Some(s)
        } else {
            self.0.downcast_ref::<String>().map(String::as_str)
        }
    }

    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.0
    }

    /// Resume unwinding with the original payload.
    pub fn rethrow(self) -> ! {
        std::panic::resume_unwind(self.0)
    }
}

impl fmt::Debug for ExceptionPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExceptionPtr").field(&self.message()).finish()
    }
}

/// Violations of the sender/receiver protocol detected at runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The operation was dropped without ever completing its receiver.
    #[error("operation was abandoned without completing")]
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_flattens_nested_errors() {
        let inner = Error::new(7_u32);
        let outer = Error::new(inner);
        assert!(outer.is::<u32>());
        assert_eq!(outer.type_desc(), TypeDesc::of::<u32>());
    }

    #[test]
    fn test_downcast_returns_self_on_mismatch() {
        let err = Error::new(String::from("boom"));
        let err = err.downcast::<i32>().unwrap_err();
        assert_eq!(err.downcast::<String>().unwrap(), "boom");
    }

    #[test]
    fn test_panic_payload_becomes_exception() {
        let payload = std::panic::catch_unwind(|| panic!("kaput")).unwrap_err();
        let err = Error::from_panic(payload);
        assert!(err.is_exception());
        assert_eq!(err.downcast_ref::<ExceptionPtr>().unwrap().message(), Some("kaput"));
        assert_eq!(err.to_string(), "panicked: kaput");
    }

    #[test]
    fn test_rethrow_leaves_plain_errors_alone() {
        let err = Error::new(3_i64).rethrow_if_exception();
        assert_eq!(err.downcast::<i64>().unwrap(), 3);
    }

    #[test]
    #[should_panic(expected = "again")]
    fn test_rethrow_resumes_panic() {
        let payload = std::panic::catch_unwind(|| panic!("again")).unwrap_err();
        let _ = Error::from_panic(payload).rethrow_if_exception();
    }

    #[test]
    fn test_display_for_protocol_errors() {
        let err: Error = ProtocolError::Abandoned.into();
        assert_eq!(err.to_string(), "operation was abandoned without completing");
    }
}
