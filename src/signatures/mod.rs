//! Completion signatures: what an asynchronous operation can finish with.
//!
//! Every sender can describe, before it is ever connected, the complete set of
//! ways it may complete. A [`Signature`] is one such way (a [`Disposition`] plus
//! payload type descriptors) and [`CompletionSignatures`] is a deduplicated set of
//! them. Adaptors compute their own sets from their children's with the
//! operations on [`CompletionSignatures`].

mod descriptor;
mod error;
mod set;

pub use descriptor::{Disposition, Signature, TypeDesc};
pub use error::SignatureError;
pub use set::{CompletionSignatures, get_completion_signatures};
