//! # Senders: structured asynchronous execution
//!
//! Describe asynchronous work as values, compose them, then run them.
//!
//! ## Core Traits
//!
//! - **[`Sender`]**: a description of work that has not started yet
//! - **[`Receiver`]**: the value / error / stopped handlers plus an [`Env`]
//! - **[`OperationState`]**: a sender connected to a receiver, ready to start
//! - **[`Scheduler`]**: a handle to an execution context
//!
//! Every sender declares how it can complete through
//! [`CompletionSignatures`], computed from its type alone (or from its type
//! and an environment, for senders that read the environment).
//!
//! ## Example
//!
//! ```
//! use senders::prelude::*;
//!
//! let work = when_all!(just((2,)), just((3,)))
//!     .then(|a: i32, b: i32| (a * b,))
//!     .let_value(|x: i32| sequence(just(()), just((x + 1,))));
//!
//! assert_eq!(work.sync_wait().unwrap(), Some((7,)));
//! ```
//!
//! ## Common Functions
//!
//! **Factories:** [`just`], [`just_error`], [`just_stopped`], [`just_from`], [`read_env`]
//!
//! **Adaptors:** [`then`], [`upon_error`], [`upon_stopped`], [`let_value`],
//! [`let_error`], [`let_stopped`], [`when_all()`], [`sequence()`], [`conditional`],
//! [`continues_on`], [`starts_on`], [`write_env`]
//!
//! **Consumers:** [`sync_wait`], [`start_detached`]
//!
//! **Contexts:** [`InlineScheduler`], [`RunLoop`], [`ThreadContext`]

mod adaptors;
mod completion;
mod consumers;
mod context;
mod env;
mod error;
mod factories;
mod panic;
mod sender;
mod signatures;
mod stop;
mod tuple;

pub mod prelude;

pub use adaptors::*;
pub use completion::*;
pub use consumers::*;
pub use context::*;
pub use env::*;
pub use error::*;
pub use factories::*;
pub use panic::*;
pub use sender::*;
pub use signatures::*;
pub use stop::*;
pub use tuple::*;
