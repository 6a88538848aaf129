//! Commonly used imports
//!
//! Use `use senders::prelude::*;` for quick access to the most common types and functions.

// Core traits
pub use crate::{OperationState, Receiver, Scheduler, Sender, SenderExt};

// Payloads and environments
pub use crate::{Completion, Env, Error};

// Factories
pub use crate::{just, just_error, just_from, just_stopped, read_env};

// Adaptors, including the `when_all!` and `sequence!` macros
pub use crate::{
    conditional, continues_on, let_error, let_stopped, let_value, sequence, starts_on, then,
    upon_error, upon_stopped, when_all, write_env,
};

// Consumers
pub use crate::{start_detached, sync_wait};
