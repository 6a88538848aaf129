//! Senders that start a pipeline.

mod just;
mod read_env;

pub use just::{Just, JustError, JustFrom, JustStopped, just, just_error, just_from, just_stopped};
pub use read_env::{ReadEnv, read_env};
