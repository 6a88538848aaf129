use crate::env::Env;
use crate::error::Error;
use crate::sender::{Receiver, Sender};
use crate::signatures::{CompletionSignatures, SignatureError};

/// Runs a sender with extra environment layered over its receiver's.
///
/// ```rust
/// use senders::prelude::*;
/// use senders::{Domain, GetDomain};
///
/// let tagged = read_env(GetDomain).write_env(Env::new().with_domain(Domain::Named("io")));
/// assert_eq!(tagged.sync_wait().unwrap(), Some((Domain::Named("io"),)));
/// ```
#[derive(Clone)]
pub struct WriteEnv<S> {
    sender: S,
    env: Env,
}

pub fn write_env<S: Sender>(sender: S, env: Env) -> WriteEnv<S> {
    WriteEnv { sender, env }
}

/// Forwards completions, answering environment queries from `env` first.
pub struct EnvReceiver<R> {
    receiver: R,
    env: Env,
}

impl<R> EnvReceiver<R> {
    /// Layer `env` over the environment of `receiver`.
    pub(crate) fn new<V>(receiver: R, env: Env) -> Self
    where
        R: Receiver<V>,
    {
        let env = env.layered(&receiver.get_env());
        EnvReceiver { receiver, env }
    }
}

impl<V, R: Receiver<V>> Receiver<V> for EnvReceiver<R> {
    fn set_value(self, value: V) {
        self.receiver.set_value(value)
    }

    fn set_error(self, error: Error) {
        self.receiver.set_error(error)
    }

    fn set_stopped(self) {
        self.receiver.set_stopped()
    }

    fn get_env(&self) -> Env {
        self.env.clone()
    }
}

impl<S: Sender> Sender for WriteEnv<S> {
    type Value = S::Value;
    type Operation<R> = S::Operation<EnvReceiver<R>>
    where
        R: Receiver<Self::Value>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Self::Value>,
    {
        self.sender.connect(EnvReceiver::new(receiver, self.env))
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        S::completion_signatures(env)
    }

    fn get_env(&self) -> Env {
        self.sender.get_env()
    }
}
