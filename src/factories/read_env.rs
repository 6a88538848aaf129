use crate::env::{Env, Query};
use crate::sender::{OperationState, Receiver, Sender};
use crate::signatures::{CompletionSignatures, SignatureError};

/// Completes with the answer to `Q` from the receiver's environment.
///
/// Its signatures depend on the environment it is connected in, so asking
/// for them without one reports [`SignatureError::DependentSender`].
///
/// ```rust
/// use senders::prelude::*;
/// use senders::{GetStopToken, SignatureError, get_completion_signatures, ReadEnv};
///
/// let err = get_completion_signatures::<ReadEnv<GetStopToken>>(None).unwrap_err();
/// assert_eq!(err, SignatureError::DependentSender);
///
/// let (token,) = read_env(GetStopToken).sync_wait().unwrap().unwrap();
/// assert!(!token.stop_requested());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ReadEnv<Q> {
    query: Q,
}

pub fn read_env<Q: Query>(query: Q) -> ReadEnv<Q> {
    ReadEnv { query }
}

pub struct ReadEnvOp<Q, R> {
    query: Q,
    receiver: R,
}

impl<Q: Query> Sender for ReadEnv<Q> {
    type Value = (Q::Output,);
    type Operation<R> = ReadEnvOp<Q, R>
    where
        R: Receiver<(Q::Output,)>;

    fn connect<R>(self, receiver: R) -> ReadEnvOp<Q, R>
    where
        R: Receiver<(Q::Output,)>,
    {
        ReadEnvOp {
            query: self.query,
            receiver,
        }
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        match env {
            Some(_) => Ok(CompletionSignatures::value_of::<(Q::Output,)>()),
            None => Err(SignatureError::DependentSender),
        }
    }
}

impl<Q: Query, R: Receiver<(Q::Output,)>> OperationState for ReadEnvOp<Q, R> {
    fn start(self) {
        let answer = self.receiver.get_env().query(self.query);
        self.receiver.set_value((answer,))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InlineScheduler;
    use crate::env::{Domain, GetDomain, GetScheduler};
    use crate::sender::SenderExt;
    use crate::signatures::Signature;

    #[test]
    fn test_dependent_without_env() {
        assert_eq!(
            ReadEnv::<GetDomain>::completion_signatures(None).unwrap_err(),
            SignatureError::DependentSender
        );
        let sigs = ReadEnv::<GetDomain>::completion_signatures(Some(&Env::new())).unwrap();
        assert!(sigs.contains(&Signature::value_of::<(Domain,)>()));
    }

    #[test]
    fn test_reads_written_env() {
        let env = Env::new().with_domain(Domain::Named("gpu"));
        let (domain,) = read_env(GetDomain).write_env(env).sync_wait().unwrap().unwrap();
        assert_eq!(domain, Domain::Named("gpu"));
    }

    #[test]
    fn test_sync_wait_supplies_scheduler() {
        let (scheduler,) = read_env(GetScheduler).sync_wait().unwrap().unwrap();
        assert!(scheduler.is_some());
        let inline = read_env(GetScheduler)
            .write_env(Env::new().with_scheduler(InlineScheduler))
            .sync_wait()
            .unwrap()
            .unwrap()
            .0
            .unwrap();
        assert!(format!("{inline:?}").contains("InlineScheduler"));
    }
}
