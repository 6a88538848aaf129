//! Sender adaptors: each takes one or more senders and returns a new one.
//!
//! The disposition-specific adaptors (`then`/`upon_error`/`upon_stopped` and
//! `let_value`/`let_error`/`let_stopped`) share one type each, selected by a
//! zero-sized disposition tag.

mod conditional;
mod let_value;
mod sequence;
mod transfer;
mod upon;
mod when_all;
mod write_env;

pub use conditional::{Conditional, conditional};
pub use let_value::{Let, let_error, let_stopped, let_value};
pub use sequence::{Sequence, sequence};
pub use transfer::{ContinuesOn, StartsOn, continues_on, starts_on};
pub use upon::{Upon, then, upon_error, upon_stopped};
pub use when_all::{JoinSlots, SenderTuple, StartAll, WhenAll, when_all};
pub use write_env::{WriteEnv, write_env};

use crate::env::Env;
use crate::sender::Sender;
use crate::signatures::{CompletionSignatures, Disposition, SignatureError};

/// Selects the disposition an adaptor reacts to.
pub trait DispositionTag: Send + 'static {
    const DISPOSITION: Disposition;
}

/// Reacts to the value completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueTag;

/// Reacts to the error completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTag;

/// Reacts to the stopped completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoppedTag;

impl DispositionTag for ValueTag {
    const DISPOSITION: Disposition = Disposition::Value;
}

impl DispositionTag for ErrorTag {
    const DISPOSITION: Disposition = Disposition::Error;
}

impl DispositionTag for StoppedTag {
    const DISPOSITION: Disposition = Disposition::Stopped;
}

/// Replace every signature of `disposition` in `sigs` by `replacement`, adding
/// `error(ExceptionPtr)` if any was replaced and the callback may panic.
fn replace_disposition(
    sigs: &CompletionSignatures,
    disposition: Disposition,
    replacement: &CompletionSignatures,
    may_panic: bool,
) -> Result<CompletionSignatures, SignatureError> {
    let reacts = sigs.count(disposition) > 0;
    let out = sigs.transform_disposition(disposition, |_| Ok(replacement.clone()))?;
    Ok(out.with_exception_if(reacts && may_panic))
}

/// Drop the completion schedulers in `env` for each of `dispositions` that
/// `Other` may also complete with. Unknown signatures drop them all.
fn retain_completion_schedulers<Other: Sender>(mut env: Env, dispositions: &[Disposition]) -> Env {
    let other = Other::completion_signatures(None).ok();
    for &disposition in dispositions {
        if other.as_ref().map_or(true, |sigs| sigs.count(disposition) > 0) {
            env = env.without_completion_scheduler(disposition);
        }
    }
    env
}

/// `when_all(a, b, ..)` over up to six senders.
///
/// ```rust
/// use senders::prelude::*;
///
/// let joined = when_all!(just((2,)), just((3,)), just(()));
/// assert_eq!(joined.sync_wait().unwrap(), Some((2, 3)));
/// ```
#[macro_export]
macro_rules! when_all {
    ($($sender:expr),* $(,)?) => {
        $crate::when_all(($($sender,)*))
    };
}

/// `sequence(a, b)` folded left over any number of senders.
///
/// ```rust
/// use senders::prelude::*;
///
/// let last = sequence!(just((1,)), just(()), just(("last",)));
/// assert_eq!(last.sync_wait().unwrap(), Some(("last",)));
/// ```
#[macro_export]
macro_rules! sequence {
    ($first:expr $(,)?) => {
        $first
    };
    ($first:expr, $second:expr $(, $rest:expr)* $(,)?) => {
        $crate::sequence!($crate::sequence($first, $second) $(, $rest)*)
    };
}
