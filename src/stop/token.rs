use std::fmt;
use std::sync::Arc;

use crate::stop::source::StopState;

/// Common interface of stop tokens.
pub trait StoppableToken: Clone + Send + Sync + 'static {
    /// Whether stop has been requested.
    fn stop_requested(&self) -> bool;

    /// Whether stop can still be requested.
    fn stop_possible(&self) -> bool;
}

/// A handle observing a [`StopSource`](crate::StopSource).
///
/// The default token is the never-stop token: it is never stopped and stop is
/// never possible.
#[derive(Clone, Default)]
pub struct StopToken {
    state: Option<Arc<StopState>>,
}

impl StopToken {
    pub(crate) fn from_state(state: Arc<StopState>) -> Self {
        StopToken { state: Some(state) }
    }

    /// The never-stop token.
    pub const fn never() -> Self {
        StopToken { state: None }
    }

    pub fn stop_requested(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.stop_requested())
    }

    pub fn stop_possible(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.stop_possible())
    }

    pub(crate) fn state(&self) -> Option<&Arc<StopState>> {
        self.state.as_ref()
    }
}

impl StoppableToken for StopToken {
    fn stop_requested(&self) -> bool {
        StopToken::stop_requested(self)
    }

    fn stop_possible(&self) -> bool {
        StopToken::stop_possible(self)
    }
}

impl PartialEq for StopToken {
    fn eq(&self, other: &Self) -> bool {
        match (&self.state, &other.state) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for StopToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopToken")
            .field("stop_requested", &self.stop_requested())
            .field("stop_possible", &self.stop_possible())
            .finish()
    }
}

/// A token that is never stopped. Carries no state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverStopToken;

impl StoppableToken for NeverStopToken {
    fn stop_requested(&self) -> bool {
        false
    }

    fn stop_possible(&self) -> bool {
        false
    }
}

impl From<NeverStopToken> for StopToken {
    fn from(_: NeverStopToken) -> Self {
        StopToken::never()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stop::StopSource;

    #[test]
    fn test_never_stop_token() {
        assert!(!NeverStopToken.stop_requested());
        assert!(!NeverStopToken.stop_possible());
        let token: StopToken = NeverStopToken.into();
        assert_eq!(token, StopToken::never());
        assert!(!token.stop_possible());
    }

    #[test]
    fn test_token_observes_source() {
        let source = StopSource::new();
        let token = source.token();
        assert!(token.stop_possible());
        assert!(!token.stop_requested());
        source.request_stop();
        assert!(token.stop_requested());
        assert_eq!(token, source.token());
        assert_ne!(token, StopToken::never());
    }
}
