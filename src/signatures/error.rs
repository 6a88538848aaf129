use crate::signatures::Disposition;

/// Diagnostics raised while computing completion signatures.
///
/// These describe malformed sender graphs. They surface when signatures are
/// queried, never as a completion of a running operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The sender's completions depend on an environment and none was given.
    #[error("completion signatures depend on an environment that was not supplied")]
    DependentSender,
    /// A signature violates the arity rule of its disposition.
    #[error("malformed {disposition} signature with {arity} payload types")]
    MalformedSignature { disposition: Disposition, arity: usize },
    /// A consumer needed exactly one value completion shape.
    #[error("expected exactly one value completion, found {count}")]
    AmbiguousValue { count: usize },
}
