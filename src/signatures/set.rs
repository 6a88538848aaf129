use std::fmt;
use std::sync::OnceLock;

use crate::env::Env;
use crate::error::ExceptionPtr;
use crate::sender::Sender;
use crate::signatures::{Disposition, Signature, SignatureError, TypeDesc};

/// A deduplicated, unordered set of completion signatures.
///
/// Insertion order is kept for readable diagnostics, but equality is set
/// equality. The split into value payloads, error types and "may stop" is
/// computed on first use and cached.
///
/// ```rust
/// use senders::{CompletionSignatures, Signature};
///
/// let a = CompletionSignatures::from_iter([Signature::value_of::<(i32,)>(), Signature::stopped()]);
/// let b = CompletionSignatures::from_iter([Signature::stopped(), Signature::error_of::<String>()]);
/// let both = a.concat(&b);
///
/// assert_eq!(both.len(), 3);
/// assert!(both.sends_stopped());
/// ```
#[derive(Default)]
pub struct CompletionSignatures {
    sigs: Vec<Signature>,
    partition: OnceLock<Partition>,
}

struct Partition {
    values: Vec<Vec<TypeDesc>>,
    errors: Vec<TypeDesc>,
    stopped: bool,
}

impl CompletionSignatures {
    /// The empty set, identity of [`concat`](Self::concat).
    pub fn new() -> Self {
        Self::default()
    }

    /// `{value(T...)}`.
    pub fn value_of<T: crate::tuple::Tuple>() -> Self {
        Self::from_iter([Signature::value_of::<T>()])
    }

    /// `{error(E)}`.
    pub fn error_of<E: 'static>() -> Self {
        Self::from_iter([Signature::error_of::<E>()])
    }

    /// `{stopped()}`.
    pub fn stopped() -> Self {
        Self::from_iter([Signature::stopped()])
    }

    /// `{error(ExceptionPtr)}`, the completion added for guarded user code.
    pub fn exception() -> Self {
        Self::error_of::<ExceptionPtr>()
    }

    /// Add a signature unless an equal one is present.
    pub fn insert(&mut self, sig: Signature) -> bool {
        if self.sigs.contains(&sig) {
            return false;
        }
        self.sigs.push(sig);
        self.partition = OnceLock::new();
        true
    }

    pub fn contains(&self, sig: &Signature) -> bool {
        self.sigs.contains(sig)
    }

    pub fn len(&self) -> usize {
        self.sigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sigs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.sigs.iter()
    }

    /// Set union.
    pub fn concat(&self, other: &CompletionSignatures) -> CompletionSignatures {
        let mut out = self.clone();
        for sig in &other.sigs {
            out.insert(sig.clone());
        }
        out
    }

    /// Union of any number of sets.
    pub fn concat_all<I>(sets: I) -> CompletionSignatures
    where
        I: IntoIterator<Item = CompletionSignatures>,
    {
        sets.into_iter()
            .fold(CompletionSignatures::new(), |acc, set| acc.concat(&set))
    }

    /// Rewrite the set one signature at a time.
    ///
    /// Each function receives the payload of one signature of its disposition and
    /// returns the set that replaces it; the results are concatenated. The first
    /// failing function aborts the transform with its diagnostic.
    pub fn transform<V, E, S>(
        &self,
        mut value_fn: V,
        mut error_fn: E,
        mut stopped_fn: S,
    ) -> Result<CompletionSignatures, SignatureError>
    where
        V: FnMut(&[TypeDesc]) -> Result<CompletionSignatures, SignatureError>,
        E: FnMut(TypeDesc) -> Result<CompletionSignatures, SignatureError>,
        S: FnMut() -> Result<CompletionSignatures, SignatureError>,
    {
        let mut out = CompletionSignatures::new();
        for sig in &self.sigs {
            let replaced = match sig.disposition() {
                Disposition::Value => value_fn(sig.payload())?,
                Disposition::Error => error_fn(sig.payload()[0])?,
                Disposition::Stopped => stopped_fn()?,
            };
            out = out.concat(&replaced);
        }
        Ok(out)
    }

    /// Rewrite only the signatures of one disposition, keeping the others.
    pub fn transform_disposition<F>(
        &self,
        disposition: Disposition,
        mut f: F,
    ) -> Result<CompletionSignatures, SignatureError>
    where
        F: FnMut(&Signature) -> Result<CompletionSignatures, SignatureError>,
    {
        let mut out = CompletionSignatures::new();
        for sig in &self.sigs {
            if sig.disposition() == disposition {
                out = out.concat(&f(sig)?);
            } else {
                out.insert(sig.clone());
            }
        }
        Ok(out)
    }

    /// The set with every signature of `disposition` removed.
    pub fn without(&self, disposition: Disposition) -> CompletionSignatures {
        self.sigs
            .iter()
            .filter(|sig| sig.disposition() != disposition)
            .cloned()
            .collect()
    }

    /// Add `error(ExceptionPtr)` when `may_panic` holds.
    pub fn with_exception_if(mut self, may_panic: bool) -> CompletionSignatures {
        if may_panic {
            self.insert(Signature::error_of::<ExceptionPtr>());
        }
        self
    }

    fn partition(&self) -> &Partition {
        self.partition.get_or_init(|| {
            let mut partition = Partition {
                values: Vec::new(),
                errors: Vec::new(),
                stopped: false,
            };
            for sig in &self.sigs {
                match sig.disposition() {
                    Disposition::Value => partition.values.push(sig.payload().to_vec()),
                    Disposition::Error => partition.errors.push(sig.payload()[0]),
                    Disposition::Stopped => partition.stopped = true,
                }
            }
            partition
        })
    }

    /// Payload types of every value signature.
    pub fn value_types(&self) -> &[Vec<TypeDesc>] {
        &self.partition().values
    }

    /// Payload type of every error signature.
    pub fn error_types(&self) -> &[TypeDesc] {
        &self.partition().errors
    }

    /// Whether a `stopped()` completion is possible.
    pub fn sends_stopped(&self) -> bool {
        self.partition().stopped
    }

    /// Number of signatures with the given disposition.
    pub fn count(&self, disposition: Disposition) -> usize {
        let partition = self.partition();
        match disposition {
            Disposition::Value => partition.values.len(),
            Disposition::Error => partition.errors.len(),
            Disposition::Stopped => usize::from(partition.stopped),
        }
    }

    /// Signatures with the given disposition.
    pub fn select(&self, disposition: Disposition) -> Vec<&Signature> {
        self.sigs
            .iter()
            .filter(|sig| sig.disposition() == disposition)
            .collect()
    }

    /// Whether an `error(ExceptionPtr)` completion is possible.
    pub fn sends_exception(&self) -> bool {
        self.error_types().iter().any(|ty| ty.is::<ExceptionPtr>())
    }
}

impl Clone for CompletionSignatures {
    fn clone(&self) -> Self {
        CompletionSignatures {
            sigs: self.sigs.clone(),
            partition: OnceLock::new(),
        }
    }
}

impl PartialEq for CompletionSignatures {
    fn eq(&self, other: &Self) -> bool {
        self.sigs.len() == other.sigs.len() && self.sigs.iter().all(|sig| other.contains(sig))
    }
}

impl Eq for CompletionSignatures {}

impl FromIterator<Signature> for CompletionSignatures {
    fn from_iter<I: IntoIterator<Item = Signature>>(iter: I) -> Self {
        let mut out = CompletionSignatures::new();
        for sig in iter {
            out.insert(sig);
        }
        out
    }
}

impl fmt::Debug for CompletionSignatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.sigs.iter()).finish()
    }
}

/// Completion signatures of `S` in the environment `env`.
///
/// Passing `None` asks for the environment-independent answer, which a
/// dependent sender cannot give: it reports [`SignatureError::DependentSender`].
pub fn get_completion_signatures<S: Sender>(
    env: Option<&Env>,
) -> Result<CompletionSignatures, SignatureError> {
    S::completion_signatures(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CompletionSignatures {
        CompletionSignatures::from_iter([
            Signature::value_of::<(i32, f64)>(),
            Signature::error_of::<String>(),
            Signature::stopped(),
        ])
    }

    #[test]
    fn test_concat_is_idempotent() {
        let a = sample();
        assert_eq!(a.concat(&a), a);
        assert_eq!(a.concat(&a).len(), 3);
    }

    #[test]
    fn test_concat_is_commutative_with_empty_identity() {
        let a = sample();
        let b = CompletionSignatures::from_iter([Signature::error_of::<u8>(), Signature::stopped()]);
        assert_eq!(a.concat(&b), b.concat(&a));
        assert_eq!(a.concat(&CompletionSignatures::new()), a);
        assert_eq!(
            CompletionSignatures::concat_all([a.clone(), b.clone(), a.clone()]),
            a.concat(&b)
        );
    }

    #[test]
    fn test_partition_counts() {
        let sigs = sample().concat(&CompletionSignatures::value_of::<()>());
        assert_eq!(sigs.count(Disposition::Value), 2);
        assert_eq!(sigs.count(Disposition::Error), 1);
        assert_eq!(sigs.count(Disposition::Stopped), 1);
        assert_eq!(sigs.error_types(), &[TypeDesc::of::<String>()]);
        assert_eq!(sigs.select(Disposition::Stopped), vec![&Signature::stopped()]);
        // cached partition is refreshed after insert
        let mut sigs = sigs;
        sigs.insert(Signature::error_of::<u8>());
        assert_eq!(sigs.count(Disposition::Error), 2);
    }

    #[test]
    fn test_transform_replaces_per_disposition() {
        let out = sample()
            .transform(
                |_| Ok(CompletionSignatures::value_of::<(bool,)>()),
                |ty| Ok(CompletionSignatures::from_iter([Signature::error(ty)])),
                || Ok(CompletionSignatures::new()),
            )
            .unwrap();
        assert_eq!(
            out,
            CompletionSignatures::from_iter([
                Signature::value_of::<(bool,)>(),
                Signature::error_of::<String>(),
            ])
        );
    }

    #[test]
    fn test_transform_surfaces_malformed_result() {
        let err = sample()
            .transform(
                |payload| {
                    Signature::new(Disposition::Error, payload.to_vec())
                        .map(|sig| CompletionSignatures::from_iter([sig]))
                },
                |ty| Ok(CompletionSignatures::from_iter([Signature::error(ty)])),
                || Ok(CompletionSignatures::stopped()),
            )
            .unwrap_err();
        assert_eq!(
            err,
            SignatureError::MalformedSignature {
                disposition: Disposition::Error,
                arity: 2
            }
        );
    }

    #[test]
    fn test_without_and_exception() {
        let sigs = sample().without(Disposition::Value).with_exception_if(true);
        assert_eq!(sigs.count(Disposition::Value), 0);
        assert!(sigs.sends_exception());
        assert!(!sample().with_exception_if(false).sends_exception());
    }
}
