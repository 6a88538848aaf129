use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::signatures::SignatureError;
use crate::tuple::Tuple;

/// How an operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Disposition {
    /// Success, with a value payload of any arity.
    Value,
    /// Failure, with exactly one error payload.
    Error,
    /// Cancellation, with no payload.
    Stopped,
}

impl Disposition {
    /// All dispositions, in declaration order.
    pub const ALL: [Disposition; 3] = [Disposition::Value, Disposition::Error, Disposition::Stopped];

    pub(crate) const fn index(self) -> usize {
        match self {
            Disposition::Value => 0,
            Disposition::Error => 1,
            Disposition::Stopped => 2,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Value => write!(f, "value"),
            Disposition::Error => write!(f, "error"),
            Disposition::Stopped => write!(f, "stopped"),
        }
    }
}

/// Runtime descriptor of a payload type.
///
/// Two descriptors are equal when they describe the same type; the name is
/// carried for diagnostics only.
#[derive(Clone, Copy)]
pub struct TypeDesc {
    id: TypeId,
    name: &'static str,
}

impl TypeDesc {
    /// Descriptor of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeDesc {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this describes `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDesc {}

impl Hash for TypeDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One way an operation can complete: a disposition and its payload types.
///
/// Identity is structural. `error` signatures carry exactly one payload type,
/// `stopped` signatures carry none; [`Signature::new`] rejects anything else.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    disposition: Disposition,
    payload: Vec<TypeDesc>,
}

impl Signature {
    /// Build a signature, checking the per-disposition arity rule.
    pub fn new(disposition: Disposition, payload: Vec<TypeDesc>) -> Result<Self, SignatureError> {
        let arity = payload.len();
        let well_formed = match disposition {
            Disposition::Value => true,
            Disposition::Error => arity == 1,
            Disposition::Stopped => arity == 0,
        };
        if !well_formed {
            return Err(SignatureError::MalformedSignature { disposition, arity });
        }
        Ok(Signature { disposition, payload })
    }

    /// `value(T...)` for the payload tuple `T`.
    pub fn value_of<T: Tuple>() -> Self {
        Signature {
            disposition: Disposition::Value,
            payload: T::descriptors(),
        }
    }

    /// `value(...)` from explicit descriptors.
    pub fn value(payload: Vec<TypeDesc>) -> Self {
        Signature {
            disposition: Disposition::Value,
            payload,
        }
    }

    /// `error(E)`.
    pub fn error_of<E: 'static>() -> Self {
        Self::error(TypeDesc::of::<E>())
    }

    /// `error(E)` from an explicit descriptor.
    pub fn error(ty: TypeDesc) -> Self {
        Signature {
            disposition: Disposition::Error,
            payload: vec![ty],
        }
    }

    /// `stopped()`.
    pub fn stopped() -> Self {
        Signature {
            disposition: Disposition::Stopped,
            payload: Vec::new(),
        }
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn payload(&self) -> &[TypeDesc] {
        &self.payload
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.disposition)?;
        for (i, ty) in self.payload.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{ty:?}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_desc_equality_ignores_name() {
        assert_eq!(TypeDesc::of::<i32>(), TypeDesc::of::<i32>());
        assert_ne!(TypeDesc::of::<i32>(), TypeDesc::of::<u32>());
        assert!(TypeDesc::of::<String>().is::<String>());
    }

    #[test]
    fn test_new_rejects_malformed_signatures() {
        let two = vec![TypeDesc::of::<i32>(), TypeDesc::of::<i32>()];
        assert_eq!(
            Signature::new(Disposition::Error, two),
            Err(SignatureError::MalformedSignature {
                disposition: Disposition::Error,
                arity: 2
            })
        );
        assert_eq!(
            Signature::new(Disposition::Stopped, vec![TypeDesc::of::<i32>()]),
            Err(SignatureError::MalformedSignature {
                disposition: Disposition::Stopped,
                arity: 1
            })
        );
        assert_eq!(Signature::new(Disposition::Stopped, vec![]), Ok(Signature::stopped()));
        assert_eq!(
            Signature::new(Disposition::Value, vec![]),
            Ok(Signature::value_of::<()>())
        );
    }

    #[test]
    fn test_debug_format() {
        let sig = Signature::value_of::<(i32, bool)>();
        assert_eq!(format!("{sig:?}"), "value(i32, bool)");
        assert_eq!(format!("{:?}", Signature::stopped()), "stopped()");
    }
}
