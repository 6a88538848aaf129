//! Value payloads as tuples.
//!
//! A sender's value completion carries a tuple: `()` for "done, nothing to
//! report", `(T,)` for a single value, and so on up to twelve elements.
//! This module provides the three pieces of tuple plumbing the adaptors need:
//!
//! - [`Tuple`] describes a payload and its element types,
//! - [`Cat`] and [`Flatten`] concatenate payloads (used by `when_all`),
//! - [`Invoke`] calls a function with a payload spread as its arguments,
//! - [`Predicate`] does the same by reference, for tests on a payload.

use crate::signatures::TypeDesc;

/// A value payload.
pub trait Tuple: Send + 'static {
    /// Number of elements.
    const ARITY: usize;

    /// Type descriptors of the elements, in order.
    fn descriptors() -> Vec<TypeDesc>;
}

macro_rules! impl_tuple {
    ($n:expr; $($T:ident),*) => {
        impl<$($T: Send + 'static),*> Tuple for ($($T,)*) {
            const ARITY: usize = $n;

            fn descriptors() -> Vec<TypeDesc> {
                vec![$(TypeDesc::of::<$T>()),*]
            }
        }
    };
}

impl_tuple!(0;);
impl_tuple!(1; A0);
impl_tuple!(2; A0, A1);
impl_tuple!(3; A0, A1, A2);
impl_tuple!(4; A0, A1, A2, A3);
impl_tuple!(5; A0, A1, A2, A3, A4);
impl_tuple!(6; A0, A1, A2, A3, A4, A5);
impl_tuple!(7; A0, A1, A2, A3, A4, A5, A6);
impl_tuple!(8; A0, A1, A2, A3, A4, A5, A6, A7);
impl_tuple!(9; A0, A1, A2, A3, A4, A5, A6, A7, A8);
impl_tuple!(10; A0, A1, A2, A3, A4, A5, A6, A7, A8, A9);
impl_tuple!(11; A0, A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);
impl_tuple!(12; A0, A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11);

/// Concatenation of two payloads.
///
/// ```rust
/// use senders::Cat;
///
/// assert_eq!((1, 2).cat(("three",)), (1, 2, "three"));
/// assert_eq!(().cat((4,)), (4,));
/// ```
pub trait Cat<Rhs> {
    /// The concatenated payload.
    type Output: Tuple;

    /// Append `rhs` after `self`.
    fn cat(self, rhs: Rhs) -> Self::Output;
}

macro_rules! impl_cat {
    (($($A:ident),*); ($($B:ident),*)) => {
        #[allow(non_snake_case)]
        impl<$($A: Send + 'static,)* $($B: Send + 'static),*> Cat<($($B,)*)> for ($($A,)*) {
            type Output = ($($A,)* $($B,)*);

            #[allow(clippy::unused_unit)]
            fn cat(self, rhs: ($($B,)*)) -> Self::Output {
                let ($($A,)*) = self;
                let ($($B,)*) = rhs;
                ($($A,)* $($B,)*)
            }
        }
    };
}

impl_cat!((); ());
impl_cat!((); (B0));
impl_cat!((); (B0, B1));
impl_cat!((); (B0, B1, B2));
impl_cat!((); (B0, B1, B2, B3));
impl_cat!((); (B0, B1, B2, B3, B4));
impl_cat!((); (B0, B1, B2, B3, B4, B5));
impl_cat!((); (B0, B1, B2, B3, B4, B5, B6));
impl_cat!((); (B0, B1, B2, B3, B4, B5, B6, B7));
impl_cat!((); (B0, B1, B2, B3, B4, B5, B6, B7, B8));
impl_cat!((); (B0, B1, B2, B3, B4, B5, B6, B7, B8, B9));
impl_cat!((); (B0, B1, B2, B3, B4, B5, B6, B7, B8, B9, B10));
impl_cat!((); (B0, B1, B2, B3, B4, B5, B6, B7, B8, B9, B10, B11));
impl_cat!((A0); ());
impl_cat!((A0); (B0));
impl_cat!((A0); (B0, B1));
impl_cat!((A0); (B0, B1, B2));
impl_cat!((A0); (B0, B1, B2, B3));
impl_cat!((A0); (B0, B1, B2, B3, B4));
impl_cat!((A0); (B0, B1, B2, B3, B4, B5));
impl_cat!((A0); (B0, B1, B2, B3, B4, B5, B6));
impl_cat!((A0); (B0, B1, B2, B3, B4, B5, B6, B7));
impl_cat!((A0); (B0, B1, B2, B3, B4, B5, B6, B7, B8));
impl_cat!((A0); (B0, B1, B2, B3, B4, B5, B6, B7, B8, B9));
impl_cat!((A0); (B0, B1, B2, B3, B4, B5, B6, B7, B8, B9, B10));
impl_cat!((A0, A1); ());
impl_cat!((A0, A1); (B0));
impl_cat!((A0, A1); (B0, B1));
impl_cat!((A0, A1); (B0, B1, B2));
impl_cat!((A0, A1); (B0, B1, B2, B3));
impl_cat!((A0, A1); (B0, B1, B2, B3, B4));
impl_cat!((A0, A1); (B0, B1, B2, B3, B4, B5));
impl_cat!((A0, A1); (B0, B1, B2, B3, B4, B5, B6));
impl_cat!((A0, A1); (B0, B1, B2, B3, B4, B5, B6, B7));
impl_cat!((A0, A1); (B0, B1, B2, B3, B4, B5, B6, B7, B8));
impl_cat!((A0, A1); (B0, B1, B2, B3, B4, B5, B6, B7, B8, B9));
impl_cat!((A0, A1, A2); ());
impl_cat!((A0, A1, A2); (B0));
impl_cat!((A0, A1, A2); (B0, B1));
impl_cat!((A0, A1, A2); (B0, B1, B2));
impl_cat!((A0, A1, A2); (B0, B1, B2, B3));
impl_cat!((A0, A1, A2); (B0, B1, B2, B3, B4));
impl_cat!((A0, A1, A2); (B0, B1, B2, B3, B4, B5));
impl_cat!((A0, A1, A2); (B0, B1, B2, B3, B4, B5, B6));
impl_cat!((A0, A1, A2); (B0, B1, B2, B3, B4, B5, B6, B7));
impl_cat!((A0, A1, A2); (B0, B1, B2, B3, B4, B5, B6, B7, B8));
impl_cat!((A0, A1, A2, A3); ());
impl_cat!((A0, A1, A2, A3); (B0));
impl_cat!((A0, A1, A2, A3); (B0, B1));
impl_cat!((A0, A1, A2, A3); (B0, B1, B2));
impl_cat!((A0, A1, A2, A3); (B0, B1, B2, B3));
impl_cat!((A0, A1, A2, A3); (B0, B1, B2, B3, B4));
impl_cat!((A0, A1, A2, A3); (B0, B1, B2, B3, B4, B5));
impl_cat!((A0, A1, A2, A3); (B0, B1, B2, B3, B4, B5, B6));
impl_cat!((A0, A1, A2, A3); (B0, B1, B2, B3, B4, B5, B6, B7));
impl_cat!((A0, A1, A2, A3, A4); ());
impl_cat!((A0, A1, A2, A3, A4); (B0));
impl_cat!((A0, A1, A2, A3, A4); (B0, B1));
impl_cat!((A0, A1, A2, A3, A4); (B0, B1, B2));
impl_cat!((A0, A1, A2, A3, A4); (B0, B1, B2, B3));
impl_cat!((A0, A1, A2, A3, A4); (B0, B1, B2, B3, B4));
impl_cat!((A0, A1, A2, A3, A4); (B0, B1, B2, B3, B4, B5));
impl_cat!((A0, A1, A2, A3, A4); (B0, B1, B2, B3, B4, B5, B6));
impl_cat!((A0, A1, A2, A3, A4, A5); ());
impl_cat!((A0, A1, A2, A3, A4, A5); (B0));
impl_cat!((A0, A1, A2, A3, A4, A5); (B0, B1));
impl_cat!((A0, A1, A2, A3, A4, A5); (B0, B1, B2));
impl_cat!((A0, A1, A2, A3, A4, A5); (B0, B1, B2, B3));
impl_cat!((A0, A1, A2, A3, A4, A5); (B0, B1, B2, B3, B4));
impl_cat!((A0, A1, A2, A3, A4, A5); (B0, B1, B2, B3, B4, B5));
impl_cat!((A0, A1, A2, A3, A4, A5, A6); ());
impl_cat!((A0, A1, A2, A3, A4, A5, A6); (B0));
impl_cat!((A0, A1, A2, A3, A4, A5, A6); (B0, B1));
impl_cat!((A0, A1, A2, A3, A4, A5, A6); (B0, B1, B2));
impl_cat!((A0, A1, A2, A3, A4, A5, A6); (B0, B1, B2, B3));
impl_cat!((A0, A1, A2, A3, A4, A5, A6); (B0, B1, B2, B3, B4));
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7); ());
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7); (B0));
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7); (B0, B1));
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7); (B0, B1, B2));
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7); (B0, B1, B2, B3));
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7, A8); ());
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7, A8); (B0));
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7, A8); (B0, B1));
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7, A8); (B0, B1, B2));
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7, A8, A9); ());
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7, A8, A9); (B0));
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7, A8, A9); (B0, B1));
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7, A8, A9, A10); ());
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7, A8, A9, A10); (B0));
impl_cat!((A0, A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11); ());

/// Concatenation of a tuple of payloads, left to right.
///
/// `((1,), (), (2, 3)).flatten()` is `(1, 2, 3)`.
pub trait Flatten {
    /// The flattened payload.
    type Output: Tuple;

    /// Concatenate every element payload in order.
    fn flatten(self) -> Self::Output;
}

impl Flatten for () {
    type Output = ();

    fn flatten(self) -> Self::Output {}
}

impl<A: Tuple> Flatten for (A,) {
    type Output = A;

    fn flatten(self) -> Self::Output {
        self.0
    }
}

impl<A, B> Flatten for (A, B)
where
    A: Cat<B>,
{
    type Output = A::Output;

    fn flatten(self) -> Self::Output {
        self.0.cat(self.1)
    }
}

macro_rules! impl_flatten {
    ($($T:ident),*; $Last:ident) => {
        #[allow(non_snake_case)]
        impl<$($T,)* $Last> Flatten for ($($T,)* $Last,)
        where
            ($($T,)*): Flatten,
            <($($T,)*) as Flatten>::Output: Cat<$Last>,
        {
            type Output = <<($($T,)*) as Flatten>::Output as Cat<$Last>>::Output;

            fn flatten(self) -> Self::Output {
                let ($($T,)* $Last,) = self;
                ($($T,)*).flatten().cat($Last)
            }
        }
    };
}

impl_flatten!(A, B; C);
impl_flatten!(A, B, C; D);
impl_flatten!(A, B, C, D; E);
impl_flatten!(A, B, C, D, E; F);

/// Call a function with a payload spread as its arguments.
///
/// Implemented for every `FnOnce` whose parameter list matches the tuple, so
/// `|a: i32, b: &str| ..` can consume the payload `(i32, &str)`.
pub trait Invoke<Args> {
    /// Return type of the call.
    type Output;

    /// Perform the call.
    fn invoke(self, args: Args) -> Self::Output;
}

macro_rules! impl_invoke {
    ($($T:ident),*) => {
        #[allow(non_snake_case)]
        impl<Func, Ret, $($T),*> Invoke<($($T,)*)> for Func
        where
            Func: FnOnce($($T),*) -> Ret,
        {
            type Output = Ret;

            fn invoke(self, args: ($($T,)*)) -> Ret {
                let ($($T,)*) = args;
                self($($T),*)
            }
        }
    };
}

impl_invoke!();
impl_invoke!(A0);
impl_invoke!(A0, A1);
impl_invoke!(A0, A1, A2);
impl_invoke!(A0, A1, A2, A3);
impl_invoke!(A0, A1, A2, A3, A4);
impl_invoke!(A0, A1, A2, A3, A4, A5);
impl_invoke!(A0, A1, A2, A3, A4, A5, A6);
impl_invoke!(A0, A1, A2, A3, A4, A5, A6, A7);
impl_invoke!(A0, A1, A2, A3, A4, A5, A6, A7, A8);
impl_invoke!(A0, A1, A2, A3, A4, A5, A6, A7, A8, A9);
impl_invoke!(A0, A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);
impl_invoke!(A0, A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11);

/// Test a payload without consuming it, its elements spread as references.
///
/// `|n: &i32, s: &&str| ..` tests the payload `(i32, &str)`.
pub trait Predicate<Args> {
    fn test(self, args: &Args) -> bool;
}

macro_rules! impl_predicate {
    ($($T:ident $idx:tt),*) => {
        impl<Func, $($T),*> Predicate<($($T,)*)> for Func
        where
            Func: FnOnce($(&$T),*) -> bool,
        {
            #[allow(unused_variables)]
            fn test(self, args: &($($T,)*)) -> bool {
                self($(&args.$idx),*)
            }
        }
    };
}

impl_predicate!();
impl_predicate!(A0 0);
impl_predicate!(A0 0, A1 1);
impl_predicate!(A0 0, A1 1, A2 2);
impl_predicate!(A0 0, A1 1, A2 2, A3 3);
impl_predicate!(A0 0, A1 1, A2 2, A3 3, A4 4);
impl_predicate!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
impl_predicate!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6);
impl_predicate!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7);
impl_predicate!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7, A8 8);
impl_predicate!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7, A8 8, A9 9);
impl_predicate!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7, A8 8, A9 9, A10 10);
impl_predicate!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7, A8 8, A9 9, A10 10, A11 11);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_and_descriptors() {
        assert_eq!(<() as Tuple>::ARITY, 0);
        assert_eq!(<(i32, f64) as Tuple>::ARITY, 2);
        assert_eq!(
            <(i32, f64) as Tuple>::descriptors(),
            vec![TypeDesc::of::<i32>(), TypeDesc::of::<f64>()]
        );
    }

    #[test]
    fn test_cat_with_empty_is_identity() {
        assert_eq!(().cat((1, 2)), (1, 2));
        assert_eq!((1, 2).cat(()), (1, 2));
        assert_eq!(().cat(()), ());
    }

    #[test]
    fn test_flatten_preserves_argument_order() {
        assert_eq!(((2,), (3,), ()).flatten(), (2, 3));
        assert_eq!(((1, "a"), (), (true,), (4u8, 5u16)).flatten(), (1, "a", true, 4u8, 5u16));
        assert_eq!(().flatten(), ());
    }

    #[test]
    fn test_invoke_spreads_arguments() {
        let f = |a: i32, b: i32| a * 10 + b;
        assert_eq!(f.invoke((4, 2)), 42);

        let unit = || "called";
        assert_eq!(unit.invoke(()), "called");
    }

    #[test]
    fn test_predicate_borrows_elements() {
        let payload = (String::from("abc"), 3_usize);
        let matches = |s: &String, n: &usize| s.len() == *n;
        assert!(matches.test(&payload));
        assert_eq!(payload.0, "abc");

        let always = || true;
        assert!(always.test(&()));
    }
}
