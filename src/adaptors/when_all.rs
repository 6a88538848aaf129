use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::env::{Env, get_stop_token};
use crate::error::{Error, ProtocolError};
use crate::sender::{OperationState, Receiver, Sender};
use crate::signatures::{CompletionSignatures, Disposition, SignatureError};
use crate::stop::{StopCallback, StopSource, StopToken};
use crate::tuple::{Flatten, Tuple};

const STARTED: u8 = 0;
const ERROR: u8 = 1;
const STOPPED: u8 = 2;

/// Value storage for one child.
pub struct Slot<V>(spin::Mutex<Option<V>>);

impl<V> Slot<V> {
    fn new() -> Self {
        Slot(spin::Mutex::new(None))
    }

    fn put(&self, value: V) {
        *self.0.lock() = Some(value);
    }

    fn take(&self) -> Option<V> {
        self.0.lock().take()
    }
}

/// The value slots of every child, in argument order.
pub trait JoinSlots: Send + Sync + 'static {
    /// Every child's payload concatenated.
    type Output: Tuple;

    fn new() -> Self;

    /// The concatenated payload, or `None` if some child never stored one.
    fn take(&self) -> Option<Self::Output>;
}

/// Starts a tuple of operation states.
pub trait StartAll {
    fn start_all(self);
}

/// State shared by the children of one join.
#[doc(hidden)]
pub struct JoinState<Slots, R> {
    remaining: AtomicUsize,
    outcome: AtomicU8,
    error: spin::Mutex<Option<Error>>,
    stop_source: StopSource,
    outer_token: StopToken,
    on_outer_stop: spin::Mutex<Option<StopCallback>>,
    receiver: spin::Mutex<Option<R>>,
    child_env: Env,
    slots: Slots,
}

impl<Slots, R> JoinState<Slots, R>
where
    Slots: JoinSlots,
    R: Receiver<Slots::Output>,
{
    fn new(count: usize, receiver: R) -> Self {
        let outer_env = receiver.get_env();
        let stop_source = StopSource::new();
        let child_env = Env::new()
            .with_stop_token(stop_source.token())
            .layered(&outer_env);
        JoinState {
            remaining: AtomicUsize::new(count),
            outcome: AtomicU8::new(STARTED),
            error: spin::Mutex::new(None),
            stop_source,
            outer_token: get_stop_token(&outer_env),
            on_outer_stop: spin::Mutex::new(None),
            receiver: spin::Mutex::new(Some(receiver)),
            child_env,
            slots: Slots::new(),
        }
    }

    fn on_error(&self, error: Error) {
        if self.outcome.swap(ERROR, Ordering::AcqRel) != ERROR {
            *self.error.lock() = Some(error);
            tracing::trace!("when_all child failed, requesting stop");
            self.stop_source.request_stop();
        }
        self.arrive();
    }

    fn on_stopped(&self) {
        if self
            .outcome
            .compare_exchange(STARTED, STOPPED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::trace!("when_all child stopped, requesting stop");
            self.stop_source.request_stop();
        }
        self.arrive();
    }

    fn arrive(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.complete();
        }
    }

    fn complete(&self) {
        let on_outer_stop = self.on_outer_stop.lock().take();
        drop(on_outer_stop);
        let Some(receiver) = self.receiver.lock().take() else {
            return;
        };
        let outcome = self.outcome.load(Ordering::Acquire);
        tracing::trace!(outcome, "when_all resolved");
        match outcome {
            ERROR => {
                let error = self.error.lock().take();
                receiver.set_error(error.unwrap_or_else(|| ProtocolError::Abandoned.into()))
            }
            STOPPED => receiver.set_stopped(),
            _ if self.outer_token.stop_requested() => receiver.set_stopped(),
            _ => match self.slots.take() {
                Some(values) => receiver.set_value(values),
                None => receiver.set_error(ProtocolError::Abandoned.into()),
            },
        }
    }
}

/// Receiver handed to one child of a join.
pub struct ChildReceiver<Slots, R, V> {
    state: Arc<JoinState<Slots, R>>,
    slot: fn(&Slots) -> &Slot<V>,
}

impl<Slots, R, V> ChildReceiver<Slots, R, V> {
    fn new(state: &Arc<JoinState<Slots, R>>, slot: fn(&Slots) -> &Slot<V>) -> Self {
        ChildReceiver {
            state: Arc::clone(state),
            slot,
        }
    }
}

impl<Slots, R, V> Receiver<V> for ChildReceiver<Slots, R, V>
where
    Slots: JoinSlots,
    R: Receiver<Slots::Output>,
    V: Send + 'static,
{
    fn set_value(self, value: V) {
        (self.slot)(&self.state.slots).put(value);
        self.state.arrive();
    }

    fn set_error(self, error: Error) {
        self.state.on_error(error)
    }

    fn set_stopped(self) {
        self.state.on_stopped()
    }

    fn get_env(&self) -> Env {
        self.state.child_env.clone()
    }
}

/// A tuple of senders that can be joined.
pub trait SenderTuple: Send + 'static {
    const ARITY: usize;

    /// Flattened value payload of the join.
    type Output: Tuple;

    /// Slot storage for the children's values.
    type Slots: JoinSlots<Output = Self::Output>;

    /// Connected children.
    type Ops<R>: StartAll
    where
        R: Receiver<Self::Output>;

    /// Connect every child to a receiver sharing `state`.
    #[doc(hidden)]
    fn connect_all<R>(self, state: &Arc<JoinState<Self::Slots, R>>) -> Self::Ops<R>
    where
        R: Receiver<Self::Output>;

    /// Signatures of every child, in argument order.
    fn child_signatures(env: Option<&Env>) -> Result<Vec<CompletionSignatures>, SignatureError>;
}

macro_rules! impl_join {
    ($n:expr; $($S:ident $O:ident $idx:tt),*) => {
        impl<$($S: Send + 'static),*> JoinSlots for ($(Slot<$S>,)*)
        where
            ($($S,)*): Flatten,
        {
            type Output = <($($S,)*) as Flatten>::Output;

            fn new() -> Self {
                ($(Slot::<$S>::new(),)*)
            }

            fn take(&self) -> Option<Self::Output> {
                Some(($(self.$idx.take()?,)*).flatten())
            }
        }

        #[allow(non_snake_case)]
        impl<$($O: OperationState),*> StartAll for ($($O,)*) {
            fn start_all(self) {
                let ($($O,)*) = self;
                $($O.start();)*
            }
        }

        impl<$($S),*> SenderTuple for ($($S,)*)
        where
            $($S: Sender + Send + 'static,)*
            ($($S::Value,)*): Flatten,
        {
            const ARITY: usize = $n;

            type Slots = ($(Slot<$S::Value>,)*);

            type Output = <($($S::Value,)*) as Flatten>::Output;

            type Ops<R> = ($($S::Operation<ChildReceiver<Self::Slots, R, $S::Value>>,)*)
            where
                R: Receiver<Self::Output>;

            #[allow(non_snake_case, unused_variables)]
            fn connect_all<R>(self, state: &Arc<JoinState<Self::Slots, R>>) -> Self::Ops<R>
            where
                R: Receiver<Self::Output>,
            {
                let ($($S,)*) = self;
                ($($S.connect(ChildReceiver::new(state, |slots| &slots.$idx)),)*)
            }

            #[allow(unused_variables)]
            fn child_signatures(env: Option<&Env>) -> Result<Vec<CompletionSignatures>, SignatureError> {
                Ok(vec![$($S::completion_signatures(env)?),*])
            }
        }
    };
}

impl_join!(0;);
impl_join!(1; S0 O0 0);
impl_join!(2; S0 O0 0, S1 O1 1);
impl_join!(3; S0 O0 0, S1 O1 1, S2 O2 2);
impl_join!(4; S0 O0 0, S1 O1 1, S2 O2 2, S3 O3 3);
impl_join!(5; S0 O0 0, S1 O1 1, S2 O2 2, S3 O3 3, S4 O4 4);
impl_join!(6; S0 O0 0, S1 O1 1, S2 O2 2, S3 O3 3, S4 O4 4, S5 O5 5);

/// Runs every child concurrently and completes once all of them have.
///
/// The value payload is the concatenation of the children's payloads in
/// argument order. The first error wins and beats any stop; otherwise one
/// stopped child, or a stop request from outside, makes the join stopped.
/// Children observe a stop token that is triggered by the first error or
/// stop so they can wind down early.
///
/// ```rust
/// use senders::prelude::*;
///
/// let joined = when_all((just((2,)), just((3,)), just(())));
/// assert_eq!(joined.sync_wait().unwrap(), Some((2, 3)));
/// ```
#[derive(Debug, Clone)]
pub struct WhenAll<T> {
    children: T,
}

pub fn when_all<T: SenderTuple>(children: T) -> WhenAll<T> {
    WhenAll { children }
}

pub struct WhenAllOp<T: SenderTuple, R>
where
    R: Receiver<T::Output>,
{
    children: T::Ops<R>,
    state: Arc<JoinState<T::Slots, R>>,
}

impl<T: SenderTuple> Sender for WhenAll<T> {
    type Value = T::Output;
    type Operation<R> = WhenAllOp<T, R>
    where
        R: Receiver<Self::Value>;

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Self::Value>,
    {
        let state = Arc::new(JoinState::new(T::ARITY, receiver));
        WhenAllOp {
            children: self.children.connect_all(&state),
            state,
        }
    }

    fn completion_signatures(env: Option<&Env>) -> Result<CompletionSignatures, SignatureError> {
        let children = T::child_signatures(env)?;
        if children.is_empty() {
            return Ok(CompletionSignatures::value_of::<()>());
        }
        let mut sigs = CompletionSignatures::stopped();
        if children.iter().all(|sigs| sigs.count(Disposition::Value) > 0) {
            sigs = sigs.concat(&CompletionSignatures::value_of::<T::Output>());
        }
        for child in &children {
            for error in child.select(Disposition::Error) {
                sigs.insert(error.clone());
            }
        }
        Ok(sigs)
    }
}

impl<T: SenderTuple, R> OperationState for WhenAllOp<T, R>
where
    R: Receiver<T::Output>,
{
    fn start(self) {
        let state = self.state;
        if T::ARITY == 0 {
            let receiver = state.receiver.lock().take();
            if let (Some(receiver), Some(values)) = (receiver, state.slots.take()) {
                receiver.set_value(values);
            }
            return;
        }
        if state.outer_token.stop_requested() {
            let receiver = state.receiver.lock().take();
            if let Some(receiver) = receiver {
                receiver.set_stopped();
            }
            return;
        }
        let source = state.stop_source.clone();
        *state.on_outer_stop.lock() = Some(StopCallback::new(&state.outer_token, move || {
            source.request_stop();
        }));
        self.children.start_all();
    }
}
