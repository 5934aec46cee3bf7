//! Host functions that script can call, and the adapters that turn ordinary
//! Rust closures into them.
//!
//! Any `Fn` closure whose arguments implement `DeserializeOwned` and whose
//! return type implements [`IntoReturn`] is a handler. A closure whose last
//! parameter is [`Variadic`] accepts any number of trailing arguments.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::encode::{IntoReturn, ReturnSlot, Variadic, VariadicArgs, decode_param};
use crate::error::{BindError, CallError};

/// Number of parameters a handler declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments.
    Fixed(usize),
    /// This many declared parameters, the last of which collects any number
    /// of arguments. A call must carry at least `n - 1` arguments.
    Variadic(usize),
}

impl Arity {
    /// Number of declared parameters, counting a variadic tail as one.
    pub fn declared(&self) -> usize {
        match *self {
            Arity::Fixed(n) | Arity::Variadic(n) => n,
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, Arity::Variadic(_))
    }

    /// Check a call with `got` arguments against this arity.
    pub fn check(&self, got: usize) -> Result<(), CallError> {
        let accepted = match *self {
            Arity::Fixed(n) => got == n,
            Arity::Variadic(n) => got >= n.saturating_sub(1),
        };
        if accepted {
            Ok(())
        } else {
            Err(CallError::ArgumentCountMismatch {
                expected: self.declared(),
                got,
                variadic: self.is_variadic(),
            })
        }
    }
}

/// How the result of a call is reported back to script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// Nothing is returned; the promise resolves with `null`.
    None,
    /// A single value.
    Value,
    /// Only an error; resolves with `null` on success.
    Error,
    /// A value and an error.
    ValueError,
}

/// Declared shape of a handler, inspected once when it is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub arity: Arity,
    pub returns: Vec<ReturnSlot>,
}

impl Signature {
    pub fn new(arity: Arity, returns: impl Into<Vec<ReturnSlot>>) -> Self {
        Self {
            arity,
            returns: returns.into(),
        }
    }

    /// Validate the signature and classify its result slots.
    pub fn shape(&self) -> Result<ReturnShape, BindError> {
        if self.arity == Arity::Variadic(0) {
            return Err(BindError::InvalidHandler(
                "a variadic handler needs a trailing variadic parameter".to_string(),
            ));
        }
        match self.returns.as_slice() {
            [] => Ok(ReturnShape::None),
            [ReturnSlot::Value] => Ok(ReturnShape::Value),
            [ReturnSlot::Error] => Ok(ReturnShape::Error),
            [ReturnSlot::Value, ReturnSlot::Error] => Ok(ReturnShape::ValueError),
            [ReturnSlot::Error, _] => Err(BindError::InvalidHandler(
                "first return value must be a value".to_string(),
            )),
            [_, _] => Err(BindError::InvalidHandler(
                "second return value must be an error".to_string(),
            )),
            slots => Err(BindError::TooManyReturns(slots.len())),
        }
    }
}

/// A host function callable from script.
///
/// Most code never implements this directly; closures are converted with
/// [`IntoHandler`]. Implement it by hand for handlers whose shape is only
/// known at runtime.
pub trait Handler: Send + Sync + 'static {
    fn signature(&self) -> Signature;

    /// Invoke the handler. `params` has already been checked against the arity
    /// reported by [`Handler::signature`].
    fn call(&self, params: Vec<Value>) -> Result<Value, CallError>;
}

/// Conversion into a shareable [`Handler`].
///
/// `Args` only exists to keep the closure impls for different arities apart.
pub trait IntoHandler<Args> {
    fn into_handler(self) -> Arc<dyn Handler>;
}

/// Adapter that stores a closure together with the argument list it was selected for.
pub struct FnHandler<F, Args> {
    f: F,
    phantom: PhantomData<fn() -> Args>,
}

impl<F, Args> FnHandler<F, Args> {
    fn new(f: F) -> Self {
        Self {
            f,
            phantom: PhantomData,
        }
    }
}

macro_rules! impl_fixed_handler {
    ($count:literal; $($arg:ident => $index:tt),*) => {
        impl<F, R, $($arg,)*> Handler for FnHandler<F, ($($arg,)*)>
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: IntoReturn + 'static,
            $($arg: DeserializeOwned + 'static,)*
        {
            fn signature(&self) -> Signature {
                Signature::new(Arity::Fixed($count), R::SLOTS)
            }

            #[allow(non_snake_case)]
            fn call(&self, params: Vec<Value>) -> Result<Value, CallError> {
                let got = params.len();
                let [$($arg),*]: [Value; $count] =
                    params.try_into().map_err(|_| CallError::ArgumentCountMismatch {
                        expected: $count,
                        got,
                        variadic: false,
                    })?;
                $(let $arg: $arg = decode_param($index, $arg)?;)*
                (self.f)($($arg),*).into_outcome()
            }
        }

        impl<F, R, $($arg,)*> IntoHandler<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: IntoReturn + 'static,
            $($arg: DeserializeOwned + 'static,)*
        {
            fn into_handler(self) -> Arc<dyn Handler> {
                Arc::new(FnHandler::<F, ($($arg,)*)>::new(self))
            }
        }
    };
}

impl_fixed_handler!(0;);
impl_fixed_handler!(1; A1 => 0);
impl_fixed_handler!(2; A1 => 0, A2 => 1);
impl_fixed_handler!(3; A1 => 0, A2 => 1, A3 => 2);
impl_fixed_handler!(4; A1 => 0, A2 => 1, A3 => 2, A4 => 3);
impl_fixed_handler!(5; A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4);
impl_fixed_handler!(6; A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4, A6 => 5);
impl_fixed_handler!(7; A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4, A6 => 5, A7 => 6);
impl_fixed_handler!(8; A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4, A6 => 5, A7 => 6, A8 => 7);

macro_rules! impl_variadic_handler {
    ($count:literal; $($arg:ident => $index:tt),*) => {
        impl<F, R, V, $($arg,)*> Handler for FnHandler<F, VariadicArgs<($($arg,)*), V>>
        where
            F: Fn($($arg,)* Variadic<V>) -> R + Send + Sync + 'static,
            R: IntoReturn + 'static,
            V: DeserializeOwned + 'static,
            $($arg: DeserializeOwned + 'static,)*
        {
            fn signature(&self) -> Signature {
                Signature::new(Arity::Variadic($count + 1), R::SLOTS)
            }

            #[allow(non_snake_case, unused_comparisons)]
            fn call(&self, mut params: Vec<Value>) -> Result<Value, CallError> {
                let got = params.len();
                let mismatch = || CallError::ArgumentCountMismatch {
                    expected: $count + 1,
                    got,
                    variadic: true,
                };
                if got < $count {
                    return Err(mismatch());
                }
                let rest = params.split_off($count);
                let [$($arg),*]: [Value; $count] = params.try_into().map_err(|_| mismatch())?;
                $(let $arg: $arg = decode_param($index, $arg)?;)*
                let rest = rest
                    .into_iter()
                    .enumerate()
                    .map(|(offset, value)| decode_param($count + offset, value))
                    .collect::<Result<Vec<V>, _>>()?;
                (self.f)($($arg,)* Variadic(rest)).into_outcome()
            }
        }

        impl<F, R, V, $($arg,)*> IntoHandler<VariadicArgs<($($arg,)*), V>> for F
        where
            F: Fn($($arg,)* Variadic<V>) -> R + Send + Sync + 'static,
            R: IntoReturn + 'static,
            V: DeserializeOwned + 'static,
            $($arg: DeserializeOwned + 'static,)*
        {
            fn into_handler(self) -> Arc<dyn Handler> {
                Arc::new(FnHandler::<F, VariadicArgs<($($arg,)*), V>>::new(self))
            }
        }
    };
}

impl_variadic_handler!(0;);
impl_variadic_handler!(1; A1 => 0);
impl_variadic_handler!(2; A1 => 0, A2 => 1);
impl_variadic_handler!(3; A1 => 0, A2 => 1, A3 => 2);
impl_variadic_handler!(4; A1 => 0, A2 => 1, A3 => 2, A4 => 3);
impl_variadic_handler!(5; A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4);
impl_variadic_handler!(6; A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4, A6 => 5);
impl_variadic_handler!(7; A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4, A6 => 5, A7 => 6);
