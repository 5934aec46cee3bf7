//! Conversions between JSON call parameters/results and Rust types.
//!
//! Parameters are decoded with serde: any `DeserializeOwned` type can be a
//! handler argument. Results go through [`IntoReturn`], which also tells the
//! registry which result slots a handler declares:
//!
//! | handler returns      | slots           | outcome                                  |
//! |----------------------|-----------------|------------------------------------------|
//! | `()`                 | none            | resolves with `null`                     |
//! | `T: IntoValue`       | value           | resolves with `T`                        |
//! | `Result<T, E>`       | value + error   | resolves with `T` or rejects with `E`    |
//! | `Result<(), E>`      | error           | resolves with `null` or rejects with `E` |

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CallError;

/// One result slot declared by a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnSlot {
    Value,
    Error,
}

/// Trait for values that can be sent back to script as a resolved payload.
pub trait IntoValue {
    fn into_value(self) -> Result<Value, CallError>;
}

/// Trait for everything a bound closure may return.
///
/// `SLOTS` is inspected once at bind time; `into_outcome` runs after every call.
pub trait IntoReturn {
    const SLOTS: &'static [ReturnSlot];

    fn into_outcome(self) -> Result<Value, CallError>;
}

fn serialize<T: Serialize>(value: T) -> Result<Value, CallError> {
    serde_json::to_value(value).map_err(|err| CallError::ResultEncode(err.to_string()))
}

impl IntoReturn for () {
    const SLOTS: &'static [ReturnSlot] = &[];

    fn into_outcome(self) -> Result<Value, CallError> {
        Ok(Value::Null)
    }
}

impl<T: IntoValue, E: Display> IntoReturn for Result<T, E> {
    const SLOTS: &'static [ReturnSlot] = &[ReturnSlot::Value, ReturnSlot::Error];

    fn into_outcome(self) -> Result<Value, CallError> {
        match self {
            Ok(value) => value.into_value(),
            Err(err) => Err(CallError::HandlerError(err.to_string())),
        }
    }
}

impl<E: Display> IntoReturn for Result<(), E> {
    const SLOTS: &'static [ReturnSlot] = &[ReturnSlot::Error];

    fn into_outcome(self) -> Result<Value, CallError> {
        match self {
            Ok(()) => Ok(Value::Null),
            Err(err) => Err(CallError::HandlerError(err.to_string())),
        }
    }
}

/// Implement IntoValue and the single value slot IntoReturn for plain serializable types.
macro_rules! impl_value {
    ($($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Result<Value, CallError> {
                    serialize(self)
                }
            }

            impl IntoReturn for $ty {
                const SLOTS: &'static [ReturnSlot] = &[ReturnSlot::Value];

                fn into_outcome(self) -> Result<Value, CallError> {
                    self.into_value()
                }
            }
        )*
    };
}

impl_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, &'static str, Value
);

/// Implement the single value slot IntoReturn for generic containers.
macro_rules! impl_value_return {
    ($($ty:ident<$($param:ident),*>),*) => {
        $(
            impl<$($param: IntoValue),*> IntoReturn for $ty<$($param),*> {
                const SLOTS: &'static [ReturnSlot] = &[ReturnSlot::Value];

                fn into_outcome(self) -> Result<Value, CallError> {
                    self.into_value()
                }
            }
        )*
    };
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Result<Value, CallError> {
        match self {
            Some(value) => value.into_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Result<Value, CallError> {
        self.into_iter()
            .map(IntoValue::into_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

impl<T: IntoValue> IntoValue for HashMap<String, T> {
    fn into_value(self) -> Result<Value, CallError> {
        self.into_iter()
            .map(|(key, value)| Ok((key, value.into_value()?)))
            .collect::<Result<serde_json::Map<_, _>, _>>()
            .map(Value::Object)
    }
}

impl<T: IntoValue> IntoValue for BTreeMap<String, T> {
    fn into_value(self) -> Result<Value, CallError> {
        self.into_iter()
            .map(|(key, value)| Ok((key, value.into_value()?)))
            .collect::<Result<serde_json::Map<_, _>, _>>()
            .map(Value::Object)
    }
}

impl_value_return!(Option<T>, Vec<T>);

impl<T: IntoValue> IntoReturn for HashMap<String, T> {
    const SLOTS: &'static [ReturnSlot] = &[ReturnSlot::Value];

    fn into_outcome(self) -> Result<Value, CallError> {
        self.into_value()
    }
}

impl<T: IntoValue> IntoReturn for BTreeMap<String, T> {
    const SLOTS: &'static [ReturnSlot] = &[ReturnSlot::Value];

    fn into_outcome(self) -> Result<Value, CallError> {
        self.into_value()
    }
}

/// Wrapper that returns any `Serialize` type to script.
///
/// ```ignore
/// #[derive(Serialize)]
/// struct Point { x: f64, y: f64 }
///
/// registry.bind("origin", || Json(Point { x: 0.0, y: 0.0 }))?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoValue for Json<T> {
    fn into_value(self) -> Result<Value, CallError> {
        serialize(self.0)
    }
}

impl<T: Serialize> IntoReturn for Json<T> {
    const SLOTS: &'static [ReturnSlot] = &[ReturnSlot::Value];

    fn into_outcome(self) -> Result<Value, CallError> {
        self.into_value()
    }
}

/// Trailing parameter that collects every remaining argument of a call.
///
/// A handler `Fn(String, Variadic<i64>)` accepts one or more arguments; every
/// argument after the first is decoded as an `i64`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Variadic<T>(pub Vec<T>);

impl<T> Variadic<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Deref for Variadic<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Variadic<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> IntoIterator for Variadic<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Marker for the argument list of a handler whose last parameter is [`Variadic`].
///
/// Only used to select the right adapter when binding a closure.
pub struct VariadicArgs<Head, Tail> {
    phantom: PhantomData<fn() -> (Head, Tail)>,
}

/// Decode the parameter at `index` into its declared type.
pub(crate) fn decode_param<T: DeserializeOwned>(index: usize, value: Value) -> Result<T, CallError> {
    serde_json::from_value(value).map_err(|err| CallError::ArgumentDecodeError {
        index,
        message: err.to_string(),
    })
}
