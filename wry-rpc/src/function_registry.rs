//! Registry of host functions exposed to script under a global name.
//!
//! The registry is shared between the thread that binds functions and the UI
//! thread that dispatches calls, so it sits behind a read/write lock. The lock
//! is never held while a handler runs; a handler may bind or unbind other
//! functions without deadlocking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{BindError, CallError};
use crate::function::{Handler, IntoHandler, ReturnShape, Signature};

/// A validated handler stored under its script name.
#[derive(Clone)]
pub struct Binding {
    name: String,
    handler: Arc<dyn Handler>,
    signature: Signature,
    shape: ReturnShape,
}

impl Binding {
    fn new(name: String, handler: Arc<dyn Handler>) -> Result<Self, BindError> {
        let signature = handler.signature();
        let shape = signature.shape()?;
        Ok(Self {
            name,
            handler,
            signature,
            shape,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn shape(&self) -> ReturnShape {
        self.shape
    }

    /// Check the argument count, then run the handler.
    pub fn call(&self, params: Vec<Value>) -> Result<Value, CallError> {
        self.signature.arity.check(params.len())?;
        let value = self.handler.call(params)?;
        Ok(match self.shape {
            ReturnShape::None | ReturnShape::Error => Value::Null,
            ReturnShape::Value | ReturnShape::ValueError => value,
        })
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Map from script name to [`Binding`].
#[derive(Default)]
pub struct BindingRegistry {
    bindings: RwLock<HashMap<String, Binding>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a closure. Rebinding a name replaces the previous handler.
    pub fn bind<Args>(
        &self,
        name: impl Into<String>,
        handler: impl IntoHandler<Args>,
    ) -> Result<(), BindError> {
        self.bind_handler(name, handler.into_handler())
    }

    /// Validate and register an already boxed handler.
    ///
    /// Nothing is stored when validation fails.
    pub fn bind_handler(
        &self,
        name: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Result<(), BindError> {
        let name = name.into();
        let binding = Binding::new(name.clone(), handler)?;
        tracing::debug!(
            name = %name,
            arity = ?binding.signature.arity,
            shape = ?binding.shape,
            "binding host function"
        );
        let replaced = self.bindings.write().insert(name, binding);
        if let Some(previous) = replaced {
            tracing::debug!(name = %previous.name, "replaced existing binding");
        }
        Ok(())
    }

    /// Put back a binding taken out with [`BindingRegistry::lookup`].
    pub fn restore(&self, binding: Binding) {
        tracing::debug!(name = %binding.name, "restoring binding");
        self.bindings.write().insert(binding.name.clone(), binding);
    }

    /// Look up a binding. The returned clone shares the handler.
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.bindings.read().get(name).cloned()
    }

    /// Remove a binding, returning whether it existed.
    pub fn unbind(&self, name: &str) -> bool {
        let removed = self.bindings.write().remove(name).is_some();
        if removed {
            tracing::debug!(name, "removed binding");
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.read().contains_key(name)
    }

    /// All bound names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("names", &self.names())
            .finish()
    }
}
