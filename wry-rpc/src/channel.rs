//! Turns raw script messages into calls on the registry and calls into
//! settling scripts.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

use crate::error::CallError;
use crate::function_registry::BindingRegistry;
use crate::ipc::{RpcOutcome, RpcRequest};
use crate::runtime::panic_message;

#[derive(Debug, Clone)]
pub struct RpcChannel {
    registry: Arc<BindingRegistry>,
}

impl RpcChannel {
    pub fn new(registry: Arc<BindingRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    /// Handle one message from script and hand the settling script to `eval`.
    ///
    /// Malformed messages are logged and dropped; no script is evaluated for them.
    pub fn handle_incoming(&self, raw: &str, mut eval: impl FnMut(&str)) -> Option<RpcOutcome> {
        let request = match RpcRequest::decode(raw) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(%err, raw, "dropping malformed rpc message");
                return None;
            }
        };
        let outcome = self.call(request);
        eval(&outcome.to_script());
        Some(outcome)
    }

    /// Run a decoded request to completion.
    pub fn call(&self, request: RpcRequest) -> RpcOutcome {
        let RpcRequest { id, method, params } = request;

        let Some(binding) = self.registry.lookup(&method) else {
            tracing::debug!(id, method = %method, "call to unbound method resolves with null");
            return RpcOutcome::resolved(id, &Value::Null);
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| binding.call(params)))
            .unwrap_or_else(|payload| {
                Err(CallError::HandlerPanicked(panic_message(&*payload)))
            });

        match &result {
            Ok(_) => tracing::trace!(id, method = %method, "call resolved"),
            Err(err) => tracing::debug!(id, method = %method, %err, "call rejected"),
        }
        RpcOutcome::from_result(id, result)
    }
}
