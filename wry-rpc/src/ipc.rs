//! Wire format between script and host.
//!
//! Script posts one JSON request per call:
//!
//! ```text
//! {"id": 1, "method": "add", "params": [2, 3]}
//! ```
//!
//! The host answers by evaluating a script that settles and forgets the
//! pending promise:
//!
//! ```text
//! window._rpc[1].resolve(5); delete window._rpc[1];
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CallError;

const BINDING_JS: &str = include_str!("js/binding.js");

/// A call from script into a bound host function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: i64,
    pub method: String,
    /// A missing or `null` list means no arguments.
    #[serde(default, deserialize_with = "params_or_empty")]
    pub params: Vec<Value>,
}

fn params_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl RpcRequest {
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Resolved,
    Rejected,
}

impl Status {
    fn settle_fn(self) -> &'static str {
        match self {
            Status::Resolved => "resolve",
            Status::Rejected => "reject",
        }
    }
}

/// Result of one call, ready to be delivered to script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcOutcome {
    pub id: i64,
    pub status: Status,
    /// Encoded JSON passed to `resolve` or `reject`.
    pub payload: String,
}

impl RpcOutcome {
    pub fn resolved(id: i64, value: &Value) -> Self {
        Self {
            id,
            status: Status::Resolved,
            payload: value.to_string(),
        }
    }

    /// Rejections always carry the message as a JSON string.
    pub fn rejected(id: i64, message: &str) -> Self {
        Self {
            id,
            status: Status::Rejected,
            payload: Value::String(message.to_string()).to_string(),
        }
    }

    pub fn from_result(id: i64, result: Result<Value, CallError>) -> Self {
        match result {
            Ok(value) => Self::resolved(id, &value),
            Err(err) => Self::rejected(id, &err.to_string()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == Status::Resolved
    }

    /// The script that settles the promise and removes its table entry.
    pub fn to_script(&self) -> String {
        format!(
            "window._rpc[{id}].{settle}({payload}); delete window._rpc[{id}];",
            id = self.id,
            settle = self.status.settle_fn(),
            payload = self.payload,
        )
    }
}

/// Install `window.external.invoke`, forwarding every message to `hook`.
pub fn external_invoke_script(hook: &str) -> String {
    format!("window.external = {{ invoke: function(s) {{ {hook}(s); }} }};")
}

/// Shim that exposes `window[name]` as a promise returning function.
pub fn binding_script(name: &str) -> String {
    BINDING_JS.replace("__NAME__", &js_string(name))
}

/// Remove `window[name]` again.
pub fn unbind_script(name: &str) -> String {
    format!("delete window[{}];", js_string(name))
}

fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}
