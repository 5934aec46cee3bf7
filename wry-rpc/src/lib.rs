//! wry-rpc - Promise based calls from webview script into host Rust functions
//!
//! This crate holds everything that does not depend on a particular windowing
//! stack: the binding registry, the JSON call protocol and the webview facade.
//! A native backend plugs in by implementing [`PlatformView`].
//!
//! # Architecture
//!
//! - [`function`] - Handler trait and the adapters for typed closures
//! - [`function_registry`] - Registry of bound host functions
//! - [`encode`] - Conversions between JSON and Rust values
//! - [`ipc`] - Wire format and injected scripts
//! - [`channel`] - Dispatches script messages to the registry
//! - [`platform`] - The backend capability trait and window sizing
//! - [`runtime`] - Events delivered to the UI thread
//! - [`webview`] - The facade and its thread safe handle
//!
//! # Example
//!
//! ```ignore
//! let mut webview = WebView::new(platform)?;
//! webview.bind("add", |a: i64, b: i64| a + b)?;
//! webview.set_html("<script>add(2, 3).then(console.log)</script>")?;
//! webview.run()?;
//! ```

pub mod channel;
pub mod encode;
mod error;
pub mod function;
pub mod function_registry;
pub mod ipc;
pub mod platform;
pub mod runtime;
pub mod webview;

#[cfg(test)]
mod mock;

pub use channel::RpcChannel;
pub use encode::{IntoReturn, IntoValue, Json, Variadic};
pub use error::{BindError, CallError, Error};
pub use function::{Arity, Handler, IntoHandler, ReturnShape, Signature};
pub use function_registry::{Binding, BindingRegistry};
pub use ipc::{RpcOutcome, RpcRequest, Status};
pub use platform::{Geometry, Hint, PlatformView, Size};
pub use runtime::{Command, EventProxy, Task, UiEvent};
pub use webview::{Handle, State, WebView};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::encode::{Json, Variadic};
    pub use crate::error::{BindError, CallError, Error};
    pub use crate::platform::Hint;
    pub use crate::webview::{Handle, WebView};
}
