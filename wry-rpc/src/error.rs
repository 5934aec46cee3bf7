//! Error types for binding registration, call dispatch and the facade.

use thiserror::Error;

/// Returned synchronously by `bind` when a handler cannot be registered.
///
/// A failed bind never touches the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The handler cannot be invoked through the RPC protocol.
    #[error("handler is not invocable: {0}")]
    InvalidHandler(String),
    /// The handler declares more result slots than a value and an error.
    #[error("function may only return a value or a value+error, found {0} return values")]
    TooManyReturns(usize),
}

/// Failure of a single call. Every variant ends up as a rejected promise in
/// script; none of them propagate to the host application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("function arguments mismatch: expected {}, got {got}", expected_count(.expected, .variadic))]
    ArgumentCountMismatch {
        expected: usize,
        got: usize,
        variadic: bool,
    },
    #[error("failed to unmarshal argument {index}: {message}")]
    ArgumentDecodeError { index: usize, message: String },
    /// The handler itself reported failure. The message is passed to `reject` as is.
    #[error("{0}")]
    HandlerError(String),
    #[error("failed to marshal result: {0}")]
    ResultEncode(String),
    #[error("handler panicked: {0}")]
    HandlerPanicked(String),
}

fn expected_count(expected: &usize, variadic: &bool) -> String {
    if *variadic {
        format!("at least {}", expected.saturating_sub(1))
    } else {
        expected.to_string()
    }
}

/// Errors returned by the [`WebView`](crate::WebView) facade and its [`Handle`](crate::Handle).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Bind(#[from] BindError),
    /// The instance was terminated; the platform view must not be touched again.
    #[error("the webview has been terminated")]
    Terminated,
    /// The UI thread is gone and can no longer receive events.
    #[error("the webview event loop is no longer running")]
    Disconnected,
    #[error("platform error: {0}")]
    Platform(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}
