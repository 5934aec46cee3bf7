//! wry-webview - A native webview window whose script can call into Rust
//!
//! This crate puts the [`wry_rpc`] facade on top of tao and wry. Host
//! functions bound with [`wry_rpc::WebView::bind`] appear in the page as
//! `window[name]` and return promises settled with the host's result.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> Result<(), wry_webview::Error> {
//!     let mut webview = wry_webview::new(true)?;
//!     webview.set_title("Demo")?;
//!     webview.bind("add", |a: i64, b: i64| a + b)?;
//!     webview.set_html("<script>add(2, 3).then(alert)</script>")?;
//!     webview.run()?;
//!     Ok(())
//! }
//! ```

use tracing_subscriber::EnvFilter;

mod home;
mod options;
mod shims;
mod webview;

pub use options::WebViewOptions;
pub use webview::TaoView;

// Re-export the facade and the types apps need alongside it
pub use wry_rpc::{BindError, BindingRegistry, CallError, Handle, Hint, Json, State, Variadic};

// Re-export tao and wry for direct access to the native window
pub use tao;
pub use wry;

/// The facade driven by the tao and wry backend.
pub type WebView = wry_rpc::WebView<TaoView>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create window: {0}")]
    Os(#[from] tao::error::OsError),
    #[error("webview error: {0}")]
    WebView(#[from] wry::Error),
    #[error(transparent)]
    Rpc(#[from] wry_rpc::Error),
    /// Only one native webview can be live in a process at a time.
    #[error("another webview is already running in this process")]
    AlreadyRunning,
    #[error("the event loop has already run")]
    LoopExited,
}

/// Create a webview with default options and the given debug flag.
pub fn new(debug: bool) -> Result<WebView, Error> {
    new_with_options(WebViewOptions::new().debug(debug))
}

/// Create a webview window from `options`.
pub fn new_with_options(options: WebViewOptions) -> Result<WebView, Error> {
    let view = TaoView::new(options)?;
    Ok(wry_rpc::WebView::new(view)?)
}

/// Like [`new_with_options`], sharing a registry that may already hold bindings.
pub fn new_with_registry(
    options: WebViewOptions,
    registry: std::sync::Arc<BindingRegistry>,
) -> Result<WebView, Error> {
    let view = TaoView::new(options)?;
    Ok(wry_rpc::WebView::with_registry(view, registry)?)
}

/// Install a `tracing` subscriber filtered by `RUST_LOG`, defaulting to info
/// for this crate and [`wry_rpc`].
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wry_webview=info,wry_rpc=info"));
    _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
