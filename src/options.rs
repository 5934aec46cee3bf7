//! Window and webview configuration.

use std::path::PathBuf;

use raw_window_handle::RawWindowHandle;
use serde::Deserialize;
use wry_rpc::Hint;

/// Settings used when creating a [`TaoView`](crate::TaoView).
///
/// Hosts can build this in code or read it from JSON; missing fields keep
/// their defaults.
///
/// ```ignore
/// let options = WebViewOptions::new()
///     .title("Settings")
///     .size(640, 480)
///     .debug(true);
/// let webview = wry_webview::new_with_options(options)?;
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebViewOptions {
    /// Enables developer tools and opens the inspector when the loop starts.
    pub debug: bool,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub hint: Hint,
    pub visible: bool,
    /// Center the window on its monitor once created.
    pub center: bool,
    pub autofocus: bool,
    /// Allow script to read and write the system clipboard.
    pub clipboard: bool,
    /// Where the browser engine keeps its profile. Engine default when unset.
    pub data_directory: Option<PathBuf>,
    /// Embed the webview as a child of this native window instead of
    /// creating a top level window.
    #[serde(skip)]
    pub parent: Option<RawWindowHandle>,
}

impl Default for WebViewOptions {
    fn default() -> Self {
        Self {
            debug: false,
            title: "wry-webview".to_string(),
            width: 800,
            height: 600,
            hint: Hint::None,
            visible: true,
            center: false,
            autofocus: true,
            clipboard: true,
            data_directory: None,
            parent: None,
        }
    }
}

impl WebViewOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Initial inner size in logical pixels.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn hint(mut self, hint: Hint) -> Self {
        self.hint = hint;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    pub fn autofocus(mut self, autofocus: bool) -> Self {
        self.autofocus = autofocus;
        self
    }

    pub fn clipboard(mut self, clipboard: bool) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn data_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_directory = Some(path.into());
        self
    }

    /// # Safety
    ///
    /// `handle` must stay a valid window for the whole life of the webview.
    pub unsafe fn parent(mut self, handle: RawWindowHandle) -> Self {
        self.parent = Some(handle);
        self
    }

    /// Parse options from JSON, filling in defaults for missing fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
