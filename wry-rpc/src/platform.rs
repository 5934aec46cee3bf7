//! The capability a native backend provides to the facade.

use serde::{Deserialize, Serialize};

use crate::runtime::{EventProxy, UiEvent};

/// How a `set_size` call constrains the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hint {
    /// Width and height are the current size. The user may resize freely.
    #[default]
    None,
    /// Width and height can't be changed by the user.
    Fixed,
    /// Width and height are the minimum bounds.
    Min,
    /// Width and height are the maximum bounds.
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Complete window geometry derived from one `set_size` call.
///
/// Every field is applied on each call, so a previous hint never leaks into
/// the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub resizable: bool,
    /// New inner size, when it should change.
    pub size: Option<Size>,
    pub min: Option<Size>,
    pub max: Option<Size>,
}

impl Geometry {
    pub fn from_hint(width: u32, height: u32, hint: Hint) -> Self {
        let size = Size::new(width, height);
        match hint {
            Hint::None => Self {
                resizable: true,
                size: Some(size),
                min: None,
                max: None,
            },
            Hint::Fixed => Self {
                resizable: false,
                size: Some(size),
                min: Some(size),
                max: Some(size),
            },
            Hint::Min => Self {
                resizable: true,
                size: None,
                min: Some(size),
                max: None,
            },
            Hint::Max => Self {
                resizable: true,
                size: None,
                min: None,
                max: Some(size),
            },
        }
    }
}

/// A native window hosting a browser surface, driven from a single UI thread.
///
/// Implementations own every native resource. The facade guarantees it never
/// calls into a view after [`PlatformView::terminate`] once `run` has returned.
pub trait PlatformView {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Script expression that posts a string to the host, e.g. `window.ipc.postMessage`.
    fn message_hook(&self) -> &'static str;

    /// Proxy that queues events for [`PlatformView::run`], usable from any thread.
    fn proxy(&self) -> EventProxy;

    /// Run the event loop on the current thread until [`PlatformView::terminate`]
    /// is called, handing every [`UiEvent`] to `on_event` in arrival order.
    fn run(&mut self, on_event: &mut dyn FnMut(&mut Self, UiEvent)) -> Result<(), Self::Error>;

    /// Ask the loop to exit after the current event.
    fn terminate(&mut self);

    fn set_title(&mut self, title: &str) -> Result<(), Self::Error>;

    fn set_geometry(&mut self, geometry: Geometry) -> Result<(), Self::Error>;

    fn navigate(&mut self, url: &str) -> Result<(), Self::Error>;

    fn set_html(&mut self, html: &str) -> Result<(), Self::Error>;

    /// Inject a script that runs before any page script on every subsequent load.
    fn init(&mut self, script: &str) -> Result<(), Self::Error>;

    /// Evaluate a script in the current page.
    fn eval(&mut self, script: &str) -> Result<(), Self::Error>;

    /// Keep the shim for binding `name` in place for every subsequent load.
    ///
    /// Backends should key shims by name so installing a name twice does not
    /// inject it twice; the default forwards every call to `init`. The current
    /// page is not touched, the facade evaluates the shim itself while running.
    fn install(&mut self, name: &str, shim: &str) -> Result<(), Self::Error> {
        let _ = name;
        self.init(shim)
    }

    /// Stop defining binding `name` on later loads. `removal` undoes the shim
    /// for backends that cannot retract an injected script.
    fn uninstall(&mut self, name: &str, removal: &str) -> Result<(), Self::Error> {
        let _ = (name, removal);
        Ok(())
    }
}
