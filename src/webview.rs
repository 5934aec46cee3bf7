use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};

use raw_window_handle::{HandleError, HasWindowHandle, RawWindowHandle, WindowHandle};
use tao::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy},
    platform::run_return::EventLoopExtRunReturn,
    window::{Window, WindowBuilder},
};
use wry::{PageLoadEvent, WebContext, WebViewBuilder};
use wry_rpc::{EventProxy, Geometry, PlatformView, UiEvent};

use crate::Error;
use crate::home::HOME_HTML;
use crate::options::WebViewOptions;
use crate::shims::Shims;

/// Event type for the tao event loop.
#[derive(Debug)]
pub(crate) enum WryEvent {
    Ui(UiEvent),
    /// The page finished loading; queued scripts can run.
    PageLoaded,
}

static INSTANCE: AtomicBool = AtomicBool::new(false);

/// Holds the one native context a process may have.
struct InstanceGuard;

impl InstanceGuard {
    fn acquire() -> Result<Self, Error> {
        if INSTANCE.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyRunning);
        }
        Ok(Self)
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        INSTANCE.store(false, Ordering::SeqCst);
    }
}

/// Native window handle supplied by the host for child webviews.
struct ParentWindow(RawWindowHandle);

impl HasWindowHandle for ParentWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        // Validity is promised by the caller of `WebViewOptions::parent`.
        Ok(unsafe { WindowHandle::borrow_raw(self.0) })
    }
}

/// Where the browser surface is placed.
enum Target {
    Window(Window),
    Child(ParentWindow),
}

enum Content {
    Url(String),
    Html(String),
}

/// Collected before the loop starts; wry only accepts init scripts at build time.
#[derive(Default)]
struct Pending {
    init_scripts: Vec<String>,
    content: Option<Content>,
    queued: Vec<String>,
}

struct Built {
    webview: wry::WebView,
    loaded: bool,
    /// Scripts evaluated before the page finished loading.
    queued: Vec<String>,
    /// Init scripts added after the build, replayed on every page load.
    late_scripts: Vec<String>,
}

enum Surface {
    Pending(Pending),
    Built(Built),
}

/// The tao and wry implementation of [`PlatformView`].
///
/// The browser surface is created when the loop starts, so navigation and
/// init scripts issued before [`wry_rpc::WebView::run`] are collected and
/// applied at build time.
pub struct TaoView {
    surface: Surface,
    shims: Shims,
    target: Target,
    event_loop: Option<EventLoop<WryEvent>>,
    proxy: EventLoopProxy<WryEvent>,
    web_context: Option<WebContext>,
    options: WebViewOptions,
    exit: bool,
    _instance: InstanceGuard,
}

impl TaoView {
    pub fn new(options: WebViewOptions) -> Result<Self, Error> {
        let instance = InstanceGuard::acquire()?;

        let event_loop = EventLoopBuilder::<WryEvent>::with_user_event().build();
        let proxy = event_loop.create_proxy();

        let target = match options.parent {
            Some(parent) => Target::Child(ParentWindow(parent)),
            None => Target::Window(
                WindowBuilder::new()
                    .with_title(&options.title)
                    .with_inner_size(LogicalSize::new(options.width, options.height))
                    .with_visible(options.visible)
                    .build(&event_loop)?,
            ),
        };

        let web_context = options
            .data_directory
            .clone()
            .map(|path| WebContext::new(Some(path)));

        let mut view = Self {
            surface: Surface::Pending(Pending::default()),
            shims: Shims::default(),
            target,
            event_loop: Some(event_loop),
            proxy,
            web_context,
            options,
            exit: false,
            _instance: instance,
        };

        let geometry =
            Geometry::from_hint(view.options.width, view.options.height, view.options.hint);
        view.set_geometry(geometry)?;
        if view.options.center {
            view.center();
        }
        tracing::debug!(
            title = %view.options.title,
            width = view.options.width,
            height = view.options.height,
            child = view.options.parent.is_some(),
            "created native window"
        );
        Ok(view)
    }

    /// The native window, unless the webview is embedded in a host window.
    pub fn window(&self) -> Option<&Window> {
        match &self.target {
            Target::Window(window) => Some(window),
            Target::Child(_) => None,
        }
    }

    /// The browser surface, once the loop has started.
    pub fn webview(&self) -> Option<&wry::WebView> {
        match &self.surface {
            Surface::Built(built) => Some(&built.webview),
            Surface::Pending(_) => None,
        }
    }

    fn center(&self) {
        let Some(window) = self.window() else {
            return;
        };
        let Some(monitor) = window.current_monitor() else {
            return;
        };
        let screen = monitor.size();
        let origin = monitor.position();
        let size = window.outer_size();
        let x = origin.x + (screen.width as i32 - size.width as i32) / 2;
        let y = origin.y + (screen.height as i32 - size.height as i32) / 2;
        window.set_outer_position(PhysicalPosition::new(x, y));
    }

    /// Create the browser surface from everything collected so far.
    fn build(&mut self) -> Result<(), Error> {
        let Surface::Pending(pending) = &mut self.surface else {
            return Ok(());
        };
        let Pending {
            init_scripts,
            content,
            queued,
        } = mem::take(pending);

        let mut builder = match &mut self.web_context {
            Some(context) => WebViewBuilder::new_with_web_context(context),
            None => WebViewBuilder::new(),
        };

        let ipc_proxy = self.proxy.clone();
        let load_proxy = self.proxy.clone();
        builder = builder
            .with_devtools(self.options.debug)
            .with_clipboard(self.options.clipboard)
            .with_focused(self.options.autofocus)
            .with_ipc_handler(move |request| {
                let message = request.into_body();
                _ = ipc_proxy.send_event(WryEvent::Ui(UiEvent::Message(message)));
            })
            .with_on_page_load_handler(move |event, url| {
                if let PageLoadEvent::Finished = event {
                    tracing::debug!(%url, "page loaded");
                    _ = load_proxy.send_event(WryEvent::PageLoaded);
                }
            });
        let shims = self.shims.bake();
        for script in init_scripts.iter().chain(&shims) {
            builder = builder.with_initialization_script(script.as_str());
        }
        builder = match content {
            Some(Content::Url(url)) => builder.with_url(url),
            Some(Content::Html(html)) => builder.with_html(html),
            None => builder.with_html(HOME_HTML),
        };

        let webview = match &self.target {
            Target::Window(window) => build_in_window(builder, window)?,
            Target::Child(parent) => builder
                .with_bounds(wry::Rect {
                    position: wry::dpi::LogicalPosition::new(0, 0).into(),
                    size: wry::dpi::LogicalSize::new(self.options.width, self.options.height)
                        .into(),
                })
                .build_as_child(parent)?,
        };

        if self.options.debug {
            webview.open_devtools();
        }
        tracing::debug!(
            init_scripts = init_scripts.len(),
            shims = shims.len(),
            queued = queued.len(),
            "built webview"
        );

        self.surface = Surface::Built(Built {
            webview,
            loaded: false,
            queued,
            late_scripts: Vec::new(),
        });
        Ok(())
    }

    fn page_loaded(&mut self) {
        let Surface::Built(built) = &mut self.surface else {
            return;
        };
        built.loaded = true;
        let queued = mem::take(&mut built.queued);
        let replay = built.late_scripts.iter().chain(self.shims.replay());
        for script in replay.chain(&queued) {
            if let Err(err) = built.webview.evaluate_script(script) {
                tracing::warn!(%err, "failed to run queued script");
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn build_in_window(builder: WebViewBuilder<'_>, window: &Window) -> wry::Result<wry::WebView> {
    use tao::platform::unix::WindowExtUnix;
    use wry::WebViewBuilderExtUnix;
    builder.build_gtk(window.gtk_window())
}

#[cfg(not(target_os = "linux"))]
fn build_in_window(builder: WebViewBuilder<'_>, window: &Window) -> wry::Result<wry::WebView> {
    builder.build(window)
}

impl PlatformView for TaoView {
    type Error = Error;

    fn message_hook(&self) -> &'static str {
        "window.ipc.postMessage"
    }

    fn proxy(&self) -> EventProxy {
        let proxy = self.proxy.clone();
        EventProxy::new(move |event| proxy.send_event(WryEvent::Ui(event)).is_ok())
    }

    fn run(&mut self, on_event: &mut dyn FnMut(&mut Self, UiEvent)) -> Result<(), Error> {
        let mut event_loop = self.event_loop.take().ok_or(Error::LoopExited)?;
        self.build()?;

        event_loop.run_return(|event, _, control_flow| {
            *control_flow = ControlFlow::Wait;

            match event {
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => {
                    tracing::debug!("window close requested");
                    self.terminate();
                }
                Event::UserEvent(WryEvent::Ui(event)) => on_event(self, event),
                Event::UserEvent(WryEvent::PageLoaded) => self.page_loaded(),
                _ => {}
            }

            if self.exit {
                *control_flow = ControlFlow::Exit;
            }
        });
        Ok(())
    }

    fn terminate(&mut self) {
        self.exit = true;
        if let Some(window) = self.window() {
            window.set_visible(false);
        }
    }

    fn set_title(&mut self, title: &str) -> Result<(), Error> {
        match self.window() {
            Some(window) => window.set_title(title),
            None => tracing::debug!(title, "child webview has no title"),
        }
        Ok(())
    }

    fn set_geometry(&mut self, geometry: Geometry) -> Result<(), Error> {
        let logical = |size: wry_rpc::Size| LogicalSize::new(size.width, size.height);
        match self.window() {
            Some(window) => {
                window.set_resizable(geometry.resizable);
                window.set_min_inner_size(geometry.min.map(logical));
                window.set_max_inner_size(geometry.max.map(logical));
                if let Some(size) = geometry.size {
                    window.set_inner_size(logical(size));
                }
            }
            None => {
                if let (Some(size), Surface::Built(built)) = (geometry.size, &self.surface) {
                    built.webview.set_bounds(wry::Rect {
                        position: wry::dpi::LogicalPosition::new(0, 0).into(),
                        size: wry::dpi::LogicalSize::new(size.width, size.height).into(),
                    })?;
                }
            }
        }
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<(), Error> {
        match &mut self.surface {
            Surface::Pending(pending) => pending.content = Some(Content::Url(url.to_string())),
            Surface::Built(built) => {
                built.webview.load_url(url)?;
                built.loaded = false;
            }
        }
        Ok(())
    }

    fn set_html(&mut self, html: &str) -> Result<(), Error> {
        match &mut self.surface {
            Surface::Pending(pending) => pending.content = Some(Content::Html(html.to_string())),
            Surface::Built(built) => {
                built.webview.load_html(html)?;
                built.loaded = false;
            }
        }
        Ok(())
    }

    fn init(&mut self, script: &str) -> Result<(), Error> {
        match &mut self.surface {
            Surface::Pending(pending) => pending.init_scripts.push(script.to_string()),
            Surface::Built(built) => {
                if built.loaded {
                    built.webview.evaluate_script(script)?;
                }
                built.late_scripts.push(script.to_string());
            }
        }
        Ok(())
    }

    fn eval(&mut self, script: &str) -> Result<(), Error> {
        match &mut self.surface {
            Surface::Pending(pending) => pending.queued.push(script.to_string()),
            Surface::Built(built) if !built.loaded => built.queued.push(script.to_string()),
            Surface::Built(built) => built.webview.evaluate_script(script)?,
        }
        Ok(())
    }

    fn install(&mut self, name: &str, shim: &str) -> Result<(), Error> {
        self.shims.install(name, shim);
        Ok(())
    }

    fn uninstall(&mut self, name: &str, removal: &str) -> Result<(), Error> {
        self.shims.uninstall(name, removal);
        Ok(())
    }
}
