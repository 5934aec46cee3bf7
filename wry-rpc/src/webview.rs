//! The facade that ties a [`PlatformView`] to the binding registry and the
//! RPC channel.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, ThreadId};

use crate::channel::RpcChannel;
use crate::error::Error;
use crate::function::IntoHandler;
use crate::function_registry::BindingRegistry;
use crate::ipc::{binding_script, external_invoke_script, unbind_script};
use crate::platform::{Geometry, Hint, PlatformView};
use crate::runtime::{Command, EventProxy, Task, UiEvent, run_task};

/// Lifecycle of a [`WebView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Uninitialized,
    /// The view exists and its bootstrap scripts are installed; the loop has not started.
    Initializing,
    Running,
    /// The loop was asked to stop. The native view is never touched again.
    Terminated,
}

fn platform_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
    Error::Platform(Box::new(err))
}

/// A browser surface with host functions callable from script.
///
/// The value must stay on the thread that created it; use [`WebView::handle`]
/// to drive it from elsewhere.
pub struct WebView<P: PlatformView> {
    platform: P,
    state: State,
    channel: RpcChannel,
    proxy: EventProxy,
    terminated: Arc<AtomicBool>,
    ui_thread: ThreadId,
    not_send: PhantomData<*const ()>,
}

impl<P: PlatformView> WebView<P> {
    /// Wrap `platform` with an empty registry.
    pub fn new(platform: P) -> Result<Self, Error> {
        Self::with_registry(platform, Arc::new(BindingRegistry::new()))
    }

    /// Wrap `platform`, installing a shim for every binding already in `registry`.
    pub fn with_registry(platform: P, registry: Arc<BindingRegistry>) -> Result<Self, Error> {
        let proxy = platform.proxy();
        let mut webview = Self {
            platform,
            state: State::Uninitialized,
            channel: RpcChannel::new(registry),
            proxy,
            terminated: Arc::new(AtomicBool::new(false)),
            ui_thread: thread::current().id(),
            not_send: PhantomData,
        };

        let hook = webview.platform.message_hook();
        webview
            .platform
            .init(&external_invoke_script(hook))
            .map_err(platform_error)?;
        for name in webview.channel.registry().names() {
            webview
                .platform
                .install(&name, &binding_script(&name))
                .map_err(platform_error)?;
        }
        webview.state = State::Initializing;
        tracing::debug!(
            bindings = webview.channel.registry().len(),
            "webview initialized"
        );
        Ok(webview)
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The registry consulted for script calls.
    ///
    /// Binding directly through the registry after construction makes the
    /// name callable but does not define `window[name]` in the page; use
    /// [`WebView::bind`] or [`Handle::bind`] for that.
    pub fn registry(&self) -> &Arc<BindingRegistry> {
        self.channel.registry()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// A thread safe handle that forwards operations to the UI thread.
    pub fn handle(&self) -> Handle {
        Handle {
            proxy: self.proxy.clone(),
            registry: self.channel.registry().clone(),
            terminated: self.terminated.clone(),
            ui_thread: self.ui_thread,
        }
    }

    fn ensure_live(&self) -> Result<(), Error> {
        if self.state == State::Terminated {
            tracing::debug!("operation on a terminated webview ignored");
            return Err(Error::Terminated);
        }
        Ok(())
    }

    /// Run the event loop until the view is terminated or its window closes.
    pub fn run(&mut self) -> Result<(), Error> {
        self.ensure_live()?;
        self.state = State::Running;
        tracing::info!("webview running");

        let Self {
            platform,
            channel,
            terminated,
            state,
            ..
        } = self;
        let result = platform.run(&mut |platform: &mut P, event: UiEvent| {
            handle_event(platform, channel, terminated, event)
        });

        terminated.store(true, Ordering::SeqCst);
        *state = State::Terminated;
        tracing::info!("webview terminated");
        result.map_err(platform_error)
    }

    /// Stop the event loop. Every later operation fails with [`Error::Terminated`].
    pub fn terminate(&mut self) {
        if self.state == State::Terminated {
            return;
        }
        self.platform.terminate();
        self.terminated.store(true, Ordering::SeqCst);
        self.state = State::Terminated;
    }

    /// Terminate and release the native view.
    pub fn destroy(mut self) {
        self.terminate();
    }

    /// Queue `f` to run on the UI thread. Returns immediately.
    pub fn dispatch(&self, f: impl FnOnce() + Send + 'static) -> Result<(), Error> {
        self.ensure_live()?;
        send(&self.proxy, UiEvent::Dispatch(Box::new(f)))
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), Error> {
        self.ensure_live()?;
        self.platform.set_title(title).map_err(platform_error)
    }

    pub fn set_size(&mut self, width: u32, height: u32, hint: Hint) -> Result<(), Error> {
        self.ensure_live()?;
        self.platform
            .set_geometry(Geometry::from_hint(width, height, hint))
            .map_err(platform_error)
    }

    pub fn navigate(&mut self, url: &str) -> Result<(), Error> {
        self.ensure_live()?;
        self.platform.navigate(url).map_err(platform_error)
    }

    pub fn set_html(&mut self, html: &str) -> Result<(), Error> {
        self.ensure_live()?;
        self.platform.set_html(html).map_err(platform_error)
    }

    /// Inject a script that runs on every page load before page scripts.
    pub fn init(&mut self, script: &str) -> Result<(), Error> {
        self.ensure_live()?;
        self.platform.init(script).map_err(platform_error)
    }

    pub fn eval(&mut self, script: &str) -> Result<(), Error> {
        self.ensure_live()?;
        self.platform.eval(script).map_err(platform_error)
    }

    /// Expose `handler` to script as `window[name]`, returning a promise.
    ///
    /// Rebinding an existing name replaces its handler.
    pub fn bind<Args>(
        &mut self,
        name: &str,
        handler: impl IntoHandler<Args>,
    ) -> Result<(), Error> {
        self.ensure_live()?;
        self.channel.registry().bind(name, handler)?;
        install(&mut self.platform, self.state, name).map_err(platform_error)
    }

    /// Remove a binding. Returns whether it existed.
    pub fn unbind(&mut self, name: &str) -> Result<bool, Error> {
        self.ensure_live()?;
        let removed = self.channel.registry().unbind(name);
        if removed {
            uninstall(&mut self.platform, self.state, name).map_err(platform_error)?;
        }
        Ok(removed)
    }
}

impl<P: PlatformView> Drop for WebView<P> {
    fn drop(&mut self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}

fn install<P: PlatformView>(platform: &mut P, state: State, name: &str) -> Result<(), P::Error> {
    let script = binding_script(name);
    platform.install(name, &script)?;
    if state == State::Running {
        platform.eval(&script)?;
    }
    Ok(())
}

fn uninstall<P: PlatformView>(platform: &mut P, state: State, name: &str) -> Result<(), P::Error> {
    let script = unbind_script(name);
    platform.uninstall(name, &script)?;
    if state == State::Running {
        platform.eval(&script)?;
    }
    Ok(())
}

fn handle_event<P: PlatformView>(
    platform: &mut P,
    channel: &RpcChannel,
    terminated: &AtomicBool,
    event: UiEvent,
) {
    match event {
        UiEvent::Message(raw) => {
            channel.handle_incoming(&raw, |script| {
                if let Err(err) = platform.eval(script) {
                    tracing::warn!(%err, "failed to deliver rpc outcome");
                }
            });
        }
        UiEvent::Dispatch(task) => run_task(task),
        UiEvent::Command(command) => {
            if terminated.load(Ordering::SeqCst) {
                tracing::debug!(?command, "command after terminate ignored");
                return;
            }
            if let Err(err) = apply(platform, terminated, command) {
                tracing::warn!(%err, "webview command failed");
            }
        }
    }
}

fn apply<P: PlatformView>(
    platform: &mut P,
    terminated: &AtomicBool,
    command: Command,
) -> Result<(), P::Error> {
    match command {
        Command::SetTitle(title) => platform.set_title(&title),
        Command::SetSize {
            width,
            height,
            hint,
        } => platform.set_geometry(Geometry::from_hint(width, height, hint)),
        Command::Navigate(url) => platform.navigate(&url),
        Command::SetHtml(html) => platform.set_html(&html),
        Command::Init(script) => platform.init(&script),
        Command::Eval(script) => platform.eval(&script),
        Command::Install(name) => install(platform, State::Running, &name),
        Command::Uninstall(name) => uninstall(platform, State::Running, &name),
        Command::Terminate => {
            terminated.store(true, Ordering::SeqCst);
            platform.terminate();
            Ok(())
        }
    }
}

fn send(proxy: &EventProxy, event: UiEvent) -> Result<(), Error> {
    if proxy.send(event) {
        Ok(())
    } else {
        Err(Error::Disconnected)
    }
}

/// Cloneable, `Send` access to a running [`WebView`] from any thread.
///
/// Operations are queued in order and applied on the UI thread.
#[derive(Clone)]
pub struct Handle {
    proxy: EventProxy,
    registry: Arc<BindingRegistry>,
    terminated: Arc<AtomicBool>,
    ui_thread: ThreadId,
}

impl Handle {
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    fn send(&self, event: UiEvent) -> Result<(), Error> {
        if self.is_terminated() {
            return Err(Error::Terminated);
        }
        send(&self.proxy, event)
    }

    fn command(&self, command: Command) -> Result<(), Error> {
        self.send(UiEvent::Command(command))
    }

    /// Queue `f` to run on the UI thread. Returns immediately.
    pub fn dispatch(&self, f: impl FnOnce() + Send + 'static) -> Result<(), Error> {
        self.send(UiEvent::Dispatch(Box::new(f) as Task))
    }

    /// Run `f` on the UI thread and wait for its result.
    ///
    /// Runs `f` directly when already on the UI thread.
    pub fn run_on_ui_thread<T, F>(&self, f: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if thread::current().id() == self.ui_thread {
            return Ok(f());
        }
        let (tx, rx) = mpsc::sync_channel(1);
        self.dispatch(move || {
            let _ = tx.send(f());
        })?;
        rx.recv().map_err(|_| Error::Disconnected)
    }

    pub fn eval(&self, script: impl Into<String>) -> Result<(), Error> {
        self.command(Command::Eval(script.into()))
    }

    pub fn init(&self, script: impl Into<String>) -> Result<(), Error> {
        self.command(Command::Init(script.into()))
    }

    pub fn set_title(&self, title: impl Into<String>) -> Result<(), Error> {
        self.command(Command::SetTitle(title.into()))
    }

    pub fn navigate(&self, url: impl Into<String>) -> Result<(), Error> {
        self.command(Command::Navigate(url.into()))
    }

    pub fn set_html(&self, html: impl Into<String>) -> Result<(), Error> {
        self.command(Command::SetHtml(html.into()))
    }

    pub fn set_size(&self, width: u32, height: u32, hint: Hint) -> Result<(), Error> {
        self.command(Command::SetSize {
            width,
            height,
            hint,
        })
    }

    /// Bind from any thread. The registry is updated immediately; the shim is
    /// installed in the page by the UI thread.
    pub fn bind<Args>(&self, name: &str, handler: impl IntoHandler<Args>) -> Result<(), Error> {
        if self.is_terminated() {
            return Err(Error::Terminated);
        }
        let previous = self.registry.lookup(name);
        self.registry.bind(name, handler)?;
        if let Err(err) = self.command(Command::Install(name.to_string())) {
            // The page never sees the shim, so the registry must not either.
            match previous {
                Some(binding) => self.registry.restore(binding),
                None => {
                    self.registry.unbind(name);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    pub fn unbind(&self, name: &str) -> Result<bool, Error> {
        if self.is_terminated() {
            return Err(Error::Terminated);
        }
        let removed = self.registry.unbind(name);
        if removed {
            self.command(Command::Uninstall(name.to_string()))?;
        }
        Ok(removed)
    }

    pub fn terminate(&self) -> Result<(), Error> {
        self.command(Command::Terminate)
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("registry", &self.registry)
            .field("terminated", &self.is_terminated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockView};
    use crate::platform::Size;
    use std::sync::Mutex;

    fn webview() -> WebView<MockView> {
        WebView::new(MockView::new()).unwrap()
    }

    #[test]
    fn construction_installs_bootstrap_and_existing_bindings() {
        let registry = Arc::new(BindingRegistry::new());
        registry.bind("ping", || "pong").unwrap();
        let webview = WebView::with_registry(MockView::new(), registry).unwrap();

        assert_eq!(webview.state(), State::Initializing);
        assert_eq!(
            webview.platform().inits(),
            vec![external_invoke_script(crate::mock::MOCK_HOOK)]
        );
        assert_eq!(webview.platform().shims(), vec![binding_script("ping")]);
    }

    #[test]
    fn script_call_round_trip() {
        let mut webview = webview();
        webview.bind("add", |a: i64, b: i64| a + b).unwrap();
        webview
            .bind("fail", || -> Result<(), String> { Err("boom".into()) })
            .unwrap();
        webview.platform().post(r#"{"id":1,"method":"add","params":[2,3]}"#);
        webview.platform().post(r#"{"id":2,"method":"fail","params":[]}"#);
        let handle = webview.handle();
        webview
            .dispatch(move || handle.terminate().unwrap())
            .unwrap();

        webview.run().unwrap();

        assert_eq!(
            webview.platform().evals(),
            vec![
                "window._rpc[1].resolve(5); delete window._rpc[1];".to_string(),
                r#"window._rpc[2].reject("boom"); delete window._rpc[2];"#.to_string(),
            ]
        );
        assert_eq!(webview.state(), State::Terminated);
    }

    #[test]
    fn bind_before_run_only_injects() {
        let mut webview = webview();
        webview.bind("f", || {}).unwrap();
        assert_eq!(webview.platform().shims(), vec![binding_script("f")]);
        assert!(webview.platform().evals().is_empty());
    }

    #[test]
    fn bind_while_running_injects_and_evaluates() {
        let mut webview = webview();
        let handle = webview.handle();
        webview
            .dispatch(move || {
                handle.bind("late", |x: i64| x * 2).unwrap();
                handle.terminate().unwrap();
            })
            .unwrap();
        webview.run().unwrap();

        let script = binding_script("late");
        assert_eq!(webview.platform().shims(), vec![script.clone()]);
        assert_eq!(webview.platform().evals(), vec![script]);
        assert!(webview.registry().contains("late"));
    }

    #[test]
    fn rebinding_keeps_one_shim_and_unbind_drops_it() {
        let mut webview = webview();
        let handle = webview.handle();
        webview
            .dispatch(move || {
                for i in 0..3 {
                    handle.bind("f", move || i).unwrap();
                }
                assert!(handle.unbind("f").unwrap());
                handle.terminate().unwrap();
            })
            .unwrap();
        webview.run().unwrap();

        let shim = binding_script("f");
        assert!(webview.platform().shims().is_empty());
        assert_eq!(
            webview.platform().evals(),
            vec![shim.clone(), shim.clone(), shim, unbind_script("f")]
        );
        assert!(
            webview
                .platform()
                .calls()
                .contains(&Call::Uninstall("f".into()))
        );
    }

    #[test]
    fn unbind_before_run_forgets_the_shim() {
        let mut webview = webview();
        webview.bind("gone", || 1).unwrap();
        webview.bind("kept", || 2).unwrap();
        assert!(webview.unbind("gone").unwrap());
        assert_eq!(webview.platform().shims(), vec![binding_script("kept")]);
        assert!(webview.platform().evals().is_empty());
    }

    #[test]
    fn registry_binds_are_callable_without_a_shim() {
        let webview = webview();
        webview.registry().bind("direct", || 1).unwrap();
        assert!(webview.registry().contains("direct"));
        assert!(webview.platform().shims().is_empty());
    }

    #[test]
    fn failed_handle_bind_leaves_the_registry_unchanged() {
        let registry = Arc::new(BindingRegistry::new());
        registry.bind("keep", || 1).unwrap();
        let handle = Handle {
            proxy: EventProxy::new(|_| false),
            registry: registry.clone(),
            terminated: Arc::new(AtomicBool::new(false)),
            ui_thread: thread::current().id(),
        };

        assert!(matches!(
            handle.bind("keep", || 2),
            Err(Error::Disconnected)
        ));
        assert_eq!(
            registry.lookup("keep").unwrap().call(vec![]),
            Ok(serde_json::json!(1))
        );
        assert!(matches!(
            handle.bind("fresh", || 3),
            Err(Error::Disconnected)
        ));
        assert!(!registry.contains("fresh"));
    }

    #[test]
    fn dispatch_runs_in_fifo_order() {
        let webview_order = Arc::new(Mutex::new(Vec::new()));
        let mut webview = webview();
        for i in 0..5 {
            let order = webview_order.clone();
            webview.dispatch(move || order.lock().unwrap().push(i)).unwrap();
        }
        let handle = webview.handle();
        webview.dispatch(move || handle.terminate().unwrap()).unwrap();
        webview.run().unwrap();
        assert_eq!(*webview_order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn operations_after_terminate_fail() {
        let mut webview = webview();
        let handle = webview.handle();
        webview.terminate();

        assert!(matches!(webview.eval("1"), Err(Error::Terminated)));
        assert!(matches!(webview.set_title("x"), Err(Error::Terminated)));
        assert!(matches!(webview.bind("f", || {}), Err(Error::Terminated)));
        assert!(matches!(webview.run(), Err(Error::Terminated)));
        assert!(matches!(handle.eval("1"), Err(Error::Terminated)));
        assert!(matches!(handle.dispatch(|| {}), Err(Error::Terminated)));
        assert!(!webview.registry().contains("f"));
        assert_eq!(webview.platform().terminations(), 1);
    }

    #[test]
    fn commands_queued_behind_terminate_are_dropped() {
        let mut webview = webview();
        let handle = webview.handle();
        handle.terminate().unwrap();
        // Sent directly through the proxy so the handle's own check is bypassed.
        webview
            .platform()
            .proxy()
            .send(UiEvent::Command(Command::SetTitle("late".into())));
        webview.run().unwrap();
        assert!(
            !webview
                .platform()
                .calls()
                .contains(&Call::SetTitle("late".into()))
        );
    }

    #[test]
    fn set_size_applies_full_geometry() {
        let mut webview = webview();
        webview.set_size(400, 300, Hint::Fixed).unwrap();
        webview.set_size(640, 480, Hint::None).unwrap();
        let geometries = webview.platform().geometries();
        assert!(!geometries[0].resizable);
        assert!(geometries[1].resizable);
        assert_eq!(geometries[1].size, Some(Size::new(640, 480)));
        assert_eq!((geometries[1].min, geometries[1].max), (None, None));
    }

    #[test]
    fn handle_commands_apply_on_the_ui_thread() {
        let mut webview = webview();
        let handle = webview.handle();
        let worker = std::thread::spawn(move || {
            handle.set_title("from worker").unwrap();
            handle.navigate("https://example.com").unwrap();
            handle.terminate().unwrap();
        });
        worker.join().unwrap();
        webview.run().unwrap();

        assert_eq!(
            webview.platform().calls(),
            vec![
                Call::Init(external_invoke_script(crate::mock::MOCK_HOOK)),
                Call::SetTitle("from worker".into()),
                Call::Navigate("https://example.com".into()),
                Call::Terminate,
            ]
        );
    }

    #[test]
    fn unbind_removes_the_binding() {
        let mut webview = webview();
        webview.bind("gone", || 1).unwrap();
        assert!(webview.unbind("gone").unwrap());
        assert!(!webview.unbind("gone").unwrap());
        assert!(!webview.registry().contains("gone"));
    }

    #[test]
    fn run_on_ui_thread_returns_the_value() {
        let webview = webview();
        let handle = webview.handle();
        assert_eq!(handle.run_on_ui_thread(|| 7).unwrap(), 7);
    }
}
