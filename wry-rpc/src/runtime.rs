//! Events delivered to the UI thread and the proxy used to send them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::platform::Hint;

/// Work queued for the UI thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Everything the UI thread can be asked to do.
pub enum UiEvent {
    /// A raw message posted by script through `window.external.invoke`.
    Message(String),
    /// A closure queued with `dispatch`.
    Dispatch(Task),
    /// A facade operation issued from another thread.
    Command(Command),
}

impl fmt::Debug for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiEvent::Message(raw) => f.debug_tuple("Message").field(raw).finish(),
            UiEvent::Dispatch(_) => f.debug_tuple("Dispatch").field(&"<closure>").finish(),
            UiEvent::Command(command) => f.debug_tuple("Command").field(command).finish(),
        }
    }
}

/// Facade operations that a [`Handle`](crate::Handle) forwards to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetTitle(String),
    SetSize { width: u32, height: u32, hint: Hint },
    Navigate(String),
    SetHtml(String),
    Init(String),
    Eval(String),
    /// Inject the shim for a binding that was just added to the registry.
    Install(String),
    /// Remove the shim of a binding that was just removed from the registry.
    Uninstall(String),
    Terminate,
}

/// Sends events to the UI thread from any thread.
///
/// `send` returns `false` once the receiving loop is gone.
#[derive(Clone)]
pub struct EventProxy {
    send: Arc<dyn Fn(UiEvent) -> bool + Send + Sync>,
}

impl EventProxy {
    pub fn new(send: impl Fn(UiEvent) -> bool + Send + Sync + 'static) -> Self {
        Self {
            send: Arc::new(send),
        }
    }

    pub fn send(&self, event: UiEvent) -> bool {
        (self.send)(event)
    }
}

impl fmt::Debug for EventProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventProxy").finish_non_exhaustive()
    }
}

/// Best effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run `task`, logging instead of unwinding into the event loop if it panics.
pub(crate) fn run_task(task: Task) {
    if let Err(payload) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(task)) {
        tracing::error!(
            panic = %panic_message(&*payload),
            "dispatched task panicked"
        );
    }
}
