//! A [`PlatformView`] without a window, recording every call it receives.

use std::convert::Infallible;
use std::sync::mpsc;

use crate::platform::{Geometry, PlatformView};
use crate::runtime::{EventProxy, UiEvent};

pub(crate) const MOCK_HOOK: &str = "window.mock.postMessage";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    SetTitle(String),
    Geometry(Geometry),
    Navigate(String),
    SetHtml(String),
    Init(String),
    Eval(String),
    Install(String),
    Uninstall(String),
    Terminate,
}

pub(crate) struct MockView {
    calls: Vec<Call>,
    /// Binding shims by name, in install order.
    shims: Vec<(String, String)>,
    sender: mpsc::Sender<UiEvent>,
    receiver: mpsc::Receiver<UiEvent>,
    exit: bool,
}

impl MockView {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            calls: Vec::new(),
            shims: Vec::new(),
            sender,
            receiver,
            exit: false,
        }
    }

    /// Queue a message as if script had posted it.
    pub(crate) fn post(&self, raw: &str) {
        let _ = self.sender.send(UiEvent::Message(raw.to_string()));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.clone()
    }

    pub(crate) fn inits(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Init(script) => Some(script.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn shims(&self) -> Vec<String> {
        self.shims.iter().map(|(_, shim)| shim.clone()).collect()
    }

    pub(crate) fn evals(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Eval(script) => Some(script.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn geometries(&self) -> Vec<Geometry> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Geometry(geometry) => Some(*geometry),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn terminations(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == Call::Terminate)
            .count()
    }
}

impl PlatformView for MockView {
    type Error = Infallible;

    fn message_hook(&self) -> &'static str {
        MOCK_HOOK
    }

    fn proxy(&self) -> EventProxy {
        let sender = self.sender.clone();
        EventProxy::new(move |event| sender.send(event).is_ok())
    }

    /// Drains the queued events, stopping early once terminated.
    fn run(&mut self, on_event: &mut dyn FnMut(&mut Self, UiEvent)) -> Result<(), Infallible> {
        while !self.exit {
            match self.receiver.try_recv() {
                Ok(event) => on_event(self, event),
                Err(_) => break,
            }
        }
        Ok(())
    }

    fn terminate(&mut self) {
        self.exit = true;
        self.calls.push(Call::Terminate);
    }

    fn set_title(&mut self, title: &str) -> Result<(), Infallible> {
        self.calls.push(Call::SetTitle(title.to_string()));
        Ok(())
    }

    fn set_geometry(&mut self, geometry: Geometry) -> Result<(), Infallible> {
        self.calls.push(Call::Geometry(geometry));
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<(), Infallible> {
        self.calls.push(Call::Navigate(url.to_string()));
        Ok(())
    }

    fn set_html(&mut self, html: &str) -> Result<(), Infallible> {
        self.calls.push(Call::SetHtml(html.to_string()));
        Ok(())
    }

    fn init(&mut self, script: &str) -> Result<(), Infallible> {
        self.calls.push(Call::Init(script.to_string()));
        Ok(())
    }

    fn eval(&mut self, script: &str) -> Result<(), Infallible> {
        self.calls.push(Call::Eval(script.to_string()));
        Ok(())
    }

    fn install(&mut self, name: &str, shim: &str) -> Result<(), Infallible> {
        self.calls.push(Call::Install(name.to_string()));
        match self.shims.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = shim.to_string(),
            None => self.shims.push((name.to_string(), shim.to_string())),
        }
        Ok(())
    }

    fn uninstall(&mut self, name: &str, _removal: &str) -> Result<(), Infallible> {
        self.calls.push(Call::Uninstall(name.to_string()));
        self.shims.retain(|(existing, _)| existing != name);
        Ok(())
    }
}
