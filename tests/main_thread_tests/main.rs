use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use wry_webview::WebViewOptions;

mod bindings;
mod dispatch;

const TIMEOUT: Duration = Duration::from_secs(30);

/// Drives the phases in order, then ends the loop.
const RUNNER: &str = r#"
bindingTests()
    .then(function () { return dispatchTests(); })
    .catch(function (e) { return report('runner_error', String(e)); })
    .then(function () { done(); });
"#;

/// Values reported from the page, keyed by test name.
#[derive(Clone, Default)]
pub(crate) struct Reports(Arc<Mutex<BTreeMap<String, Value>>>);

impl Reports {
    pub(crate) fn record(&self, name: impl Into<String>, value: Value) {
        self.0.lock().unwrap().insert(name.into(), value);
    }

    pub(crate) fn get(&self, name: &str) -> Value {
        self.0
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("nothing was reported for {name}"))
    }

    fn error(&self) -> Option<Value> {
        self.0.lock().unwrap().get("runner_error").cloned()
    }
}

fn has_display() -> bool {
    if cfg!(target_os = "linux") {
        std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
    } else {
        true
    }
}

fn main() {
    wry_webview::init_logging();
    if !has_display() {
        println!("no display available, skipping main thread tests");
        return;
    }

    let reports = Reports::default();
    let options = WebViewOptions::new()
        .title("main thread tests")
        .visible(false);
    let mut webview = wry_webview::new_with_options(options).expect("failed to create webview");
    let handle = webview.handle();
    assert!(
        matches!(wry_webview::new(false), Err(wry_webview::Error::AlreadyRunning)),
        "a second live webview must be refused"
    );

    {
        let reports = reports.clone();
        webview
            .bind("report", move |name: String, value: Value| {
                reports.record(name, value)
            })
            .unwrap();
    }
    {
        let handle = handle.clone();
        webview
            .bind("done", move || {
                _ = handle.terminate();
            })
            .unwrap();
    }
    bindings::bind(&mut webview);
    dispatch::bind(&mut webview, &reports);

    let page = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body><script>{}\n{}\n{}</script></body></html>",
        bindings::SCRIPT,
        dispatch::SCRIPT,
        RUNNER
    );
    webview.set_html(&page).unwrap();

    let timed_out = Arc::new(AtomicBool::new(false));
    {
        let handle = handle.clone();
        let timed_out = timed_out.clone();
        std::thread::spawn(move || {
            std::thread::sleep(TIMEOUT);
            if !handle.is_terminated() {
                timed_out.store(true, Ordering::SeqCst);
                _ = handle.terminate();
            }
        });
    }

    webview.run().expect("event loop failed");
    assert!(
        !timed_out.load(Ordering::SeqCst),
        "page did not finish within {TIMEOUT:?}"
    );
    assert_eq!(reports.error(), None);
    assert_eq!(webview.state(), wry_webview::State::Terminated);

    bindings::test_add(&reports);
    bindings::test_handler_error(&reports);
    bindings::test_argument_count(&reports);
    bindings::test_argument_decode(&reports);
    bindings::test_variadic(&reports);
    bindings::test_struct_result(&reports);
    bindings::test_unknown_method(&reports);
    bindings::test_promise_table_cleanup(&reports);

    dispatch::test_dispatch_order(&reports);
    dispatch::test_run_on_ui_thread(&reports);
    dispatch::test_bind_while_running(&reports);
    dispatch::test_set_title(&webview);

    println!("all main thread tests passed");
}
