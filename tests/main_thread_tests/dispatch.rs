use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;
use wry_webview::{Handle, WebView};

use crate::Reports;

pub(crate) const SCRIPT: &str = r#"
function dispatchTests() {
    return new Promise(function (resolve) {
        window.__dispatchDone = resolve;
        startDispatch();
    });
}
"#;

pub(crate) fn bind(webview: &mut WebView, reports: &Reports) {
    let handle = webview.handle();
    let reports = reports.clone();
    webview
        .bind("startDispatch", move || {
            let handle = handle.clone();
            let reports = reports.clone();
            thread::spawn(move || worker(handle, reports));
        })
        .unwrap();
}

fn worker(handle: Handle, reports: Reports) {
    let order = Arc::new(Mutex::new(Vec::new()));
    for i in 0..5 {
        let order = order.clone();
        handle
            .dispatch(move || order.lock().unwrap().push(i))
            .unwrap();
    }
    {
        let reports = reports.clone();
        handle
            .dispatch(move || reports.record("order", json!(*order.lock().unwrap())))
            .unwrap();
    }

    let worker_thread = thread::current().id();
    let elsewhere = handle
        .run_on_ui_thread(move || thread::current().id() != worker_thread)
        .unwrap();
    reports.record("ui_thread", json!(elsewhere));

    handle.set_title("renamed").unwrap();
    handle.bind("late", |x: i64| x * 10).unwrap();
    handle
        .eval(
            "late(4).then(function (v) { return report('late', v); })\
             .then(function () { window.__dispatchDone(); });",
        )
        .unwrap();
}

/// Dispatched closures run in the order they were queued.
pub(crate) fn test_dispatch_order(reports: &Reports) {
    assert_eq!(reports.get("order"), json!([0, 1, 2, 3, 4]));
}

pub(crate) fn test_run_on_ui_thread(reports: &Reports) {
    assert_eq!(reports.get("ui_thread"), json!(true));
}

/// A binding added while the loop runs is usable from the loaded page.
pub(crate) fn test_bind_while_running(reports: &Reports) {
    assert_eq!(reports.get("late"), json!(40));
}

pub(crate) fn test_set_title(webview: &WebView) {
    let window = webview.platform().window().expect("top level window");
    assert_eq!(window.title(), "renamed");
}
