use serde::Serialize;
use serde_json::{Value, json};
use wry_webview::{Json, Variadic, WebView};

use crate::Reports;

#[derive(Serialize)]
struct Point {
    x: i32,
    y: i32,
}

pub(crate) const SCRIPT: &str = r#"
function callUnknown() {
    var RPC = window._rpc;
    var seq = RPC.nextSeq++;
    var promise = new Promise(function (resolve, reject) {
        RPC[seq] = { resolve: resolve, reject: reject };
    });
    window.external.invoke(JSON.stringify({ id: seq, method: 'missing', params: [] }));
    return promise;
}

function bindingTests() {
    return Promise.all([
        add(2, 3).then(function (v) { return report('add', v); }),
        fail().then(
            function (v) { return report('fail', { resolved: v }); },
            function (e) { return report('fail', { rejected: e }); }
        ),
        add(1).catch(function (e) { return report('arity', e); }),
        add(1, 'two').catch(function (e) { return report('decode', e); }),
        sum(1, 2, 3.5).then(function (v) { return report('sum', v); }),
        sum().then(function (v) { return report('sum_empty', v); }),
        origin().then(function (v) { return report('origin', v); }),
        callUnknown().then(function (v) { return report('unknown', v); }),
    ]).then(function () {
        var pending = Object.keys(window._rpc).filter(function (k) { return k !== 'nextSeq'; });
        return report('pending', pending.length);
    });
}
"#;

pub(crate) fn bind(webview: &mut WebView) {
    webview.bind("add", |a: i64, b: i64| a + b).unwrap();
    webview
        .bind("fail", || -> Result<i64, String> { Err("boom".to_string()) })
        .unwrap();
    webview
        .bind("sum", |values: Variadic<f64>| values.iter().sum::<f64>())
        .unwrap();
    webview
        .bind("origin", || Json(Point { x: 1, y: -2 }))
        .unwrap();
}

/// The promise resolves with the handler's value.
pub(crate) fn test_add(reports: &Reports) {
    assert_eq!(reports.get("add"), json!(5));
}

/// A handler error rejects with its message.
pub(crate) fn test_handler_error(reports: &Reports) {
    assert_eq!(reports.get("fail"), json!({ "rejected": "boom" }));
}

pub(crate) fn test_argument_count(reports: &Reports) {
    assert_eq!(
        reports.get("arity"),
        json!("function arguments mismatch: expected 2, got 1")
    );
}

pub(crate) fn test_argument_decode(reports: &Reports) {
    let message = reports.get("decode");
    let message = message.as_str().expect("rejection is a string");
    assert!(message.starts_with("failed to unmarshal argument 1"), "{message}");
}

pub(crate) fn test_variadic(reports: &Reports) {
    assert_eq!(reports.get("sum").as_f64(), Some(6.5));
    assert_eq!(reports.get("sum_empty").as_f64(), Some(0.0));
}

pub(crate) fn test_struct_result(reports: &Reports) {
    assert_eq!(reports.get("origin"), json!({ "x": 1, "y": -2 }));
}

/// Calls to names that were never bound resolve with null.
pub(crate) fn test_unknown_method(reports: &Reports) {
    assert_eq!(reports.get("unknown"), Value::Null);
}

/// Every settled call removed its entry from the promise table.
pub(crate) fn test_promise_table_cleanup(reports: &Reports) {
    assert_eq!(reports.get("pending"), json!(0));
}
