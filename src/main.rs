//! Demo window: the page calls back into Rust through bound functions.

use wry_webview::{Variadic, WebViewOptions};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>wry-webview demo</title></head>
<body>
    <h2>wry-webview</h2>
    <p id="sum">computing...</p>
    <p id="error"></p>
    <button onclick="myfunc('button clicked')">Say hello to Rust</button>
    <button onclick="quit()">Quit</button>
    <script>
        myfunc('page loaded');
        add(2, 3).then(function (v) { document.getElementById('sum').textContent = '2 + 3 = ' + v; });
        join(', ', 'one', 'two', 'three').then(function (v) { myfunc(v); });
        divide(1, 0).catch(function (e) { document.getElementById('error').textContent = 'divide failed: ' + e; });
    </script>
</body>
</html>"#;

fn main() -> Result<(), wry_webview::Error> {
    wry_webview::init_logging();

    let debug = std::env::args().any(|arg| arg == "--debug");
    let options = WebViewOptions::new()
        .title("wry-webview demo")
        .size(480, 320)
        .center(true)
        .debug(debug);
    let mut webview = wry_webview::new_with_options(options)?;
    let handle = webview.handle();

    webview.bind("myfunc", |message: String| {
        println!("[JS] {message}");
    })?;
    webview.bind("add", |a: i64, b: i64| a + b)?;
    webview.bind("join", |sep: String, parts: Variadic<String>| parts.join(&sep))?;
    webview.bind("divide", |a: f64, b: f64| -> Result<f64, String> {
        if b == 0.0 {
            Err("division by zero".to_string())
        } else {
            Ok(a / b)
        }
    })?;
    webview.bind("quit", move || {
        _ = handle.terminate();
    })?;

    webview.set_html(PAGE)?;
    webview.run()?;
    Ok(())
}
