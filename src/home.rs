/// Page shown when nothing was navigated to before the loop started.
pub(crate) const HOME_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>wry-webview</title>
</head>
<body>
</body>
</html>"#;
