use reqwest::{Method, StatusCode};

/// 回應內容只記錄前面這麼多字元
pub const BODY_PREVIEW_CHARS: usize = 300;

pub fn body_preview(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_PREVIEW_CHARS).collect();

    if chars.next().is_some() {
        format!("{}... ({} bytes total)", head, body.len())
    } else {
        head
    }
}

pub fn describe_exchange(method: &Method, url: &str, status: StatusCode, body: Option<&str>) -> String {
    match body {
        Some(body) => format!("{} {} -> {} {}", method, url, status, body_preview(body.trim())),
        None => format!("{} {} -> {}", method, url, status),
    }
}

/// 配置 `debug = true` 時記錄每一次請求與回應
pub fn log_exchange(enabled: bool, method: &Method, url: &str, status: StatusCode, body: Option<&str>) {
    if enabled {
        tracing::debug!("🌐 {}", describe_exchange(method, url, status, body));
    }
}
