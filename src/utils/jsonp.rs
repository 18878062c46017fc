use crate::utils::error::{Result, SeckillError};
use serde_json::Value;

/// 京東多數介面回傳 `callback({...})`，取出括號內的 JSON
pub fn strip_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }

    match (trimmed.find('('), trimmed.rfind(')')) {
        (Some(start), Some(end)) if start < end => trimmed[start + 1..end].trim(),
        _ => trimmed,
    }
}

pub fn parse_jsonp(endpoint: &str, body: &str) -> Result<Value> {
    serde_json::from_str(strip_jsonp(body)).map_err(|e| SeckillError::UnexpectedResponse {
        endpoint: endpoint.to_string(),
        message: format!("invalid JSON payload: {}", e),
    })
}

/// 取字串欄位，數字也轉成字串
pub fn field_str(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// jQuery 風格的七位數 callback 編號
pub fn random_callback_id() -> u32 {
    fastrand::u32(1_000_000..=9_999_999)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_jsonp_wrapper() {
        assert_eq!(strip_jsonp("jQuery1234567({\"code\":200});"), "{\"code\":200}");
        assert_eq!(strip_jsonp("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_jsonp("fetchJSON({\"url\":\"//a(b)\"})"), "{\"url\":\"//a(b)\"}");
    }

    #[test]
    fn test_parse_jsonp_rejects_html() {
        let err = parse_jsonp("qr/check", "<html>busy</html>").unwrap_err();
        assert!(matches!(err, SeckillError::UnexpectedResponse { .. }));
    }

    #[test]
    fn test_field_str_accepts_numbers() {
        let value = serde_json::json!({"id": 138, "name": "home", "flag": null});
        assert_eq!(field_str(&value, "id").as_deref(), Some("138"));
        assert_eq!(field_str(&value, "name").as_deref(), Some("home"));
        assert_eq!(field_str(&value, "flag"), None);
        assert_eq!(field_str(&value, "missing"), None);
    }

    #[test]
    fn test_random_callback_id_has_seven_digits() {
        for _ in 0..100 {
            assert_eq!(random_callback_id().to_string().len(), 7);
        }
    }
}
