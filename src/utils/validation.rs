use crate::utils::error::{Result, SeckillError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid_value(field_name: &str, value: &str, reason: impl Into<String>) -> SeckillError {
    SeckillError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// 端點只放主機前綴，路徑與查詢參數由呼叫端拼接
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.trim().is_empty() {
        return Err(invalid_value(field_name, url_str, "Endpoint base URL is empty"));
    }

    let url = Url::parse(url_str).map_err(|e| {
        invalid_value(
            field_name,
            url_str,
            format!("Endpoint must be an absolute URL like https://passport.jd.com ({})", e),
        )
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid_value(
            field_name,
            url_str,
            format!("Endpoint must use http or https, got {}", url.scheme()),
        ));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid_value(
            field_name,
            url_str,
            "Endpoint base must not carry a query string or fragment",
        ));
    }

    Ok(())
}

/// 二維碼圖片的輸出路徑
pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid_value(field_name, path, "QR image path is empty"));
    }

    if path.contains('\0') {
        return Err(invalid_value(field_name, path, "QR image path contains a null byte"));
    }

    if path.ends_with('/') || path.ends_with('\\') {
        return Err(invalid_value(
            field_name,
            path,
            "QR image path points to a directory, expected a file such as static/qr_code.png",
        ));
    }

    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SeckillError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 必填欄位，空字串視為未填
pub fn validate_required(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SeckillError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    Ok(())
}

pub fn validate_digits(field_name: &str, value: &str) -> Result<()> {
    validate_required(field_name, value)?;

    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(SeckillError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must contain only digits".to_string(),
        });
    }
    Ok(())
}
