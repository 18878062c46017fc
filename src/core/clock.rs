use crate::utils::error::{Result, SeckillError};
use crate::utils::jsonp;
use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use std::time::Duration;

const BUY_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// 解析本地時區的搶購時間，回傳 epoch 毫秒
pub fn parse_buy_time(value: &str) -> Result<i64> {
    let value = value.trim();
    let naive = BUY_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| SeckillError::InvalidConfigValueError {
            field: "buy_time".to_string(),
            value: value.to_string(),
            reason: "Expected format YYYY-MM-DD HH:MM:SS[.ffffff]".to_string(),
        })?;

    let local = Local.from_local_datetime(&naive).earliest().ok_or_else(|| {
        SeckillError::InvalidConfigValueError {
            field: "buy_time".to_string(),
            value: value.to_string(),
            reason: "Time does not exist in the local timezone".to_string(),
        }
    })?;

    Ok(local.timestamp_millis())
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 本地時鐘與京東伺服器時鐘的差值
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockOffset {
    /// local - server，正值表示本地時鐘較快
    pub offset_ms: i64,
}

impl ClockOffset {
    pub fn new(local_ms: i64, server_ms: i64) -> Self {
        Self {
            offset_ms: local_ms - server_ms,
        }
    }

    pub fn server_now(&self, local_now_ms: i64) -> i64 {
        local_now_ms - self.offset_ms
    }

    /// 距離伺服器時鐘到達 buy_ms 還要等多久，已過期則為零
    pub fn wait_duration(&self, buy_ms: i64, local_now_ms: i64) -> Duration {
        let remaining = buy_ms - self.server_now(local_now_ms);
        if remaining <= 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(remaining as u64)
        }
    }
}

pub async fn server_time_ms(client: &Client, api_base: &str) -> Result<i64> {
    let endpoint = format!(
        "{}/client.action?functionId=queryMaterialProducts&client=wh5",
        api_base
    );
    let response = client.get(&endpoint).send().await?;

    if !response.status().is_success() {
        return Err(SeckillError::UnexpectedResponse {
            endpoint,
            message: format!("status {}", response.status()),
        });
    }

    let body = response.text().await?;
    let value = jsonp::parse_jsonp(&endpoint, &body)?;
    jsonp::field_str(&value, "currentTime2")
        .and_then(|raw| raw.parse::<i64>().ok())
        .ok_or_else(|| SeckillError::UnexpectedResponse {
            endpoint,
            message: "missing currentTime2".to_string(),
        })
}

/// 量測時差，以請求前後的中點作為本地時間抵銷網路延遲；失敗時退回本地時鐘
pub async fn measure_offset(client: &Client, api_base: &str) -> ClockOffset {
    let before = now_millis();
    match server_time_ms(client, api_base).await {
        Ok(server_ms) => {
            let after = now_millis();
            let offset = ClockOffset::new(before + (after - before) / 2, server_ms);
            tracing::debug!("⏱️ Server time {} ms, round trip {} ms", server_ms, after - before);
            offset
        }
        Err(e) => {
            tracing::warn!("⚠️ Failed to fetch JD server time, using local clock: {}", e);
            ClockOffset::default()
        }
    }
}
