#![allow(dead_code)]

use async_trait::async_trait;
use jd_seckill::config::toml_config::Endpoints;
use jd_seckill::{Notifier, Result, SeckillConfig};
use std::path::Path;
use std::sync::Mutex;

pub const SKU: &str = "8654289";

/// 所有主機都指向 mock server 的測試配置
pub fn test_config(base_url: &str, work_dir: &Path) -> SeckillConfig {
    let mut config = SeckillConfig::from_toml_str(
        r#"
eid = "EID123"
fp = "FP456"
sku_id = "8654289"
seckill_num = 1
buy_time = "2020-01-01 10:00:00"
workers = 2

[account]
payment_pwd = "654321"
"#,
    )
    .unwrap();

    config.debug = true;
    config.endpoints = Endpoints::all(base_url);
    config.login.qr_path = work_dir.join("static/qr_code.png").to_str().unwrap().to_string();
    config.login.open_qr_image = false;
    config.login.poll_interval_ms = 10;
    config.login.max_poll_attempts = 3;
    config.seckill.url_retry_attempts = 2;
    config.seckill.retry_interval_ms = 10;
    config
}

pub fn init_info_body() -> serde_json::Value {
    serde_json::json!({
        "addressList": [{
            "id": 138263081,
            "name": "Zhang San",
            "provinceId": 1,
            "cityId": 72,
            "countyId": 2819,
            "townId": 0,
            "addressDetail": "No. 1 Example Road",
            "mobile": "138****0000",
            "mobileKey": "mk-1",
            "email": ""
        }],
        "token": "init-token"
    })
}

/// 記錄所有通知內容
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}
