use crate::config::SeckillConfig;
use crate::core::clock::now_millis;
use crate::domain::model::{InitInfo, OrderReceipt};
use crate::utils::error::{Result, SeckillError};
use crate::utils::{http_debug, jsonp};
use regex::Regex;
use reqwest::header::REFERER;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static SKU_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="sku-name"[^>]*>(.*?)</div>"#).expect("sku-name pattern is valid")
});
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// 協定相對的連結補上 https:
pub fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// divide.jd.com/user_routing -> marathon.jd.com/captcha.html
pub fn rewrite_seckill_url(url: &str) -> String {
    absolute_url(url)
        .replace("divide", "marathon")
        .replace("user_routing", "captcha.html")
}

pub fn extract_sku_title(html: &str) -> Option<String> {
    let inner = SKU_NAME.captures(html)?.get(1)?.as_str();
    let title = HTML_TAG.replace_all(inner, "").trim().to_string();
    (!title.is_empty()).then_some(title)
}

/// 由 init.action 的資料組出下單表單
pub fn build_order_form(config: &SeckillConfig, info: &InitInfo) -> Result<Vec<(&'static str, String)>> {
    let address = info
        .address_list
        .first()
        .ok_or_else(|| SeckillError::UnexpectedResponse {
            endpoint: "init.action".to_string(),
            message: "no delivery address on the account".to_string(),
        })?;

    let (invoice, title, content, phone, phone_key) = match &info.invoice_info {
        Some(invoice) => (
            "true",
            invoice.invoice_title.clone(),
            invoice.invoice_content_type.clone(),
            invoice.invoice_phone.clone(),
            invoice.invoice_phone_key.clone(),
        ),
        None => ("false", "-1".to_string(), "-1".to_string(), String::new(), String::new()),
    };

    Ok(vec![
        ("skuId", config.sku_id.clone()),
        ("num", config.seckill_num.to_string()),
        ("addressId", address.id.clone()),
        ("yuShou", "true".to_string()),
        ("isModifyAddress", "false".to_string()),
        ("name", address.name.clone()),
        ("provinceId", address.province_id.clone()),
        ("cityId", address.city_id.clone()),
        ("countyId", address.county_id.clone()),
        ("townId", address.town_id.clone()),
        ("addressDetail", address.address_detail.clone()),
        ("mobile", address.mobile.clone()),
        ("mobileKey", address.mobile_key.clone()),
        ("email", address.email.clone()),
        ("postCode", String::new()),
        ("invoiceTitle", title),
        ("invoiceCompanyName", String::new()),
        ("invoiceContent", content),
        ("invoiceTaxpayerNO", String::new()),
        ("invoiceEmail", String::new()),
        ("invoicePhone", phone),
        ("invoicePhoneKey", phone_key),
        ("invoice", invoice.to_string()),
        ("password", config.account.payment_pwd.clone()),
        ("codTimeType", "3".to_string()),
        ("paymentType", "4".to_string()),
        ("areaCode", String::new()),
        ("overseas", "0".to_string()),
        ("phone", String::new()),
        ("eid", config.eid.clone()),
        ("fp", config.fp.clone()),
        ("token", info.token.clone()),
        ("pru", String::new()),
    ])
}

/// 預約與搶購。多個 worker 共用同一個實例，彼此不共享可變狀態
pub struct Seckill {
    client: Client,
    config: Arc<SeckillConfig>,
}

impl Seckill {
    pub fn new(client: Client, config: Arc<SeckillConfig>) -> Self {
        Self { client, config }
    }

    fn trace(&self, method: Method, url: &str, status: StatusCode, body: Option<&str>) {
        http_debug::log_exchange(self.config.debug, &method, url, status, body);
    }

    fn seckill_page_url(&self) -> String {
        format!(
            "{}/seckill/seckill.action?skuId={}&num={}&rid={}",
            self.config.endpoints.marathon,
            self.config.sku_id,
            self.config.seckill_num,
            now_millis() / 1000
        )
    }

    pub async fn sku_title(&self) -> Result<String> {
        let endpoint = self.config.item_page_url();
        let response = self.client.get(&endpoint).send().await?;
        let status = response.status();
        let html = response.text().await?;
        self.trace(Method::GET, &endpoint, status, Some(&html));

        if !status.is_success() {
            return Err(SeckillError::UnexpectedResponse {
                endpoint,
                message: format!("status {}", status),
            });
        }

        extract_sku_title(&html).ok_or_else(|| SeckillError::UnexpectedResponse {
            endpoint,
            message: "sku-name not found".to_string(),
        })
    }

    /// 預約商品，已預約過的重複預約不會出錯
    pub async fn reserve(&self) -> Result<()> {
        let endpoint = format!(
            "{}/youshouinfo.action?callback=fetchJSON&sku={}&_={}",
            self.config.endpoints.yushou,
            self.config.sku_id,
            now_millis()
        );
        let response = self
            .client
            .get(&endpoint)
            .header(REFERER, self.config.item_page_url())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        self.trace(Method::GET, &endpoint, status, Some(&body));

        if !status.is_success() {
            return Err(SeckillError::ReservationError {
                message: format!("reservation info returned status {}", status),
            });
        }

        let value = jsonp::parse_jsonp(&endpoint, &body)?;
        let reserve_url = jsonp::field_str(&value, "url")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| SeckillError::ReservationError {
                message: "reservation url missing, the item may not support reservation".to_string(),
            })?;

        let reserve_url = absolute_url(&reserve_url);
        let response = self.client.get(&reserve_url).send().await?;
        self.trace(Method::GET, &reserve_url, response.status(), None);
        if !response.status().is_success() {
            return Err(SeckillError::ReservationError {
                message: format!("reservation returned status {}", response.status()),
            });
        }

        tracing::info!("✅ Reserved (or already reserved), eligible for the seckill");
        Ok(())
    }

    /// 取得搶購連結並改寫成結算頁的 captcha 連結
    pub async fn seckill_url(&self) -> Result<String> {
        let endpoint = format!(
            "{}/itemShowBtn?callback=jQuery{}&skuId={}&from=pc&_={}",
            self.config.endpoints.itemko,
            jsonp::random_callback_id(),
            self.config.sku_id,
            now_millis()
        );
        let response = self
            .client
            .get(&endpoint)
            .header(REFERER, self.config.item_page_url())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        self.trace(Method::GET, &endpoint, status, Some(&body));

        if !status.is_success() {
            return Err(SeckillError::UnexpectedResponse {
                endpoint,
                message: format!("status {}", status),
            });
        }

        let value = jsonp::parse_jsonp(&endpoint, &body)?;
        match jsonp::field_str(&value, "url").filter(|url| !url.is_empty()) {
            Some(url) => Ok(rewrite_seckill_url(&url)),
            None => Err(SeckillError::SeckillNotReady),
        }
    }

    pub async fn request_seckill_url(&self) -> Result<()> {
        let tuning = &self.config.seckill;
        let attempts = tuning.url_retry_attempts.max(1);
        let mut last_error = SeckillError::SeckillNotReady;
        let mut url = None;

        for attempt in 1..=attempts {
            match self.seckill_url().await {
                Ok(found) => {
                    url = Some(found);
                    break;
                }
                Err(e) => {
                    tracing::warn!("⚠️ Seckill link attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e;
                }
            }

            if attempt < attempts {
                tokio::time::sleep(Duration::from_millis(tuning.retry_interval_ms)).await;
            }
        }

        let url = url.ok_or(last_error)?;
        tracing::info!("🔗 Seckill link: {}", url);

        let response = self
            .client
            .get(&url)
            .header(REFERER, self.config.item_page_url())
            .send()
            .await?;
        self.trace(Method::GET, &url, response.status(), None);
        Ok(())
    }

    /// 訪問搶購訂單結算頁
    pub async fn seckill_page(&self) -> Result<()> {
        tracing::info!("🧾 Visiting seckill checkout page");
        let endpoint = self.seckill_page_url();
        let response = self
            .client
            .get(&endpoint)
            .header(REFERER, self.config.item_page_url())
            .send()
            .await?;
        self.trace(Method::GET, &endpoint, response.status(), None);
        Ok(())
    }

    pub async fn init_info(&self) -> Result<InitInfo> {
        let endpoint = format!(
            "{}/seckillnew/orderService/pc/init.action",
            self.config.endpoints.marathon
        );
        let form = [
            ("sku", self.config.sku_id.clone()),
            ("num", self.config.seckill_num.to_string()),
            ("isModifyAddress", "false".to_string()),
        ];
        let response = self.client.post(&endpoint).form(&form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        self.trace(Method::POST, &endpoint, status, Some(&body));

        if !status.is_success() {
            return Err(SeckillError::UnexpectedResponse {
                endpoint,
                message: format!("status {}", status),
            });
        }

        serde_json::from_str(&body).map_err(|e| SeckillError::UnexpectedResponse {
            endpoint,
            message: format!("init info is not valid JSON: {}", e),
        })
    }

    pub async fn submit_order(&self) -> Result<OrderReceipt> {
        let info = self.init_info().await?;
        let form = build_order_form(&self.config, &info)?;

        tracing::info!("🛒 Submitting seckill order");
        let endpoint = format!(
            "{}/seckillnew/orderService/pc/submitOrder.action?skuId={}",
            self.config.endpoints.marathon, self.config.sku_id
        );
        let response = self
            .client
            .post(&endpoint)
            .header(REFERER, self.seckill_page_url())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        self.trace(Method::POST, &endpoint, status, Some(&body));

        if !status.is_success() {
            return Err(SeckillError::UnexpectedResponse {
                endpoint,
                message: format!("status {}", status),
            });
        }

        let value: Value = serde_json::from_str(&body).map_err(|_| SeckillError::UnexpectedResponse {
            endpoint: endpoint.clone(),
            message: format!("order response is not JSON: {}", body),
        })?;

        if value.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(SeckillError::OrderRejected { body });
        }

        let receipt = OrderReceipt {
            order_id: jsonp::field_str(&value, "orderId").unwrap_or_default(),
            total_money: jsonp::field_str(&value, "totalMoney").unwrap_or_default(),
            pay_url: absolute_url(&jsonp::field_str(&value, "pcUrl").unwrap_or_default()),
        };
        tracing::info!(
            "🎉 Order placed: id {}, total {}, pay at {}",
            receipt.order_id,
            receipt.total_money,
            receipt.pay_url
        );
        Ok(receipt)
    }

    /// 單一 worker 的完整呼叫鏈
    pub async fn run_chain(&self) -> Result<OrderReceipt> {
        self.request_seckill_url().await?;
        self.seckill_page().await?;
        self.submit_order().await
    }
}
