use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 秒殺結算頁初始化資訊 (init.action)
#[derive(Debug, Clone, Deserialize)]
pub struct InitInfo {
    #[serde(rename = "addressList", default)]
    pub address_list: Vec<Address>,
    #[serde(rename = "invoiceInfo", default)]
    pub invoice_info: Option<InvoiceInfo>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub province_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub county_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub town_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address_detail: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile_key: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_content_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_phone_key: String,
}

/// 京東的 id 欄位時而是數字時而是字串，統一成字串，null 視為空
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub total_money: String,
    pub pay_url: String,
}

/// 回應內容原樣寫進郵件前先轉義
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 所有 worker 結束後的彙總
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub workers: usize,
    pub receipt: Option<OrderReceipt>,
    pub failures: Vec<String>,
}

impl RunSummary {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Default::default()
        }
    }

    /// 只保留第一張成功的訂單
    pub fn record(&mut self, outcome: std::result::Result<OrderReceipt, String>) {
        match outcome {
            Ok(receipt) => {
                if self.receipt.is_none() {
                    self.receipt = Some(receipt);
                }
            }
            Err(reason) => self.failures.push(reason),
        }
    }

    pub fn is_success(&self) -> bool {
        self.receipt.is_some()
    }

    pub fn notification_body(&self, sku_id: &str) -> String {
        match &self.receipt {
            Some(receipt) => format!(
                "<p>搶購成功</p><p>商品: {}</p><p>訂單號: {}</p><p>總價: {}</p><p>電腦端付款連結: <a href=\"{}\">{}</a></p>",
                escape_html(sku_id),
                escape_html(&receipt.order_id),
                escape_html(&receipt.total_money),
                escape_html(&receipt.pay_url),
                escape_html(&receipt.pay_url)
            ),
            None => {
                let reasons = self
                    .failures
                    .iter()
                    .map(|reason| format!("<li>{}</li>", escape_html(reason)))
                    .collect::<String>();
                format!(
                    "<p>搶購失敗</p><p>商品: {}</p><p>{} 個任務均未成功:</p><ul>{}</ul>",
                    escape_html(sku_id),
                    self.workers,
                    reasons
                )
            }
        }
    }
}
