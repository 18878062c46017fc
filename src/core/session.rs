use crate::adapters::qr;
use crate::config::SeckillConfig;
use crate::core::clock::now_millis;
use crate::utils::error::{Result, SeckillError};
use crate::utils::{http_debug, jsonp};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONNECTION, REFERER};
use reqwest::{Client, Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;

const QR_APP_ID: u32 = 133;
const QR_TOKEN_COOKIE: &str = "wlfstk_smdl";

/// 建立共用 cookie 的 HTTP client，登入與搶購必須用同一個
pub fn build_client(config: &SeckillConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .cookie_store(true)
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// 使用者登入狀態
pub struct Session {
    client: Client,
    config: Arc<SeckillConfig>,
}

impl Session {
    pub fn new(client: Client, config: Arc<SeckillConfig>) -> Self {
        Self { client, config }
    }

    fn trace(&self, method: Method, url: &str, status: StatusCode, body: Option<&str>) {
        http_debug::log_exchange(self.config.debug, &method, url, status, body);
    }

    fn login_url(&self) -> String {
        format!("{}/new/login.aspx", self.config.endpoints.passport)
    }

    /// 先訪問登入頁取得初始 cookie
    pub async fn login_page(&self) -> Result<()> {
        let response = self
            .client
            .get(self.login_url())
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3",
            )
            .send()
            .await?;
        self.trace(Method::GET, response.url().as_str(), response.status(), None);
        Ok(())
    }

    /// 下載二維碼並回傳 wlfstk_smdl token
    pub async fn fetch_qr_code(&self) -> Result<String> {
        let endpoint = format!(
            "{}/show?appid={}&size=300&t={}",
            self.config.endpoints.qr,
            QR_APP_ID,
            now_millis()
        );
        let response = self
            .client
            .get(&endpoint)
            .header(REFERER, self.login_url())
            .send()
            .await?;
        self.trace(Method::GET, &endpoint, response.status(), None);

        if !response.status().is_success() {
            return Err(SeckillError::LoginError {
                message: format!("failed to fetch QR code, status {}", response.status()),
            });
        }

        let token = response
            .cookies()
            .find(|cookie| cookie.name() == QR_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| SeckillError::LoginError {
                message: format!("QR response did not set {}", QR_TOKEN_COOKIE),
            })?;

        let image = response.bytes().await?;
        qr::save_image(&self.config.login.qr_path, &image)?;
        tracing::info!("📱 QR code saved to {}, scan it with the JD app", self.config.login.qr_path);

        Ok(token)
    }

    /// 查詢一次掃碼狀態，尚未確認時回傳 None
    pub async fn check_qr_ticket(&self, token: &str) -> Result<Option<String>> {
        let endpoint = format!(
            "{}/check?callback=jQuery{}&appid={}&token={}&_={}",
            self.config.endpoints.qr,
            jsonp::random_callback_id(),
            QR_APP_ID,
            token,
            now_millis()
        );
        let response = self
            .client
            .get(&endpoint)
            .header(REFERER, self.login_url())
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

        if jsonp::field_str(&value, "code").as_deref() != Some("200") {
            tracing::info!(
                "⌛ {}",
                jsonp::field_str(&value, "msg").unwrap_or_else(|| "QR code not confirmed yet".to_string())
            );
            return Ok(None);
        }

        tracing::info!("✅ Confirmed on the mobile client");
        Ok(jsonp::field_str(&value, "ticket").filter(|ticket| !ticket.is_empty()))
    }

    /// 固定間隔輪詢，直到取得 ticket 或用完次數
    pub async fn wait_for_ticket(&self, token: &str) -> Result<String> {
        let login = &self.config.login;
        let interval = Duration::from_millis(login.poll_interval_ms);

        for attempt in 1..=login.max_poll_attempts {
            match self.check_qr_ticket(token).await {
                Ok(Some(ticket)) => return Ok(ticket),
                Ok(None) => {}
                Err(e) => tracing::warn!("⚠️ QR status check {} failed: {}", attempt, e),
            }

            if attempt < login.max_poll_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(SeckillError::LoginError {
            message: format!(
                "QR code was not confirmed after {} checks",
                login.max_poll_attempts
            ),
        })
    }

    pub async fn validate_ticket(&self, ticket: &str) -> Result<()> {
        let endpoint = format!(
            "{}/uc/qrCodeTicketValidation?t={}",
            self.config.endpoints.passport, ticket
        );
        let response = self
            .client
            .get(&endpoint)
            .header(
                REFERER,
                format!("{}/uc/login?ltype=logout", self.config.endpoints.passport),
            )
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        self.trace(Method::GET, &endpoint, status, Some(&body));

        if !status.is_success() {
            return Err(SeckillError::LoginError {
                message: format!("ticket validation returned status {}", status),
            });
        }

        let value = jsonp::parse_jsonp(&endpoint, &body)?;

        match jsonp::field_str(&value, "returnCode").as_deref() {
            Some("0") => {
                tracing::info!("✅ QR ticket validated");
                Ok(())
            }
            code => Err(SeckillError::LoginError {
                message: format!("ticket validation failed, returnCode={:?}", code),
            }),
        }
    }

    /// 完整的掃碼登入流程
    pub async fn qr_login(&self) -> Result<()> {
        self.login_page().await?;
        let token = self.fetch_qr_code().await?;

        if self.config.login.open_qr_image {
            qr::open_image(&self.config.login.qr_path);
        }

        let ticket = self.wait_for_ticket(&token).await?;
        self.validate_ticket(&ticket).await?;
        tracing::info!("🔓 Login succeeded");
        Ok(())
    }

    /// 訪問訂單列表確認 cookie 仍有效；被導回登入頁即視為失效
    pub async fn refresh_status(&self) -> Result<()> {
        let endpoint = format!(
            "{}/center/list.action?rid={}",
            self.config.endpoints.order,
            now_millis()
        );
        let response = self.client.get(&endpoint).send().await?;
        self.trace(Method::GET, response.url().as_str(), response.status(), None);

        let redirected_to_login = response.url().path().contains("login");
        if response.status().is_success() && !redirected_to_login {
            Ok(())
        } else {
            tracing::error!(
                "❌ Session check failed: status {}, url {}",
                response.status(),
                response.url()
            );
            Err(SeckillError::SessionExpired)
        }
    }

    /// 取得暱稱，介面回傳 GBK 編碼的 JSONP
    pub async fn user_info(&self) -> Result<String> {
        let endpoint = format!(
            "{}/user/petName/getUserInfoForMiniJd.action?callback={}&_={}",
            self.config.endpoints.passport,
            jsonp::random_callback_id(),
            now_millis()
        );
        let response = self
            .client
            .get(&endpoint)
            .header(REFERER, format!("{}/center/list.action", self.config.endpoints.order))
            .send()
            .await?;

        let status = response.status();
        let body = response.text_with_charset("gbk").await?;
        self.trace(Method::GET, &endpoint, status, Some(&body));

        if !status.is_success() {
            return Err(SeckillError::UnexpectedResponse {
                endpoint,
                message: format!("status {}", status),
            });
        }

        let value = jsonp::parse_jsonp(&endpoint, &body)?;
        jsonp::field_str(&value, "nickName").ok_or_else(|| SeckillError::UnexpectedResponse {
            endpoint,
            message: "missing nickName".to_string(),
        })
    }
}
