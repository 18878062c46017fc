use crate::core::clock;
use crate::utils::error::{Result, SeckillError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SKU_ID: &str = "100012043978";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/86.0.4240.198 Safari/537.36";
pub const MAX_WORKERS: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeckillConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub logger: LoggerConfig,
    /// eid, fp 必須填寫
    #[serde(default)]
    pub eid: String,
    #[serde(default)]
    pub fp: String,
    #[serde(default = "default_sku_id")]
    pub sku_id: String,
    #[serde(default = "default_seckill_num")]
    pub seckill_num: u32,
    /// 例如 2020-12-09 10:00:00.100000
    #[serde(default)]
    pub buy_time: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub message: MessageConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub login: LoginConfig,
    #[serde(default)]
    pub seckill: SeckillTuning,
    #[serde(default)]
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub env: String,
    pub level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// 帳戶有京券或上次使用了京豆時，下單需要六位數支付密碼
    pub payment_pwd: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    pub enable: bool,
    /// 目前只支援 smtp
    pub r#type: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// 留空時依 email_user 的網域推斷 smtp.<domain>
    pub email_host: String,
    pub port: u16,
    pub email_user: String,
    /// 郵箱授權碼，不一定是郵箱密碼
    pub email_pwd: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub qr_path: String,
    pub open_qr_image: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeckillTuning {
    pub url_retry_attempts: u32,
    pub retry_interval_ms: u64,
}

/// 各遠端主機的 base URL
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub passport: String,
    pub qr: String,
    pub item: String,
    pub yushou: String,
    pub itemko: String,
    pub marathon: String,
    pub order: String,
    pub api: String,
}

fn default_sku_id() -> String {
    DEFAULT_SKU_ID.to_string()
}

fn default_seckill_num() -> u32 {
    1
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_workers() -> usize {
    5
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            env: "prod".to_string(),
            level: "info".to_string(),
        }
    }
}

impl LoggerConfig {
    pub fn is_dev(&self) -> bool {
        self.env == "dev"
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            enable: false,
            r#type: "smtp".to_string(),
            email: String::new(),
        }
    }
}

impl MessageConfig {
    pub fn smtp_enabled(&self) -> bool {
        self.enable && self.r#type == "smtp"
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            email_host: String::new(),
            port: 465,
            email_user: String::new(),
            email_pwd: String::new(),
        }
    }
}

impl SmtpConfig {
    pub fn host(&self) -> Option<String> {
        if !self.email_host.trim().is_empty() {
            return Some(self.email_host.trim().to_string());
        }

        let (_, domain) = self.email_user.trim().rsplit_once('@')?;
        if domain.is_empty() {
            return None;
        }
        Some(format!("smtp.{}", domain.to_ascii_lowercase()))
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            max_poll_attempts: 85,
            qr_path: "static/qr_code.png".to_string(),
            open_qr_image: true,
        }
    }
}

impl Default for SeckillTuning {
    fn default() -> Self {
        Self {
            url_retry_attempts: 3,
            retry_interval_ms: 200,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            passport: "https://passport.jd.com".to_string(),
            qr: "https://qr.m.jd.com".to_string(),
            item: "https://item.jd.com".to_string(),
            yushou: "https://yushou.jd.com".to_string(),
            itemko: "https://itemko.jd.com".to_string(),
            marathon: "https://marathon.jd.com".to_string(),
            order: "https://order.jd.com".to_string(),
            api: "https://api.m.jd.com".to_string(),
        }
    }
}

impl Endpoints {
    /// 測試時把所有主機指向同一個 base URL
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            passport: base.clone(),
            qr: base.clone(),
            item: base.clone(),
            yushou: base.clone(),
            itemko: base.clone(),
            marathon: base.clone(),
            order: base.clone(),
            api: base,
        }
    }

    fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("endpoints.passport", &self.passport),
            ("endpoints.qr", &self.qr),
            ("endpoints.item", &self.item),
            ("endpoints.yushou", &self.yushou),
            ("endpoints.itemko", &self.itemko),
            ("endpoints.marathon", &self.marathon),
            ("endpoints.order", &self.order),
            ("endpoints.api", &self.api),
        ]
    }
}

impl SeckillConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SeckillError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${JD_PAYMENT_PWD})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            SeckillError::ConfigValidationError {
                field: "env_substitution".to_string(),
                message: e.to_string(),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 搶購時間（本地時區）的 epoch 毫秒
    pub fn buy_time_millis(&self) -> Result<i64> {
        clock::parse_buy_time(&self.buy_time)
    }

    pub fn item_page_url(&self) -> String {
        format!("{}/{}.html", self.endpoints.item, self.sku_id)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_digits("sku_id", &self.sku_id)?;
        if self.seckill_num == 0 {
            return Err(SeckillError::InvalidConfigValueError {
                field: "seckill_num".to_string(),
                value: "0".to_string(),
                reason: "Quantity must be at least 1".to_string(),
            });
        }
        validation::validate_range("workers", self.workers, 1, MAX_WORKERS)?;
        validation::validate_required("eid", &self.eid)?;
        validation::validate_required("fp", &self.fp)?;
        validation::validate_required("user_agent", &self.user_agent)?;
        validation::validate_required("buy_time", &self.buy_time)?;
        self.buy_time_millis()?;
        validation::validate_path("login.qr_path", &self.login.qr_path)?;

        if self.login.max_poll_attempts == 0 {
            return Err(SeckillError::InvalidConfigValueError {
                field: "login.max_poll_attempts".to_string(),
                value: "0".to_string(),
                reason: "At least one poll is required".to_string(),
            });
        }

        for (field, url) in self.endpoints.entries() {
            validation::validate_url(field, url)?;
        }

        if !matches!(self.logger.env.as_str(), "dev" | "prod") {
            return Err(SeckillError::InvalidConfigValueError {
                field: "logger.env".to_string(),
                value: self.logger.env.clone(),
                reason: "Valid values: dev, prod".to_string(),
            });
        }

        if self.message.enable {
            if self.message.r#type != "smtp" {
                return Err(SeckillError::InvalidConfigValueError {
                    field: "message.type".to_string(),
                    value: self.message.r#type.clone(),
                    reason: "Only smtp notification is supported".to_string(),
                });
            }
            validation::validate_required("message.email", &self.message.email)?;
            validation::validate_required("smtp.email_user", &self.smtp.email_user)?;
            validation::validate_required("smtp.email_pwd", &self.smtp.email_pwd)?;
            if self.smtp.host().is_none() {
                return Err(SeckillError::MissingConfigError {
                    field: "smtp.email_host".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for SeckillConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
eid = "EID123"
fp = "FP456"
buy_time = "2030-01-01 10:00:00"
"#;

    #[test]
    fn test_parse_minimal_config_applies_defaults() {
        let config = SeckillConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.sku_id, DEFAULT_SKU_ID);
        assert_eq!(config.seckill_num, 1);
        assert_eq!(config.workers, 5);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.logger.env, "prod");
        assert_eq!(config.logger.level, "info");
        assert_eq!(config.smtp.port, 465);
        assert_eq!(config.login.poll_interval_ms, 2000);
        assert_eq!(config.endpoints.marathon, "https://marathon.jd.com");
        assert!(!config.message.smtp_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
debug = true
eid = "EID"
fp = "FP"
sku_id = "8654289"
seckill_num = 2
buy_time = "2030-01-01 10:00:00.100000"
workers = 3

[logger]
env = "dev"
level = "debug"

[account]
payment_pwd = "123456"

[message]
enable = true
type = "smtp"
email = "me@example.com"

[smtp]
port = 587
email_user = "bot@QQ.com"
email_pwd = "auth-code"

[login]
max_poll_attempts = 10
open_qr_image = false
"#;

        let config = SeckillConfig::from_toml_str(toml_content).unwrap();

        assert!(config.debug);
        assert!(config.logger.is_dev());
        assert_eq!(config.sku_id, "8654289");
        assert_eq!(config.seckill_num, 2);
        assert_eq!(config.account.payment_pwd, "123456");
        assert!(config.message.smtp_enabled());
        assert_eq!(config.smtp.host().as_deref(), Some("smtp.qq.com"));
        assert_eq!(config.login.max_poll_attempts, 10);
        assert_eq!(config.login.poll_interval_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("JD_SECKILL_TEST_EID", "from-env");

        let toml_content = r#"
eid = "${JD_SECKILL_TEST_EID}"
fp = "${JD_SECKILL_TEST_UNSET_FP}"
buy_time = "2030-01-01 10:00:00"
"#;

        let config = SeckillConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.eid, "from-env");
        assert_eq!(config.fp, "${JD_SECKILL_TEST_UNSET_FP}");

        std::env::remove_var("JD_SECKILL_TEST_EID");
    }

    #[test]
    fn test_validation_requires_fingerprint() {
        let config = SeckillConfig::from_toml_str(r#"buy_time = "2030-01-01 10:00:00""#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SeckillError::MissingConfigError { ref field } if field == "eid"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = SeckillConfig::from_toml_str(BASIC).unwrap();
        config.buy_time = "tomorrow morning".to_string();
        assert!(config.validate().is_err());

        let mut config = SeckillConfig::from_toml_str(BASIC).unwrap();
        config.workers = 0;
        assert!(config.validate().is_err());

        let mut config = SeckillConfig::from_toml_str(BASIC).unwrap();
        config.endpoints.marathon = "marathon.jd.com".to_string();
        assert!(config.validate().is_err());

        let mut config = SeckillConfig::from_toml_str(BASIC).unwrap();
        config.message.enable = true;
        config.message.r#type = "wechat".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seckill_num_has_only_a_lower_bound() {
        let mut config = SeckillConfig::from_toml_str(BASIC).unwrap();
        config.seckill_num = 0;
        assert!(matches!(
            config.validate(),
            Err(SeckillError::InvalidConfigValueError { ref field, .. }) if field == "seckill_num"
        ));

        config.seckill_num = 500;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_smtp_host_resolution() {
        let mut smtp = SmtpConfig::default();
        assert_eq!(smtp.host(), None);

        smtp.email_user = "someone@163.com".to_string();
        assert_eq!(smtp.host().as_deref(), Some("smtp.163.com"));

        smtp.email_host = "mail.example.org".to_string();
        assert_eq!(smtp.host().as_deref(), Some("mail.example.org"));
    }

    #[test]
    fn test_endpoints_all_trims_slash() {
        let endpoints = Endpoints::all("http://127.0.0.1:9000/");
        assert_eq!(endpoints.qr, "http://127.0.0.1:9000");
        assert_eq!(endpoints.api, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = SeckillConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.eid, "EID123");
        assert_eq!(config.item_page_url(), "https://item.jd.com/100012043978.html");
    }
}
