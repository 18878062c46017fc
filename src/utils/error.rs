use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeckillError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse { endpoint: String, message: String },

    #[error("Login failed: {message}")]
    LoginError { message: String },

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Reservation failed: {message}")]
    ReservationError { message: String },

    #[error("Seckill link is not available yet")]
    SeckillNotReady,

    #[error("Order rejected: {body}")]
    OrderRejected { body: String },

    #[error("Notification failed: {message}")]
    NotificationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Authentication,
    Purchase,
    Notification,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SeckillError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SeckillError::ConfigValidationError { .. }
            | SeckillError::InvalidConfigValueError { .. }
            | SeckillError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SeckillError::HttpError(_) | SeckillError::UnexpectedResponse { .. } => {
                ErrorCategory::Network
            }
            SeckillError::LoginError { .. } | SeckillError::SessionExpired => {
                ErrorCategory::Authentication
            }
            SeckillError::ReservationError { .. }
            | SeckillError::SeckillNotReady
            | SeckillError::OrderRejected { .. } => ErrorCategory::Purchase,
            SeckillError::NotificationError { .. } => ErrorCategory::Notification,
            SeckillError::IoError(_) | SeckillError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Notification => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Purchase => ErrorSeverity::Medium,
            ErrorCategory::Authentication | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的簡短說明
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("配置有誤: {}", self),
            ErrorCategory::Network => format!("網路請求失敗: {}", self),
            ErrorCategory::Authentication => format!("登入失敗: {}", self),
            ErrorCategory::Purchase => format!("搶購失敗: {}", self),
            ErrorCategory::Notification => format!("通知發送失敗: {}", self),
            ErrorCategory::System => format!("系統錯誤: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SeckillError::MissingConfigError { .. }
            | SeckillError::InvalidConfigValueError { .. }
            | SeckillError::ConfigValidationError { .. } => {
                "檢查 config.toml，eid 與 fp 必須填寫，buy_time 格式為 YYYY-MM-DD HH:MM:SS"
            }
            SeckillError::LoginError { .. } => "重新執行並在二維碼過期前用京東 APP 掃碼確認",
            SeckillError::SessionExpired => "登入狀態失效，請重新掃碼登入",
            SeckillError::SeckillNotReady => "搶購連結尚未開放，確認 buy_time 是否正確",
            SeckillError::OrderRejected { .. } => "商品可能已售罄或帳號無搶購資格",
            SeckillError::ReservationError { .. } => "確認商品支援預約且帳號已登入",
            SeckillError::NotificationError { .. } => "檢查 smtp 配置與郵箱授權碼",
            SeckillError::HttpError(_) | SeckillError::UnexpectedResponse { .. } => {
                "檢查網路連線後重試"
            }
            SeckillError::IoError(_) | SeckillError::SerializationError(_) => {
                "檢查檔案權限與磁碟空間"
            }
        }
    }
}

impl From<toml::de::Error> for SeckillError {
    fn from(err: toml::de::Error) -> Self {
        SeckillError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, SeckillError>;
