use crate::config::SeckillConfig;
use crate::domain::ports::Notifier;
use crate::utils::error::{Result, SeckillError};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

const IMPLICIT_TLS_PORT: u16 = 465;

/// 透過 SMTP 寄送 HTML 郵件
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    host: String,
    port: u16,
    user: String,
    password: String,
    recipients: Vec<String>,
}

fn notification_error(message: impl std::fmt::Display) -> SeckillError {
    SeckillError::NotificationError {
        message: message.to_string(),
    }
}

impl SmtpNotifier {
    pub fn from_config(config: &SeckillConfig) -> Result<Self> {
        let host = config
            .smtp
            .host()
            .ok_or_else(|| SeckillError::MissingConfigError {
                field: "smtp.email_host".to_string(),
            })?;

        Ok(Self {
            host,
            port: config.smtp.port,
            user: config.smtp.email_user.trim().to_string(),
            password: config.smtp.email_pwd.clone(),
            recipients: vec![config.message.email.trim().to_string()],
        })
    }

    pub fn build_message(&self, subject: &str, body: &str) -> Result<Message> {
        let from: Mailbox = self.user.parse().map_err(notification_error)?;
        let mut builder = Message::builder()
            .from(from)
            .subject(subject)
            .header(ContentType::TEXT_HTML);

        for recipient in &self.recipients {
            let to: Mailbox = recipient.parse().map_err(notification_error)?;
            builder = builder.to(to);
        }

        builder.body(body.to_string()).map_err(notification_error)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        // 465 走隱式 TLS，其他埠口走 STARTTLS
        let builder = (if self.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
        })
        .map_err(notification_error)?;

        Ok(builder
            .port(self.port)
            .credentials(Credentials::new(self.user.clone(), self.password.clone()))
            .build())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let message = self.build_message(subject, body)?;
        let transport = self.transport()?;

        transport.send(message).await.map_err(notification_error)?;
        tracing::info!("📧 Notification sent to {}", self.recipients.join(", "));
        Ok(())
    }
}
