use crate::utils::error::Result;
use async_trait::async_trait;

/// 搶購結果通知的出口
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> Result<()>;
}

/// 關閉通知時使用
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, subject: &str, _body: &str) -> Result<()> {
        tracing::debug!("Notification disabled, skipping '{}'", subject);
        Ok(())
    }
}
