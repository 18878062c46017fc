use crate::config::SeckillConfig;
use crate::core::clock;
use crate::core::seckill::Seckill;
use crate::core::session::{self, Session};
use crate::domain::model::RunSummary;
use crate::domain::ports::Notifier;
use crate::utils::error::Result;
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::Instrument;

pub const NOTIFICATION_SUBJECT: &str = "抢购通知";

/// 整體流程：登入 → 預約 → 等待 → 並發下單 → 通知
pub struct SeckillEngine {
    config: Arc<SeckillConfig>,
    client: Client,
    notifier: Arc<dyn Notifier>,
}

impl SeckillEngine {
    pub fn new(config: SeckillConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let client = session::build_client(&config)?;
        Ok(Self {
            config: Arc::new(config),
            client,
            notifier,
        })
    }

    pub fn session(&self) -> Session {
        Session::new(self.client.clone(), self.config.clone())
    }

    pub fn seckill(&self) -> Seckill {
        Seckill::new(self.client.clone(), self.config.clone())
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let session = self.session();
        session.qr_login().await?;
        session.refresh_status().await?;

        match session.user_info().await {
            Ok(nickname) => tracing::info!("👤 User: {}", nickname),
            Err(e) => tracing::warn!("⚠️ Failed to fetch user info: {}", e),
        }

        let seckill = Arc::new(self.seckill());
        self.prepare(&seckill).await;
        self.wait_for_buy_time().await?;

        tracing::info!("🚀 Time reached, starting {} workers", self.config.workers);
        let summary = self.fan_out(seckill).await;
        self.send_notification(&summary).await;
        Ok(summary)
    }

    /// 商品名稱與預約失敗都不影響後續搶購
    async fn prepare(&self, seckill: &Seckill) {
        match seckill.sku_title().await {
            Ok(title) => tracing::info!("📦 Item: {}", title),
            Err(e) => tracing::warn!("⚠️ Failed to fetch item title: {}", e),
        }

        if let Err(e) = seckill.reserve().await {
            tracing::error!("❌ Reservation failed: {}", e);
        }
    }

    pub async fn wait_for_buy_time(&self) -> Result<()> {
        let buy_ms = self.config.buy_time_millis()?;
        let offset = clock::measure_offset(&self.client, &self.config.endpoints.api).await;
        let wait = offset.wait_duration(buy_ms, clock::now_millis());

        tracing::info!(
            "⏳ Waiting for {} (local clock is {} ms ahead of JD server), {:?} left",
            self.config.buy_time,
            offset.offset_ms,
            wait
        );

        if wait.is_zero() {
            tracing::warn!("⚠️ buy_time {} has already passed, starting now", self.config.buy_time);
        } else {
            tokio::time::sleep(wait).await;
        }
        Ok(())
    }

    /// 同時發出 N 條相同的呼叫鏈，等全部結束
    pub async fn fan_out(&self, seckill: Arc<Seckill>) -> RunSummary {
        let mut tasks = JoinSet::new();

        for worker in 1..=self.config.workers {
            let seckill = seckill.clone();
            tasks.spawn(
                async move { seckill.run_chain().await }
                    .instrument(tracing::info_span!("worker", id = worker)),
            );
        }

        let mut summary = RunSummary::new(self.config.workers);
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(Ok(receipt)) => Ok(receipt),
                Ok(Err(e)) => {
                    tracing::error!("❌ Worker failed: {}", e);
                    Err(e.to_string())
                }
                Err(e) => {
                    tracing::error!("❌ Worker panicked: {}", e);
                    Err(format!("worker task aborted: {}", e))
                }
            };
            summary.record(outcome);
        }

        if summary.is_success() {
            tracing::info!("🎉 Seckill succeeded");
        } else {
            tracing::error!("❌ All {} workers failed", summary.workers);
        }
        summary
    }

    /// 通知失敗只記錄，不影響結果
    pub async fn send_notification(&self, summary: &RunSummary) {
        let body = summary.notification_body(&self.config.sku_id);
        if let Err(e) = self.notifier.notify(NOTIFICATION_SUBJECT, &body).await {
            tracing::error!("❌ {} ({})", e.user_friendly_message(), e.recovery_suggestion());
        }
    }
}
