use clap::Parser;
use jd_seckill::core::{clock, session};
use jd_seckill::utils::error::ErrorSeverity;
use jd_seckill::utils::{logger, validation::Validate};
use jd_seckill::{
    CliArgs, Command, NoopNotifier, Notifier, SeckillConfig, SeckillEngine, SeckillError,
    SmtpNotifier,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let command = args.command;

    // 載入 TOML 配置
    let mut config = match SeckillConfig::from_file(command.config_path()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", command.config_path(), e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Command::Run {
        workers: Some(workers),
        ..
    } = &command
    {
        config.workers = *workers;
    }

    // 初始化日誌
    logger::init_logger(&config.logger, command.verbose() || config.debug);
    tracing::info!("🚀 Starting jd-seckill");
    tracing::info!("📁 Loaded configuration from: {}", command.config_path());

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match command {
        Command::Check { .. } => check(&config).await,
        Command::Run { .. } => run(config).await,
    }
}

async fn check(config: &SeckillConfig) -> anyhow::Result<()> {
    display_config_summary(config);

    let client = session::build_client(config)?;
    let offset = clock::measure_offset(&client, &config.endpoints.api).await;
    let wait = offset.wait_duration(config.buy_time_millis()?, clock::now_millis());

    println!("⏱️ Clock offset (local - JD): {} ms", offset.offset_ms);
    println!("⏳ Time until buy_time on the JD clock: {:?}", wait);
    println!("✅ Configuration check complete");
    Ok(())
}

async fn run(config: SeckillConfig) -> anyhow::Result<()> {
    let notifier: Arc<dyn Notifier> = if config.message.smtp_enabled() {
        Arc::new(SmtpNotifier::from_config(&config)?)
    } else {
        Arc::new(NoopNotifier)
    };

    let engine = SeckillEngine::new(config, notifier)?;

    match engine.run().await {
        Ok(summary) if summary.is_success() => {
            if let Some(receipt) = &summary.receipt {
                println!("✅ Order {} placed, total {}", receipt.order_id, receipt.total_money);
                println!("💳 Pay at: {}", receipt.pay_url);
            }
            Ok(())
        }
        Ok(summary) => {
            eprintln!("❌ All {} workers failed", summary.workers);
            for reason in &summary.failures {
                eprintln!("   - {}", reason);
            }
            std::process::exit(2);
        }
        Err(e) => exit_with(e),
    }
}

fn exit_with(e: SeckillError) -> ! {
    tracing::error!(
        "❌ Seckill failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn display_config_summary(config: &SeckillConfig) {
    println!("📋 Configuration Summary:");
    println!("  SKU: {} x {}", config.sku_id, config.seckill_num);
    println!("  Buy Time: {}", config.buy_time);
    println!("  Workers: {}", config.workers);
    println!(
        "  Payment Password: {}",
        if config.account.payment_pwd.is_empty() { "not set" } else { "set" }
    );

    if config.message.smtp_enabled() {
        println!(
            "  Notification: smtp via {}:{} -> {}",
            config.smtp.host().unwrap_or_default(),
            config.smtp.port,
            config.message.email
        );
    } else {
        println!("  Notification: disabled");
    }

    println!("  Logger: {} ({})", config.logger.env, config.logger.level);
    println!();
}
