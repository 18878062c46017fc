use crate::config::toml_config::LoggerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 依設定組出過濾器，RUST_LOG 優先
pub fn build_filter(logger: &LoggerConfig, verbose: bool) -> EnvFilter {
    let directive = if verbose {
        "jd_seckill=debug,info".to_string()
    } else {
        format!("jd_seckill={},warn", logger.level)
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

pub fn init_logger(logger: &LoggerConfig, verbose: bool) {
    let filter = build_filter(logger, verbose);

    if logger.is_dev() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .json(),
            )
            .init();
    }
}

