pub mod toml_config;

pub use toml_config::SeckillConfig;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "jd-seckill")]
#[command(about = "京東秒殺服務: 掃碼登入、預約並定時搶購單一商品")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 登入、預約並在設定時間搶購
    Run {
        /// Path to TOML configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,

        /// Override the number of parallel order workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// 只檢查配置與伺服器時間差，不登入
    Check {
        #[arg(short, long, default_value = "config.toml")]
        config: String,

        #[arg(short, long)]
        verbose: bool,
    },
}

#[cfg(feature = "cli")]
impl Command {
    pub fn config_path(&self) -> &str {
        match self {
            Command::Run { config, .. } | Command::Check { config, .. } => config,
        }
    }

    pub fn verbose(&self) -> bool {
        match self {
            Command::Run { verbose, .. } | Command::Check { verbose, .. } => *verbose,
        }
    }
}
