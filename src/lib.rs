pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliArgs, Command};

pub use adapters::SmtpNotifier;
pub use config::SeckillConfig;
pub use crate::core::{engine::SeckillEngine, seckill::Seckill, session::Session};
pub use domain::ports::{NoopNotifier, Notifier};
pub use utils::error::{Result, SeckillError};
