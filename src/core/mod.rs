pub mod clock;
pub mod engine;
pub mod seckill;
pub mod session;

pub use crate::domain::model::{InitInfo, OrderReceipt, RunSummary};
pub use crate::domain::ports::{NoopNotifier, Notifier};
pub use crate::utils::error::Result;
