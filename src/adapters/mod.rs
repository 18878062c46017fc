// Adapters layer: concrete implementations for external systems (smtp, local QR image viewer).

pub mod email;
pub mod qr;

pub use email::SmtpNotifier;
