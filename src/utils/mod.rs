pub mod error;
pub mod http_debug;
pub mod jsonp;
pub mod logger;
pub mod validation;
