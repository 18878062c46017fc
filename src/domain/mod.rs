// Domain layer: order models and the notifier port.

pub mod model;
pub mod ports;
