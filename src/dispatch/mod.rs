//! Dispatch of decoded notifications to application-visible observers.

mod broadcast;
mod sink;

pub use broadcast::Broadcaster;
pub use sink::NotificationSink;
