/// Listener registry - broken down into manageable components
mod core;
mod dispatch;
mod handlers;
mod management;
mod stats;
mod subscription;
mod tests;

pub use core::{EventRegistry, ListenerId};
pub use stats::EventRegistryStats;
pub use subscription::Subscription;
