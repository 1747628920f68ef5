//! Progress notification fan-out.

pub mod publisher;

pub use publisher::{NotificationPublisher, Subscription, SubscriptionHandle};
