pub mod notifier;
pub mod session_store;

pub use notifier::{NotificationContext, Notifier};
pub use session_store::SessionStore;

/// Output port: publish domain events (no knowledge of transport).
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}
