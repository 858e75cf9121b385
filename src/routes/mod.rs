mod digests;
mod health_check;
mod subscriptions;

pub use digests::handle_trigger_digest;
pub use health_check::health_check;
pub use subscriptions::handle_create_subscription;
