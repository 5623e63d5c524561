pub mod handlers;
pub mod plans;
pub mod subscriptions;
pub mod usage;
