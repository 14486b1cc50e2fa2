//! The live alert core.
//!
//! Any connected client may report that the live event started. Once enough
//! distinct clients corroborate it, and the cooldown since the previous alert
//! has elapsed, every connected client is told through the session broadcast
//! and every registered push endpoint is sent a notification.
//!
//! - [`session_registry`]: who is connected
//! - [`press_aggregator`]: threshold and cooldown gating
//! - [`subscription_store`]: push endpoints, snapshot iteration
//! - [`fanout`]: broadcast plus isolated per-endpoint push delivery
//! - [`count_broadcast`]: debounced connected-user count
//! - [`coordinator`]: wires session events to all of the above
//!
//! Around the core sit the nickname registration gate and the Web Push gateway.

pub use events::{ClientHandle, NotificationPayload};

pub mod coordinator;
pub mod count_broadcast;
pub mod error;
pub mod fanout;
pub mod gateway;
pub mod nickname_registry;
pub mod press_aggregator;
pub mod session_registry;
pub mod subscription_store;
