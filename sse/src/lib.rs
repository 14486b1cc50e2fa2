//! Server-Sent Events (SSE) transport for the live alert server.
//!
//! This crate is the session collaborator of the alert core: it turns an HTTP
//! stream into a logical client with a [`events::ClientHandle`], and delivers
//! the core's outbound events (`update-user-count`, `show-notification`) to
//! every open stream.
//!
//! # Architecture
//!
//! - **One stream per browser tab**: each `GET /sse` gets a fresh handle, so
//!   a page refresh is a disconnect followed by a new connect.
//! - **Registry keyed by handle**: O(1) register/unregister through a DashMap.
//! - **Client and Broadcast scopes**: the `connected` handshake goes to one
//!   client, everything else is broadcast.
//! - **Ephemeral messages**: clients that are offline miss the event.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry of live senders
//! - `manager`: message serialization and routing
//! - `message`: typed SSE events and scopes
//! - `domain_event_handler`: bridges `events::DomainEvent` to SSE broadcasts

pub mod connection;
pub mod domain_event_handler;
pub mod manager;
pub mod message;

pub use manager::Manager;
