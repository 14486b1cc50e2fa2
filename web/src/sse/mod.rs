//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the SSE endpoint.
//! The connection registry and message types live in the `sse` crate.

pub mod handler;
