//! This module holds typed parameters for various endpoint inputs.
//!
//! Each request body is deserialized into one of these structs before the
//! controller hands it to the domain layer, so malformed input is rejected
//! by type at the edge.

pub(crate) mod live;
pub(crate) mod registration;
pub(crate) mod subscription;
