//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Field names match what the web frontend sends and expects.

pub mod auth;
pub mod id;
pub mod pagination;
pub mod post;
pub mod request;
