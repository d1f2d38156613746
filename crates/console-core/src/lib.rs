//! Service plumbing shared by Console services: health probes, request-id and
//! trace layers, tracing bootstrap and timestamp serialization.

pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
