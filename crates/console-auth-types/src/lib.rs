//! Auth types shared across Console services.
//!
//! Provides JWT validation for tokens minted by the identity service and the
//! `SandboxHeaders` extractor.

pub mod sandbox;
pub mod token;
