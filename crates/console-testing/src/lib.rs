//! Test utilities for Console services.
//!
//! Builders for the request headers the console and API clients send.
//! Import in tests only, never in production code.

pub mod headers;
