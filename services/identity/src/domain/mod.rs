pub mod repository;
pub mod session;
pub mod types;
pub mod webhook;
