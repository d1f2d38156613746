pub mod authenticate;
pub mod login;
pub mod onboard;
pub mod password;
pub mod sandbox;
pub mod session;
pub mod token;
pub mod verification;
pub mod webhook_log;
