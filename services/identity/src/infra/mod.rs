pub mod db;
pub mod webhook_listener;
