//! HTTP handlers.

pub mod billing;
pub mod health;
