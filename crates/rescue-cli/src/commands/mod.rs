//! CLI command handlers.

pub mod common;
pub mod friend;
pub mod owner;
pub mod rescuer;
