//! Shared wire model for the Taskboard task/user API.

pub mod api;
pub mod codec;
pub mod task;
pub mod user;
