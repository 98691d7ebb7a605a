//! Taskboard -- polled task list joined with users, with edit suppression.

pub mod api;
pub mod board;
pub mod config;
pub mod console;
pub mod edit;
pub mod feed;
pub mod poll;
pub mod tasks;
pub mod users;
