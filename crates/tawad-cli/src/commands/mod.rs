pub mod auth;
pub mod common;
pub mod completions;
pub mod config;
pub mod conversation;
pub mod meetup;
pub mod offer;
pub mod watch;
