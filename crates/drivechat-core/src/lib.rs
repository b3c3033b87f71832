//! Core drivechat library (session, API client, folder scope, chat state machine).

pub mod api;
pub mod chat;
pub mod config;
pub mod folders;
pub mod protocol;
pub mod session;
