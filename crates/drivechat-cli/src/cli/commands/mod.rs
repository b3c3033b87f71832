//! Command handlers.

pub mod chat;
pub mod folders;
pub mod login;
pub mod logout;
pub mod whoami;
