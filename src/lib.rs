pub mod bridge;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod session;
pub mod tui;
