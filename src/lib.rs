// src/lib.rs

pub mod api;
pub mod app;
pub mod chat;
pub mod chat_message;
pub mod config;
pub mod connection;
pub mod constants;
pub mod errors;
pub mod key_handlers;
pub mod logging;
pub mod models;
pub mod reveal;
pub mod session;
pub mod status_indicator;
pub mod ui;

pub use app::App;
pub use session::ChatSession;
