//! HTTP and WebSocket routes

pub mod health;
pub mod student;
