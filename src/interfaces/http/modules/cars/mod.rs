//! Car registration and listing endpoints

pub mod dto;
pub mod handlers;

pub use handlers::*;
