//! Zone and spot endpoints

pub mod dto;
pub mod handlers;

pub use handlers::*;
