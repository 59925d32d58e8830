//! Cryptography utilities

pub mod jwt;
pub mod qr_token;

pub use jwt::{create_token, verify_token, JwtConfig, TokenClaims};
pub use qr_token::{QrTokenCodec, TokenPayload};
