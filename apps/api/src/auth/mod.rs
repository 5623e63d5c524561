//! Email/password accounts with bearer JWTs.

pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod validation;
