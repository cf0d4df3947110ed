//! Authentication module for Loanbook
//!
//! - Username/password accounts with bcrypt hashes
//! - JWT access token generation and validation
//! - Default admin seeding

mod jwt;
mod password;
mod service;

pub use jwt::{generate_token, verify_token, Claims, JwtError};
pub use password::{hash_password, verify_password};
pub use service::{AdminSeed, AuthService};
