//! Authentication module for pinboard

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, JwtError, JwtManager};
pub use middleware::{require_auth, AuthUser};
pub use password::{hash_password, verify_password};
