//! Authentication and authorization for studio-auth
//!
//! Provides:
//! - JWT token issuance and verification
//! - Password hashing with Argon2
//! - Credential verification for login
//! - The per-request token filter and its request-scoped context
//! - Ownership checks for self-service operations

pub mod authenticator;
pub mod context;
pub mod filter;
pub mod guard;
pub mod jwt;
pub mod password;

pub use authenticator::Authenticator;
pub use context::{current_identity_of, Principal, SecurityContext};
pub use filter::RequestTokenFilter;
pub use guard::permits;
pub use jwt::{
    extract_token_from_header, Claims, TokenCodec, BEARER_PREFIX, DEFAULT_VALIDITY,
    MIN_SECRET_LEN,
};
pub use password::{hash_password, verify_password};
