//! HTTP routes for studio-auth

pub mod auth_routes;
pub mod health;
pub mod response;
pub mod user_routes;

pub use auth_routes::{handle_auth_request, JwtResponse};
pub use health::health_check;
pub use response::BoxBody;
pub use user_routes::{handle_user_request, UserResponse};
