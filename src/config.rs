//! Configuration for studio-auth
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::TokenCodec;
use crate::types::StudioError;

/// studio-auth - JWT authentication gateway for the yoga studio API
#[derive(Parser, Debug, Clone)]
#[command(name = "studio-auth")]
#[command(about = "Issues and verifies bearer tokens for the yoga studio API")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (built-in signing secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// JWT validity window in milliseconds
    #[arg(long, env = "JWT_EXPIRATION_MS", default_value = "86400000")]
    pub jwt_expiration_ms: u64,

    /// Email of the admin account created at startup
    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Password of the admin account created at startup
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// First name of the admin account
    #[arg(long, env = "ADMIN_FIRST_NAME", default_value = "Admin")]
    pub admin_first_name: String,

    /// Last name of the admin account
    #[arg(long, env = "ADMIN_LAST_NAME", default_value = "Admin")]
    pub admin_last_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

impl Args {
    /// Token validity as a duration
    pub fn jwt_validity(&self) -> Duration {
        Duration::from_millis(self.jwt_expiration_ms)
    }

    /// Build the token codec (uses the built-in secret in dev mode when none is given)
    pub fn token_codec(&self) -> Result<TokenCodec, StudioError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => TokenCodec::new(secret, self.jwt_validity()),
            (None, true) => Ok(TokenCodec::new_dev(self.jwt_validity())),
            (None, false) => Err(StudioError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Admin credentials to seed, when both email and password are set
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.jwt_expiration_ms < 1000 {
            return Err("JWT_EXPIRATION_MS must be at least 1000".to_string());
        }

        if self.admin_email.is_some() != self.admin_password.is_some() {
            return Err("ADMIN_EMAIL and ADMIN_PASSWORD must be set together".to_string());
        }

        self.token_codec().map_err(|e| e.to_string())?;

        Ok(())
    }
}
