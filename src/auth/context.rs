//! Request-scoped security context
//!
//! The filter stores a [`SecurityContext`] in the request's extensions, so it
//! lives exactly as long as the request and is never shared between requests.

use hyper::Request;
use serde::{Deserialize, Serialize};

/// Authenticated studio member, as known for the duration of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: i64,
    /// Login name (email)
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub admin: bool,
}

impl Principal {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Holder of the current principal. No principal means anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContext {
    principal: Option<Principal>,
    authorities: Vec<String>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for a verified principal.
    ///
    /// Authorization is ownership based, so no authorities are granted.
    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            authorities: Vec::new(),
        }
    }

    pub fn current_identity(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }
}

/// Current principal installed on a request, if any
pub fn current_identity_of<B>(req: &Request<B>) -> Option<&Principal> {
    req.extensions()
        .get::<SecurityContext>()
        .and_then(SecurityContext::current_identity)
}
