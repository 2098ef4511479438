//! Per-request bearer token filter
//!
//! Runs once in front of every handler. A request either leaves the filter
//! with an authenticated [`SecurityContext`] or an anonymous one; the filter
//! itself never rejects a request and always hands it to the next stage.
//! Protected handlers decide what an anonymous context means for them.

use hyper::header::AUTHORIZATION;
use hyper::Request;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::auth::{extract_token_from_header, Principal, SecurityContext, TokenCodec};
use crate::store::CredentialStore;
use crate::types::StudioError;

/// Resolves the bearer token of each request into a security context
#[derive(Clone)]
pub struct RequestTokenFilter {
    codec: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
}

impl RequestTokenFilter {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self { codec, store }
    }

    /// Install a security context on `req`, then pass it to `next`.
    ///
    /// `next` is called exactly once whatever happens during token
    /// resolution; lookup failures are logged and leave the request anonymous.
    pub async fn do_filter<B, F, Fut>(&self, mut req: Request<B>, next: F) -> Fut::Output
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future,
    {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|header| extract_token_from_header(Some(header)))
            .map(str::to_owned);

        let context = match self.resolve_principal(token.as_deref()).await {
            Ok(Some(principal)) => {
                debug!("Authenticated request for {}", principal.username);
                SecurityContext::authenticated(principal)
            }
            Ok(None) => SecurityContext::anonymous(),
            Err(e) => {
                error!("Cannot set user authentication: {}", e);
                SecurityContext::anonymous()
            }
        };

        // Replaces anything a caller may have smuggled into the extensions
        req.extensions_mut().insert(context);

        next(req).await
    }

    /// Turn a candidate token into the member it belongs to.
    ///
    /// `Ok(None)` covers no token, an invalid token, and a subject that no
    /// longer exists. Only infrastructure failures are errors.
    pub async fn resolve_principal(
        &self,
        token: Option<&str>,
    ) -> Result<Option<Principal>, StudioError> {
        let Some(token) = token else {
            return Ok(None);
        };

        if !self.codec.verify(Some(token)) {
            return Ok(None);
        }

        let login_name = self.codec.subject_of(token)?;

        match self.store.find_by_login_name(&login_name).await? {
            Some(record) => Ok(Some(record.to_principal())),
            None => {
                warn!("Token subject no longer exists: {}", login_name);
                Ok(None)
            }
        }
    }
}
