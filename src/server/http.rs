//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo; one task per connection. Every request
//! passes through the [`RequestTokenFilter`] before it reaches a route.

use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::{current_identity_of, hash_password, Authenticator, RequestTokenFilter, TokenCodec};
use crate::config::Args;
use crate::routes::response::{
    not_found_response, preflight_response, unauthorized_entry_point, BoxError,
};
use crate::routes::{self, BoxBody};
use crate::store::{CredentialStore, MemoryCredentialStore, NewCredential};
use crate::types::StudioError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub codec: Arc<TokenCodec>,
    pub store: Arc<dyn CredentialStore>,
    pub authenticator: Authenticator,
    pub filter: RequestTokenFilter,
}

impl AppState {
    /// Create AppState backed by the in-memory credential store
    pub fn new(args: Args) -> Result<Self, StudioError> {
        Self::with_store(args, Arc::new(MemoryCredentialStore::new()))
    }

    /// Create AppState on top of an existing credential store
    pub fn with_store(args: Args, store: Arc<dyn CredentialStore>) -> Result<Self, StudioError> {
        let codec = Arc::new(args.token_codec()?);
        let authenticator = Authenticator::new(Arc::clone(&store));
        let filter = RequestTokenFilter::new(Arc::clone(&codec), Arc::clone(&store));

        Ok(Self {
            args,
            codec,
            store,
            authenticator,
            filter,
        })
    }
}

/// Create the configured admin account if it does not exist yet.
///
/// Returns true when an account was created.
pub async fn bootstrap_admin(state: &AppState) -> Result<bool, StudioError> {
    let Some((email, password)) = state.args.admin_credentials() else {
        return Ok(false);
    };

    if state.store.exists_by_login_name(email).await? {
        debug!("Admin account {} already present", email);
        return Ok(false);
    }

    let record = state
        .store
        .insert(NewCredential {
            email: email.to_string(),
            first_name: state.args.admin_first_name.clone(),
            last_name: state.args.admin_last_name.clone(),
            password_hash: hash_password(password)?,
            admin: true,
        })
        .await?;

    info!("Created admin account {} ({})", record.id, record.email);
    Ok(true)
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), StudioError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("studio-auth listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - using built-in signing secret unless JWT_SECRET is set");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    debug!("Accepted connection from {}", addr);
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, hyper::Error>(route(state, req).await) }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Handle one request: filter, then dispatch.
pub async fn route<B>(state: Arc<AppState>, req: Request<B>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    info!("{} {}", req.method(), req.uri().path());

    let next_state = Arc::clone(&state);
    state
        .filter
        .do_filter(req, move |req| dispatch(next_state, req))
        .await
}

/// Route a filtered request
async fn dispatch<B>(state: Arc<AppState>, req: Request<B>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        // CORS preflight, answered whatever the security context
        (Method::OPTIONS, _) => preflight_response(),

        // Health check endpoints
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(&state),

        // Login and registration are open to anonymous callers
        (_, p) if p.starts_with("/api/auth/") => routes::handle_auth_request(req, state)
            .await
            .unwrap_or_else(|| not_found_response(&path)),

        // Everything else under /api needs a member
        (_, p) if p.starts_with("/api/") => {
            if current_identity_of(&req).is_none() {
                debug!("Rejecting anonymous request to {}", path);
                return unauthorized_entry_point(&path);
            }

            routes::handle_user_request(req, state)
                .await
                .unwrap_or_else(|| not_found_response(&path))
        }

        // Not found
        _ => not_found_response(&path),
    }
}
