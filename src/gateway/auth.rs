//! Client certificate middleware
//!
//! Runs the certificate authorizer in front of protected routes.  The peer
//! certificate comes from the [`TlsPeer`] extension set by the TLS acceptor;
//! a request without one is treated as having no validated handshake.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, warn};

use crate::mtls::{CertificateAuthorizer, Decision, DenyReason, TlsPeer};

/// Message returned for every denial when reasons are hidden.
pub const GENERIC_DENY_MESSAGE: &str = "Unauthorized";

/// Authorizer plus the response policy for denials.
#[derive(Debug, Clone)]
pub struct CertGuard {
    /// Decision core
    pub authorizer: CertificateAuthorizer,
    /// Whether denial bodies name the failed check
    pub expose_deny_reason: bool,
}

impl CertGuard {
    /// Create a guard.
    #[must_use]
    pub fn new(authorizer: CertificateAuthorizer, expose_deny_reason: bool) -> Self {
        Self {
            authorizer,
            expose_deny_reason,
        }
    }

    /// Authorize the peer at the authorizer's current time.
    #[must_use]
    pub fn check(&self, peer: Option<&TlsPeer>) -> Decision {
        match peer {
            Some(peer) => self
                .authorizer
                .authorize_now(peer.handshake_validated, peer.certificate.as_ref()),
            None => self.authorizer.authorize_now(false, None),
        }
    }
}

/// Certificate authorization middleware
pub async fn cert_auth_middleware(
    State(guard): State<Arc<CertGuard>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request.extensions().get::<TlsPeer>();
    let decision = guard.check(peer);
    let client = peer
        .and_then(|p| p.certificate.as_ref())
        .map_or("<none>", |cert| cert.display_name())
        .to_owned();
    let path = request.uri().path().to_owned();

    match decision {
        Decision::Allow => {
            debug!(client = %client, path = %path, "Client certificate accepted");
            next.run(request).await
        }
        Decision::Deny(reason) => {
            warn!(
                reason = reason.code(),
                client = %client,
                path = %path,
                "Client certificate rejected"
            );
            deny_response(reason, guard.expose_deny_reason)
        }
    }
}

/// Create the 401 response for a denial
#[must_use]
pub fn deny_response(reason: DenyReason, expose_reason: bool) -> Response {
    let message = if expose_reason {
        reason.message()
    } else {
        GENERIC_DENY_MESSAGE
    };
    error_response(StatusCode::UNAUTHORIZED, message)
}

/// Create a `{"status", "message"}` JSON error response
#[must_use]
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "status": status.as_u16(),
            "message": message
        })),
    )
        .into_response()
}
