use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::auth::{AuthError, TokenVerifier};
use crate::error::ApiError;

/// Verifier plus the one permission a route demands.
#[derive(Clone)]
pub struct PermissionGate {
    verifier: Arc<TokenVerifier>,
    permission: &'static str,
}

impl PermissionGate {
    pub fn new(verifier: Arc<TokenVerifier>, permission: &'static str) -> Self {
        Self { verifier, permission }
    }
}

/// Wrap every handler of `route` behind `permission`.
pub fn require_permission<S>(
    route: MethodRouter<S>,
    verifier: &Arc<TokenVerifier>,
    permission: &'static str,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(from_fn_with_state(
        PermissionGate::new(verifier.clone(), permission),
        enforce_permission,
    ))
}

/// Verifies the bearer token and its permission set before the handler
/// runs; the verified `AuthClaims` are handed on as a request extension.
pub async fn enforce_permission(
    State(gate): State<PermissionGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = gate.verifier.verify_headers(request.headers()).map_err(|err| {
        tracing::warn!(
            "Rejected {} {}: {}",
            request.method(),
            request.uri().path(),
            err
        );
        ApiError::from(err)
    })?;

    if !claims.has_permission(gate.permission) {
        tracing::warn!(
            "Subject '{}' lacks '{}' for {} {}",
            claims.subject(),
            gate.permission,
            request.method(),
            request.uri().path()
        );
        return Err(AuthError::PermissionDenied(gate.permission.to_string()).into());
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
