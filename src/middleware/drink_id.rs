use axum::{
    extract::{rejection::PathRejection, Path, Request},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;

/// `/drinks/:id` only matches integer ids. Anything else is a 404 before
/// any token is looked at.
pub async fn require_drink_id(
    id: Result<Path<i32>, PathRejection>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(rejection) = id {
        tracing::debug!("No drink route for {}: {}", request.uri().path(), rejection);
        return Err(ApiError::NotFound);
    }
    Ok(next.run(request).await)
}
