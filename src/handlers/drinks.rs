// Handlers for the drinks menu
//
// GET    /drinks          public, short projection
// GET    /drinks-detail   get:drinks-detail, long projection
// POST   /drinks          post:drinks
// PATCH  /drinks/:id      patch:drinks, title only
// DELETE /drinks/:id      delete:drinks

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::auth::AuthClaims;
use crate::database::models::{title_from_json, Drink, NewDrink};
use crate::error::ApiError;

/// GET /drinks
pub async fn list_drinks(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let drinks = non_empty_menu(&state).await?;
    let drinks: Vec<_> = drinks.iter().map(Drink::short).collect();

    Ok(Json(json!({ "success": true, "drinks": drinks })))
}

/// GET /drinks-detail
pub async fn list_drinks_detail(
    State(state): State<AppState>,
    Extension(_claims): Extension<AuthClaims>,
) -> Result<Json<Value>, ApiError> {
    let drinks = non_empty_menu(&state).await?;
    let drinks: Vec<_> = drinks.iter().map(Drink::long).collect();

    Ok(Json(json!({ "success": true, "drinks": drinks })))
}

/// POST /drinks
pub async fn create_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload.map_err(bad_body)?;
    let draft = NewDrink::from_json(&body)?;

    let drink = state.drinks.create(draft).await.map_err(ApiError::from_write)?;
    info!("Drink {} '{}' created by {}", drink.id, drink.title, claims.subject());

    Ok(Json(json!({ "success": true, "drinks": drink.long() })))
}

/// PATCH /drinks/:id
pub async fn update_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = drink_id(id)?;
    let Json(body) = payload.map_err(bad_body)?;

    // Unknown ids win over a bad body
    state.drinks.get_by_id(id).await?;
    let title = title_from_json(&body)?;

    let drink = state
        .drinks
        .update_title(id, &title)
        .await
        .map_err(ApiError::from_write)?;
    info!("Drink {} renamed to '{}' by {}", drink.id, drink.title, claims.subject());

    Ok(Json(json!({ "success": true, "drinks": drink.long() })))
}

/// DELETE /drinks/:id
pub async fn delete_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = drink_id(id)?;
    let deleted = state.drinks.delete_by_id(id).await?;
    info!("Drink {} deleted by {}", deleted, claims.subject());

    Ok(Json(json!({ "success": true, "delete": deleted })))
}

/// An empty menu is reported as not found.
async fn non_empty_menu(state: &AppState) -> Result<Vec<Drink>, ApiError> {
    let drinks = state.drinks.list_all().await?;
    if drinks.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(drinks)
}

/// Non-integer ids address nothing.
fn drink_id(id: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    id.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!("Unroutable drink id: {}", rejection);
        ApiError::NotFound
    })
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    tracing::debug!("Unreadable request body: {}", rejection);
    ApiError::BadRequest
}
