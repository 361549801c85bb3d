//! HTTP routes
//!
//! Protected handlers check in a fixed order: bearer token, then role, then
//! the request's own path, query and body. Extractor rejections are therefore
//! taken as `Result`s and only inspected after the gate has admitted the
//! caller.

use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use pricebook_lakehouse::{
    Item, ItemFields, Operation, Principal, Role, SearchPage, SearchParams, SearchQuery, UserRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserRecord,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Build the application router with CORS, tracing and a request timeout
pub fn router(state: AppState, cors_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(health_check))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/items", post(create_item).get(list_items))
        .route("/items/search", get(search_items))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ─── Helpers ───

fn admit(state: &AppState, headers: &HeaderMap, operation: Operation) -> ApiResult<Principal> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default());
    Ok(state.gate.admit(authorization, operation)?)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::MalformedRequest(rejection.body_text()))
}

fn item_id(path: Result<Path<u64>, PathRejection>) -> ApiResult<u64> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::MalformedRequest("item id must be a non-negative integer".into()))
}

// ─── Handlers ───

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = body(payload)?;
    let role = request
        .role
        .filter(|r| !r.is_empty())
        .map(|r| Role::parse(&r))
        .unwrap_or_default();

    let (user, token) = state
        .auth
        .register(request.username, request.password, role)
        .await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user, token })))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let request = body(payload)?;
    let (token, _) = state.auth.login(request.username, request.password).await?;
    Ok(Json(LoginResponse { token }))
}

async fn create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ItemFields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let principal = admit(&state, &headers, Operation::CreateItem)?;
    let fields = body(payload)?;

    let item = state.items.create(fields).await?;
    info!(user_id = principal.user_id, item_id = item.id, "Item created via API");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_items(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Item>>> {
    admit(&state, &headers, Operation::ListItems)?;
    Ok(Json(state.items.list().await?))
}

async fn get_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<Item>> {
    admit(&state, &headers, Operation::GetItem)?;
    let id = item_id(path)?;
    Ok(Json(state.items.get(id).await?))
}

async fn search_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<SearchPage>> {
    admit(&state, &headers, Operation::SearchItems)?;
    let Query(params) = query.map_err(|rejection| ApiError::MalformedRequest(rejection.body_text()))?;

    let page = state.items.search(SearchQuery::from_params(params)?).await?;
    Ok(Json(page))
}

async fn update_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<ItemFields>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let principal = admit(&state, &headers, Operation::UpdateItem)?;
    let id = item_id(path)?;
    let fields = body(payload)?;

    state.items.update(id, fields).await?;
    info!(user_id = principal.user_id, item_id = id, "Item updated via API");
    Ok(Json(json!({ "message": "Item updated successfully" })))
}

async fn delete_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let principal = admit(&state, &headers, Operation::DeleteItem)?;
    let id = item_id(path)?;

    state.items.delete(id).await?;
    info!(user_id = principal.user_id, item_id = id, "Item deleted via API");
    Ok(Json(json!({ "message": "Item deleted successfully" })))
}
