use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    entities::stock_movement::MovementDirection,
    errors::ApiError,
    handlers::AppState,
    services::stock_ledger::{StockLevelsInput, StockUpdateInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Request and response DTOs

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct StockUpdateRequest {
    /// "in" or "out"
    #[schema(value_type = String)]
    pub direction: MovementDirection,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(length(min = 1, message = "Reference is required"))]
    pub reference: String,
    pub unit_cost: Option<Decimal>,
    pub reason: Option<String>,
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReservationRequest {
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct StockCountRequest {
    #[validate(range(min = 0))]
    pub counted_quantity: i32,
    pub counted_by: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct StockLevelsRequest {
    #[validate(range(min = 0))]
    pub min_stock_level: i32,
    #[validate(range(min = 0))]
    pub max_stock_level: i32,
    #[validate(range(min = 0))]
    pub reorder_level: i32,
    #[validate(range(min = 0))]
    pub reorder_quantity: i32,
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DiscontinueRequest {
    pub discontinued: bool,
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LowStockParams {
    #[serde(default = "default_low_stock_limit")]
    pub limit: u64,
}

fn default_low_stock_limit() -> u64 {
    50
}

// Handler functions

/// List stock ledger entries
#[utoipa::path(
    get,
    path = "/api/v1/stock",
    params(PaginationParams),
    responses(
        (status = 200, description = "Stock entries fetched", body = serde_json::Value)
    ),
    tag = "stock"
)]
pub async fn list_stock_entries(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (entries, total) = state
        .services
        .stock_ledger
        .list_entries(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        entries,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get the stock entry for a product
#[utoipa::path(
    get,
    path = "/api/v1/stock/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Stock entry fetched", body = serde_json::Value),
        (status = 404, description = "Stock entry not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn get_stock_entry(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let entry = state
        .services
        .stock_ledger
        .get_entry(product_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(entry))
}

/// Movement history for a product
#[utoipa::path(
    get,
    path = "/api/v1/stock/{product_id}/movements",
    params(
        ("product_id" = Uuid, Path, description = "Product ID"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Movements fetched", body = serde_json::Value)
    ),
    tag = "stock"
)]
pub async fn list_stock_movements(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (movements, total) = state
        .services
        .stock_ledger
        .list_movements(product_id, pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        movements,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Record a physical stock movement
#[utoipa::path(
    post,
    path = "/api/v1/stock/{product_id}/movements",
    request_body = StockUpdateRequest,
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 201, description = "Stock updated", body = serde_json::Value),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn update_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<StockUpdateRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let entry = state
        .services
        .stock_ledger
        .update_stock(StockUpdateInput {
            product_id,
            quantity: payload.quantity,
            direction: payload.direction,
            reference: payload.reference,
            unit_cost: payload.unit_cost,
            reason: payload.reason,
            performed_by: payload.performed_by,
        })
        .await
        .map_err(map_service_error)?;

    info!("Stock updated for product {}", product_id);
    Ok(created_response(entry))
}

/// Reserve stock for pending fulfillment
#[utoipa::path(
    post,
    path = "/api/v1/stock/{product_id}/reserve",
    request_body = ReservationRequest,
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Stock reserved", body = serde_json::Value),
        (status = 422, description = "Insufficient available stock", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn reserve_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<ReservationRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let entry = state
        .services
        .stock_ledger
        .reserve_stock(product_id, payload.quantity, payload.performed_by)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(entry))
}

/// Release previously reserved stock
#[utoipa::path(
    post,
    path = "/api/v1/stock/{product_id}/release",
    request_body = ReservationRequest,
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Reservation released", body = serde_json::Value)
    ),
    tag = "stock"
)]
pub async fn release_reserved_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<ReservationRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let entry = state
        .services
        .stock_ledger
        .release_reserved_stock(product_id, payload.quantity, payload.performed_by)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(entry))
}

/// Record a physical stock count
#[utoipa::path(
    post,
    path = "/api/v1/stock/{product_id}/count",
    request_body = StockCountRequest,
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Count recorded", body = serde_json::Value),
        (status = 404, description = "Stock entry not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn perform_stock_count(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<StockCountRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let entry = state
        .services
        .stock_ledger
        .perform_stock_count(product_id, payload.counted_quantity, payload.counted_by)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(entry))
}

/// Set replenishment thresholds for a product
#[utoipa::path(
    put,
    path = "/api/v1/stock/{product_id}/levels",
    request_body = StockLevelsRequest,
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Levels updated", body = serde_json::Value),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn set_stock_levels(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<StockLevelsRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let entry = state
        .services
        .stock_ledger
        .set_stock_levels(StockLevelsInput {
            product_id,
            min_stock_level: payload.min_stock_level,
            max_stock_level: payload.max_stock_level,
            reorder_level: payload.reorder_level,
            reorder_quantity: payload.reorder_quantity,
            performed_by: payload.performed_by,
        })
        .await
        .map_err(map_service_error)?;
    Ok(success_response(entry))
}

/// Flag or unflag a product as discontinued
#[utoipa::path(
    post,
    path = "/api/v1/stock/{product_id}/discontinue",
    request_body = DiscontinueRequest,
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Status updated", body = serde_json::Value),
        (status = 404, description = "Stock entry not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn set_discontinued(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<DiscontinueRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let entry = state
        .services
        .stock_ledger
        .set_discontinued(product_id, payload.discontinued, payload.performed_by)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(entry))
}

/// Check whether a product has fallen to its reorder level
#[utoipa::path(
    get,
    path = "/api/v1/stock/{product_id}/reorder-needed",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Reorder check", body = serde_json::Value),
        (status = 404, description = "Stock entry not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn check_reorder_needed(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let needed = state
        .services
        .stock_ledger
        .check_reorder_needed(product_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(serde_json::json!({
        "product_id": product_id,
        "reorder_needed": needed
    })))
}

/// Entries currently low or out of stock
#[utoipa::path(
    get,
    path = "/api/v1/reorder/low-stock",
    responses(
        (status = 200, description = "Low stock entries", body = serde_json::Value)
    ),
    tag = "reorder"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    Query(params): Query<LowStockParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let entries = state
        .services
        .reorder
        .list_low_stock(params.limit)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(entries))
}

/// Entries at or below their reorder level
#[utoipa::path(
    get,
    path = "/api/v1/reorder/candidates",
    responses(
        (status = 200, description = "Reorder candidates", body = serde_json::Value)
    ),
    tag = "reorder"
)]
pub async fn list_reorder_candidates(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let entries = state
        .services
        .reorder
        .list_reorder_candidates()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(entries))
}

/// Purchase suggestions for every reorder candidate
#[utoipa::path(
    get,
    path = "/api/v1/reorder/suggestions",
    responses(
        (status = 200, description = "Reorder suggestions", body = serde_json::Value)
    ),
    tag = "reorder"
)]
pub async fn list_reorder_suggestions(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let suggestions = state
        .services
        .reorder
        .suggest()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(suggestions))
}

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stock_entries))
        .route("/:product_id", get(get_stock_entry))
        .route(
            "/:product_id/movements",
            get(list_stock_movements).post(update_stock),
        )
        .route("/:product_id/reserve", post(reserve_stock))
        .route("/:product_id/release", post(release_reserved_stock))
        .route("/:product_id/count", post(perform_stock_count))
        .route("/:product_id/levels", put(set_stock_levels))
        .route("/:product_id/discontinue", post(set_discontinued))
        .route("/:product_id/reorder-needed", get(check_reorder_needed))
}

pub fn reorder_routes() -> Router<AppState> {
    Router::new()
        .route("/low-stock", get(list_low_stock))
        .route("/candidates", get(list_reorder_candidates))
        .route("/suggestions", get(list_reorder_suggestions))
}
