use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    entities::purchase_order::PurchaseOrderStatus,
    errors::ApiError,
    handlers::AppState,
    services::purchase_orders::{
        CreatePurchaseOrderInput, PurchaseOrderLineInput, ReceiveLineInput,
        UpdatePurchaseOrderInput,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Request and response DTOs

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseOrderLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
    /// Percentage GST rate for the line
    #[serde(default)]
    pub tax_rate: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderRequest {
    pub supplier_id: Uuid,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    /// True for inter-state supply (IGST); false splits tax into CGST+SGST
    #[serde(default)]
    pub inter_state: bool,
    pub payment_terms: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 365))]
    pub credit_days: i32,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    #[validate(length(min = 1, message = "At least one line is required"))]
    pub lines: Vec<PurchaseOrderLineRequest>,
}

/// Draft-only edit. Omitting a nullable field keeps the stored value;
/// sending an explicit `null` clears it.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub expected_delivery_date: Option<Option<DateTime<Utc>>>,
    pub inter_state: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub payment_terms: Option<Option<String>>,
    #[validate(range(min = 0, max = 365))]
    pub credit_days: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    pub updated_by: Option<Uuid>,
    pub lines: Option<Vec<PurchaseOrderLineRequest>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApprovePurchaseOrderRequest {
    pub approved_by: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RejectPurchaseOrderRequest {
    pub rejected_by: Uuid,
    #[validate(length(min = 1, max = 500, message = "Rejection reason is required"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AcknowledgePurchaseOrderRequest {
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReceiveItemsRequest {
    pub received_by: Option<Uuid>,
    #[validate(length(min = 1, message = "At least one receipt line is required"))]
    pub items: Vec<ReceiptLineRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReceiptLineRequest {
    pub line_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CancelPurchaseOrderRequest {
    #[validate(length(min = 1, max = 500, message = "Cancellation reason is required"))]
    pub reason: String,
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClosePurchaseOrderRequest {
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseOrderListParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    pub status: Option<String>,
    pub supplier_id: Option<Uuid>,
}

fn to_line_inputs(lines: Vec<PurchaseOrderLineRequest>) -> Vec<PurchaseOrderLineInput> {
    lines
        .into_iter()
        .map(|line| PurchaseOrderLineInput {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            tax_rate: line.tax_rate,
        })
        .collect()
}

// Handler functions

/// Create a new purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = CreatePurchaseOrderRequest,
    responses(
        (status = 201, description = "Purchase order created", body = serde_json::Value),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supplier or product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    Json(payload): Json<CreatePurchaseOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let details = state
        .services
        .purchase_orders
        .create_purchase_order(CreatePurchaseOrderInput {
            supplier_id: payload.supplier_id,
            expected_delivery_date: payload.expected_delivery_date,
            inter_state: payload.inter_state,
            payment_terms: payload.payment_terms,
            credit_days: payload.credit_days,
            notes: payload.notes,
            created_by: payload.created_by,
            lines: to_line_inputs(payload.lines),
        })
        .await
        .map_err(map_service_error)?;

    info!("Purchase order created: {}", details.order.po_number);
    Ok(created_response(details))
}

/// List purchase orders
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(PaginationParams),
    responses(
        (status = 200, description = "Purchase orders fetched", body = serde_json::Value)
    ),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(params): Query<PurchaseOrderListParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(PurchaseOrderStatus::from_str(raw).map_err(|_| {
            ApiError::ValidationError(format!("Unknown purchase order status '{}'", raw))
        })?),
        None => None,
    };

    let (orders, total) = state
        .services
        .purchase_orders
        .list_purchase_orders(
            params.pagination.page,
            params.pagination.per_page,
            status,
            params.supplier_id,
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        orders,
        params.pagination.page,
        params.pagination.per_page,
        total,
    )))
}

/// Get a purchase order by ID
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Purchase order ID")
    ),
    responses(
        (status = 200, description = "Purchase order fetched", body = serde_json::Value),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let details = state
        .services
        .purchase_orders
        .get_purchase_order(po_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(details))
}

/// Get a purchase order by its number
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/number/{po_number}",
    params(
        ("po_number" = String, Path, description = "Purchase order number")
    ),
    responses(
        (status = 200, description = "Purchase order fetched", body = serde_json::Value),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order_by_number(
    State(state): State<AppState>,
    Path(po_number): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let details = state
        .services
        .purchase_orders
        .get_by_number(&po_number)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(details))
}

/// Update a draft purchase order
#[utoipa::path(
    put,
    path = "/api/v1/purchase-orders/{id}",
    request_body = UpdatePurchaseOrderRequest,
    params(
        ("id" = Uuid, Path, description = "Purchase order ID")
    ),
    responses(
        (status = 200, description = "Purchase order updated", body = serde_json::Value),
        (status = 400, description = "Not a draft", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<Uuid>,
    Json(payload): Json<UpdatePurchaseOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let details = state
        .services
        .purchase_orders
        .update_purchase_order(
            po_id,
            UpdatePurchaseOrderInput {
                expected_delivery_date: payload.expected_delivery_date,
                inter_state: payload.inter_state,
                payment_terms: payload.payment_terms,
                credit_days: payload.credit_days,
                notes: payload.notes,
                updated_by: payload.updated_by,
                lines: payload.lines.map(to_line_inputs),
            },
        )
        .await
        .map_err(map_service_error)?;

    info!("Purchase order updated: {}", details.order.po_number);
    Ok(success_response(details))
}

/// Approve a purchase order and mark it sent
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/approve",
    request_body = ApprovePurchaseOrderRequest,
    params(
        ("id" = Uuid, Path, description = "Purchase order ID")
    ),
    responses(
        (status = 200, description = "Purchase order approved", body = serde_json::Value),
        (status = 400, description = "Not pending approval", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn approve_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<Uuid>,
    Json(payload): Json<ApprovePurchaseOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .approve(po_id, payload.approved_by)
        .await
        .map_err(map_service_error)?;

    info!("Purchase order approved: {}", order.po_number);
    Ok(success_response(order))
}

/// Reject a purchase order's approval request
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/reject",
    request_body = RejectPurchaseOrderRequest,
    params(
        ("id" = Uuid, Path, description = "Purchase order ID")
    ),
    responses(
        (status = 200, description = "Purchase order rejected", body = serde_json::Value),
        (status = 400, description = "Not pending approval", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn reject_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<Uuid>,
    Json(payload): Json<RejectPurchaseOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .purchase_orders
        .reject(po_id, payload.reason, payload.rejected_by)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Mark a sent purchase order as acknowledged by the supplier
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/acknowledge",
    request_body = AcknowledgePurchaseOrderRequest,
    params(
        ("id" = Uuid, Path, description = "Purchase order ID")
    ),
    responses(
        (status = 200, description = "Purchase order acknowledged", body = serde_json::Value),
        (status = 400, description = "Not a sent order", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn acknowledge_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<Uuid>,
    Json(payload): Json<AcknowledgePurchaseOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .acknowledge(po_id, payload.performed_by)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Record goods received against a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/receive",
    request_body = ReceiveItemsRequest,
    params(
        ("id" = Uuid, Path, description = "Purchase order ID")
    ),
    responses(
        (status = 200, description = "Receipt recorded", body = serde_json::Value),
        (status = 400, description = "Order not receivable", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn receive_items(
    State(state): State<AppState>,
    Path(po_id): Path<Uuid>,
    Json(payload): Json<ReceiveItemsRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let receipts = payload
        .items
        .into_iter()
        .map(|item| ReceiveLineInput {
            line_id: item.line_id,
            quantity: item.quantity,
        })
        .collect();

    let (details, warnings) = state
        .services
        .purchase_orders
        .receive_items(po_id, receipts, payload.received_by)
        .await
        .map_err(map_service_error)?;

    info!(
        "Receipt recorded for purchase order {} ({} warnings)",
        details.order.po_number,
        warnings.len()
    );
    Ok(success_response(serde_json::json!({
        "order": details.order,
        "lines": details.lines,
        "warnings": warnings
    })))
}

/// Cancel a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/cancel",
    request_body = CancelPurchaseOrderRequest,
    params(
        ("id" = Uuid, Path, description = "Purchase order ID")
    ),
    responses(
        (status = 200, description = "Purchase order cancelled", body = serde_json::Value),
        (status = 400, description = "Already terminal", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<Uuid>,
    Json(payload): Json<CancelPurchaseOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .purchase_orders
        .cancel(po_id, payload.reason, payload.performed_by)
        .await
        .map_err(map_service_error)?;

    info!("Purchase order cancelled: {}", order.po_number);
    Ok(success_response(order))
}

/// Close a completed purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/close",
    request_body = ClosePurchaseOrderRequest,
    params(
        ("id" = Uuid, Path, description = "Purchase order ID")
    ),
    responses(
        (status = 200, description = "Purchase order closed", body = serde_json::Value),
        (status = 400, description = "Not completed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn close_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<Uuid>,
    Json(payload): Json<ClosePurchaseOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .close(po_id, payload.performed_by)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Record a payment against a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/payments",
    request_body = RecordPaymentRequest,
    params(
        ("id" = Uuid, Path, description = "Purchase order ID")
    ),
    responses(
        (status = 200, description = "Payment recorded", body = serde_json::Value),
        (status = 400, description = "Invalid amount", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(po_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .record_payment(po_id, payload.amount, payload.performed_by)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_purchase_order).get(list_purchase_orders),
        )
        .route(
            "/:id",
            get(get_purchase_order).put(update_purchase_order),
        )
        .route("/number/:po_number", get(get_purchase_order_by_number))
        .route("/:id/approve", post(approve_purchase_order))
        .route("/:id/reject", post(reject_purchase_order))
        .route("/:id/acknowledge", post(acknowledge_purchase_order))
        .route("/:id/receive", post(receive_items))
        .route("/:id/cancel", post(cancel_purchase_order))
        .route("/:id/close", post(close_purchase_order))
        .route("/:id/payments", post(record_payment))
}
