use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "0.3.0",
        description = r#"
# Stockroom Inventory & Purchase Order API

Back-office API for a single merchant: per-product stock ledger with
moving-average cost, reorder suggestions, and the supplier purchase order
lifecycle from draft through approval, receiving and payment.

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default 20).

## Error Handling

Failures use a consistent envelope with appropriate HTTP status codes:

```json
{
  "error": "Unprocessable Entity",
  "message": "Insufficient stock: ...",
  "timestamp": "2026-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "stock", description = "Stock ledger endpoints"),
        (name = "reorder", description = "Reorder suggestion endpoints"),
        (name = "purchase-orders", description = "Purchase order lifecycle endpoints"),
        (name = "suppliers", description = "Supplier master data endpoints")
    ),
    paths(
        // Stock ledger
        crate::handlers::inventory::list_stock_entries,
        crate::handlers::inventory::get_stock_entry,
        crate::handlers::inventory::list_stock_movements,
        crate::handlers::inventory::update_stock,
        crate::handlers::inventory::reserve_stock,
        crate::handlers::inventory::release_reserved_stock,
        crate::handlers::inventory::perform_stock_count,
        crate::handlers::inventory::set_stock_levels,
        crate::handlers::inventory::set_discontinued,
        crate::handlers::inventory::check_reorder_needed,

        // Reorder
        crate::handlers::inventory::list_low_stock,
        crate::handlers::inventory::list_reorder_candidates,
        crate::handlers::inventory::list_reorder_suggestions,

        // Purchase orders
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::get_purchase_order_by_number,
        crate::handlers::purchase_orders::update_purchase_order,
        crate::handlers::purchase_orders::approve_purchase_order,
        crate::handlers::purchase_orders::reject_purchase_order,
        crate::handlers::purchase_orders::acknowledge_purchase_order,
        crate::handlers::purchase_orders::receive_items,
        crate::handlers::purchase_orders::cancel_purchase_order,
        crate::handlers::purchase_orders::close_purchase_order,
        crate::handlers::purchase_orders::record_payment,

        // Suppliers
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::deactivate_supplier,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,

            // Stock ledger types
            crate::handlers::inventory::StockUpdateRequest,
            crate::handlers::inventory::ReservationRequest,
            crate::handlers::inventory::StockCountRequest,
            crate::handlers::inventory::StockLevelsRequest,
            crate::handlers::inventory::DiscontinueRequest,

            // Purchase order types
            crate::handlers::purchase_orders::CreatePurchaseOrderRequest,
            crate::handlers::purchase_orders::PurchaseOrderLineRequest,
            crate::handlers::purchase_orders::UpdatePurchaseOrderRequest,
            crate::handlers::purchase_orders::ApprovePurchaseOrderRequest,
            crate::handlers::purchase_orders::RejectPurchaseOrderRequest,
            crate::handlers::purchase_orders::AcknowledgePurchaseOrderRequest,
            crate::handlers::purchase_orders::ReceiveItemsRequest,
            crate::handlers::purchase_orders::ReceiptLineRequest,
            crate::handlers::purchase_orders::CancelPurchaseOrderRequest,
            crate::handlers::purchase_orders::ClosePurchaseOrderRequest,
            crate::handlers::purchase_orders::RecordPaymentRequest,

            // Supplier types
            crate::handlers::suppliers::SupplierRequest,

            // Reorder types
            crate::services::reorder::ReorderSuggestion,
            crate::services::reorder::Urgency,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_router() -> Router<AppState> {
    Router::new().merge(
        SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDocV1::openapi())
            .config(
                utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true),
            ),
    )
}
