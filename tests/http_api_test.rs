mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn status_and_health_endpoints_respond() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["service"], json!("stockroom-api"));

    let response = app.request(Method::GET, "/api/v1/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["data"]["database"], json!("healthy"));
}

#[tokio::test]
async fn supplier_crud_over_http() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({
                "name": "Meridian Metals",
                "email": "orders@meridian.example",
                "credit_days": 45
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["name"], json!("Meridian Metals"));
    let supplier_id = body["id"].as_str().unwrap().to_string();

    let response = app
        .request(Method::GET, &format!("/api/v1/suppliers/{}", supplier_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["name"], json!("Meridian Metals"));

    let response = app
        .request(Method::GET, "/api/v1/suppliers?active_only=true", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["pagination"]["total"], json!(1));
    assert_eq!(body["data"][0]["id"].as_str().unwrap(), supplier_id);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/suppliers/{}", supplier_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["is_active"], json!(false));
}

#[tokio::test]
async fn invalid_supplier_payload_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({
                "name": "",
                "email": "not-an-email"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_resources_return_404() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/stock/00000000-0000-0000-0000-000000000000",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(
            Method::GET,
            "/api/v1/purchase-orders/00000000-0000-0000-0000-000000000000",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stock_movements_over_http() {
    let app = TestApp::new().await;
    let product = app.seed_product("HTTP-WIDGET").await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/stock/{}/movements", product.id),
            Some(json!({
                "direction": "in",
                "quantity": 15,
                "reference": "GRN-1",
                "unit_cost": "3.50"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["current_stock"], json!(15));
    assert_eq!(body["stock_status"], json!("in_stock"));

    // Draining more than on hand maps to 422
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/stock/{}/movements", product.id),
            Some(json!({
                "direction": "out",
                "quantity": 99,
                "reference": "SALE-1"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/stock/{}/movements", product.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["pagination"]["total"], json!(1));
    assert_eq!(body["data"][0]["direction"], json!("in"));
}

#[tokio::test]
async fn purchase_order_lifecycle_over_http() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("HTTP Traders").await;
    let product = app.seed_product("HTTP-PART").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "supplier_id": supplier.id,
                "inter_state": false,
                "credit_days": 30,
                "lines": [
                    { "product_id": product.id, "quantity": 10, "unit_price": "100", "tax_rate": "18" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = TestApp::body_json(response).await;
    let po_id = body["order"]["id"].as_str().unwrap().to_string();
    let line_id = body["lines"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(body["order"]["status"], json!("draft"));

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/purchase-orders/{}/approve", po_id),
            Some(json!({ "approved_by": uuid::Uuid::new_v4() })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["status"], json!("sent"));

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/purchase-orders/{}/receive", po_id),
            Some(json!({
                "items": [ { "line_id": line_id, "quantity": 10 } ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["order"]["status"], json!("completed"));
    assert_eq!(body["warnings"], json!([]));

    // The receipt landed in the stock ledger
    let response = app
        .request(Method::GET, &format!("/api/v1/stock/{}", product.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["current_stock"], json!(10));

    // Listing filters by status
    let response = app
        .request(Method::GET, "/api/v1/purchase-orders?status=completed", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["pagination"]["total"], json!(1));

    let response = app
        .request(Method::GET, "/api/v1/purchase-orders?status=bogus", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert!(body["paths"]["/api/v1/purchase-orders"].is_object());
    assert!(body["paths"]["/api/v1/stock/{product_id}/movements"].is_object());
}
