mod common;

use chrono::{Datelike, Utc};
use common::TestApp;
use rust_decimal_macros::dec;
use stockroom_api::{
    entities::purchase_order::{ApprovalStatus, PaymentStatus, PurchaseOrderStatus},
    entities::purchase_order_line::LineStatus,
    errors::ServiceError,
    services::purchase_orders::{
        CreatePurchaseOrderInput, PurchaseOrderLineInput, ReceiveLineInput,
        UpdatePurchaseOrderInput,
    },
};
use uuid::Uuid;

fn po_input(
    supplier_id: Uuid,
    lines: Vec<PurchaseOrderLineInput>,
    inter_state: bool,
) -> CreatePurchaseOrderInput {
    CreatePurchaseOrderInput {
        supplier_id,
        expected_delivery_date: Some(Utc::now() + chrono::Duration::days(14)),
        inter_state,
        payment_terms: Some("Net 30".to_string()),
        credit_days: 30,
        notes: None,
        created_by: None,
        lines,
    }
}

fn line(product_id: Uuid, quantity: i32) -> PurchaseOrderLineInput {
    PurchaseOrderLineInput {
        product_id,
        quantity,
        unit_price: dec!(100),
        tax_rate: dec!(18),
    }
}

#[tokio::test]
async fn create_assigns_sequential_numbers_and_computes_pricing() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-1").await;
    let pos = app.state.services.purchase_orders.clone();

    let first = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 10)], false))
        .await
        .unwrap();
    let second = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 1)], false))
        .await
        .unwrap();

    let year = Utc::now().year();
    assert_eq!(first.order.po_number, format!("{}0001", year));
    assert_eq!(second.order.po_number, format!("{}0002", year));

    // 10 * 100 = 1000, 18% GST split into CGST and SGST
    assert_eq!(first.order.subtotal, dec!(1000));
    assert_eq!(first.order.cgst_amount, dec!(90));
    assert_eq!(first.order.sgst_amount, dec!(90));
    assert_eq!(first.order.igst_amount, dec!(0));
    assert_eq!(first.order.total_amount, dec!(1180));
    assert_eq!(first.order.balance_amount, dec!(1180));
    assert_eq!(first.order.status, PurchaseOrderStatus::Draft);
    assert_eq!(first.order.approval_status, ApprovalStatus::Pending);
    assert_eq!(first.lines.len(), 1);
    assert_eq!(first.lines[0].status, LineStatus::Pending);

    // Creation bumps the supplier's order counter
    let supplier = app
        .state
        .services
        .suppliers
        .get_supplier(supplier.id)
        .await
        .unwrap();
    assert_eq!(supplier.total_orders, 2);
}

#[tokio::test]
async fn inter_state_order_books_igst() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Out Of State Traders").await;
    let product = app.seed_product("PART-2").await;

    let details = app
        .state
        .services
        .purchase_orders
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 10)], true))
        .await
        .unwrap();
    assert_eq!(details.order.cgst_amount, dec!(0));
    assert_eq!(details.order.sgst_amount, dec!(0));
    assert_eq!(details.order.igst_amount, dec!(180));
    assert_eq!(details.order.total_amount, dec!(1180));
}

#[tokio::test]
async fn create_rejects_unknown_references_and_empty_lines() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-3").await;
    let pos = app.state.services.purchase_orders.clone();

    let err = pos
        .create_purchase_order(po_input(Uuid::new_v4(), vec![line(product.id, 1)], false))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = pos
        .create_purchase_order(po_input(supplier.id, vec![line(Uuid::new_v4(), 1)], false))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = pos
        .create_purchase_order(po_input(supplier.id, vec![], false))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn approval_moves_draft_to_sent() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-4").await;
    let pos = app.state.services.purchase_orders.clone();
    let approver = Uuid::new_v4();

    let details = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 5)], false))
        .await
        .unwrap();

    let order = pos.approve(details.order.id, approver).await.unwrap();
    assert_eq!(order.status, PurchaseOrderStatus::Sent);
    assert_eq!(order.approval_status, ApprovalStatus::Approved);
    assert_eq!(order.approved_by, Some(approver));
    assert!(order.sent_at.is_some());

    // Approval is single-shot
    let err = pos.approve(details.order.id, approver).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStateTransition(_)));
}

#[tokio::test]
async fn acknowledgement_requires_a_sent_order() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-ACK").await;
    let pos = app.state.services.purchase_orders.clone();

    let details = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 5)], false))
        .await
        .unwrap();

    let err = pos.acknowledge(details.order.id, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStateTransition(_)));

    pos.approve(details.order.id, Uuid::new_v4()).await.unwrap();
    let order = pos.acknowledge(details.order.id, None).await.unwrap();
    assert_eq!(order.status, PurchaseOrderStatus::Acknowledged);

    // Acknowledged orders can still receive goods
    let (after, _) = pos
        .receive_items(
            details.order.id,
            vec![ReceiveLineInput {
                line_id: details.lines[0].id,
                quantity: 2,
            }],
            None,
        )
        .await
        .unwrap();
    assert_eq!(after.order.status, PurchaseOrderStatus::Partial);
}

#[tokio::test]
async fn rejection_leaves_lifecycle_status_alone() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-5").await;
    let pos = app.state.services.purchase_orders.clone();

    let details = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 5)], false))
        .await
        .unwrap();

    let order = pos
        .reject(details.order.id, "over budget".to_string(), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(order.approval_status, ApprovalStatus::Rejected);
    assert_eq!(order.status, PurchaseOrderStatus::Draft);
    assert_eq!(order.rejection_reason, Some("over budget".to_string()));
}

#[tokio::test]
async fn updates_are_draft_only() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-6").await;
    let pos = app.state.services.purchase_orders.clone();

    let details = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 5)], false))
        .await
        .unwrap();

    // Replacing the lines recomputes pricing
    let updated = pos
        .update_purchase_order(
            details.order.id,
            UpdatePurchaseOrderInput {
                lines: Some(vec![PurchaseOrderLineInput {
                    product_id: product.id,
                    quantity: 2,
                    unit_price: dec!(50),
                    tax_rate: dec!(0),
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.order.subtotal, dec!(100));
    assert_eq!(updated.order.total_amount, dec!(100));
    assert_eq!(updated.lines.len(), 1);
    assert_eq!(updated.lines[0].quantity, 2);

    pos.approve(details.order.id, Uuid::new_v4()).await.unwrap();
    let err = pos
        .update_purchase_order(
            details.order.id,
            UpdatePurchaseOrderInput {
                notes: Some(Some("too late".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStateTransition(_)));
}

#[tokio::test]
async fn draft_update_can_clear_nullable_fields() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-6B").await;
    let pos = app.state.services.purchase_orders.clone();

    let mut input = po_input(supplier.id, vec![line(product.id, 5)], false);
    input.notes = Some("rush order".to_string());
    let details = pos.create_purchase_order(input).await.unwrap();
    assert!(details.order.notes.is_some());
    assert!(details.order.expected_delivery_date.is_some());

    // Untouched fields keep their values; explicit nulls clear them
    let updated = pos
        .update_purchase_order(
            details.order.id,
            UpdatePurchaseOrderInput {
                notes: Some(None),
                expected_delivery_date: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.order.notes, None);
    assert_eq!(updated.order.expected_delivery_date, None);
    assert_eq!(updated.order.payment_terms, Some("Net 30".to_string()));
    assert_eq!(updated.order.credit_days, 30);
}

#[tokio::test]
async fn partial_then_full_receipt_completes_the_order() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-7").await;
    let pos = app.state.services.purchase_orders.clone();
    let ledger = app.state.services.stock_ledger.clone();

    let details = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 10)], false))
        .await
        .unwrap();
    pos.approve(details.order.id, Uuid::new_v4()).await.unwrap();
    let line_id = details.lines[0].id;

    let (after_first, warnings) = pos
        .receive_items(
            details.order.id,
            vec![ReceiveLineInput {
                line_id,
                quantity: 5,
            }],
            None,
        )
        .await
        .unwrap();
    assert!(warnings.is_empty());
    assert_eq!(after_first.order.status, PurchaseOrderStatus::Partial);
    assert_eq!(after_first.lines[0].status, LineStatus::Partial);
    assert_eq!(after_first.lines[0].received_quantity, 5);
    assert!(after_first.order.first_delivery_at.is_some());
    assert!(after_first.order.completed_at.is_none());

    // Each received unit lands in the ledger at the line's unit price
    let entry = ledger.get_entry(product.id).await.unwrap();
    assert_eq!(entry.current_stock, 5);
    assert_eq!(entry.average_cost, dec!(100));
    assert_eq!(
        entry.last_stock_in_reference,
        Some(after_first.order.po_number.clone())
    );

    let (after_second, warnings) = pos
        .receive_items(
            details.order.id,
            vec![ReceiveLineInput {
                line_id,
                quantity: 5,
            }],
            None,
        )
        .await
        .unwrap();
    assert!(warnings.is_empty());
    assert_eq!(after_second.order.status, PurchaseOrderStatus::Completed);
    assert_eq!(after_second.lines[0].status, LineStatus::Received);
    assert!(after_second.order.completed_at.is_some());
    assert!(after_second.order.actual_delivery_date.is_some());

    let entry = ledger.get_entry(product.id).await.unwrap();
    assert_eq!(entry.current_stock, 10);

    // Completion feeds the supplier rollups
    let supplier = app
        .state
        .services
        .suppliers
        .get_supplier(supplier.id)
        .await
        .unwrap();
    assert_eq!(supplier.completed_orders, 1);
    assert_eq!(supplier.on_time_deliveries, 1);
    assert_eq!(supplier.total_purchases, dec!(1180));
    assert_eq!(supplier.outstanding_amount, dec!(1180));
}

#[tokio::test]
async fn over_receipt_is_capped_and_unknown_lines_are_skipped_with_warnings() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-8").await;
    let pos = app.state.services.purchase_orders.clone();
    let ledger = app.state.services.stock_ledger.clone();

    let details = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 10)], false))
        .await
        .unwrap();
    pos.approve(details.order.id, Uuid::new_v4()).await.unwrap();

    let (after, warnings) = pos
        .receive_items(
            details.order.id,
            vec![
                ReceiveLineInput {
                    line_id: details.lines[0].id,
                    quantity: 25,
                },
                ReceiveLineInput {
                    line_id: Uuid::new_v4(),
                    quantity: 3,
                },
            ],
            None,
        )
        .await
        .unwrap();

    assert_eq!(warnings.len(), 2);
    assert_eq!(after.lines[0].received_quantity, 10);
    assert_eq!(after.order.status, PurchaseOrderStatus::Completed);

    let entry = ledger.get_entry(product.id).await.unwrap();
    assert_eq!(entry.current_stock, 10);
}

#[tokio::test]
async fn re_receiving_a_fully_received_line_is_a_safe_no_op() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product_a = app.seed_product("PART-9A").await;
    let product_b = app.seed_product("PART-9B").await;
    let pos = app.state.services.purchase_orders.clone();
    let ledger = app.state.services.stock_ledger.clone();

    let details = pos
        .create_purchase_order(po_input(
            supplier.id,
            vec![line(product_a.id, 5), line(product_b.id, 10)],
            false,
        ))
        .await
        .unwrap();
    pos.approve(details.order.id, Uuid::new_v4()).await.unwrap();
    let line_a = details.lines[0].id;

    pos.receive_items(
        details.order.id,
        vec![ReceiveLineInput {
            line_id: line_a,
            quantity: 5,
        }],
        None,
    )
    .await
    .unwrap();

    // Same receipt again: capped to zero, nothing changes
    let (after, warnings) = pos
        .receive_items(
            details.order.id,
            vec![ReceiveLineInput {
                line_id: line_a,
                quantity: 5,
            }],
            None,
        )
        .await
        .unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(after.lines[0].received_quantity, 5);
    assert_eq!(after.order.status, PurchaseOrderStatus::Partial);

    let entry = ledger.get_entry(product_a.id).await.unwrap();
    assert_eq!(entry.current_stock, 5);
}

#[tokio::test]
async fn receiving_requires_a_sent_order() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-10").await;
    let pos = app.state.services.purchase_orders.clone();

    let details = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 5)], false))
        .await
        .unwrap();

    let err = pos
        .receive_items(
            details.order.id,
            vec![ReceiveLineInput {
                line_id: details.lines[0].id,
                quantity: 1,
            }],
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStateTransition(_)));
}

#[tokio::test]
async fn cancellation_after_partial_receipt_keeps_received_stock() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-11").await;
    let pos = app.state.services.purchase_orders.clone();
    let ledger = app.state.services.stock_ledger.clone();

    let details = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 10)], false))
        .await
        .unwrap();
    pos.approve(details.order.id, Uuid::new_v4()).await.unwrap();
    pos.receive_items(
        details.order.id,
        vec![ReceiveLineInput {
            line_id: details.lines[0].id,
            quantity: 4,
        }],
        None,
    )
    .await
    .unwrap();

    let order = pos
        .cancel(details.order.id, "supplier folded".to_string(), None)
        .await
        .unwrap();
    assert_eq!(order.status, PurchaseOrderStatus::Cancelled);
    assert!(order.cancelled_at.is_some());

    // Already-received goods stay in inventory
    let entry = ledger.get_entry(product.id).await.unwrap();
    assert_eq!(entry.current_stock, 4);

    let supplier = app
        .state
        .services
        .suppliers
        .get_supplier(supplier.id)
        .await
        .unwrap();
    assert_eq!(supplier.cancelled_orders, 1);

    // Terminal states cannot be cancelled again
    let err = pos
        .cancel(details.order.id, "again".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStateTransition(_)));
}

#[tokio::test]
async fn payments_update_status_and_supplier_financials() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-12").await;
    let pos = app.state.services.purchase_orders.clone();

    let details = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 10)], false))
        .await
        .unwrap();
    pos.approve(details.order.id, Uuid::new_v4()).await.unwrap();
    pos.receive_items(
        details.order.id,
        vec![ReceiveLineInput {
            line_id: details.lines[0].id,
            quantity: 10,
        }],
        None,
    )
    .await
    .unwrap();

    let order = pos
        .record_payment(details.order.id, dec!(500), None)
        .await
        .unwrap();
    assert_eq!(order.paid_amount, dec!(500));
    assert_eq!(order.balance_amount, dec!(680));
    assert_eq!(order.payment_status, PaymentStatus::Partial);

    let order = pos
        .record_payment(details.order.id, dec!(680), None)
        .await
        .unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.balance_amount, dec!(0));

    let err = pos
        .record_payment(details.order.id, dec!(1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let supplier = app
        .state
        .services
        .suppliers
        .get_supplier(supplier.id)
        .await
        .unwrap();
    assert_eq!(supplier.total_payments, dec!(1180));
    assert_eq!(supplier.outstanding_amount, dec!(0));
}

#[tokio::test]
async fn closing_requires_a_completed_order() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Components").await;
    let product = app.seed_product("PART-13").await;
    let pos = app.state.services.purchase_orders.clone();

    let details = pos
        .create_purchase_order(po_input(supplier.id, vec![line(product.id, 2)], false))
        .await
        .unwrap();

    let err = pos.close(details.order.id, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStateTransition(_)));

    pos.approve(details.order.id, Uuid::new_v4()).await.unwrap();
    pos.receive_items(
        details.order.id,
        vec![ReceiveLineInput {
            line_id: details.lines[0].id,
            quantity: 2,
        }],
        None,
    )
    .await
    .unwrap();

    let order = pos.close(details.order.id, None).await.unwrap();
    assert_eq!(order.status, PurchaseOrderStatus::Closed);
}

#[tokio::test]
async fn list_filters_by_status_and_supplier() {
    let app = TestApp::new().await;
    let supplier_a = app.seed_supplier("Supplier A").await;
    let supplier_b = app.seed_supplier("Supplier B").await;
    let product = app.seed_product("PART-14").await;
    let pos = app.state.services.purchase_orders.clone();

    let a = pos
        .create_purchase_order(po_input(supplier_a.id, vec![line(product.id, 1)], false))
        .await
        .unwrap();
    pos.create_purchase_order(po_input(supplier_b.id, vec![line(product.id, 1)], false))
        .await
        .unwrap();
    pos.approve(a.order.id, Uuid::new_v4()).await.unwrap();

    let (drafts, total) = pos
        .list_purchase_orders(1, 10, Some(PurchaseOrderStatus::Draft), None)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(drafts[0].supplier_id, supplier_b.id);

    let (for_a, total) = pos
        .list_purchase_orders(1, 10, None, Some(supplier_a.id))
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(for_a[0].id, a.order.id);

    let by_number = pos.get_by_number(&a.order.po_number).await.unwrap();
    assert_eq!(by_number.order.id, a.order.id);
}
