use crate::{
    db::DbPool,
    entities::purchase_order::{
        self, ApprovalStatus, Entity as PurchaseOrders, PaymentStatus, PurchaseOrderStatus,
    },
    entities::purchase_order_line::{self, Entity as PurchaseOrderLines, LineStatus},
    entities::po_sequence::{self, Entity as PoSequences},
    errors::ServiceError,
    events::{Event, EventSender},
    services::product_catalog::ProductCatalog,
    services::stock_ledger,
    services::suppliers::{
        self, apply_financial_update, apply_performance_update, FinancialKind, PerformanceUpdate,
    },
};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

const MAX_VERSION_RETRIES: u32 = 3;
const MAX_SEQUENCE_RETRIES: u32 = 5;

#[derive(Debug, Clone, serde::Serialize, Validate)]
pub struct PurchaseOrderLineInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub unit_price: Decimal,
    /// Percentage GST rate for the line.
    pub tax_rate: Decimal,
}

#[derive(Debug, Clone, Validate)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: Uuid,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    /// Decides the tax split: IGST when inter-state, CGST+SGST otherwise.
    /// Supplied by the caller, never inferred from addresses.
    pub inter_state: bool,
    pub payment_terms: Option<String>,
    #[validate(range(min = 0, max = 365))]
    pub credit_days: i32,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    #[validate(length(min = 1, message = "At least one line is required"))]
    pub lines: Vec<PurchaseOrderLineInput>,
}

/// Draft-only edit. Replacing the lines recomputes pricing from scratch.
/// For the nullable fields the outer `None` keeps the stored value and
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdatePurchaseOrderInput {
    pub expected_delivery_date: Option<Option<DateTime<Utc>>>,
    pub inter_state: Option<bool>,
    pub payment_terms: Option<Option<String>>,
    #[validate(range(min = 0, max = 365))]
    pub credit_days: Option<i32>,
    pub notes: Option<Option<String>>,
    pub updated_by: Option<Uuid>,
    pub lines: Option<Vec<PurchaseOrderLineInput>>,
}

#[derive(Debug, Clone)]
pub struct ReceiveLineInput {
    pub line_id: Uuid,
    pub quantity: i32,
}

/// A purchase order with its lines, the shape all read paths return.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PurchaseOrderDetails {
    pub order: purchase_order::Model,
    pub lines: Vec<purchase_order_line::Model>,
}

#[derive(Debug, Clone, Copy)]
struct OrderPricing {
    subtotal: Decimal,
    cgst: Decimal,
    sgst: Decimal,
    igst: Decimal,
    total: Decimal,
}

/// Supplier order lifecycle: creation, approval, receiving, cancellation
/// and payment. Receiving feeds the stock ledger in the same transaction.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    catalog: Arc<dyn ProductCatalog>,
}

impl PurchaseOrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            catalog,
        }
    }

    /// Creates a draft order. The PO number is claimed from the year-scoped
    /// sequence inside the creation transaction, so concurrent creators can
    /// never mint duplicates.
    #[instrument(skip(self, input))]
    pub async fn create_purchase_order(
        &self,
        input: CreatePurchaseOrderInput,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        input.validate()?;
        validate_lines(&input.lines)?;
        for line in &input.lines {
            if !self.catalog.exists(line.product_id).await? {
                return Err(ServiceError::NotFound(format!(
                    "Product {}",
                    line.product_id
                )));
            }
        }

        let txn = self.db_pool.begin().await?;
        let supplier = suppliers::require_supplier(&txn, input.supplier_id).await?;
        if !supplier.is_active {
            return Err(ServiceError::ValidationError(format!(
                "Supplier {} is inactive",
                supplier.id
            )));
        }

        let now = Utc::now();
        let po_number = next_po_number(&txn, now.year()).await?;
        let pricing = compute_pricing(&input.lines, input.inter_state);

        let order = purchase_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            po_number: Set(po_number.clone()),
            supplier_id: Set(input.supplier_id),
            po_date: Set(now),
            expected_delivery_date: Set(input.expected_delivery_date),
            actual_delivery_date: Set(None),
            status: Set(PurchaseOrderStatus::Draft),
            approval_status: Set(ApprovalStatus::Pending),
            subtotal: Set(pricing.subtotal),
            cgst_amount: Set(pricing.cgst),
            sgst_amount: Set(pricing.sgst),
            igst_amount: Set(pricing.igst),
            total_amount: Set(pricing.total),
            inter_state: Set(input.inter_state),
            payment_terms: Set(input.payment_terms),
            credit_days: Set(input.credit_days),
            paid_amount: Set(Decimal::ZERO),
            balance_amount: Set(pricing.total),
            payment_status: Set(PaymentStatus::Pending),
            sent_at: Set(None),
            first_delivery_at: Set(None),
            completed_at: Set(None),
            cancelled_at: Set(None),
            cancellation_reason: Set(None),
            approved_by: Set(None),
            approved_at: Set(None),
            rejected_by: Set(None),
            rejection_reason: Set(None),
            notes: Set(input.notes),
            created_by: Set(input.created_by),
            last_updated_by: Set(input.created_by),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let order = order.insert(&txn).await?;
        let lines = insert_lines(&txn, order.id, &input.lines).await?;
        suppliers::record_order_placed(&txn, input.supplier_id).await?;
        txn.commit().await?;

        info!("Created purchase order {}", po_number);
        self.event_sender
            .send_or_log(Event::PurchaseOrderCreated {
                po_id: order.id,
                po_number,
                supplier_id: order.supplier_id,
                total_amount: order.total_amount,
            })
            .await;
        Ok(PurchaseOrderDetails { order, lines })
    }

    /// Edits a draft. Any other status fails with `InvalidStateTransition`;
    /// once sent, an order only changes through receiving or cancellation.
    #[instrument(skip(self, input))]
    pub async fn update_purchase_order(
        &self,
        po_id: Uuid,
        input: UpdatePurchaseOrderInput,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        input.validate()?;
        if let Some(lines) = &input.lines {
            if lines.is_empty() {
                return Err(ServiceError::ValidationError(
                    "At least one line is required".to_string(),
                ));
            }
            validate_lines(lines)?;
            for line in lines {
                if !self.catalog.exists(line.product_id).await? {
                    return Err(ServiceError::NotFound(format!(
                        "Product {}",
                        line.product_id
                    )));
                }
            }
        }

        let txn = self.db_pool.begin().await?;
        let order = require_order(&txn, po_id).await?;
        if order.status != PurchaseOrderStatus::Draft {
            return Err(ServiceError::InvalidStateTransition(format!(
                "Purchase order {} is {:?}; only drafts can be edited",
                order.po_number, order.status
            )));
        }

        let inter_state = input.inter_state.unwrap_or(order.inter_state);
        let lines = match &input.lines {
            Some(line_inputs) => {
                PurchaseOrderLines::delete_many()
                    .filter(purchase_order_line::Column::PurchaseOrderId.eq(po_id))
                    .exec(&txn)
                    .await?;
                Some(insert_lines(&txn, po_id, line_inputs).await?)
            }
            None => None,
        };

        let pricing = match &input.lines {
            Some(line_inputs) => compute_pricing(line_inputs, inter_state),
            None => OrderPricing {
                subtotal: order.subtotal,
                cgst: order.cgst_amount,
                sgst: order.sgst_amount,
                igst: order.igst_amount,
                total: order.total_amount,
            },
        };

        let active = purchase_order::ActiveModel {
            id: Set(order.id),
            expected_delivery_date: Set(input
                .expected_delivery_date
                .unwrap_or(order.expected_delivery_date)),
            inter_state: Set(inter_state),
            payment_terms: Set(input
                .payment_terms
                .unwrap_or_else(|| order.payment_terms.clone())),
            credit_days: Set(input.credit_days.unwrap_or(order.credit_days)),
            notes: Set(input.notes.unwrap_or_else(|| order.notes.clone())),
            subtotal: Set(pricing.subtotal),
            cgst_amount: Set(pricing.cgst),
            sgst_amount: Set(pricing.sgst),
            igst_amount: Set(pricing.igst),
            total_amount: Set(pricing.total),
            balance_amount: Set(pricing.total - order.paid_amount),
            payment_status: Set(PaymentStatus::derive(order.paid_amount, pricing.total)),
            last_updated_by: Set(input.updated_by),
            version: Set(order.version + 1),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if !persist_order_guarded(&txn, &order, active).await? {
            return Err(ServiceError::ConcurrentModification(po_id));
        }

        let order = require_order(&txn, po_id).await?;
        let lines = match lines {
            Some(lines) => lines,
            None => load_lines(&txn, po_id).await?,
        };
        txn.commit().await?;
        Ok(PurchaseOrderDetails { order, lines })
    }

    /// Approves a pending order and marks it sent to the supplier.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        po_id: Uuid,
        approved_by: Uuid,
    ) -> Result<purchase_order::Model, ServiceError> {
        let order = self
            .mutate_order(po_id, |order| {
                if order.approval_status != ApprovalStatus::Pending {
                    return Err(ServiceError::InvalidStateTransition(format!(
                        "Purchase order {} approval is already {:?}",
                        order.po_number, order.approval_status
                    )));
                }
                if order.status.is_terminal() {
                    return Err(ServiceError::InvalidStateTransition(format!(
                        "Purchase order {} is {:?}",
                        order.po_number, order.status
                    )));
                }
                let now = Utc::now();
                Ok(purchase_order::ActiveModel {
                    approval_status: Set(ApprovalStatus::Approved),
                    status: Set(PurchaseOrderStatus::Sent),
                    sent_at: Set(Some(now)),
                    approved_by: Set(Some(approved_by)),
                    approved_at: Set(Some(now)),
                    last_updated_by: Set(Some(approved_by)),
                    ..Default::default()
                })
            })
            .await?;

        self.event_sender
            .send_or_log(Event::PurchaseOrderApproved {
                po_id,
                approved_by,
            })
            .await;
        Ok(order)
    }

    /// Rejects the approval request. The lifecycle status is left alone so
    /// the draft can be corrected and resubmitted.
    #[instrument(skip(self))]
    pub async fn reject(
        &self,
        po_id: Uuid,
        reason: String,
        rejected_by: Uuid,
    ) -> Result<purchase_order::Model, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Rejection reason is required".to_string(),
            ));
        }
        let order = self
            .mutate_order(po_id, |order| {
                if order.approval_status != ApprovalStatus::Pending {
                    return Err(ServiceError::InvalidStateTransition(format!(
                        "Purchase order {} approval is already {:?}",
                        order.po_number, order.approval_status
                    )));
                }
                Ok(purchase_order::ActiveModel {
                    approval_status: Set(ApprovalStatus::Rejected),
                    rejected_by: Set(Some(rejected_by)),
                    rejection_reason: Set(Some(reason.clone())),
                    last_updated_by: Set(Some(rejected_by)),
                    ..Default::default()
                })
            })
            .await?;

        self.event_sender
            .send_or_log(Event::PurchaseOrderRejected { po_id, reason })
            .await;
        Ok(order)
    }

    /// Marks a sent order as acknowledged by the supplier.
    #[instrument(skip(self))]
    pub async fn acknowledge(
        &self,
        po_id: Uuid,
        performed_by: Option<Uuid>,
    ) -> Result<purchase_order::Model, ServiceError> {
        let order = self
            .mutate_order(po_id, |order| {
                if order.status != PurchaseOrderStatus::Sent {
                    return Err(ServiceError::InvalidStateTransition(format!(
                        "Purchase order {} is {:?}; only sent orders can be acknowledged",
                        order.po_number, order.status
                    )));
                }
                Ok(purchase_order::ActiveModel {
                    status: Set(PurchaseOrderStatus::Acknowledged),
                    last_updated_by: Set(performed_by),
                    ..Default::default()
                })
            })
            .await?;

        self.event_sender
            .send_or_log(Event::PurchaseOrderAcknowledged {
                po_id,
                po_number: order.po_number.clone(),
            })
            .await;
        Ok(order)
    }

    /// Records goods arriving against an open order.
    ///
    /// Each receipt line is capped at its pending quantity and unknown or
    /// cancelled line ids are skipped; both show up in the returned warnings
    /// rather than failing the batch. Every unit actually received is fed
    /// into the stock ledger at the line's unit price, inside the same
    /// transaction as the order update.
    #[instrument(skip(self, receipts))]
    pub async fn receive_items(
        &self,
        po_id: Uuid,
        receipts: Vec<ReceiveLineInput>,
        performed_by: Option<Uuid>,
    ) -> Result<(PurchaseOrderDetails, Vec<String>), ServiceError> {
        if receipts.is_empty() {
            return Err(ServiceError::ValidationError(
                "No receipt lines supplied".to_string(),
            ));
        }
        for receipt in &receipts {
            if receipt.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Receipt quantity for line {} must be positive",
                    receipt.line_id
                )));
            }
        }

        let txn = self.db_pool.begin().await?;
        let order = require_order(&txn, po_id).await?;
        if !order.status.can_receive() {
            return Err(ServiceError::InvalidStateTransition(format!(
                "Purchase order {} is {:?}; goods can only be received against a sent order",
                order.po_number, order.status
            )));
        }

        let mut lines = load_lines(&txn, po_id).await?;
        let mut warnings = Vec::new();
        let mut events = Vec::new();
        let mut any_received = false;
        let now = Utc::now();

        for receipt in &receipts {
            let line = match lines.iter_mut().find(|l| l.id == receipt.line_id) {
                Some(line) => line,
                None => {
                    warn!(
                        "Receipt for unknown line {} on purchase order {}",
                        receipt.line_id, order.po_number
                    );
                    warnings.push(format!("Unknown line {} skipped", receipt.line_id));
                    continue;
                }
            };
            if line.status == LineStatus::Cancelled {
                warnings.push(format!("Line {} is cancelled and was skipped", line.line_no));
                continue;
            }

            let pending = line.pending_quantity();
            let applied = receipt.quantity.min(pending);
            if applied < receipt.quantity {
                warnings.push(format!(
                    "Line {}: received quantity capped at {} pending units",
                    line.line_no, pending
                ));
            }
            if applied == 0 {
                continue;
            }

            stock_ledger::stock_in(
                &txn,
                line.product_id,
                applied,
                Some(line.unit_price),
                &order.po_number,
                performed_by,
                &mut events,
            )
            .await?;

            let received = line.received_quantity + applied;
            let status = LineStatus::derive(line.quantity, received, line.status);
            let active = purchase_order_line::ActiveModel {
                id: Set(line.id),
                received_quantity: Set(received),
                status: Set(status),
                updated_at: Set(now),
                ..Default::default()
            };
            active.update(&txn).await?;
            line.received_quantity = received;
            line.status = status;
            any_received = true;
        }

        let open_lines = lines
            .iter()
            .filter(|l| l.status != LineStatus::Cancelled)
            .collect::<Vec<_>>();
        let all_received =
            !open_lines.is_empty() && open_lines.iter().all(|l| l.status == LineStatus::Received);
        let any_line_started = open_lines.iter().any(|l| l.received_quantity > 0);

        let new_status = if all_received {
            PurchaseOrderStatus::Completed
        } else if any_line_started {
            PurchaseOrderStatus::Partial
        } else {
            order.status
        };

        let mut active = purchase_order::ActiveModel {
            id: Set(order.id),
            status: Set(new_status),
            balance_amount: Set(order.total_amount - order.paid_amount),
            payment_status: Set(PaymentStatus::derive(order.paid_amount, order.total_amount)),
            last_updated_by: Set(performed_by),
            version: Set(order.version + 1),
            updated_at: Set(now),
            ..Default::default()
        };
        if any_received && order.first_delivery_at.is_none() {
            active.first_delivery_at = Set(Some(now));
        }
        if new_status == PurchaseOrderStatus::Completed {
            active.completed_at = Set(Some(now));
            active.actual_delivery_date = Set(Some(now));
        }
        if !persist_order_guarded(&txn, &order, active).await? {
            return Err(ServiceError::ConcurrentModification(po_id));
        }

        if new_status == PurchaseOrderStatus::Completed {
            let on_time = order
                .expected_delivery_date
                .map(|expected| now <= expected)
                .unwrap_or(true);
            let delivery_days = (now - order.po_date).num_days().max(0) as i32;
            apply_performance_update(
                &txn,
                order.supplier_id,
                &PerformanceUpdate {
                    is_completed: true,
                    is_on_time: on_time,
                    delivery_days: Some(delivery_days),
                    ..Default::default()
                },
            )
            .await?;
            apply_financial_update(
                &txn,
                order.supplier_id,
                order.total_amount,
                FinancialKind::Purchase,
            )
            .await?;
            events.push(Event::PurchaseOrderCompleted {
                po_id,
                po_number: order.po_number.clone(),
                supplier_id: order.supplier_id,
                completed_at: now,
            });
        } else if any_received {
            events.push(Event::PurchaseOrderPartiallyReceived {
                po_id,
                po_number: order.po_number.clone(),
            });
        }

        let order = require_order(&txn, po_id).await?;
        let lines = load_lines(&txn, po_id).await?;
        txn.commit().await?;

        for event in events {
            self.event_sender.send_or_log(event).await;
        }
        Ok((PurchaseOrderDetails { order, lines }, warnings))
    }

    /// Cancels a non-terminal order. Stock already received stays in the
    /// ledger; cancellation is not a return.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        po_id: Uuid,
        reason: String,
        performed_by: Option<Uuid>,
    ) -> Result<purchase_order::Model, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Cancellation reason is required".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let order = require_order(&txn, po_id).await?;
        if order.status.is_terminal() {
            return Err(ServiceError::InvalidStateTransition(format!(
                "Purchase order {} is already {:?}",
                order.po_number, order.status
            )));
        }

        let now = Utc::now();
        let active = purchase_order::ActiveModel {
            id: Set(order.id),
            status: Set(PurchaseOrderStatus::Cancelled),
            cancelled_at: Set(Some(now)),
            cancellation_reason: Set(Some(reason.clone())),
            last_updated_by: Set(performed_by),
            version: Set(order.version + 1),
            updated_at: Set(now),
            ..Default::default()
        };
        if !persist_order_guarded(&txn, &order, active).await? {
            return Err(ServiceError::ConcurrentModification(po_id));
        }
        apply_performance_update(
            &txn,
            order.supplier_id,
            &PerformanceUpdate {
                is_cancelled: true,
                ..Default::default()
            },
        )
        .await?;
        let order = require_order(&txn, po_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PurchaseOrderCancelled {
                po_id,
                po_number: order.po_number.clone(),
                reason,
            })
            .await;
        Ok(order)
    }

    /// Manual archival of a completed order.
    #[instrument(skip(self))]
    pub async fn close(
        &self,
        po_id: Uuid,
        performed_by: Option<Uuid>,
    ) -> Result<purchase_order::Model, ServiceError> {
        let order = self
            .mutate_order(po_id, |order| {
                if order.status != PurchaseOrderStatus::Completed {
                    return Err(ServiceError::InvalidStateTransition(format!(
                        "Purchase order {} is {:?}; only completed orders can be closed",
                        order.po_number, order.status
                    )));
                }
                Ok(purchase_order::ActiveModel {
                    status: Set(PurchaseOrderStatus::Closed),
                    last_updated_by: Set(performed_by),
                    ..Default::default()
                })
            })
            .await?;

        self.event_sender
            .send_or_log(Event::PurchaseOrderClosed { po_id })
            .await;
        Ok(order)
    }

    /// Records a payment against the order and updates the supplier's
    /// financial rollup in the same transaction.
    #[instrument(skip(self))]
    pub async fn record_payment(
        &self,
        po_id: Uuid,
        amount: Decimal,
        performed_by: Option<Uuid>,
    ) -> Result<purchase_order::Model, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Payment amount must be positive".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let order = require_order(&txn, po_id).await?;
        if order.status == PurchaseOrderStatus::Cancelled {
            return Err(ServiceError::InvalidStateTransition(format!(
                "Purchase order {} is cancelled",
                order.po_number
            )));
        }
        let paid = order.paid_amount + amount;
        if paid > order.total_amount {
            return Err(ServiceError::ValidationError(format!(
                "Payment of {} exceeds the outstanding balance of {}",
                amount, order.balance_amount
            )));
        }

        let balance = order.total_amount - paid;
        let active = purchase_order::ActiveModel {
            id: Set(order.id),
            paid_amount: Set(paid),
            balance_amount: Set(balance),
            payment_status: Set(PaymentStatus::derive(paid, order.total_amount)),
            last_updated_by: Set(performed_by),
            version: Set(order.version + 1),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if !persist_order_guarded(&txn, &order, active).await? {
            return Err(ServiceError::ConcurrentModification(po_id));
        }
        apply_financial_update(&txn, order.supplier_id, amount, FinancialKind::Payment).await?;
        let order = require_order(&txn, po_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PurchaseOrderPaymentRecorded {
                po_id,
                amount,
                balance,
            })
            .await;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn get_purchase_order(
        &self,
        po_id: Uuid,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        let db = &*self.db_pool;
        let order = require_order(db, po_id).await?;
        let lines = load_lines(db, po_id).await?;
        Ok(PurchaseOrderDetails { order, lines })
    }

    #[instrument(skip(self))]
    pub async fn get_by_number(
        &self,
        po_number: &str,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        let db = &*self.db_pool;
        let order = PurchaseOrders::find()
            .filter(purchase_order::Column::PoNumber.eq(po_number))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {}", po_number)))?;
        let lines = load_lines(db, order.id).await?;
        Ok(PurchaseOrderDetails { order, lines })
    }

    /// Paginated listing, newest first, optionally filtered by status
    /// and supplier.
    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        page: u64,
        limit: u64,
        status: Option<PurchaseOrderStatus>,
        supplier_id: Option<Uuid>,
    ) -> Result<(Vec<purchase_order::Model>, u64), ServiceError> {
        let mut query = PurchaseOrders::find().order_by_desc(purchase_order::Column::PoDate);
        if let Some(status) = status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }
        if let Some(supplier_id) = supplier_id {
            query = query.filter(purchase_order::Column::SupplierId.eq(supplier_id));
        }
        let paginator = query.paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((orders, total))
    }

    /// Load-mutate-persist with a bounded retry on version conflicts, for
    /// simple field transitions where re-checking the guard is cheap.
    async fn mutate_order<F>(
        &self,
        po_id: Uuid,
        mut build: F,
    ) -> Result<purchase_order::Model, ServiceError>
    where
        F: FnMut(&purchase_order::Model) -> Result<purchase_order::ActiveModel, ServiceError>,
    {
        let db = &*self.db_pool;
        for _ in 0..MAX_VERSION_RETRIES {
            let order = require_order(db, po_id).await?;
            let mut active = build(&order)?;
            active.id = Set(order.id);
            active.version = Set(order.version + 1);
            active.updated_at = Set(Utc::now());
            if persist_order_guarded(db, &order, active).await? {
                return require_order(db, po_id).await;
            }
        }
        Err(ServiceError::ConcurrentModification(po_id))
    }
}

async fn require_order<C: ConnectionTrait>(
    db: &C,
    po_id: Uuid,
) -> Result<purchase_order::Model, ServiceError> {
    PurchaseOrders::find_by_id(po_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {}", po_id)))
}

async fn load_lines<C: ConnectionTrait>(
    db: &C,
    po_id: Uuid,
) -> Result<Vec<purchase_order_line::Model>, ServiceError> {
    Ok(PurchaseOrderLines::find()
        .filter(purchase_order_line::Column::PurchaseOrderId.eq(po_id))
        .order_by_asc(purchase_order_line::Column::LineNo)
        .all(db)
        .await?)
}

async fn persist_order_guarded<C: ConnectionTrait>(
    db: &C,
    order: &purchase_order::Model,
    active: purchase_order::ActiveModel,
) -> Result<bool, ServiceError> {
    let result = PurchaseOrders::update_many()
        .set(active)
        .filter(purchase_order::Column::Id.eq(order.id))
        .filter(purchase_order::Column::Version.eq(order.version))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

async fn insert_lines<C: ConnectionTrait>(
    db: &C,
    po_id: Uuid,
    inputs: &[PurchaseOrderLineInput],
) -> Result<Vec<purchase_order_line::Model>, ServiceError> {
    let now = Utc::now();
    let mut lines = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let line = purchase_order_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_order_id: Set(po_id),
            line_no: Set(index as i32 + 1),
            product_id: Set(input.product_id),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            tax_rate: Set(input.tax_rate),
            received_quantity: Set(0),
            status: Set(LineStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };
        lines.push(line.insert(db).await?);
    }
    Ok(lines)
}

fn validate_lines(lines: &[PurchaseOrderLineInput]) -> Result<(), ServiceError> {
    for (index, line) in lines.iter().enumerate() {
        line.validate()?;
        if line.unit_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Line {}: unit price cannot be negative",
                index + 1
            )));
        }
        if line.tax_rate < Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Line {}: tax rate cannot be negative",
                index + 1
            )));
        }
    }
    Ok(())
}

/// Subtotal and GST breakdown. Intra-state orders split each line's tax
/// evenly between CGST and SGST; inter-state orders book it all as IGST.
fn compute_pricing(lines: &[PurchaseOrderLineInput], inter_state: bool) -> OrderPricing {
    let hundred = Decimal::from(100);
    let two = Decimal::from(2);
    let mut subtotal = Decimal::ZERO;
    let mut cgst = Decimal::ZERO;
    let mut sgst = Decimal::ZERO;
    let mut igst = Decimal::ZERO;

    for line in lines {
        let line_total = Decimal::from(line.quantity) * line.unit_price;
        let tax = line_total * line.tax_rate / hundred;
        subtotal += line_total;
        if inter_state {
            igst += tax;
        } else {
            cgst += tax / two;
            sgst += tax / two;
        }
    }

    OrderPricing {
        subtotal,
        cgst,
        sgst,
        igst,
        total: subtotal + cgst + sgst + igst,
    }
}

/// Claims the next number from the year-scoped sequence with a guarded
/// increment. The first creator of a year seeds the row.
pub(crate) async fn next_po_number<C: ConnectionTrait>(
    db: &C,
    year: i32,
) -> Result<String, ServiceError> {
    for _ in 0..MAX_SEQUENCE_RETRIES {
        match PoSequences::find_by_id(year).one(db).await? {
            Some(row) => {
                let claimed = row.next_seq;
                let result = PoSequences::update_many()
                    .set(po_sequence::ActiveModel {
                        next_seq: Set(claimed + 1),
                        ..Default::default()
                    })
                    .filter(po_sequence::Column::Year.eq(year))
                    .filter(po_sequence::Column::NextSeq.eq(claimed))
                    .exec(db)
                    .await?;
                if result.rows_affected == 1 {
                    return Ok(format!("{}{:04}", year, claimed));
                }
            }
            None => {
                let seeded = po_sequence::ActiveModel {
                    year: Set(year),
                    next_seq: Set(2),
                }
                .insert(db)
                .await;
                match seeded {
                    Ok(_) => return Ok(format!("{}{:04}", year, 1)),
                    // Another creator seeded the year first; retry the
                    // guarded increment path.
                    Err(_) => continue,
                }
            }
        }
    }
    Err(ServiceError::InternalError(format!(
        "Could not claim a purchase order number for {}",
        year
    )))
}

/// Startup initialization of the current year's sequence row, so the
/// common path never has to race on first insert.
pub async fn ensure_po_sequence<C: ConnectionTrait>(db: &C, year: i32) -> Result<(), ServiceError> {
    if PoSequences::find_by_id(year).one(db).await?.is_none() {
        let seeded = po_sequence::ActiveModel {
            year: Set(year),
            next_seq: Set(1),
        }
        .insert(db)
        .await;
        if seeded.is_err() {
            // Lost the race to another instance, which is fine.
            info!("Sequence row for {} already present", year);
        }
    }
    Ok(())
}
