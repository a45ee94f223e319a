use crate::{
    db::DbPool,
    entities::stock_entry::{self, available_stock, Entity as StockEntries, StockStatus},
    entities::stock_movement::{self, MovementDirection},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Attempts before a version conflict is surfaced to the caller.
const MAX_VERSION_RETRIES: u32 = 3;

/// Physical stock movement request.
#[derive(Debug, Clone, Validate)]
pub struct StockUpdateInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub direction: MovementDirection,
    #[validate(length(min = 1, message = "Reference is required"))]
    pub reference: String,
    /// Unit cost for stock-in; feeds the weighted-average recomputation.
    pub unit_cost: Option<Decimal>,
    /// Reason for stock-out (damage, sale, correction).
    pub reason: Option<String>,
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Clone, Validate)]
pub struct StockLevelsInput {
    pub product_id: Uuid,
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

/// Authoritative per-product quantity and cost tracking. Every stock
/// mutation in the system passes through here.
#[derive(Clone)]
pub struct StockLedgerService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl StockLedgerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records a physical stock movement (in or out).
    ///
    /// Stock-in lazily creates the ledger entry on first use and recomputes
    /// the weighted-average cost when a unit cost is supplied. Stock-out
    /// fails with `InsufficientStock` rather than driving on-hand negative.
    #[instrument(skip(self))]
    pub async fn update_stock(
        &self,
        input: StockUpdateInput,
    ) -> Result<stock_entry::Model, ServiceError> {
        input.validate()?;
        if input.direction == MovementDirection::Count {
            return Err(ServiceError::ValidationError(
                "Use perform_stock_count for count adjustments".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let mut events = Vec::new();
        let entry = match input.direction {
            MovementDirection::In => {
                stock_in(
                    &txn,
                    input.product_id,
                    input.quantity,
                    input.unit_cost,
                    &input.reference,
                    input.performed_by,
                    &mut events,
                )
                .await?
            }
            MovementDirection::Out => {
                stock_out(
                    &txn,
                    input.product_id,
                    input.quantity,
                    &input.reference,
                    input.reason.as_deref(),
                    input.performed_by,
                    &mut events,
                )
                .await?
            }
            MovementDirection::Count => unreachable!(),
        };
        txn.commit().await?;

        for event in events {
            self.event_sender.send_or_log(event).await;
        }
        Ok(entry)
    }

    /// Allocates units to pending fulfillment. Fails when the request
    /// exceeds what is currently available; state is left untouched.
    #[instrument(skip(self))]
    pub async fn reserve_stock(
        &self,
        product_id: Uuid,
        quantity: i32,
        performed_by: Option<Uuid>,
    ) -> Result<stock_entry::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Quantity must be positive".to_string(),
            ));
        }

        let db = &*self.db_pool;
        for _ in 0..MAX_VERSION_RETRIES {
            let entry = require_entry(db, product_id).await?;
            if quantity > entry.available_stock {
                return Err(ServiceError::InsufficientAvailableStock(format!(
                    "Requested {} units of product {} but only {} are available",
                    quantity, product_id, entry.available_stock
                )));
            }

            let reserved = entry.reserved_stock + quantity;
            let active = stock_entry::ActiveModel {
                id: Set(entry.id),
                reserved_stock: Set(reserved),
                available_stock: Set(available_stock(entry.current_stock, reserved)),
                last_updated_by: Set(performed_by),
                version: Set(entry.version + 1),
                updated_at: Set(Utc::now()),
                ..Default::default()
            };
            if persist_guarded(db, &entry, active).await? {
                self.event_sender
                    .send_or_log(Event::StockReserved {
                        product_id,
                        quantity,
                    })
                    .await;
                return require_entry(db, product_id).await;
            }
        }
        Err(concurrent_modification(product_id))
    }

    /// Returns previously reserved units to the available pool. Clamped at
    /// zero; releasing more than is reserved is not an error.
    #[instrument(skip(self))]
    pub async fn release_reserved_stock(
        &self,
        product_id: Uuid,
        quantity: i32,
        performed_by: Option<Uuid>,
    ) -> Result<stock_entry::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Quantity must be positive".to_string(),
            ));
        }

        let db = &*self.db_pool;
        for _ in 0..MAX_VERSION_RETRIES {
            let entry = require_entry(db, product_id).await?;
            let reserved = (entry.reserved_stock - quantity).max(0);
            let active = stock_entry::ActiveModel {
                id: Set(entry.id),
                reserved_stock: Set(reserved),
                available_stock: Set(available_stock(entry.current_stock, reserved)),
                last_updated_by: Set(performed_by),
                version: Set(entry.version + 1),
                updated_at: Set(Utc::now()),
                ..Default::default()
            };
            if persist_guarded(db, &entry, active).await? {
                self.event_sender
                    .send_or_log(Event::StockReleased {
                        product_id,
                        quantity,
                    })
                    .await;
                return require_entry(db, product_id).await;
            }
        }
        Err(concurrent_modification(product_id))
    }

    /// Records a physical count. The counted quantity is authoritative:
    /// on-hand is overwritten and the variance against the previous figure
    /// is kept in the audit trail. Reserved stock is not touched.
    #[instrument(skip(self))]
    pub async fn perform_stock_count(
        &self,
        product_id: Uuid,
        counted_quantity: i32,
        counted_by: Uuid,
    ) -> Result<stock_entry::Model, ServiceError> {
        if counted_quantity < 0 {
            return Err(ServiceError::ValidationError(
                "Counted quantity cannot be negative".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let mut events = Vec::new();
        let mut result = None;

        for _ in 0..MAX_VERSION_RETRIES {
            let entry = require_entry(&txn, product_id).await?;
            let variance = counted_quantity - entry.current_stock;
            let now = Utc::now();
            let status = StockStatus::derive(
                counted_quantity,
                entry.min_stock_level,
                entry.stock_status,
            );

            let active = stock_entry::ActiveModel {
                id: Set(entry.id),
                current_stock: Set(counted_quantity),
                available_stock: Set(available_stock(counted_quantity, entry.reserved_stock)),
                stock_status: Set(status),
                last_count_at: Set(Some(now)),
                last_count_by: Set(Some(counted_by)),
                last_count_quantity: Set(Some(counted_quantity)),
                last_count_variance: Set(Some(variance)),
                last_updated_by: Set(Some(counted_by)),
                version: Set(entry.version + 1),
                updated_at: Set(now),
                ..Default::default()
            };
            if persist_guarded(&txn, &entry, active).await? {
                record_movement(
                    &txn,
                    product_id,
                    MovementDirection::Count,
                    counted_quantity,
                    entry.current_stock,
                    counted_quantity,
                    None,
                    "stock_count",
                    Some("physical count"),
                    Some(counted_by),
                )
                .await?;

                events.push(Event::StockCountPerformed {
                    product_id,
                    counted_quantity,
                    variance,
                    counted_by,
                });
                push_status_events(&mut events, &entry, counted_quantity, status);
                result = Some(require_entry(&txn, product_id).await?);
                break;
            }
        }

        let entry = match result {
            Some(entry) => entry,
            None => return Err(concurrent_modification(product_id)),
        };
        txn.commit().await?;

        for event in events {
            self.event_sender.send_or_log(event).await;
        }
        Ok(entry)
    }

    /// True when on-hand has fallen to or below the reorder level.
    #[instrument(skip(self))]
    pub async fn check_reorder_needed(&self, product_id: Uuid) -> Result<bool, ServiceError> {
        let entry = require_entry(&*self.db_pool, product_id).await?;
        Ok(entry.current_stock <= entry.reorder_level)
    }

    /// Sets the replenishment thresholds. Creates the ledger entry when the
    /// product is not yet tracked.
    #[instrument(skip(self))]
    pub async fn set_stock_levels(
        &self,
        input: StockLevelsInput,
    ) -> Result<stock_entry::Model, ServiceError> {
        input.validate()?;
        if input.max_stock_level > 0 && input.max_stock_level < input.min_stock_level {
            return Err(ServiceError::ValidationError(
                "Maximum stock level cannot be below the minimum".to_string(),
            ));
        }

        let db = &*self.db_pool;
        for _ in 0..MAX_VERSION_RETRIES {
            let entry = ensure_entry(db, input.product_id).await?;
            let status = StockStatus::derive(
                entry.current_stock,
                input.min_stock_level,
                entry.stock_status,
            );
            let active = stock_entry::ActiveModel {
                id: Set(entry.id),
                min_stock_level: Set(input.min_stock_level),
                max_stock_level: Set(input.max_stock_level),
                reorder_level: Set(input.reorder_level),
                reorder_quantity: Set(input.reorder_quantity),
                stock_status: Set(status),
                last_updated_by: Set(input.performed_by),
                version: Set(entry.version + 1),
                updated_at: Set(Utc::now()),
                ..Default::default()
            };
            if persist_guarded(db, &entry, active).await? {
                return require_entry(db, input.product_id).await;
            }
        }
        Err(concurrent_modification(input.product_id))
    }

    /// Flags a product as discontinued or lifts the flag. Lifting re-derives
    /// the status from current quantities.
    #[instrument(skip(self))]
    pub async fn set_discontinued(
        &self,
        product_id: Uuid,
        discontinued: bool,
        performed_by: Option<Uuid>,
    ) -> Result<stock_entry::Model, ServiceError> {
        let db = &*self.db_pool;
        for _ in 0..MAX_VERSION_RETRIES {
            let entry = require_entry(db, product_id).await?;
            let status = if discontinued {
                StockStatus::Discontinued
            } else {
                StockStatus::derive(entry.current_stock, entry.min_stock_level, StockStatus::InStock)
            };
            let active = stock_entry::ActiveModel {
                id: Set(entry.id),
                stock_status: Set(status),
                is_active: Set(!discontinued),
                last_updated_by: Set(performed_by),
                version: Set(entry.version + 1),
                updated_at: Set(Utc::now()),
                ..Default::default()
            };
            if persist_guarded(db, &entry, active).await? {
                return require_entry(db, product_id).await;
            }
        }
        Err(concurrent_modification(product_id))
    }

    #[instrument(skip(self))]
    pub async fn get_entry(&self, product_id: Uuid) -> Result<stock_entry::Model, ServiceError> {
        require_entry(&*self.db_pool, product_id).await
    }

    /// Paginated listing, most recently updated first.
    #[instrument(skip(self))]
    pub async fn list_entries(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_entry::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let paginator = StockEntries::find()
            .order_by_desc(stock_entry::Column::UpdatedAt)
            .paginate(db, limit.max(1));
        let total = paginator.num_items().await?;
        let entries = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((entries, total))
    }

    /// Movement history for a product, newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        product_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let paginator = stock_movement::Entity::find()
            .filter(stock_movement::Column::ProductId.eq(product_id))
            .order_by_desc(stock_movement::Column::CreatedAt)
            .paginate(db, limit.max(1));
        let total = paginator.num_items().await?;
        let movements = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((movements, total))
    }
}

/// Applies a stock-in within the caller's connection or transaction.
/// Used directly by purchase order receiving so the ledger update commits
/// or rolls back together with the order.
pub(crate) async fn stock_in<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    quantity: i32,
    unit_cost: Option<Decimal>,
    reference: &str,
    performed_by: Option<Uuid>,
    events: &mut Vec<Event>,
) -> Result<stock_entry::Model, ServiceError> {
    for _ in 0..MAX_VERSION_RETRIES {
        let entry = ensure_entry(db, product_id).await?;
        let previous = entry.current_stock;
        let current = previous + quantity;
        let now = Utc::now();

        let average_cost = match unit_cost {
            Some(cost) => weighted_average_cost(previous, entry.average_cost, quantity, cost),
            None => entry.average_cost,
        };

        let status = StockStatus::derive(current, entry.min_stock_level, entry.stock_status);
        let active = stock_entry::ActiveModel {
            id: Set(entry.id),
            current_stock: Set(current),
            available_stock: Set(available_stock(current, entry.reserved_stock)),
            average_cost: Set(average_cost),
            last_purchase_cost: Set(unit_cost.or(entry.last_purchase_cost)),
            stock_status: Set(status),
            last_stock_in_at: Set(Some(now)),
            last_stock_in_quantity: Set(Some(quantity)),
            last_stock_in_reference: Set(Some(reference.to_string())),
            last_updated_by: Set(performed_by),
            version: Set(entry.version + 1),
            updated_at: Set(now),
            ..Default::default()
        };
        if persist_guarded(db, &entry, active).await? {
            record_movement(
                db,
                product_id,
                MovementDirection::In,
                quantity,
                previous,
                current,
                unit_cost,
                reference,
                None,
                performed_by,
            )
            .await?;

            events.push(Event::StockUpdated {
                product_id,
                direction: "in".to_string(),
                quantity,
                new_quantity: current,
                available: available_stock(current, entry.reserved_stock),
                reference: reference.to_string(),
            });
            push_status_events(events, &entry, current, status);
            return require_entry(db, product_id).await;
        }
    }
    Err(concurrent_modification(product_id))
}

pub(crate) async fn stock_out<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    quantity: i32,
    reference: &str,
    reason: Option<&str>,
    performed_by: Option<Uuid>,
    events: &mut Vec<Event>,
) -> Result<stock_entry::Model, ServiceError> {
    for _ in 0..MAX_VERSION_RETRIES {
        let entry = require_entry(db, product_id).await?;
        if quantity > entry.current_stock {
            return Err(ServiceError::InsufficientStock(format!(
                "Requested {} units of product {} but only {} are on hand",
                quantity, product_id, entry.current_stock
            )));
        }

        let previous = entry.current_stock;
        let current = previous - quantity;
        let now = Utc::now();
        let status = StockStatus::derive(current, entry.min_stock_level, entry.stock_status);

        let active = stock_entry::ActiveModel {
            id: Set(entry.id),
            current_stock: Set(current),
            available_stock: Set(available_stock(current, entry.reserved_stock)),
            stock_status: Set(status),
            last_stock_out_at: Set(Some(now)),
            last_stock_out_quantity: Set(Some(quantity)),
            last_stock_out_reference: Set(Some(reference.to_string())),
            last_stock_out_reason: Set(reason.map(str::to_string)),
            last_updated_by: Set(performed_by),
            version: Set(entry.version + 1),
            updated_at: Set(now),
            ..Default::default()
        };
        if persist_guarded(db, &entry, active).await? {
            record_movement(
                db,
                product_id,
                MovementDirection::Out,
                quantity,
                previous,
                current,
                None,
                reference,
                reason,
                performed_by,
            )
            .await?;

            events.push(Event::StockUpdated {
                product_id,
                direction: "out".to_string(),
                quantity,
                new_quantity: current,
                available: available_stock(current, entry.reserved_stock),
                reference: reference.to_string(),
            });
            push_status_events(events, &entry, current, status);
            return require_entry(db, product_id).await;
        }
    }
    Err(concurrent_modification(product_id))
}

/// Weighted average over the combined quantity. A zero divisor can only
/// happen when both old and new stock are zero, in which case the previous
/// average is kept.
pub fn weighted_average_cost(
    previous_quantity: i32,
    previous_average: Decimal,
    quantity: i32,
    unit_cost: Decimal,
) -> Decimal {
    let combined = previous_quantity + quantity;
    if combined <= 0 {
        return previous_average;
    }
    (Decimal::from(previous_quantity) * previous_average + Decimal::from(quantity) * unit_cost)
        / Decimal::from(combined)
}

async fn find_entry<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
) -> Result<Option<stock_entry::Model>, ServiceError> {
    StockEntries::find()
        .filter(stock_entry::Column::ProductId.eq(product_id))
        .one(db)
        .await
        .map_err(ServiceError::DatabaseError)
}

async fn require_entry<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
) -> Result<stock_entry::Model, ServiceError> {
    find_entry(db, product_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Stock entry for product {}", product_id)))
}

/// Fetches the entry for a product, creating a zeroed one on first use.
async fn ensure_entry<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
) -> Result<stock_entry::Model, ServiceError> {
    if let Some(entry) = find_entry(db, product_id).await? {
        return Ok(entry);
    }

    info!("Creating stock entry for product {}", product_id);
    let now = Utc::now();
    let entry = stock_entry::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        current_stock: Set(0),
        reserved_stock: Set(0),
        available_stock: Set(0),
        average_cost: Set(Decimal::ZERO),
        last_purchase_cost: Set(None),
        min_stock_level: Set(0),
        max_stock_level: Set(0),
        reorder_level: Set(0),
        reorder_quantity: Set(0),
        stock_status: Set(StockStatus::OutOfStock),
        last_stock_in_at: Set(None),
        last_stock_in_quantity: Set(None),
        last_stock_in_reference: Set(None),
        last_stock_out_at: Set(None),
        last_stock_out_quantity: Set(None),
        last_stock_out_reference: Set(None),
        last_stock_out_reason: Set(None),
        last_count_at: Set(None),
        last_count_by: Set(None),
        last_count_quantity: Set(None),
        last_count_variance: Set(None),
        is_active: Set(true),
        last_updated_by: Set(None),
        version: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    entry.insert(db).await.map_err(ServiceError::DatabaseError)
}

#[cfg(test)]
static FORCED_STALE_WRITES: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(0);

/// Consumes one forced stale write when the test counter is armed.
/// Always false outside of tests.
#[cfg(test)]
fn take_forced_stale_write() -> bool {
    use std::sync::atomic::Ordering;
    FORCED_STALE_WRITES
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[cfg(not(test))]
fn take_forced_stale_write() -> bool {
    false
}

/// Version-guarded persist. Returns false when another writer got there
/// first, in which case the caller reloads and retries.
async fn persist_guarded<C: ConnectionTrait>(
    db: &C,
    entry: &stock_entry::Model,
    active: stock_entry::ActiveModel,
) -> Result<bool, ServiceError> {
    if take_forced_stale_write() {
        return Ok(false);
    }
    let result = StockEntries::update_many()
        .set(active)
        .filter(stock_entry::Column::Id.eq(entry.id))
        .filter(stock_entry::Column::Version.eq(entry.version))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

fn concurrent_modification(product_id: Uuid) -> ServiceError {
    warn!(
        "Giving up on stock entry for product {} after repeated version conflicts",
        product_id
    );
    ServiceError::ConcurrentModification(product_id)
}

#[allow(clippy::too_many_arguments)]
async fn record_movement<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    direction: MovementDirection,
    quantity: i32,
    previous_quantity: i32,
    new_quantity: i32,
    unit_cost: Option<Decimal>,
    reference: &str,
    reason: Option<&str>,
    performed_by: Option<Uuid>,
) -> Result<(), ServiceError> {
    let movement = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        direction: Set(direction),
        quantity: Set(quantity),
        previous_quantity: Set(previous_quantity),
        new_quantity: Set(new_quantity),
        unit_cost: Set(unit_cost),
        reference: Set(reference.to_string()),
        reason: Set(reason.map(str::to_string)),
        performed_by: Set(performed_by),
        created_at: Set(Utc::now()),
    };
    movement.insert(db).await?;
    Ok(())
}

/// Raises threshold alerts on downward status transitions.
fn push_status_events(
    events: &mut Vec<Event>,
    before: &stock_entry::Model,
    current_stock: i32,
    status: StockStatus,
) {
    if status == StockStatus::OutOfStock && before.stock_status != StockStatus::OutOfStock {
        events.push(Event::StockOut {
            product_id: before.product_id,
        });
    }
    if status == StockStatus::LowStock && before.stock_status != StockStatus::LowStock {
        events.push(Event::StockLow {
            product_id: before.product_id,
            current_stock,
            min_stock_level: before.min_stock_level,
        });
    }
}
