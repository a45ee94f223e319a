use crate::{
    db::DbPool,
    entities::supplier::{self, Entity as Suppliers},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Validate)]
pub struct SupplierInput {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    pub contact_person: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub gstin: Option<String>,
    pub payment_terms: Option<String>,
    #[validate(range(min = 0, max = 365))]
    pub credit_days: i32,
}

/// Outcome of a finished purchase order, folded into the supplier's
/// performance rollup.
#[derive(Debug, Clone, Default)]
pub struct PerformanceUpdate {
    pub is_completed: bool,
    pub is_cancelled: bool,
    pub is_on_time: bool,
    pub delivery_days: Option<i32>,
    pub quality_rating: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinancialKind {
    Purchase,
    Payment,
}

/// Supplier master data plus the rollups the purchase order lifecycle
/// maintains as side effects.
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input))]
    pub async fn create_supplier(
        &self,
        input: SupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let model = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            contact_person: Set(input.contact_person),
            email: Set(input.email),
            phone: Set(input.phone),
            address_line: Set(input.address_line),
            city: Set(input.city),
            state: Set(input.state),
            postal_code: Set(input.postal_code),
            country: Set(input.country),
            gstin: Set(input.gstin),
            payment_terms: Set(input.payment_terms),
            credit_days: Set(input.credit_days),
            total_orders: Set(0),
            completed_orders: Set(0),
            cancelled_orders: Set(0),
            on_time_deliveries: Set(0),
            average_delivery_days: Set(Decimal::ZERO),
            quality_rating: Set(Decimal::ZERO),
            total_purchases: Set(Decimal::ZERO),
            total_payments: Set(Decimal::ZERO),
            outstanding_amount: Set(Decimal::ZERO),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(&*self.db_pool).await?)
    }

    /// Master data update. Rollup counters are owned by the purchase order
    /// lifecycle and cannot be edited here.
    #[instrument(skip(self, input))]
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        input: SupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;
        let existing = require_supplier(&*self.db_pool, supplier_id).await?;
        let mut active: supplier::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.contact_person = Set(input.contact_person);
        active.email = Set(input.email);
        active.phone = Set(input.phone);
        active.address_line = Set(input.address_line);
        active.city = Set(input.city);
        active.state = Set(input.state);
        active.postal_code = Set(input.postal_code);
        active.country = Set(input.country);
        active.gstin = Set(input.gstin);
        active.payment_terms = Set(input.payment_terms);
        active.credit_days = Set(input.credit_days);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(&self, supplier_id: Uuid) -> Result<supplier::Model, ServiceError> {
        require_supplier(&*self.db_pool, supplier_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        page: u64,
        limit: u64,
        active_only: bool,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let mut query = Suppliers::find().order_by_asc(supplier::Column::Name);
        if active_only {
            query = query.filter(supplier::Column::IsActive.eq(true));
        }
        let paginator = query.paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let suppliers = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((suppliers, total))
    }

    /// Suppliers are deactivated, never deleted; order history stays intact.
    #[instrument(skip(self))]
    pub async fn deactivate_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<supplier::Model, ServiceError> {
        let existing = require_supplier(&*self.db_pool, supplier_id).await?;
        let mut active: supplier::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_performance(
        &self,
        supplier_id: Uuid,
        update: PerformanceUpdate,
    ) -> Result<supplier::Model, ServiceError> {
        apply_performance_update(&*self.db_pool, supplier_id, &update).await
    }

    #[instrument(skip(self))]
    pub async fn update_financials(
        &self,
        supplier_id: Uuid,
        amount: Decimal,
        kind: FinancialKind,
    ) -> Result<supplier::Model, ServiceError> {
        apply_financial_update(&*self.db_pool, supplier_id, amount, kind).await
    }
}

pub(crate) async fn require_supplier<C: ConnectionTrait>(
    db: &C,
    supplier_id: Uuid,
) -> Result<supplier::Model, ServiceError> {
    Suppliers::find_by_id(supplier_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Supplier {}", supplier_id)))
}

/// Bumps the order counter when a purchase order is placed. Runs inside
/// the order creation transaction.
pub(crate) async fn record_order_placed<C: ConnectionTrait>(
    db: &C,
    supplier_id: Uuid,
) -> Result<(), ServiceError> {
    let supplier = require_supplier(db, supplier_id).await?;
    let mut active: supplier::ActiveModel = supplier.clone().into();
    active.total_orders = Set(supplier.total_orders + 1);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

/// Folds one finished order into the rollup. Delivery days and quality
/// rating are maintained as running averages over completed orders.
pub(crate) async fn apply_performance_update<C: ConnectionTrait>(
    db: &C,
    supplier_id: Uuid,
    update: &PerformanceUpdate,
) -> Result<supplier::Model, ServiceError> {
    let supplier = require_supplier(db, supplier_id).await?;
    let mut active: supplier::ActiveModel = supplier.clone().into();

    if update.is_completed {
        let completed = supplier.completed_orders + 1;
        active.completed_orders = Set(completed);
        if update.is_on_time {
            active.on_time_deliveries = Set(supplier.on_time_deliveries + 1);
        }
        if let Some(days) = update.delivery_days {
            active.average_delivery_days = Set(running_average(
                supplier.average_delivery_days,
                supplier.completed_orders,
                Decimal::from(days),
            ));
        }
        if let Some(rating) = update.quality_rating {
            active.quality_rating = Set(running_average(
                supplier.quality_rating,
                supplier.completed_orders,
                rating,
            ));
        }
    }
    if update.is_cancelled {
        active.cancelled_orders = Set(supplier.cancelled_orders + 1);
    }
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

pub(crate) async fn apply_financial_update<C: ConnectionTrait>(
    db: &C,
    supplier_id: Uuid,
    amount: Decimal,
    kind: FinancialKind,
) -> Result<supplier::Model, ServiceError> {
    if amount < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Amount cannot be negative".to_string(),
        ));
    }
    let supplier = require_supplier(db, supplier_id).await?;
    let mut active: supplier::ActiveModel = supplier.clone().into();
    let (purchases, payments) = match kind {
        FinancialKind::Purchase => (supplier.total_purchases + amount, supplier.total_payments),
        FinancialKind::Payment => (supplier.total_purchases, supplier.total_payments + amount),
    };
    active.total_purchases = Set(purchases);
    active.total_payments = Set(payments);
    active.outstanding_amount = Set(purchases - payments);
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

fn running_average(previous_average: Decimal, previous_count: i32, sample: Decimal) -> Decimal {
    let count = Decimal::from(previous_count);
    (previous_average * count + sample) / (count + Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn running_average_over_samples() {
        let first = running_average(dec!(0), 0, dec!(4));
        assert_eq!(first, dec!(4));
        let second = running_average(first, 1, dec!(6));
        assert_eq!(second, dec!(5));
        let third = running_average(second, 2, dec!(8));
        assert_eq!(third, dec!(6));
    }
}
