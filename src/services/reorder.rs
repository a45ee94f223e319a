use crate::{
    db::DbPool,
    entities::stock_entry::{self, Entity as StockEntries, StockStatus},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// How urgently a reorder candidate needs replenishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    High,
    Medium,
}

impl Urgency {
    /// Critical when out of stock, high when at or below half the minimum.
    pub fn classify(current_stock: i32, min_stock_level: i32) -> Urgency {
        if current_stock == 0 {
            Urgency::Critical
        } else if current_stock <= min_stock_level / 2 {
            Urgency::High
        } else {
            Urgency::Medium
        }
    }
}

/// One actionable purchase suggestion.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReorderSuggestion {
    #[schema(value_type = Object)]
    pub entry: stock_entry::Model,
    pub suggested_quantity: i32,
    pub estimated_cost: Decimal,
    pub urgency: Urgency,
}

/// Read-only queries over the stock ledger producing reorder data.
/// Never mutates an entry; acting on a suggestion is the operator's call.
#[derive(Clone)]
pub struct ReorderService {
    db_pool: Arc<DbPool>,
}

impl ReorderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Entries flagged low or out of stock, worst first.
    #[instrument(skip(self))]
    pub async fn list_low_stock(
        &self,
        limit: u64,
    ) -> Result<Vec<stock_entry::Model>, ServiceError> {
        let entries = StockEntries::find()
            .filter(
                Condition::any()
                    .add(stock_entry::Column::StockStatus.eq(StockStatus::LowStock))
                    .add(stock_entry::Column::StockStatus.eq(StockStatus::OutOfStock)),
            )
            .filter(stock_entry::Column::IsActive.eq(true))
            .order_by_asc(stock_entry::Column::CurrentStock)
            .limit(limit.max(1))
            .all(&*self.db_pool)
            .await?;
        Ok(entries)
    }

    /// Entries at or below their reorder level. Column-to-column compare,
    /// so each product's own threshold applies.
    #[instrument(skip(self))]
    pub async fn list_reorder_candidates(&self) -> Result<Vec<stock_entry::Model>, ServiceError> {
        let entries = StockEntries::find()
            .filter(
                Expr::col(stock_entry::Column::CurrentStock)
                    .lte(Expr::col(stock_entry::Column::ReorderLevel)),
            )
            .filter(stock_entry::Column::IsActive.eq(true))
            .order_by_asc(stock_entry::Column::CurrentStock)
            .all(&*self.db_pool)
            .await?;
        Ok(entries)
    }

    /// Purchase suggestions for every reorder candidate.
    #[instrument(skip(self))]
    pub async fn suggest(&self) -> Result<Vec<ReorderSuggestion>, ServiceError> {
        let candidates = self.list_reorder_candidates().await?;
        Ok(candidates
            .into_iter()
            .map(|entry| {
                let suggested_quantity = entry.reorder_quantity;
                let estimated_cost = Decimal::from(suggested_quantity) * entry.average_cost;
                let urgency = Urgency::classify(entry.current_stock, entry.min_stock_level);
                ReorderSuggestion {
                    entry,
                    suggested_quantity,
                    estimated_cost,
                    urgency,
                }
            })
            .collect())
    }
}
