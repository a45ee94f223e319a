use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-product stock ledger record. Single owner of truth for on-hand,
/// reserved and available quantities and the moving-average cost basis.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub product_id: Uuid,
    pub current_stock: i32,
    pub reserved_stock: i32,
    /// Derived: max(0, current_stock - reserved_stock). Recomputed on every
    /// mutation, never treated as independent source of truth.
    pub available_stock: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub average_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub last_purchase_cost: Option<Decimal>,
    pub min_stock_level: i32,
    pub max_stock_level: i32,
    pub reorder_level: i32,
    pub reorder_quantity: i32,
    pub stock_status: StockStatus,
    pub last_stock_in_at: Option<DateTime<Utc>>,
    pub last_stock_in_quantity: Option<i32>,
    pub last_stock_in_reference: Option<String>,
    pub last_stock_out_at: Option<DateTime<Utc>>,
    pub last_stock_out_quantity: Option<i32>,
    pub last_stock_out_reference: Option<String>,
    pub last_stock_out_reason: Option<String>,
    pub last_count_at: Option<DateTime<Utc>>,
    pub last_count_by: Option<Uuid>,
    pub last_count_quantity: Option<i32>,
    pub last_count_variance: Option<i32>,
    /// Entries are deactivated, never hard-deleted.
    pub is_active: bool,
    pub last_updated_by: Option<Uuid>,
    /// Optimistic concurrency guard; bumped on every persisted mutation.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Stock status classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum StockStatus {
    #[sea_orm(string_value = "in_stock")]
    InStock,
    #[sea_orm(string_value = "low_stock")]
    LowStock,
    #[sea_orm(string_value = "out_of_stock")]
    OutOfStock,
    #[sea_orm(string_value = "discontinued")]
    Discontinued,
}

impl StockStatus {
    /// Derives the status from quantities. A manual `Discontinued` override
    /// is sticky until explicitly changed.
    pub fn derive(current_stock: i32, min_stock_level: i32, previous: StockStatus) -> StockStatus {
        if previous == StockStatus::Discontinued {
            return StockStatus::Discontinued;
        }
        if current_stock == 0 {
            StockStatus::OutOfStock
        } else if current_stock <= min_stock_level {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

/// Derived available quantity: on-hand minus reserved, floored at zero.
pub fn available_stock(current_stock: i32, reserved_stock: i32) -> i32 {
    (current_stock - reserved_stock).max(0)
}
