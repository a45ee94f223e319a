use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier master data plus performance and financial rollups.
///
/// The rollup counters are only mutated as a side effect of purchase order
/// completion, cancellation and payment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    /// GST identification number
    pub gstin: Option<String>,
    pub payment_terms: Option<String>,
    pub credit_days: i32,
    // Performance rollup
    pub total_orders: i32,
    pub completed_orders: i32,
    pub cancelled_orders: i32,
    pub on_time_deliveries: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub average_delivery_days: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quality_rating: Decimal,
    // Financial rollup
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_purchases: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_payments: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub outstanding_amount: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_order::Entity")]
    PurchaseOrders,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
