use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Year-scoped sequential number, `"{year}{seq:04}"`.
    #[sea_orm(unique)]
    pub po_number: String,
    pub supplier_id: Uuid,
    pub po_date: DateTime<Utc>,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub status: PurchaseOrderStatus,
    pub approval_status: ApprovalStatus,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub cgst_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub sgst_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub igst_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_amount: Decimal,
    /// Caller decides the tax split: IGST for inter-state, CGST+SGST otherwise.
    pub inter_state: bool,
    pub payment_terms: Option<String>,
    pub credit_days: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub paid_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub balance_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub first_delivery_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub last_updated_by: Option<Uuid>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_order_line::Entity")]
    PurchaseOrderLines,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<super::purchase_order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderLines.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Purchase order lifecycle status
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PurchaseOrderStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "acknowledged")]
    Acknowledged,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl PurchaseOrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Closed)
    }

    /// Goods can only be recorded against an order that has been sent.
    pub fn can_receive(&self) -> bool {
        matches!(self, Self::Sent | Self::Acknowledged | Self::Partial)
    }
}

/// Approval axis, independent of the lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ApprovalStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl PaymentStatus {
    pub fn derive(paid_amount: Decimal, total_amount: Decimal) -> PaymentStatus {
        if paid_amount <= Decimal::ZERO {
            PaymentStatus::Pending
        } else if paid_amount < total_amount {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Paid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn terminal_states() {
        assert!(PurchaseOrderStatus::Completed.is_terminal());
        assert!(PurchaseOrderStatus::Cancelled.is_terminal());
        assert!(PurchaseOrderStatus::Closed.is_terminal());
        assert!(!PurchaseOrderStatus::Draft.is_terminal());
        assert!(!PurchaseOrderStatus::Partial.is_terminal());
    }

    #[test]
    fn receivable_states() {
        assert!(PurchaseOrderStatus::Sent.can_receive());
        assert!(PurchaseOrderStatus::Acknowledged.can_receive());
        assert!(PurchaseOrderStatus::Partial.can_receive());
        assert!(!PurchaseOrderStatus::Draft.can_receive());
        assert!(!PurchaseOrderStatus::Cancelled.can_receive());
    }

    #[test]
    fn payment_status_derivation() {
        assert_eq!(
            PaymentStatus::derive(dec!(0), dec!(100)),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentStatus::derive(dec!(40), dec!(100)),
            PaymentStatus::Partial
        );
        assert_eq!(
            PaymentStatus::derive(dec!(100), dec!(100)),
            PaymentStatus::Paid
        );
    }
}
