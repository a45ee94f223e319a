use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Year-scoped atomic counter for purchase order numbers.
///
/// Replaces the racy count-documents-then-format scheme: the next sequence
/// is claimed with a guarded increment inside the creation transaction.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "po_sequences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub year: i32,
    pub next_seq: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
