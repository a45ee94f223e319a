use crate::{db::DbPool, entities::product, errors::ServiceError};
use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

/// Catalog boundary. The engine only ever asks whether a product exists;
/// names, pricing and categorization belong to the catalog owner.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn exists(&self, product_id: Uuid) -> Result<bool, ServiceError>;
}

/// Catalog backed by the local products table.
#[derive(Clone)]
pub struct SqlProductCatalog {
    db_pool: Arc<DbPool>,
}

impl SqlProductCatalog {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProductCatalog for SqlProductCatalog {
    async fn exists(&self, product_id: Uuid) -> Result<bool, ServiceError> {
        let count = product::Entity::find()
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::IsActive.eq(true))
            .count(&*self.db_pool)
            .await?;
        Ok(count > 0)
    }
}
