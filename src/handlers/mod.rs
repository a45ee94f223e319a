pub mod common;
pub mod inventory;
pub mod purchase_orders;
pub mod suppliers;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    ProductCatalog, PurchaseOrderService, ReorderService, SqlProductCatalog, StockLedgerService,
    SupplierService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub stock_ledger: Arc<StockLedgerService>,
    pub reorder: Arc<ReorderService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub suppliers: Arc<SupplierService>,
    pub catalog: Arc<dyn ProductCatalog>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        let catalog: Arc<dyn ProductCatalog> = Arc::new(SqlProductCatalog::new(db_pool.clone()));
        Self {
            stock_ledger: Arc::new(StockLedgerService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            reorder: Arc::new(ReorderService::new(db_pool.clone())),
            purchase_orders: Arc::new(PurchaseOrderService::new(
                db_pool.clone(),
                event_sender,
                catalog.clone(),
            )),
            suppliers: Arc::new(SupplierService::new(db_pool)),
            catalog,
        }
    }
}
