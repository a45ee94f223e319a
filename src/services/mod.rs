pub mod product_catalog;
pub mod purchase_orders;
pub mod reorder;
pub mod stock_ledger;
pub mod suppliers;

pub use product_catalog::{ProductCatalog, SqlProductCatalog};
pub use purchase_orders::PurchaseOrderService;
pub use reorder::ReorderService;
pub use stock_ledger::StockLedgerService;
pub use suppliers::SupplierService;
