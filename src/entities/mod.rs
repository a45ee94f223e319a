pub mod po_sequence;
pub mod product;
pub mod purchase_order;
pub mod purchase_order_line;
pub mod stock_entry;
pub mod stock_movement;
pub mod supplier;
