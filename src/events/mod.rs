use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Sender half of the in-process event channel.
///
/// Events are raised inside the same logical operation as the state change
/// that produced them; consumption (notifications, reporting) is a
/// collaborator concern handled by the `process_events` loop.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failures to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// State transitions must not be rolled back because a consumer is gone.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("Event channel closed, dropping event: {}", e);
        }
    }
}

// The events the engine can raise for external consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Stock ledger events
    StockLow {
        product_id: Uuid,
        current_stock: i32,
        min_stock_level: i32,
    },
    StockOut {
        product_id: Uuid,
    },
    StockUpdated {
        product_id: Uuid,
        direction: String,
        quantity: i32,
        new_quantity: i32,
        available: i32,
        reference: String,
    },
    StockCountPerformed {
        product_id: Uuid,
        counted_quantity: i32,
        variance: i32,
        counted_by: Uuid,
    },
    StockReserved {
        product_id: Uuid,
        quantity: i32,
    },
    StockReleased {
        product_id: Uuid,
        quantity: i32,
    },

    // Purchase order events
    PurchaseOrderCreated {
        po_id: Uuid,
        po_number: String,
        supplier_id: Uuid,
        total_amount: Decimal,
    },
    PurchaseOrderApproved {
        po_id: Uuid,
        approved_by: Uuid,
    },
    PurchaseOrderRejected {
        po_id: Uuid,
        reason: String,
    },
    PurchaseOrderAcknowledged {
        po_id: Uuid,
        po_number: String,
    },
    PurchaseOrderPartiallyReceived {
        po_id: Uuid,
        po_number: String,
    },
    PurchaseOrderCompleted {
        po_id: Uuid,
        po_number: String,
        supplier_id: Uuid,
        completed_at: DateTime<Utc>,
    },
    PurchaseOrderCancelled {
        po_id: Uuid,
        po_number: String,
        reason: String,
    },
    PurchaseOrderClosed {
        po_id: Uuid,
    },
    PurchaseOrderPaymentRecorded {
        po_id: Uuid,
        amount: Decimal,
        balance: Decimal,
    },
}

/// Consumes events off the channel until every sender is dropped.
///
/// Handlers here only log; notification and reporting delivery belongs to
/// external collaborators listening on their own channel.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Event processing loop started");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockLow {
                product_id,
                current_stock,
                min_stock_level,
            } => {
                warn!(
                    "Low stock alert: product {} has {} units (minimum {})",
                    product_id, current_stock, min_stock_level
                );
            }
            Event::StockOut { product_id } => {
                warn!("Product {} is out of stock", product_id);
            }
            Event::StockUpdated {
                product_id,
                direction,
                quantity,
                new_quantity,
                ..
            } => {
                info!(
                    "Stock {} of {} units for product {}, new total {}",
                    direction, quantity, product_id, new_quantity
                );
            }
            Event::StockCountPerformed {
                product_id,
                variance,
                ..
            } => {
                if *variance != 0 {
                    warn!(
                        "Stock count for product {} recorded a variance of {}",
                        product_id, variance
                    );
                }
            }
            Event::PurchaseOrderCompleted {
                po_id, po_number, ..
            } => {
                info!("Purchase order {} ({}) completed", po_number, po_id);
            }
            Event::PurchaseOrderCancelled {
                po_id,
                po_number,
                reason,
            } => {
                info!(
                    "Purchase order {} ({}) cancelled: {}",
                    po_number, po_id, reason
                );
            }
            _ => {
                info!("Event raised: {:?}", event);
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_does_not_fail_without_consumer() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or return an error path
        sender
            .send_or_log(Event::StockOut {
                product_id: Uuid::new_v4(),
            })
            .await;
    }

    #[tokio::test]
    async fn send_delivers_to_consumer() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send(Event::StockReserved {
                product_id: Uuid::new_v4(),
                quantity: 3,
            })
            .await
            .unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(Event::StockReserved { quantity: 3, .. })
        ));
    }
}
