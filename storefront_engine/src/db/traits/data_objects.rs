use serde::{Deserialize, Serialize};

use crate::db_types::{Cents, OrderId};

/// What a buyer gets back from a successful order: the new order's id and what it cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub total: Cents,
}
