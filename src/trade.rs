use crate::orders::{OrderId, Price, Quantity};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// One side of an executed trade, carrying that order's own recorded price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TradeLeg {
    pub order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
}

/// A matched execution between an aggressing (taker) order and a resting
/// (maker) order. Both legs always carry the same quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub taker: TradeLeg,
    pub maker: TradeLeg,
    pub timestamp: SystemTime,
}

impl Trade {
    pub fn new(taker: TradeLeg, maker: TradeLeg) -> Self {
        Trade {
            taker,
            maker,
            timestamp: SystemTime::now(),
        }
    }
}
