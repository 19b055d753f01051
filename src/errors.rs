use crate::orders::OrderId;
use thiserror::Error;

/// Why the book refused an admission or modification.
///
/// The public engine API keeps the original silent-rejection contract (an
/// empty trade list, no state change), so these never cross the facade;
/// they feed the rejection logs and the internal book/engine boundary.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("order id {0} already present in the book")]
    DuplicateId(OrderId),
    #[error("order {0} has zero quantity")]
    ZeroQuantity(OrderId),
    #[error("order {0} is not a market order but carries no price")]
    MissingPrice(OrderId),
    #[error("market order {0} has no opposite-side liquidity")]
    NoLiquidity(OrderId),
    #[error("fill-and-kill order {0} cannot cross the best opposite price")]
    NoCross(OrderId),
    #[error("fill-or-kill order {0} exceeds available quantity within its limit")]
    InsufficientLiquidity(OrderId),
    #[error("order id {0} is not in the book")]
    UnknownOrder(OrderId),
}
