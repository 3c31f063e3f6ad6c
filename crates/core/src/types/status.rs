//! Status values used when querying the retailer API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order status filter accepted by the bol.com orders listing.
///
/// `All` includes orders that have already been shipped or cancelled; `Open`
/// only returns orders still awaiting fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    All,
    Open,
}

impl OrderStatus {
    /// Wire value for the `status` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Open => "OPEN",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status filter is not one of the supported values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid order status: {0} (expected ALL or OPEN)")]
pub struct InvalidOrderStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = InvalidOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "OPEN" => Ok(Self::Open),
            _ => Err(InvalidOrderStatus(s.to_string())),
        }
    }
}
