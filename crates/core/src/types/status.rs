//! Order status values reported by the API.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a placed order.
///
/// Unrecognized values are preserved in [`OrderStatus::Other`] so a new
/// server-side state never breaks order history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    #[serde(untagged)]
    Other(String),
}

impl OrderStatus {
    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Other(raw) => raw,
        }
    }

    /// Whether the order can no longer change.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_status() {
        let status: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        assert_eq!(status.to_string(), "Shipped");
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let status: OrderStatus = serde_json::from_str("\"returned\"").unwrap();
        assert_eq!(status, OrderStatus::Other("returned".to_string()));
        assert_eq!(status.label(), "returned");
        assert!(!status.is_final());
    }
}
