//! Medicine batch models.

use serde::{Deserialize, Serialize};

/// A received purchase-order batch of a product.
///
/// The batch ID is the purchase order receiving history ID the practice
/// management server assigns; prescription lines reference it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineBatch {
    /// Purchase order receiving history ID
    pub batch_id: String,
    /// Product this batch belongs to
    pub product_id: String,
    /// Product display name
    pub product_name: String,
    /// Manufacturer lot number
    pub batch_number: Option<String>,
    /// Unit of measure (e.g., "EA", "BOTTLE")
    pub unit_of_measure: String,
    /// Units currently in stock
    pub available_quantity: f64,
    /// Expiry date (ISO 8601)
    pub expiry_date: Option<String>,
}

impl MedicineBatch {
    /// Create a new batch with required fields.
    pub fn new(
        batch_id: String,
        product_id: String,
        product_name: String,
        available_quantity: f64,
    ) -> Self {
        Self {
            batch_id,
            product_id,
            product_name,
            batch_number: None,
            unit_of_measure: "EA".into(),
            available_quantity,
            expiry_date: None,
        }
    }

    /// Whether any stock is on hand.
    pub fn in_stock(&self) -> bool {
        self.available_quantity > 0.0
    }

    /// Whether the batch expired before the given date (ISO 8601, compared lexically).
    pub fn is_expired_on(&self, date: &str) -> bool {
        self.expiry_date
            .as_deref()
            .map(|expiry| expiry < date)
            .unwrap_or(false)
    }
}
