//! Prescription line models: the editable draft and the persisted detail.

use serde::{Deserialize, Serialize};

use super::batch::MedicineBatch;
use crate::dosing::{reconcile_against_stock, Frequency, ReconciliationResult, StockWarning};

/// The batch a draft line dispenses from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSelection {
    /// Purchase order receiving history ID
    pub batch_id: String,
    /// Units in stock when the batch was selected
    pub available_quantity: f64,
    /// Unit of measure label
    pub unit_of_measure: String,
}

impl From<&MedicineBatch> for BatchSelection {
    fn from(batch: &MedicineBatch) -> Self {
        Self {
            batch_id: batch.batch_id.clone(),
            available_quantity: batch.available_quantity,
            unit_of_measure: batch.unit_of_measure.clone(),
        }
    }
}

/// A medicine line being built or edited.
///
/// Drafts are values: every edit consumes the draft and returns a new one.
/// Edits to frequency, day count or batch re-run stock reconciliation, so
/// `quantity` and `warning` always reflect the current inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionLineDraft {
    /// Saved line ID when editing, None for a new line
    pub detail_id: Option<String>,
    /// Owning prescription
    pub prescription_id: String,
    /// Selected product
    pub product_id: Option<String>,
    /// Product display name
    pub product_name: Option<String>,
    /// Frequency spec as entered ("1-0-1", "twice daily", ...)
    pub frequency: String,
    /// Treatment days
    pub number_of_days: Option<i64>,
    /// Units to dispense
    pub quantity: f64,
    /// Directions for the owner
    pub directions: Option<String>,
    /// Batch to dispense from
    pub batch: Option<BatchSelection>,
    /// Warning from the last reconciliation
    pub warning: Option<StockWarning>,
}

impl PrescriptionLineDraft {
    /// Start a new, empty line on a prescription.
    pub fn new(prescription_id: String) -> Self {
        Self {
            detail_id: None,
            prescription_id,
            product_id: None,
            product_name: None,
            frequency: String::new(),
            number_of_days: None,
            quantity: 0.0,
            directions: None,
            batch: None,
            warning: None,
        }
    }

    /// Load a saved line for editing. The saved quantity is kept as-is until
    /// the next reconciling edit.
    pub fn from_detail(detail: &PrescriptionDetail, batch: Option<&MedicineBatch>) -> Self {
        Self {
            detail_id: Some(detail.detail_id.clone()),
            prescription_id: detail.prescription_id.clone(),
            product_id: Some(detail.product_id.clone()),
            product_name: batch.map(|b| b.product_name.clone()),
            frequency: detail.frequency.clone(),
            number_of_days: Some(detail.number_of_days),
            quantity: detail.quantity,
            directions: detail.directions.clone(),
            batch: batch.map(BatchSelection::from),
            warning: None,
        }
    }

    /// Select a product. Changing product drops a batch of the old product.
    pub fn with_product(mut self, product_id: String, product_name: Option<String>) -> Self {
        if self.product_id.as_deref() != Some(product_id.as_str()) {
            self.batch = None;
        }
        self.product_id = Some(product_id);
        self.product_name = product_name;
        self.reconciled()
    }

    /// Set the frequency spec.
    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = frequency.into();
        self.reconciled()
    }

    /// Set the treatment day count.
    pub fn with_number_of_days(mut self, days: Option<i64>) -> Self {
        self.number_of_days = days;
        self.reconciled()
    }

    /// Select a batch; also selects its product.
    pub fn with_batch(mut self, batch: &MedicineBatch) -> Self {
        self.product_id = Some(batch.product_id.clone());
        self.product_name = Some(batch.product_name.clone());
        self.batch = Some(BatchSelection::from(batch));
        self.reconciled()
    }

    /// Clear the batch, leaving stock unconstrained.
    pub fn without_batch(mut self) -> Self {
        self.batch = None;
        self.reconciled()
    }

    /// Set directions. Does not affect quantity.
    pub fn with_directions(mut self, directions: Option<String>) -> Self {
        self.directions = directions;
        self
    }

    /// Override the quantity by hand. Not capped; checked at submission.
    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self.warning = None;
        self
    }

    /// Reconcile against the selected batch's stock.
    pub fn reconciliation(&self) -> ReconciliationResult {
        reconcile_against_stock(
            &self.frequency,
            self.number_of_days,
            self.available_quantity(),
            self.unit_of_measure().unwrap_or_default(),
        )
    }

    /// Apply reconciliation, replacing quantity and warning.
    pub fn reconciled(mut self) -> Self {
        let result = self.reconciliation();
        self.quantity = result.final_quantity;
        self.warning = result.warning;
        self
    }

    /// Parsed frequency, or None when none was entered.
    pub fn parsed_frequency(&self) -> Option<Frequency> {
        (!self.frequency.trim().is_empty()).then(|| Frequency::parse(&self.frequency))
    }

    /// Stock of the selected batch.
    pub fn available_quantity(&self) -> Option<f64> {
        self.batch.as_ref().map(|b| b.available_quantity)
    }

    /// Unit of measure of the selected batch.
    pub fn unit_of_measure(&self) -> Option<&str> {
        self.batch.as_ref().map(|b| b.unit_of_measure.as_str())
    }
}

/// A saved prescription line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionDetail {
    /// Unique line ID
    pub detail_id: String,
    /// Owning prescription
    pub prescription_id: String,
    /// Product dispensed
    pub product_id: String,
    /// Frequency spec as entered
    pub frequency: String,
    /// Treatment days
    pub number_of_days: i64,
    /// Units dispensed
    pub quantity: f64,
    /// Directions for the owner
    pub directions: Option<String>,
    /// Batch dispensed from
    pub purchase_order_receiving_history_id: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl PrescriptionDetail {
    /// Create a new line with required fields.
    pub fn new(
        prescription_id: String,
        product_id: String,
        frequency: String,
        number_of_days: i64,
        quantity: f64,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            detail_id: uuid::Uuid::new_v4().to_string(),
            prescription_id,
            product_id,
            frequency,
            number_of_days,
            quantity,
            directions: None,
            purchase_order_receiving_history_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
