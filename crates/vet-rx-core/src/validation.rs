//! Submission checks for prescription lines.
//!
//! Dosing arithmetic never fails; this is where a line is refused. Checks run
//! in a fixed order and the first failure is reported.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RxConfig;
use crate::dosing::{compute_max_days, StockWarning};
use crate::models::PrescriptionLineDraft;

/// Why a line cannot be submitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please select a medicine")]
    MissingProduct,

    #[error("Please enter a frequency")]
    MissingFrequency,

    #[error("Number of days must be greater than zero")]
    InvalidNumberOfDays,

    #[error("Frequency '{0}' administers no doses")]
    ZeroDoseFrequency(String),

    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    #[error("{0}")]
    InsufficientStock(StockWarning),

    #[error("Batch {0} is out of stock")]
    OutOfStock(String),
}

/// A line that passed validation, with every required field present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidatedLine {
    pub product_id: String,
    pub frequency: String,
    pub number_of_days: i64,
    pub quantity: f64,
    pub directions: Option<String>,
    pub batch_id: Option<String>,
}

/// Check a draft before it is saved.
pub fn validate_for_submission(
    draft: &PrescriptionLineDraft,
    config: &RxConfig,
) -> Result<ValidatedLine, ValidationError> {
    let product_id = draft
        .product_id
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or(ValidationError::MissingProduct)?;

    let frequency = draft
        .parsed_frequency()
        .ok_or(ValidationError::MissingFrequency)?;

    let number_of_days = draft
        .number_of_days
        .filter(|d| *d > 0)
        .ok_or(ValidationError::InvalidNumberOfDays)?;

    if config.reject_zero_dose_frequency && frequency.is_zero_dose() {
        return Err(ValidationError::ZeroDoseFrequency(draft.frequency.clone()));
    }

    if !(draft.quantity.is_finite() && draft.quantity > 0.0) {
        return Err(ValidationError::InvalidQuantity);
    }

    if config.block_on_insufficient_stock {
        check_stock(draft, config)?;
    }

    Ok(ValidatedLine {
        product_id: product_id.to_string(),
        frequency: draft.frequency.clone(),
        number_of_days,
        quantity: draft.quantity,
        directions: draft
            .directions
            .clone()
            .filter(|d| !d.trim().is_empty()),
        batch_id: draft.batch.as_ref().map(|b| b.batch_id.clone()),
    })
}

/// Fails when the quantity exceeds the selected batch's known stock.
pub fn check_stock(draft: &PrescriptionLineDraft, config: &RxConfig) -> Result<(), ValidationError> {
    let Some(available) = draft.available_quantity().filter(|q| *q > 0.0) else {
        return Ok(());
    };
    if draft.quantity <= available {
        return Ok(());
    }

    Err(ValidationError::InsufficientStock(StockWarning {
        required: draft.quantity,
        available,
        unit: config.unit_label(draft.unit_of_measure()).to_string(),
        max_days: compute_max_days(&draft.frequency, Some(available)),
    }))
}
