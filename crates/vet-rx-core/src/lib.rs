//! Vet-Rx Core Library
//!
//! Dosing, quantity and stock reconciliation for veterinary prescription lines.
//!
//! # Architecture
//!
//! ```text
//!   Frequency spec ──┐
//!   Number of days ──┼──► Reconcile against stock ──► PrescriptionLineDraft
//!   Selected batch ──┘          (every edit)                  │
//!                                                        Vet submits
//!                                                             │
//!                                          Refresh stock → Validate → Save
//!                                                             │
//!                                             prescription_details (local store)
//! ```
//!
//! # Core Principle
//!
//! **Dosing arithmetic never fails.** Malformed input degrades to 0 or to one
//! dose per day; refusing a line is the job of [`validation`].
//!
//! # Modules
//!
//! - [`dosing`]: Frequency parsing, quantity/day-count arithmetic, stock reconciliation
//! - [`models`]: Domain types (MedicineBatch, PrescriptionLineDraft, PrescriptionDetail)
//! - [`validation`]: Submission checks
//! - [`editor`]: Select batch, edit, save and list prescription lines
//! - [`db`]: SQLite store standing in for the inventory and prescription services
//! - [`config`]: Prescription policy

pub mod config;
pub mod db;
pub mod dosing;
pub mod editor;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::RxConfig;
pub use db::Database;
pub use dosing::{Frequency, ReconciliationResult, StockWarning};
pub use editor::PrescriptionEditor;
pub use models::{BatchSelection, MedicineBatch, PrescriptionDetail, PrescriptionLineDraft};
pub use validation::ValidationError;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum VetRxError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for VetRxError {
    fn from(e: db::DbError) -> Self {
        VetRxError::DatabaseError(e.to_string())
    }
}

impl From<config::ConfigError> for VetRxError {
    fn from(e: config::ConfigError) -> Self {
        VetRxError::ConfigError(e.to_string())
    }
}

impl From<editor::EditorError> for VetRxError {
    fn from(e: editor::EditorError) -> Self {
        use editor::EditorError;
        match e {
            EditorError::Database(e) => e.into(),
            EditorError::Validation(e) => VetRxError::InvalidInput(e.to_string()),
            EditorError::BatchNotFound(_) | EditorError::LineNotFound(_) => {
                VetRxError::NotFound(e.to_string())
            }
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for VetRxError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        VetRxError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Logging
// =========================================================================

/// Install a global `tracing` subscriber.
///
/// `filter` uses `EnvFilter` syntax; when absent, `RUST_LOG` is read, falling
/// back to `vet_rx_core=info`. Calling more than once is a no-op.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) {
    let filter = filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("vet_rx_core=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

// =========================================================================
// Dosing Functions (exported to FFI)
// =========================================================================

/// Per-day dose count of a frequency spec.
#[uniffi::export]
pub fn parse_frequency(spec: String) -> f64 {
    dosing::parse_frequency(&spec)
}

/// Units needed for `days` at the given frequency (rounded up).
#[uniffi::export]
pub fn compute_required_quantity(spec: String, days: Option<i64>) -> f64 {
    dosing::compute_required_quantity(&spec, days)
}

/// Days the available stock covers at the given frequency (rounded down).
#[uniffi::export]
pub fn compute_max_days(spec: String, available_quantity: Option<f64>) -> u64 {
    dosing::compute_max_days(&spec, available_quantity)
}

/// Required quantity capped to stock, with a warning when capped.
#[uniffi::export]
pub fn reconcile_against_stock(
    spec: String,
    days: Option<i64>,
    available_quantity: Option<f64>,
    unit: String,
) -> FfiReconciliation {
    dosing::reconcile_against_stock(&spec, days, available_quantity, &unit).into()
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
///
/// `config_json` overrides the default prescription policy.
#[uniffi::export]
pub fn open_database(
    path: String,
    config_json: Option<String>,
) -> Result<Arc<VetRxCore>, VetRxError> {
    let config = match config_json {
        Some(json) => RxConfig::from_json_str(&json)?,
        None => RxConfig::default(),
    };
    let db = Database::open(&path)?;
    tracing::info!(path = %path, "opened vet-rx database");
    Ok(Arc::new(VetRxCore {
        db: Arc::new(Mutex::new(db)),
        config,
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<VetRxCore>, VetRxError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(VetRxCore {
        db: Arc::new(Mutex::new(db)),
        config: RxConfig::default(),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct VetRxCore {
    db: Arc<Mutex<Database>>,
    config: RxConfig,
}

#[uniffi::export]
impl VetRxCore {
    // =========================================================================
    // Batch Operations
    // =========================================================================

    /// Add or update a batch.
    pub fn upsert_batch(&self, batch: FfiMedicineBatch) -> Result<(), VetRxError> {
        let db = self.db.lock()?;
        db.upsert_batch(&batch.into())?;
        Ok(())
    }

    /// Get a batch by ID.
    pub fn get_batch(&self, batch_id: String) -> Result<Option<FfiMedicineBatch>, VetRxError> {
        let db = self.db.lock()?;
        let batch = db.get_batch(&batch_id)?;
        Ok(batch.map(|b| b.into()))
    }

    /// In-stock batches of a product, soonest expiry first.
    pub fn batches_for_product(
        &self,
        product_id: String,
    ) -> Result<Vec<FfiMedicineBatch>, VetRxError> {
        let db = self.db.lock()?;
        let batches = self.editor(&db).batches_for_product(&product_id)?;
        Ok(batches.into_iter().map(|b| b.into()).collect())
    }

    // =========================================================================
    // Prescription Line Operations
    // =========================================================================

    /// Start a new line on a prescription.
    pub fn new_line(&self, prescription_id: String) -> FfiPrescriptionLine {
        PrescriptionLineDraft::new(prescription_id).into()
    }

    /// Recompute quantity and warning after the form changed.
    pub fn reconcile_line(&self, line: FfiPrescriptionLine) -> FfiPrescriptionLine {
        PrescriptionLineDraft::from(line).reconciled().into()
    }

    /// Select a batch for a line.
    pub fn select_batch(
        &self,
        line: FfiPrescriptionLine,
        batch_id: String,
    ) -> Result<FfiPrescriptionLine, VetRxError> {
        let db = self.db.lock()?;
        let draft = self.editor(&db).select_batch(line.into(), &batch_id)?;
        Ok(draft.into())
    }

    /// Load a saved line for editing.
    pub fn edit_line(&self, detail_id: String) -> Result<FfiPrescriptionLine, VetRxError> {
        let db = self.db.lock()?;
        let draft = self.editor(&db).edit_line(&detail_id)?;
        Ok(draft.into())
    }

    /// Validate and save a line.
    pub fn save_line(
        &self,
        line: FfiPrescriptionLine,
    ) -> Result<FfiPrescriptionDetail, VetRxError> {
        let db = self.db.lock()?;
        let detail = self.editor(&db).save_line(line.into())?;
        Ok(detail.into())
    }

    /// Saved lines of a prescription.
    pub fn list_lines(
        &self,
        prescription_id: String,
    ) -> Result<Vec<FfiPrescriptionDetail>, VetRxError> {
        let db = self.db.lock()?;
        let details = self.editor(&db).list_lines(&prescription_id)?;
        Ok(details.into_iter().map(|d| d.into()).collect())
    }

    /// Delete a saved line.
    pub fn delete_line(&self, detail_id: String) -> Result<bool, VetRxError> {
        let db = self.db.lock()?;
        Ok(self.editor(&db).delete_line(&detail_id)?)
    }
}

impl VetRxCore {
    fn editor<'a>(&self, db: &'a Database) -> PrescriptionEditor<'a> {
        PrescriptionEditor::with_config(db, self.config.clone())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe reconciliation result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReconciliation {
    pub final_quantity: f64,
    pub warning: Option<String>,
}

impl From<ReconciliationResult> for FfiReconciliation {
    fn from(result: ReconciliationResult) -> Self {
        Self {
            warning: result.warning_message(),
            final_quantity: result.final_quantity,
        }
    }
}

/// FFI-safe medicine batch.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicineBatch {
    pub batch_id: String,
    pub product_id: String,
    pub product_name: String,
    pub batch_number: Option<String>,
    pub unit_of_measure: String,
    pub available_quantity: f64,
    pub expiry_date: Option<String>,
}

impl From<MedicineBatch> for FfiMedicineBatch {
    fn from(batch: MedicineBatch) -> Self {
        Self {
            batch_id: batch.batch_id,
            product_id: batch.product_id,
            product_name: batch.product_name,
            batch_number: batch.batch_number,
            unit_of_measure: batch.unit_of_measure,
            available_quantity: batch.available_quantity,
            expiry_date: batch.expiry_date,
        }
    }
}

impl From<FfiMedicineBatch> for MedicineBatch {
    fn from(batch: FfiMedicineBatch) -> Self {
        MedicineBatch {
            batch_id: batch.batch_id,
            product_id: batch.product_id,
            product_name: batch.product_name,
            batch_number: batch.batch_number,
            unit_of_measure: batch.unit_of_measure,
            available_quantity: batch.available_quantity,
            expiry_date: batch.expiry_date,
        }
    }
}

/// FFI-safe prescription line draft.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionLine {
    pub detail_id: Option<String>,
    pub prescription_id: String,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub frequency: String,
    pub number_of_days: Option<i64>,
    pub quantity: f64,
    pub directions: Option<String>,
    pub batch_id: Option<String>,
    pub available_quantity: Option<f64>,
    pub unit_of_measure: Option<String>,
    pub warning: Option<String>,
}

impl From<PrescriptionLineDraft> for FfiPrescriptionLine {
    fn from(draft: PrescriptionLineDraft) -> Self {
        let (batch_id, available_quantity, unit_of_measure) = match draft.batch {
            Some(b) => (
                Some(b.batch_id),
                Some(b.available_quantity),
                Some(b.unit_of_measure),
            ),
            None => (None, None, None),
        };
        Self {
            detail_id: draft.detail_id,
            prescription_id: draft.prescription_id,
            product_id: draft.product_id,
            product_name: draft.product_name,
            frequency: draft.frequency,
            number_of_days: draft.number_of_days,
            quantity: draft.quantity,
            directions: draft.directions,
            batch_id,
            available_quantity,
            unit_of_measure,
            warning: draft.warning.map(|w| w.to_string()),
        }
    }
}

impl From<FfiPrescriptionLine> for PrescriptionLineDraft {
    fn from(line: FfiPrescriptionLine) -> Self {
        PrescriptionLineDraft {
            detail_id: line.detail_id,
            prescription_id: line.prescription_id,
            product_id: line.product_id,
            product_name: line.product_name,
            frequency: line.frequency,
            number_of_days: line.number_of_days,
            quantity: line.quantity,
            directions: line.directions,
            batch: line.batch_id.map(|batch_id| BatchSelection {
                batch_id,
                available_quantity: line.available_quantity.unwrap_or(0.0),
                unit_of_measure: line.unit_of_measure.unwrap_or_default(),
            }),
            // Recomputed on the next reconciling edit
            warning: None,
        }
    }
}

/// FFI-safe saved prescription line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionDetail {
    pub detail_id: String,
    pub prescription_id: String,
    pub product_id: String,
    pub frequency: String,
    pub number_of_days: i64,
    pub quantity: f64,
    pub directions: Option<String>,
    pub purchase_order_receiving_history_id: Option<String>,
    pub updated_at: String,
}

impl From<PrescriptionDetail> for FfiPrescriptionDetail {
    fn from(detail: PrescriptionDetail) -> Self {
        Self {
            detail_id: detail.detail_id,
            prescription_id: detail.prescription_id,
            product_id: detail.product_id,
            frequency: detail.frequency,
            number_of_days: detail.number_of_days,
            quantity: detail.quantity,
            directions: detail.directions,
            purchase_order_receiving_history_id: detail.purchase_order_receiving_history_id,
            updated_at: detail.updated_at,
        }
    }
}
