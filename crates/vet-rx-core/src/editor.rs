//! Prescription line editor.
//!
//! Flow: Select batch → Edit frequency/days (reconciled on every edit)
//! → Refresh stock → Validate → Save

use chrono::Utc;
use thiserror::Error;

use crate::config::RxConfig;
use crate::db::{Database, DbError};
use crate::models::{MedicineBatch, PrescriptionDetail, PrescriptionLineDraft};
use crate::validation::{validate_for_submission, ValidationError};

/// Editor errors.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    #[error("Prescription line not found: {0}")]
    LineNotFound(String),
}

pub type EditorResult<T> = Result<T, EditorError>;

/// Builds, edits and saves prescription lines against the local store.
pub struct PrescriptionEditor<'a> {
    db: &'a Database,
    config: RxConfig,
}

impl<'a> PrescriptionEditor<'a> {
    /// Create an editor with the default policy.
    pub fn new(db: &'a Database) -> Self {
        Self::with_config(db, RxConfig::default())
    }

    /// Create an editor with a custom policy.
    pub fn with_config(db: &'a Database, config: RxConfig) -> Self {
        Self { db, config }
    }

    /// Batches a product can be dispensed from: in stock and not expired.
    pub fn batches_for_product(&self, product_id: &str) -> EditorResult<Vec<MedicineBatch>> {
        let today = Utc::now().date_naive().to_string();
        Ok(self
            .db
            .list_batches_for_product(product_id)?
            .into_iter()
            .filter(|b| b.in_stock() && !b.is_expired_on(&today))
            .collect())
    }

    /// Select a batch for a draft and reconcile against its stock.
    pub fn select_batch(
        &self,
        draft: PrescriptionLineDraft,
        batch_id: &str,
    ) -> EditorResult<PrescriptionLineDraft> {
        let batch = self.load_batch(batch_id)?;
        tracing::debug!(
            batch_id,
            available = batch.available_quantity,
            "selected batch"
        );

        let draft = draft.with_batch(&batch);
        if let Some(warning) = &draft.warning {
            tracing::warn!(batch_id, "{}", warning);
        }
        Ok(draft)
    }

    /// Load a saved line as a draft for editing.
    pub fn edit_line(&self, detail_id: &str) -> EditorResult<PrescriptionLineDraft> {
        let detail = self
            .db
            .get_detail(detail_id)?
            .ok_or_else(|| EditorError::LineNotFound(detail_id.to_string()))?;

        let batch = match detail.purchase_order_receiving_history_id.as_deref() {
            Some(batch_id) => Some(self.load_batch(batch_id)?),
            None => None,
        };

        Ok(PrescriptionLineDraft::from_detail(&detail, batch.as_ref()))
    }

    /// Validate a draft against current stock and persist it.
    ///
    /// New drafts are inserted; drafts loaded with [`Self::edit_line`] update
    /// their saved line.
    pub fn save_line(&self, draft: PrescriptionLineDraft) -> EditorResult<PrescriptionDetail> {
        let draft = self.refresh_stock(draft)?;

        let stock_check = draft.reconciliation();
        if stock_check.final_quantity < draft.quantity {
            if let Some(warning) = &stock_check.warning {
                tracing::warn!(prescription_id = %draft.prescription_id, "{}", warning);
            }
        }

        let line = validate_for_submission(&draft, &self.config)?;

        let detail = match &draft.detail_id {
            None => {
                let mut detail = PrescriptionDetail::new(
                    draft.prescription_id.clone(),
                    line.product_id,
                    line.frequency,
                    line.number_of_days,
                    line.quantity,
                );
                detail.directions = line.directions;
                detail.purchase_order_receiving_history_id = line.batch_id;
                self.db.insert_detail(&detail)?;
                tracing::info!(detail_id = %detail.detail_id, "created prescription line");
                detail
            }
            Some(detail_id) => {
                let mut detail = self
                    .db
                    .get_detail(detail_id)?
                    .ok_or_else(|| EditorError::LineNotFound(detail_id.clone()))?;
                detail.product_id = line.product_id;
                detail.frequency = line.frequency;
                detail.number_of_days = line.number_of_days;
                detail.quantity = line.quantity;
                detail.directions = line.directions;
                detail.purchase_order_receiving_history_id = line.batch_id;
                detail.touch();
                if !self.db.update_detail(&detail)? {
                    return Err(EditorError::LineNotFound(detail_id.clone()));
                }
                tracing::info!(detail_id = %detail.detail_id, "updated prescription line");
                detail
            }
        };

        Ok(detail)
    }

    /// Lines of a prescription in entry order.
    pub fn list_lines(&self, prescription_id: &str) -> EditorResult<Vec<PrescriptionDetail>> {
        Ok(self.db.list_details_for_prescription(prescription_id)?)
    }

    /// Delete a saved line.
    pub fn delete_line(&self, detail_id: &str) -> EditorResult<bool> {
        let deleted = self.db.delete_detail(detail_id)?;
        if deleted {
            tracing::info!(detail_id, "deleted prescription line");
        }
        Ok(deleted)
    }

    fn load_batch(&self, batch_id: &str) -> EditorResult<MedicineBatch> {
        self.db
            .get_batch(batch_id)?
            .ok_or_else(|| EditorError::BatchNotFound(batch_id.to_string()))
    }

    /// Replace the draft's stock snapshot with the stored one. The quantity is
    /// left alone so a stale or hand-entered amount is caught by validation.
    ///
    /// A batch emptied since selection fails here, since a zero snapshot would
    /// otherwise read as unconstrained stock.
    fn refresh_stock(&self, mut draft: PrescriptionLineDraft) -> EditorResult<PrescriptionLineDraft> {
        if let Some(selection) = draft.batch.as_mut() {
            let batch = self.load_batch(&selection.batch_id)?;
            if !batch.in_stock() {
                if self.config.block_on_insufficient_stock {
                    return Err(ValidationError::OutOfStock(batch.batch_id).into());
                }
                tracing::warn!(batch_id = %batch.batch_id, "saving against an empty batch");
            }
            selection.available_quantity = batch.available_quantity;
            selection.unit_of_measure = batch.unit_of_measure;
        }
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        let mut batch = MedicineBatch::new(
            "POR-1".into(),
            "CARP-100".into(),
            "Carprofen 100mg tablets".into(),
            15.0,
        );
        batch.unit_of_measure = "TAB".into();
        db.upsert_batch(&batch).unwrap();
        db
    }

    #[test]
    fn test_select_batch_caps_quantity() {
        let db = setup_db();
        let editor = PrescriptionEditor::new(&db);

        let draft = PrescriptionLineDraft::new("rx-1".into())
            .with_frequency("1-0-1")
            .with_number_of_days(Some(10));
        let draft = editor.select_batch(draft, "POR-1").unwrap();

        assert_eq!(draft.quantity, 15.0);
        assert_eq!(draft.warning.as_ref().unwrap().unit, "TAB");
    }

    #[test]
    fn test_select_missing_batch() {
        let db = setup_db();
        let editor = PrescriptionEditor::new(&db);

        let result = editor.select_batch(PrescriptionLineDraft::new("rx-1".into()), "nope");
        assert!(matches!(result, Err(EditorError::BatchNotFound(_))));
    }

    #[test]
    fn test_save_new_then_edit() {
        let db = setup_db();
        let editor = PrescriptionEditor::new(&db);

        let draft = editor
            .select_batch(PrescriptionLineDraft::new("rx-1".into()), "POR-1")
            .unwrap()
            .with_frequency("1-0-1")
            .with_number_of_days(Some(3));
        let saved = editor.save_line(draft).unwrap();
        assert_eq!(saved.quantity, 6.0);
        assert_eq!(saved.purchase_order_receiving_history_id.as_deref(), Some("POR-1"));

        let draft = editor.edit_line(&saved.detail_id).unwrap().with_number_of_days(Some(5));
        let updated = editor.save_line(draft).unwrap();
        assert_eq!(updated.detail_id, saved.detail_id);
        assert_eq!(updated.quantity, 10.0);
        assert_eq!(editor.list_lines("rx-1").unwrap().len(), 1);
    }

    #[test]
    fn test_save_rejects_stock_that_shrank() {
        let db = setup_db();
        let editor = PrescriptionEditor::new(&db);

        let draft = editor
            .select_batch(PrescriptionLineDraft::new("rx-1".into()), "POR-1")
            .unwrap()
            .with_frequency("1-0-1")
            .with_number_of_days(Some(5));
        assert_eq!(draft.quantity, 10.0);

        db.set_available_quantity("POR-1", 8.0).unwrap();

        match editor.save_line(draft) {
            Err(EditorError::Validation(ValidationError::InsufficientStock(warning))) => {
                assert_eq!(warning.available, 8.0);
                assert_eq!(warning.max_days, 4);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_save_rejects_batch_emptied_after_selection() {
        let db = setup_db();
        let editor = PrescriptionEditor::new(&db);

        let draft = editor
            .select_batch(PrescriptionLineDraft::new("rx-1".into()), "POR-1")
            .unwrap()
            .with_frequency("1-0-1")
            .with_number_of_days(Some(5));

        db.set_available_quantity("POR-1", 0.0).unwrap();

        match editor.save_line(draft.clone()) {
            Err(EditorError::Validation(ValidationError::OutOfStock(batch_id))) => {
                assert_eq!(batch_id, "POR-1");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(editor.list_lines("rx-1").unwrap().is_empty());

        let lenient = PrescriptionEditor::with_config(
            &db,
            RxConfig {
                block_on_insufficient_stock: false,
                ..RxConfig::default()
            },
        );
        assert_eq!(lenient.save_line(draft).unwrap().quantity, 10.0);
    }

    #[test]
    fn test_batches_for_product_skips_expired_and_empty() {
        let db = setup_db();
        let mut expired = MedicineBatch::new(
            "POR-OLD".into(),
            "CARP-100".into(),
            "Carprofen 100mg tablets".into(),
            40.0,
        );
        expired.expiry_date = Some("2000-01-01".into());
        db.upsert_batch(&expired).unwrap();

        let mut current = expired.clone();
        current.batch_id = "POR-NEW".into();
        current.expiry_date = Some("2099-12-31".into());
        db.upsert_batch(&current).unwrap();

        let mut empty = current.clone();
        empty.batch_id = "POR-EMPTY".into();
        empty.available_quantity = 0.0;
        db.upsert_batch(&empty).unwrap();

        let editor = PrescriptionEditor::new(&db);
        let ids: Vec<String> = editor
            .batches_for_product("CARP-100")
            .unwrap()
            .into_iter()
            .map(|b| b.batch_id)
            .collect();
        assert_eq!(ids, vec!["POR-NEW".to_string(), "POR-1".to_string()]);
    }

    #[test]
    fn test_save_reports_validation_errors() {
        let db = setup_db();
        let editor = PrescriptionEditor::new(&db);

        let draft = PrescriptionLineDraft::new("rx-1".into()).with_frequency("1-0-1");
        let result = editor.save_line(draft);
        assert!(matches!(
            result,
            Err(EditorError::Validation(ValidationError::MissingProduct))
        ));
    }

    #[test]
    fn test_edit_missing_line() {
        let db = setup_db();
        let editor = PrescriptionEditor::new(&db);
        assert!(matches!(
            editor.edit_line("nope"),
            Err(EditorError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_delete_line() {
        let db = setup_db();
        let editor = PrescriptionEditor::new(&db);

        let draft = editor
            .select_batch(PrescriptionLineDraft::new("rx-1".into()), "POR-1")
            .unwrap()
            .with_frequency("once")
            .with_number_of_days(Some(2));
        let saved = editor.save_line(draft).unwrap();

        assert!(editor.delete_line(&saved.detail_id).unwrap());
        assert!(editor.list_lines("rx-1").unwrap().is_empty());
    }
}
