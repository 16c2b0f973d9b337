//! Medicine batch database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::MedicineBatch;

const BATCH_COLUMNS: &str = "batch_id, product_id, product_name, batch_number, \
     unit_of_measure, available_quantity, expiry_date";

impl Database {
    /// Insert or update a batch.
    pub fn upsert_batch(&self, batch: &MedicineBatch) -> DbResult<()> {
        if !(batch.available_quantity.is_finite() && batch.available_quantity >= 0.0) {
            return Err(DbError::Constraint(format!(
                "Batch {} has invalid available quantity {}",
                batch.batch_id, batch.available_quantity
            )));
        }

        self.conn.execute(
            r#"
            INSERT INTO medicine_batches (
                batch_id, product_id, product_name, batch_number,
                unit_of_measure, available_quantity, expiry_date, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))
            ON CONFLICT(batch_id) DO UPDATE SET
                product_id = excluded.product_id,
                product_name = excluded.product_name,
                batch_number = excluded.batch_number,
                unit_of_measure = excluded.unit_of_measure,
                available_quantity = excluded.available_quantity,
                expiry_date = excluded.expiry_date,
                updated_at = datetime('now')
            "#,
            params![
                batch.batch_id,
                batch.product_id,
                batch.product_name,
                batch.batch_number,
                batch.unit_of_measure,
                batch.available_quantity,
                batch.expiry_date,
            ],
        )?;
        Ok(())
    }

    /// Get a batch by ID.
    pub fn get_batch(&self, batch_id: &str) -> DbResult<Option<MedicineBatch>> {
        let batch = self
            .conn
            .query_row(
                &format!("SELECT {BATCH_COLUMNS} FROM medicine_batches WHERE batch_id = ?"),
                [batch_id],
                batch_from_row,
            )
            .optional()?;
        Ok(batch)
    }

    /// List in-stock batches of a product, soonest expiry first.
    pub fn list_batches_for_product(&self, product_id: &str) -> DbResult<Vec<MedicineBatch>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM medicine_batches
            WHERE product_id = ? AND available_quantity > 0
            ORDER BY expiry_date IS NULL, expiry_date ASC, batch_id ASC
            "#
        ))?;

        let rows = stmt.query_map([product_id], batch_from_row)?;

        let mut batches = Vec::new();
        for row in rows {
            batches.push(row?);
        }
        Ok(batches)
    }

    /// Replace a batch's available quantity.
    pub fn set_available_quantity(&self, batch_id: &str, available_quantity: f64) -> DbResult<bool> {
        if !(available_quantity.is_finite() && available_quantity >= 0.0) {
            return Err(DbError::Constraint(format!(
                "Invalid available quantity {} for batch {}",
                available_quantity, batch_id
            )));
        }

        let rows_affected = self.conn.execute(
            "UPDATE medicine_batches SET available_quantity = ?2, updated_at = datetime('now') WHERE batch_id = ?1",
            params![batch_id, available_quantity],
        )?;
        Ok(rows_affected > 0)
    }
}

fn batch_from_row(row: &Row<'_>) -> rusqlite::Result<MedicineBatch> {
    Ok(MedicineBatch {
        batch_id: row.get(0)?,
        product_id: row.get(1)?,
        product_name: row.get(2)?,
        batch_number: row.get(3)?,
        unit_of_measure: row.get(4)?,
        available_quantity: row.get(5)?,
        expiry_date: row.get(6)?,
    })
}
