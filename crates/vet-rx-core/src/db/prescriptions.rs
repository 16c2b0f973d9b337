//! Prescription detail database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::PrescriptionDetail;

const DETAIL_COLUMNS: &str = "detail_id, prescription_id, product_id, frequency, \
     number_of_days, quantity, directions, batch_id, created_at, updated_at";

impl Database {
    /// Insert a new prescription line.
    pub fn insert_detail(&self, detail: &PrescriptionDetail) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO prescription_details (
                detail_id, prescription_id, product_id, frequency,
                number_of_days, quantity, directions, batch_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                detail.detail_id,
                detail.prescription_id,
                detail.product_id,
                detail.frequency,
                detail.number_of_days,
                detail.quantity,
                detail.directions,
                detail.purchase_order_receiving_history_id,
                detail.created_at,
                detail.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing prescription line.
    pub fn update_detail(&self, detail: &PrescriptionDetail) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE prescription_details SET
                product_id = ?2,
                frequency = ?3,
                number_of_days = ?4,
                quantity = ?5,
                directions = ?6,
                batch_id = ?7,
                updated_at = ?8
            WHERE detail_id = ?1
            "#,
            params![
                detail.detail_id,
                detail.product_id,
                detail.frequency,
                detail.number_of_days,
                detail.quantity,
                detail.directions,
                detail.purchase_order_receiving_history_id,
                detail.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a prescription line by ID.
    pub fn get_detail(&self, detail_id: &str) -> DbResult<Option<PrescriptionDetail>> {
        let detail = self
            .conn
            .query_row(
                &format!("SELECT {DETAIL_COLUMNS} FROM prescription_details WHERE detail_id = ?"),
                [detail_id],
                detail_from_row,
            )
            .optional()?;
        Ok(detail)
    }

    /// List the lines of a prescription in entry order.
    pub fn list_details_for_prescription(
        &self,
        prescription_id: &str,
    ) -> DbResult<Vec<PrescriptionDetail>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {DETAIL_COLUMNS}
            FROM prescription_details
            WHERE prescription_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#
        ))?;

        let rows = stmt.query_map([prescription_id], detail_from_row)?;

        let mut details = Vec::new();
        for row in rows {
            details.push(row?);
        }
        Ok(details)
    }

    /// Delete a prescription line.
    pub fn delete_detail(&self, detail_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM prescription_details WHERE detail_id = ?", [detail_id])?;
        Ok(rows_affected > 0)
    }
}

fn detail_from_row(row: &Row<'_>) -> rusqlite::Result<PrescriptionDetail> {
    Ok(PrescriptionDetail {
        detail_id: row.get(0)?,
        prescription_id: row.get(1)?,
        product_id: row.get(2)?,
        frequency: row.get(3)?,
        number_of_days: row.get(4)?,
        quantity: row.get(5)?,
        directions: row.get(6)?,
        purchase_order_receiving_history_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
