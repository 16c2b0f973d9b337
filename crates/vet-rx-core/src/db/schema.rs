//! SQLite schema definition.

/// Complete database schema for vet-rx.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Medicine Batches (mirror of purchase order receiving history)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicine_batches (
    batch_id TEXT PRIMARY KEY,                   -- purchase order receiving history ID
    product_id TEXT NOT NULL,
    product_name TEXT NOT NULL,
    batch_number TEXT,
    unit_of_measure TEXT NOT NULL DEFAULT 'EA',
    available_quantity REAL NOT NULL DEFAULT 0 CHECK (available_quantity >= 0),
    expiry_date TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_batches_product ON medicine_batches(product_id);

-- ============================================================================
-- Prescription Details (one row per medicine line)
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescription_details (
    detail_id TEXT PRIMARY KEY,
    prescription_id TEXT NOT NULL,
    product_id TEXT NOT NULL,
    frequency TEXT NOT NULL,
    number_of_days INTEGER NOT NULL CHECK (number_of_days > 0),
    quantity REAL NOT NULL CHECK (quantity >= 0),
    directions TEXT,
    batch_id TEXT REFERENCES medicine_batches(batch_id),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_details_prescription ON prescription_details(prescription_id);
CREATE INDEX IF NOT EXISTS idx_details_batch ON prescription_details(batch_id);
"#;
