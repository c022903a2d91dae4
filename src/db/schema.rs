//! SQL DDL for the make/model store.

/// SQLite schema with:
/// - `makes.id` / `models.id` reused verbatim from the remote catalog
/// - `makes.make` UNIQUE
/// - `models.make_id` referencing `makes(id)` (enforced via `foreign_keys`)
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS makes (
    id INTEGER PRIMARY KEY,
    make TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS models (
    id INTEGER PRIMARY KEY,
    make_id INTEGER NOT NULL,
    model TEXT NOT NULL,
    FOREIGN KEY(make_id) REFERENCES makes(id)
);

CREATE INDEX IF NOT EXISTS idx_models_make_id ON models(make_id);
"#;
