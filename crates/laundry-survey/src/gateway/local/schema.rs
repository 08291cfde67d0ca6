//! `SQLite` schema for the local backend.
//!
//! The entries table name is configurable, so its statements are built at
//! runtime; everything else is fixed.

/// Columns of the entries table in select order.
pub const ENTRY_COLUMNS: &[&str] = &[
    "id",
    "created_at",
    "establishment_name",
    "category",
    "gm_name",
    "gm_phone",
    "hk_name",
    "hk_phone",
    "location",
    "photo_url",
    "in_house_laundry",
    "current_laundry",
    "lead",
    "lead_detail",
    "created_by",
];

/// Columns stored as 0/1 integers but read back as booleans.
pub const BOOLEAN_COLUMNS: &[&str] = &["in_house_laundry", "lead"];

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Check that a table name is a plain identifier and safe to splice into SQL.
#[must_use]
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// SQL statement to create the entries table.
#[must_use]
pub fn create_entries_table(table: &str) -> String {
    format!(
        r"
CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    establishment_name TEXT NOT NULL,
    category TEXT NOT NULL,
    gm_name TEXT NOT NULL DEFAULT '',
    gm_phone TEXT NOT NULL DEFAULT '',
    hk_name TEXT NOT NULL DEFAULT '',
    hk_phone TEXT NOT NULL DEFAULT '',
    location TEXT NOT NULL,
    photo_url TEXT NOT NULL DEFAULT '',
    in_house_laundry INTEGER NOT NULL DEFAULT 0,
    current_laundry TEXT NOT NULL DEFAULT '',
    lead INTEGER NOT NULL DEFAULT 0,
    lead_detail TEXT NOT NULL DEFAULT '',
    created_by TEXT
)
"
    )
}

/// SQL statement to insert one entry; `id` and `created_at` come from defaults.
#[must_use]
pub fn insert_entry(table: &str) -> String {
    format!(
        r"
INSERT INTO {table} (
    establishment_name, category, gm_name, gm_phone, hk_name, hk_phone,
    location, photo_url, in_house_laundry, current_laundry, lead, lead_detail,
    created_by
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
"
    )
}

/// SQL statement to select every entry in insertion order.
#[must_use]
pub fn select_all_entries(table: &str) -> String {
    format!("SELECT {} FROM {table} ORDER BY id", ENTRY_COLUMNS.join(", "))
}
