//! Local backend.
//!
//! Stands in for the hosted store during development: entries live in a
//! `SQLite` table with the hosted table's columns, and photos are written
//! under `{objects_dir}/{bucket}/`.

pub mod migrations;
pub mod schema;

use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use reqwest::Url;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use serde_json::Value;
use tracing::{debug, info};

use super::{Gateway, PhotoUpload, Row};
use crate::entry::{SurveyEntry, ENTRIES_TABLE_NAME, STORAGE_BUCKET_NAME};
use crate::error::{Error, Result};

use schema::{insert_entry, is_valid_table_name, select_all_entries, BOOLEAN_COLUMNS};

/// Gateway backed by a local `SQLite` file and an objects directory.
#[derive(Debug)]
pub struct LocalGateway {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
    /// Root directory for stored objects.
    objects_dir: PathBuf,
    table: String,
    bucket: String,
}

impl LocalGateway {
    /// Open or create the local store.
    ///
    /// Creates the parent directories and database file if they don't exist
    /// and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is not a plain identifier, or the
    /// database cannot be opened or initialized.
    pub fn open(
        path: impl AsRef<Path>,
        objects_dir: impl AsRef<Path>,
        table: &str,
        bucket: &str,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_table_name(table)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn, table)?;

        info!("Local store opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
            objects_dir: std::path::absolute(objects_dir.as_ref())?,
            table: table.to_string(),
            bucket: bucket.to_string(),
        })
    }

    /// Create an in-memory store with the default table and bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory(objects_dir: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn, ENTRIES_TABLE_NAME)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
            objects_dir: std::path::absolute(objects_dir.as_ref())?,
            table: ENTRIES_TABLE_NAME.to_string(),
            bucket: STORAGE_BUCKET_NAME.to_string(),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Filesystem location of an object path.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the path would escape the bucket directory.
    pub fn object_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::internal(format!("invalid object path: {path}")));
        }
        Ok(self.objects_dir.join(&self.bucket).join(relative))
    }

    /// Convert a database row to a JSON row, keeping column order.
    fn row_to_json(row: &rusqlite::Row, columns: &[String]) -> rusqlite::Result<Row> {
        let mut out = Row::new();
        for (i, name) in columns.iter().enumerate() {
            let value = match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(n) if BOOLEAN_COLUMNS.contains(&name.as_str()) => {
                    Value::Bool(n != 0)
                }
                ValueRef::Integer(n) => Value::from(n),
                ValueRef::Real(f) => Value::from(f),
                ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
                ValueRef::Blob(b) => Value::String(format!("<{} bytes>", b.len())),
            };
            out.insert(name.clone(), value);
        }
        Ok(out)
    }
}

fn check_table_name(table: &str) -> Result<()> {
    if is_valid_table_name(table) {
        Ok(())
    } else {
        Err(Error::ConfigValidation {
            message: format!("invalid table name: {table}"),
        })
    }
}

#[async_trait::async_trait]
impl Gateway for LocalGateway {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn insert(&self, entry: &SurveyEntry) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            &insert_entry(&self.table),
            params![
                entry.establishment_name,
                entry.category.to_string(),
                entry.gm_name,
                entry.gm_phone,
                entry.hk_name,
                entry.hk_phone,
                entry.location,
                entry.photo_url,
                entry.in_house_laundry,
                entry.current_laundry,
                entry.lead,
                entry.lead_detail,
                entry.created_by,
            ],
        )?;
        debug!("Inserted entry with id {}", conn.last_insert_rowid());
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<Row>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&select_all_entries(&self.table))?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let rows = stmt
            .query_map([], |row| Self::row_to_json(row, &columns))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("Fetched {} rows", rows.len());
        Ok(rows)
    }

    async fn upload(&self, path: &str, photo: &PhotoUpload) -> Result<()> {
        let target = self.object_path(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&target, &photo.bytes).await?;
        debug!("Stored {} bytes at {}", photo.bytes.len(), target.display());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        let target = self.objects_dir.join(&self.bucket).join(path);
        Url::from_file_path(&target)
            .map_or_else(|()| format!("file://{}", target.display()), String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Category;

    fn create_test_gateway(dir: &Path) -> LocalGateway {
        LocalGateway::open_in_memory(dir).expect("failed to create test gateway")
    }

    fn entry(name: &str) -> SurveyEntry {
        SurveyEntry {
            establishment_name: name.to_string(),
            category: Category::Other("Hostel".to_string()),
            gm_name: "Asha".to_string(),
            gm_phone: "9876543210".to_string(),
            hk_name: String::new(),
            hk_phone: String::new(),
            location: "https://www.google.com/maps?q=12.97,77.59".to_string(),
            photo_url: String::new(),
            in_house_laundry: true,
            current_laundry: "City Wash".to_string(),
            lead: true,
            lead_detail: "Call back Monday".to_string(),
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_select() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = create_test_gateway(dir.path());
        gateway.insert(&entry("Hostel One")).await.unwrap();

        let rows = gateway.select_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["id"], 1);
        assert_eq!(row["establishment_name"], "Hostel One");
        assert_eq!(row["category"], "Others - Hostel");
        assert_eq!(row["in_house_laundry"], true);
        assert_eq!(row["lead"], true);
        assert_eq!(row["created_by"], Value::Null);
        assert!(row["created_at"].as_str().is_some_and(|s| !s.is_empty()));
    }

    #[tokio::test]
    async fn test_select_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = create_test_gateway(dir.path());
        gateway.insert(&entry("A")).await.unwrap();

        let rows = gateway.select_all().await.unwrap();
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, schema::ENTRY_COLUMNS);
    }

    #[tokio::test]
    async fn test_select_empty() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = create_test_gateway(dir.path());
        assert!(gateway.select_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_submissions_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = create_test_gateway(dir.path());
        gateway.insert(&entry("Same")).await.unwrap();
        gateway.insert(&entry("Same")).await.unwrap();
        assert_eq!(gateway.select_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = create_test_gateway(dir.path());
        let photo = PhotoUpload::new("lobby.png", b"png-bytes".to_vec());

        gateway
            .upload("establishments/1700000000000.png", &photo)
            .await
            .unwrap();

        let stored = dir
            .path()
            .join("establishment-photos/establishments/1700000000000.png");
        assert_eq!(std::fs::read(stored).unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_upload_rejects_escaping_path() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = create_test_gateway(dir.path());
        let photo = PhotoUpload::new("x.png", vec![]);
        assert!(gateway.upload("../outside.png", &photo).await.is_err());
        assert!(gateway.upload("/etc/passwd", &photo).await.is_err());
    }

    #[test]
    fn test_public_url_is_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = create_test_gateway(dir.path());
        let url = gateway.public_url("establishments/1.png");
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("establishment-photos/establishments/1.png"));
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested/entries.db");
        let gateway = LocalGateway::open(
            &db_path,
            dir.path().join("objects"),
            "laundry_entries",
            "establishment-photos",
        )
        .unwrap();
        assert_eq!(gateway.path(), db_path);
        assert!(db_path.exists());
    }

    #[test]
    fn test_open_rejects_bad_table_name() {
        let dir = tempfile::tempdir().unwrap();
        let result = LocalGateway::open(
            dir.path().join("entries.db"),
            dir.path(),
            "entries; DROP TABLE metadata",
            "b",
        );
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }
}
