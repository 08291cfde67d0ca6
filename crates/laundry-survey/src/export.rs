//! Excel export of every survey entry.
//!
//! Rows are written with their stored field names as headers, in source
//! key order rather than the grid's display order, on a single sheet.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::gateway::{Gateway, Row};

/// Sheet name used for exports.
pub const SHEET_NAME: &str = "Laundry Entries";

/// File name used for exports.
pub const EXPORT_FILE_NAME: &str = "Survey_Data.xlsx";

/// Longest text a single xlsx cell holds, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Header plus one line of values per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportGrid {
    /// Column names.
    pub header: Vec<String>,
    /// Values aligned with `header`; `Null` for missing keys.
    pub rows: Vec<Vec<Value>>,
}

impl ExportGrid {
    /// Lay rows out under the union of their keys.
    #[must_use]
    pub fn from_rows(rows: &[Row]) -> Self {
        let header = export_columns(rows);
        let rows = rows
            .iter()
            .map(|row| {
                header
                    .iter()
                    .map(|key| row.get(key).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self { header, rows }
    }

    /// Number of rows in the sheet, header included.
    #[must_use]
    pub fn sheet_rows(&self) -> usize {
        self.rows.len() + 1
    }
}

/// Column names: every key, in order of first appearance.
#[must_use]
pub fn export_columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Encode a grid as an xlsx workbook with one sheet.
///
/// # Errors
///
/// Returns an error if the sheet name is rejected or the workbook cannot be
/// serialized.
pub fn build_workbook(grid: &ExportGrid, sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    for (col, name) in grid.header.iter().enumerate() {
        sheet.write_string_with_format(0, column_index(col)?, cell_text(name), &bold)?;
    }

    for (i, values) in grid.rows.iter().enumerate() {
        let row = row_index(i + 1)?;
        for (col, value) in values.iter().enumerate() {
            let col = column_index(col)?;
            match value {
                Value::Null => {}
                Value::Bool(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                Value::Number(n) => match n.as_f64() {
                    Some(f) => {
                        sheet.write_number(row, col, f)?;
                    }
                    None => {
                        sheet.write_string(row, col, n.to_string())?;
                    }
                },
                Value::String(s) => {
                    sheet.write_string(row, col, cell_text(s))?;
                }
                nested @ (Value::Array(_) | Value::Object(_)) => {
                    sheet.write_string(row, col, cell_text(&nested.to_string()))?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Text clipped to what a cell can hold; longer values are truncated.
fn cell_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => {
            warn!(
                "Truncating cell text of {} characters to {}",
                text.chars().count(),
                MAX_CELL_CHARS
            );
            &text[..end]
        }
        None => text,
    }
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::internal(format!("too many columns: {col}")))
}

fn row_index(row: usize) -> Result<u32> {
    u32::try_from(row).map_err(|_| Error::internal(format!("too many rows: {row}")))
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// There were no rows; nothing was written.
    Empty,
    /// The workbook was written.
    Written {
        /// Where the file went.
        path: PathBuf,
        /// Number of data rows.
        rows: usize,
    },
}

/// Fetch-all, build, write.
#[derive(Debug, Clone)]
pub struct ExportTransform {
    sheet_name: String,
    file_name: String,
}

impl Default for ExportTransform {
    fn default() -> Self {
        Self {
            sheet_name: SHEET_NAME.to_string(),
            file_name: EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl ExportTransform {
    /// Create a transform from the export section of the configuration.
    #[must_use]
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            sheet_name: config.sheet_name.clone(),
            file_name: config.file_name.clone(),
        }
    }

    /// Default output location inside `directory`.
    #[must_use]
    pub fn default_output(&self, directory: &Path) -> PathBuf {
        directory.join(&self.file_name)
    }

    /// Build the workbook bytes for `rows`, or `None` if there are none.
    ///
    /// Text longer than [`MAX_CELL_CHARS`] is truncated rather than failing
    /// the whole export.
    ///
    /// # Errors
    ///
    /// Returns an error if the workbook cannot be built.
    pub fn encode(&self, rows: &[Row]) -> Result<Option<Vec<u8>>> {
        if rows.is_empty() {
            return Ok(None);
        }
        let grid = ExportGrid::from_rows(rows);
        debug!(
            "Encoding {} rows x {} columns",
            grid.rows.len(),
            grid.header.len()
        );
        build_workbook(&grid, &self.sheet_name).map(Some)
    }

    /// Fetch every row and write the workbook to `output`.
    ///
    /// With no rows nothing is written. A failed fetch halts the export
    /// before any file is touched.
    ///
    /// # Errors
    ///
    /// Returns the gateway's error, or an error building or writing the file.
    pub async fn run(&self, gateway: &dyn Gateway, output: &Path) -> Result<ExportOutcome> {
        let rows = gateway.select_all().await?;
        let Some(bytes) = self.encode(&rows)? else {
            info!("No entries to export");
            return Ok(ExportOutcome::Empty);
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        tokio::fs::write(output, &bytes).await?;

        info!("Exported {} entries to {}", rows.len(), output.display());
        Ok(ExportOutcome::Written {
            path: output.to_path_buf(),
            rows: rows.len(),
        })
    }
}
