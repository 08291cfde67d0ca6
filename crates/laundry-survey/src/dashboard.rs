//! Read-only grid view of survey entries.
//!
//! Columns, headers and cell rendering follow the survey dashboard; paging,
//! filtering and sorting happen in memory over the full row set.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::gateway::Row;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// How a column's cells are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Plain text.
    Text,
    /// A map link; empty shows `No Location`.
    Location,
    /// A photo URL; empty shows `No Photo`.
    Photo,
    /// A boolean shown as `Yes`/`No`.
    Flag,
}

/// A grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Stored field name.
    pub field: &'static str,
    /// Header text.
    pub header: &'static str,
    /// Whether the column can be sorted.
    pub sortable: bool,
    /// Whether the column can be filtered.
    pub filterable: bool,
    /// Cell rendering.
    pub kind: CellKind,
}

const fn column(field: &'static str, header: &'static str, kind: CellKind) -> ColumnDef {
    ColumnDef {
        field,
        header,
        sortable: true,
        filterable: true,
        kind,
    }
}

/// Grid columns in display order.
pub const COLUMNS: &[ColumnDef] = &[
    column("establishment_name", "Establishment", CellKind::Text),
    column("category", "Category", CellKind::Text),
    column("gm_name", "GM Name", CellKind::Text),
    column("gm_phone", "GM Phone", CellKind::Text),
    column("hk_name", "HK Name", CellKind::Text),
    column("hk_phone", "HK Phone", CellKind::Text),
    column("location", "Location", CellKind::Location),
    ColumnDef {
        field: "photo_url",
        header: "Photo",
        sortable: false,
        filterable: false,
        kind: CellKind::Photo,
    },
    column("in_house_laundry", "In House Laundry", CellKind::Flag),
    column("lead", "Lead", CellKind::Flag),
    column("current_laundry", "Current Laundry", CellKind::Text),
    column("lead_detail", "Lead Detail", CellKind::Text),
    column("created_by", "Created By", CellKind::Text),
];

/// Look up a column by field name or header, ignoring case.
#[must_use]
pub fn find_column(name: &str) -> Option<&'static ColumnDef> {
    COLUMNS
        .iter()
        .find(|c| c.field.eq_ignore_ascii_case(name) || c.header.eq_ignore_ascii_case(name))
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes"),
        _ => false,
    }
}

/// Render one cell as text.
#[must_use]
pub fn render_cell(column: &ColumnDef, row: &Row) -> String {
    let value = row.get(column.field);
    match column.kind {
        CellKind::Text => value_text(value),
        CellKind::Location => {
            let text = value_text(value);
            if text.is_empty() {
                "No Location".to_string()
            } else {
                text
            }
        }
        CellKind::Photo => {
            let text = value_text(value);
            if text.is_empty() {
                "No Photo".to_string()
            } else {
                text
            }
        }
        CellKind::Flag => {
            if is_truthy(value) {
                "Yes".to_string()
            } else {
                "No".to_string()
            }
        }
    }
}

/// A case-insensitive substring filter on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    /// Stored field name.
    pub field: &'static str,
    /// Text to look for.
    pub needle: String,
}

impl ColumnFilter {
    /// Create a filter, checking that the column exists and is filterable.
    ///
    /// # Errors
    ///
    /// Returns an invalid query error for unknown or non-filterable columns.
    pub fn new(column: &str, needle: impl Into<String>) -> Result<Self> {
        let def = find_column(column)
            .ok_or_else(|| Error::invalid_query(format!("unknown column: {column}")))?;
        if !def.filterable {
            return Err(Error::invalid_query(format!(
                "column {} cannot be filtered",
                def.field
            )));
        }
        Ok(Self {
            field: def.field,
            needle: needle.into(),
        })
    }

    /// Parse `column=text`.
    ///
    /// # Errors
    ///
    /// Returns an invalid query error if there is no `=` or the column is
    /// not filterable.
    pub fn parse(spec: &str) -> Result<Self> {
        let (column, needle) = spec
            .split_once('=')
            .ok_or_else(|| Error::invalid_query(format!("expected column=text, got: {spec}")))?;
        Self::new(column.trim(), needle.trim())
    }

    fn matches(&self, row: &Row) -> bool {
        let Some(def) = find_column(self.field) else {
            return false;
        };
        render_cell(def, row)
            .to_lowercase()
            .contains(&self.needle.to_lowercase())
    }
}

/// Sort order for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    /// Stored field name.
    pub field: &'static str,
    /// Sort descending instead of ascending.
    pub descending: bool,
}

impl SortSpec {
    /// Parse `column` or `column:asc` / `column:desc`.
    ///
    /// # Errors
    ///
    /// Returns an invalid query error for unknown or unsortable columns, or
    /// an unrecognized direction.
    pub fn parse(spec: &str) -> Result<Self> {
        let (column, direction) = spec.split_once(':').unwrap_or((spec, "asc"));
        let def = find_column(column.trim())
            .ok_or_else(|| Error::invalid_query(format!("unknown column: {column}")))?;
        if !def.sortable {
            return Err(Error::invalid_query(format!(
                "column {} cannot be sorted",
                def.field
            )));
        }
        let descending = match direction.trim().to_ascii_lowercase().as_str() {
            "asc" => false,
            "desc" => true,
            other => {
                return Err(Error::invalid_query(format!(
                    "unknown sort direction: {other}"
                )))
            }
        };
        Ok(Self {
            field: def.field,
            descending,
        })
    }
}

/// Filters, sort and page selection for the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridQuery {
    /// All filters must match.
    pub filters: Vec<ColumnFilter>,
    /// Optional sort.
    pub sort: Option<SortSpec>,
    /// 1-based page number.
    pub page: usize,
    /// Rows per page.
    pub page_size: usize,
}

impl Default for GridQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of grid rows.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPage {
    /// Rows on this page.
    pub rows: Vec<Row>,
    /// 1-based page number.
    pub page: usize,
    /// Total pages after filtering; at least 1.
    pub total_pages: usize,
    /// Rows matching the filters.
    pub total_rows: usize,
}

/// Visible columns and the query applied to them.
#[derive(Debug, Clone)]
pub struct GridView {
    columns: Vec<&'static ColumnDef>,
}

impl Default for GridView {
    fn default() -> Self {
        Self {
            columns: COLUMNS.iter().collect(),
        }
    }
}

impl GridView {
    /// Show only the named columns, in the given order.
    ///
    /// # Errors
    ///
    /// Returns an invalid query error for an unknown column or an empty list.
    pub fn with_columns<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::invalid_query("at least one column must be shown"));
        }
        let columns = names
            .iter()
            .map(|name| {
                find_column(name.as_ref().trim()).ok_or_else(|| {
                    Error::invalid_query(format!("unknown column: {}", name.as_ref()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    /// Visible columns.
    #[must_use]
    pub fn columns(&self) -> &[&'static ColumnDef] {
        &self.columns
    }

    /// Filter, sort and page the rows.
    ///
    /// # Errors
    ///
    /// Returns an invalid query error for a zero page or page size.
    pub fn apply(&self, rows: Vec<Row>, query: &GridQuery) -> Result<GridPage> {
        if query.page == 0 || query.page_size == 0 {
            return Err(Error::invalid_query("page and page size start at 1"));
        }

        let mut rows: Vec<Row> = rows
            .into_iter()
            .filter(|row| query.filters.iter().all(|f| f.matches(row)))
            .collect();

        if let Some(sort) = query.sort {
            if let Some(def) = find_column(sort.field) {
                rows.sort_by(|a, b| {
                    let ordering = compare_cells(def, a, b);
                    if sort.descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                });
            }
        }

        let total_rows = rows.len();
        let total_pages = total_rows.div_ceil(query.page_size).max(1);
        let rows = rows
            .into_iter()
            .skip((query.page - 1).saturating_mul(query.page_size))
            .take(query.page_size)
            .collect();

        Ok(GridPage {
            rows,
            page: query.page,
            total_pages,
            total_rows,
        })
    }

    /// Render a page as an aligned text table.
    #[must_use]
    pub fn render_table(&self, page: &GridPage) -> String {
        let cells: Vec<Vec<String>> = page
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| truncate(&render_cell(c, row), MAX_CELL_WIDTH))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(c.header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(|c| c.header).collect();
        push_line(&mut out, &header, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in &cells {
            push_line(&mut out, row, &widths);
        }
        out.push_str(&format!(
            "Page {} of {} ({} rows)\n",
            page.page, page.total_pages, page.total_rows
        ));
        out
    }

    /// The visible columns of a page as JSON objects keyed by field name.
    #[must_use]
    pub fn to_json(&self, page: &GridPage) -> Value {
        let rows = page
            .rows
            .iter()
            .map(|row| {
                let mut out = Row::new();
                for column in &self.columns {
                    let value = row.get(column.field).cloned().unwrap_or(Value::Null);
                    out.insert(column.field.to_string(), value);
                }
                Value::Object(out)
            })
            .collect();
        Value::Array(rows)
    }
}

const MAX_CELL_WIDTH: usize = 40;

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn push_line<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn compare_cells(column: &ColumnDef, a: &Row, b: &Row) -> Ordering {
    render_cell(column, a)
        .to_lowercase()
        .cmp(&render_cell(column, b).to_lowercase())
}
