//! Workbook abstraction and generation-time binding models.
//!
//! Spreadsheet file parsing belongs to an external library; this module
//! defines the reader surface the generator consumes ([`Workbook`] /
//! [`Worksheet`]) plus an in-memory implementation used by tests and by
//! callers bridging a real parser.
//!
//! A worksheet must contain exactly one table region. The region's header row
//! carries, per column, a JSON metadata comment describing the column's
//! storage kind, value type, nullability, identity and length. From that the
//! builder produces a [`TableBindingModel`], the code-generation counterpart
//! of the introspected schema model.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{DataseedError, Result};
use crate::typemap::StorageKind;

/// Rectangular table region inside a worksheet, header row included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRegion {
    /// Region name in `schema.table` form.
    pub name: String,
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

/// One worksheet of a data workbook.
pub trait Worksheet {
    fn name(&self) -> &str;

    /// Table regions declared on the worksheet.
    fn table_regions(&self) -> Vec<TableRegion>;

    /// Text content of a cell, if the cell exists.
    fn cell_text(&self, row: usize, col: usize) -> Option<String>;

    /// Comment attached to a cell, if any.
    fn cell_comment(&self, row: usize, col: usize) -> Option<String>;
}

/// A workbook of data worksheets.
pub trait Workbook {
    fn worksheets(&self) -> Vec<&dyn Worksheet>;
}

/// In-memory worksheet.
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    name: String,
    tables: Vec<TableRegion>,
    cells: HashMap<(usize, usize), String>,
    comments: HashMap<(usize, usize), String>,
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_table(mut self, region: TableRegion) -> Self {
        self.tables.push(region);
        self
    }

    pub fn set_cell(&mut self, row: usize, col: usize, text: impl Into<String>) {
        self.cells.insert((row, col), text.into());
    }

    pub fn set_comment(&mut self, row: usize, col: usize, comment: impl Into<String>) {
        self.comments.insert((row, col), comment.into());
    }
}

impl Worksheet for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn table_regions(&self) -> Vec<TableRegion> {
        self.tables.clone()
    }

    fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        self.cells.get(&(row, col)).cloned()
    }

    fn cell_comment(&self, row: usize, col: usize) -> Option<String> {
        self.comments.get(&(row, col)).cloned()
    }
}

/// In-memory workbook.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: MemorySheet) -> Self {
        self.sheets.push(sheet);
        self
    }
}

impl Workbook for MemoryWorkbook {
    fn worksheets(&self) -> Vec<&dyn Worksheet> {
        self.sheets.iter().map(|s| s as &dyn Worksheet).collect()
    }
}

/// Generation-time view of one column, populated from header metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnBindingModel {
    /// Column name from the header cell text.
    pub name: String,

    /// Portable storage classification (metadata key `DbType`).
    pub storage_kind: StorageKind,

    /// Value type name used by the generated code (metadata key `Type`).
    pub value_type: String,

    /// Whether the column is part of the primary key.
    pub is_primary_key: bool,

    pub is_nullable: bool,

    pub is_identity: bool,

    /// Engine-assigned column; stripped from the model before rendering.
    pub is_auto_generated: bool,

    /// Declared maximum length; 0 or negative means unbounded.
    pub max_length: i32,

    /// Vendor-native type name (metadata key `NativeType`).
    pub native_type: String,

    /// Length bound or byte width the generated code declares for parameters.
    pub parameter_size: i32,
}

/// Generation-time view of one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableBindingModel {
    pub name: String,
    pub schema: String,
    pub columns: Vec<ColumnBindingModel>,
}

impl TableBindingModel {
    /// Build a binding model from a worksheet's single table region.
    ///
    /// Every header cell must carry a JSON metadata comment with the required
    /// keys; any omission is a fatal metadata error naming the worksheet and
    /// the zero-based column index.
    pub fn from_worksheet(worksheet: &dyn Worksheet) -> Result<Self> {
        let region = single_table_region(worksheet)?;
        Self::from_region(worksheet, &region)
    }

    /// Build a binding model from a known table region.
    pub fn from_region(worksheet: &dyn Worksheet, region: &TableRegion) -> Result<Self> {
        let (schema, name) = split_table_name(worksheet.name(), &region.name)?;

        let mut columns = Vec::with_capacity(region.end_col - region.start_col + 1);
        for col in region.start_col..=region.end_col {
            let index = col - region.start_col;
            columns.push(read_column(worksheet, region.start_row, col, index)?);
        }

        Ok(Self { name, schema, columns })
    }

    /// Drop engine-assigned columns so generated code never supplies values
    /// for them.
    pub fn remove_auto_generated(&mut self) {
        self.columns.retain(|c| !c.is_auto_generated);
    }

    pub fn has_identity_column(&self) -> bool {
        self.columns.iter().any(|c| c.is_identity)
    }
}

/// Return the worksheet's single table region.
///
/// Zero or multiple regions is a workbook authoring error.
pub fn single_table_region(worksheet: &dyn Worksheet) -> Result<TableRegion> {
    let mut regions = worksheet.table_regions();
    match regions.len() {
        0 => Err(DataseedError::metadata(worksheet.name(), "worksheet does not contain a table")),
        1 => Ok(regions.remove(0)),
        n => Err(DataseedError::metadata(
            worksheet.name(),
            format!("worksheet has {n} tables, expected exactly one"),
        )),
    }
}

/// Split a region name into (schema, table) on the first `.`.
///
/// Both parts must be non-empty; a table name containing further dots keeps
/// them (the first delimiter wins).
pub fn split_table_name(worksheet: &str, region_name: &str) -> Result<(String, String)> {
    match region_name.split_once('.') {
        Some((schema, table)) if !schema.is_empty() && !table.is_empty() => {
            Ok((schema.to_string(), table.to_string()))
        }
        _ => Err(DataseedError::metadata(
            worksheet,
            format!("table name '{region_name}' is not in schema.table form"),
        )),
    }
}

const REQUIRED_KEYS: [&str; 8] = [
    "DbType",
    "Type",
    "IsPrimaryKey",
    "IsNullable",
    "IsIdentity",
    "MaxLength",
    "IsAutoGenerated",
    "NativeType",
];

fn read_column(
    worksheet: &dyn Worksheet,
    header_row: usize,
    col: usize,
    index: usize,
) -> Result<ColumnBindingModel> {
    let sheet = worksheet.name();

    let name = worksheet
        .cell_text(header_row, col)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| DataseedError::metadata_at(sheet, index, "header cell is missing or blank"))?;

    let comment = worksheet
        .cell_comment(header_row, col)
        .ok_or_else(|| DataseedError::metadata_at(sheet, index, "header cell has no metadata comment"))?;

    let metadata: Value = serde_json::from_str(&comment)
        .map_err(|e| DataseedError::metadata_at(sheet, index, format!("invalid metadata comment: {e}")))?;
    let metadata = metadata
        .as_object()
        .ok_or_else(|| DataseedError::metadata_at(sheet, index, "metadata comment is not a JSON object"))?;

    for key in REQUIRED_KEYS {
        if !metadata.contains_key(key) {
            return Err(DataseedError::metadata_at(
                sheet,
                index,
                format!("metadata comment does not have the {key} key"),
            ));
        }
    }

    let kind_name = string_value(&metadata["DbType"]);
    let storage_kind = StorageKind::from_name(&kind_name).ok_or_else(|| {
        DataseedError::metadata_at(sheet, index, format!("unknown storage kind '{kind_name}'"))
    })?;

    let max_length = int_value(&metadata["MaxLength"]).ok_or_else(|| {
        DataseedError::metadata_at(sheet, index, "MaxLength metadata is not an integer")
    })?;

    Ok(ColumnBindingModel {
        name,
        storage_kind,
        value_type: string_value(&metadata["Type"]),
        is_primary_key: bool_value(&metadata["IsPrimaryKey"]),
        is_nullable: bool_value(&metadata["IsNullable"]),
        is_identity: bool_value(&metadata["IsIdentity"]),
        is_auto_generated: bool_value(&metadata["IsAutoGenerated"]),
        max_length,
        native_type: string_value(&metadata["NativeType"]),
        parameter_size: parameter_size(storage_kind, max_length),
    })
}

/// Size the generated code declares for a column parameter.
///
/// Variable-size kinds use the declared length with an unbounded sentinel;
/// fixed scalars use their byte width; temporal, identifier and opaque kinds
/// get a placeholder of 1.
pub fn parameter_size(kind: StorageKind, max_length: i32) -> i32 {
    if kind.is_variable_size() {
        if max_length > 0 {
            max_length
        } else {
            i32::MAX
        }
    } else {
        kind.fixed_width().unwrap_or(1)
    }
}

// Workbook metadata is authored loosely; values may arrive as JSON strings,
// numbers, or booleans.

fn string_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn bool_value(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().unwrap_or(0) != 0,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
        _ => false,
    }
}

fn int_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().map(|v| v as i32),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
