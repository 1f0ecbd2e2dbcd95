//! Seed-helper generation: value serialization and template-driven output.
//!
//! The generator walks each flavor's workbook, builds a binding model per
//! worksheet, serializes every data cell into literal text for the column's
//! storage kind, and hands models to a template renderer. The renderer and
//! the workbook parser are collaborators supplied by the caller.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::typemap::StorageKind;
use crate::workbook::{
    single_table_region, TableBindingModel, TableRegion, Workbook, Worksheet,
};

/// Generic string-template renderer collaborator.
pub trait Renderer {
    /// One-time model-type registration. Must be idempotent; invoked through
    /// [`initialize_renderer`] before the first render.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn render(&self, template: &str, model: &Value) -> Result<String>;
}

/// Spreadsheet reader collaborator: opens a workbook by path.
pub trait WorkbookOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn Workbook>>;
}

static RENDERER_INIT: OnceLock<()> = OnceLock::new();

/// Run the renderer's one-time initialization exactly once per process.
///
/// Safe to call repeatedly; later calls are no-ops.
pub fn initialize_renderer(renderer: &dyn Renderer) -> Result<()> {
    if RENDERER_INIT.get().is_some() {
        return Ok(());
    }
    renderer.initialize()?;
    let _ = RENDERER_INIT.set(());
    Ok(())
}

/// Template texts consumed by the generator, rendered in document order.
#[derive(Debug, Clone)]
pub struct HelperTemplates {
    pub header: String,
    pub flavor_header: String,
    pub consolidated: String,
    pub table: String,
    pub flavor_footer: String,
    pub footer: String,
}

impl Default for HelperTemplates {
    fn default() -> Self {
        Self {
            header: include_str!("../../templates/header.liquid").to_string(),
            flavor_header: include_str!("../../templates/flavor_header.liquid").to_string(),
            consolidated: include_str!("../../templates/consolidated.liquid").to_string(),
            table: include_str!("../../templates/table.liquid").to_string(),
            flavor_footer: include_str!("../../templates/flavor_footer.liquid").to_string(),
            footer: include_str!("../../templates/footer.liquid").to_string(),
        }
    }
}

/// Generates the seed-data helper source file from workbook data.
pub struct HelperGenerator {
    config: GeneratorConfig,
    templates: HelperTemplates,
}

impl HelperGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            templates: HelperTemplates::default(),
        }
    }

    pub fn with_templates(mut self, templates: HelperTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Generate the helper file for every configured flavor.
    ///
    /// With no flavors configured this is a no-op. Otherwise the output file's
    /// parent directory is created if absent and the file is written once,
    /// after all sections rendered successfully; a failed run leaves no
    /// partial output behind.
    pub fn execute(&self, workbooks: &dyn WorkbookOpener, renderer: &dyn Renderer) -> Result<()> {
        if self.config.flavors.is_empty() {
            return Ok(());
        }

        initialize_renderer(renderer)?;

        let mut output = String::new();
        output.push_str(&renderer.render(&self.templates.header, &serde_json::to_value(&self.config)?)?);

        let single_flavor = self.config.flavors.len() == 1;
        for flavor in &self.config.flavors {
            info!("Generating data helper for flavor '{}'", flavor.name);

            let display_name = if single_flavor { "Default" } else { flavor.name.as_str() };
            output.push_str(
                &renderer.render(&self.templates.flavor_header, &json!({ "name": display_name }))?,
            );

            let workbook = workbooks.open(&flavor.workbook_path)?;
            let worksheets = workbook.worksheets();

            let mut prepared = Vec::with_capacity(worksheets.len());
            for worksheet in &worksheets {
                let region = single_table_region(*worksheet)?;
                let model = TableBindingModel::from_region(*worksheet, &region)?;
                prepared.push((region, model));
            }

            let consolidated: Vec<Value> = prepared
                .iter()
                .map(|(_, model)| json!({ "schema": model.schema, "name": model.name }))
                .collect();
            output.push_str(
                &renderer.render(&self.templates.consolidated, &Value::Array(consolidated))?,
            );

            for (worksheet, (region, mut model)) in worksheets.iter().zip(prepared) {
                let rows = fill_data_rows(*worksheet, &region, &model);
                let full_rows: Vec<String> = rows.iter().map(|r| r.join(", ")).collect();
                debug!("Extracted {} data rows for {}.{}", rows.len(), model.schema, model.name);

                model.remove_auto_generated();
                let has_identity_column = model.has_identity_column();
                output.push_str(&renderer.render(
                    &self.templates.table,
                    &json!({
                        "table": model,
                        "rows": rows,
                        "full_rows": full_rows,
                        "has_identity_column": has_identity_column,
                    }),
                )?);
            }

            output.push_str(&renderer.render(&self.templates.flavor_footer, &Value::Null)?);
        }

        output.push_str(&renderer.render(&self.templates.footer, &Value::Null)?);

        if let Some(parent) = self.config.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.config.output_path, output)?;

        info!("Wrote generated helper to {}", self.config.output_path.display());
        Ok(())
    }
}

/// Extract serialized data rows from a table region.
///
/// Auto-generated columns stay in the model at this point; their cell values
/// are skipped, not emitted. Rows whose cells are all blank are dropped.
fn fill_data_rows(
    worksheet: &dyn Worksheet,
    region: &TableRegion,
    model: &TableBindingModel,
) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for row in (region.start_row + 1)..=region.end_row {
        let cells: Vec<Option<String>> = (region.start_col..=region.end_col)
            .map(|col| worksheet.cell_text(row, col))
            .collect();

        let all_blank = cells
            .iter()
            .all(|c| c.as_ref().map_or(true, |t| t.trim().is_empty()));
        if all_blank {
            continue;
        }

        let mut values = Vec::with_capacity(cells.len());
        for (index, cell) in cells.iter().enumerate() {
            let column = &model.columns[index];
            if column.is_auto_generated {
                continue;
            }
            values.push(serialize_value(
                cell.as_deref(),
                column.storage_kind,
                &column.native_type,
                column.is_nullable,
            ));
        }

        rows.push(values);
    }

    rows
}

/// Serialize one raw cell value into literal text for the generated source.
///
/// Total over [`StorageKind`]; no value is ever silently dropped.
pub fn serialize_value(
    raw: Option<&str>,
    kind: StorageKind,
    native_type: &str,
    is_nullable: bool,
) -> String {
    let raw = match raw {
        None => return "None".to_string(),
        Some(text) if is_nullable && text.eq_ignore_ascii_case("NULL") => {
            return "None".to_string()
        }
        Some(text) => text,
    };

    match kind {
        StorageKind::Binary => {
            if native_type.eq_ignore_ascii_case("varbinary") {
                format!("\"{}\".as_bytes().to_vec()", escape_string(raw))
            } else {
                format!("{raw}u64.to_le_bytes().to_vec()")
            }
        }
        StorageKind::Boolean => {
            if raw == "0" {
                "false".to_string()
            } else {
                "true".to_string()
            }
        }
        StorageKind::AnsiString
        | StorageKind::AnsiStringFixedLength
        | StorageKind::String
        | StorageKind::StringFixedLength
        | StorageKind::Xml => format!("\"{}\"", escape_string(raw)),
        StorageKind::Decimal
        | StorageKind::Single
        | StorageKind::Double
        | StorageKind::Int16
        | StorageKind::Int32
        | StorageKind::Int64
        | StorageKind::Byte => raw.to_string(),
        StorageKind::Date
        | StorageKind::Time
        | StorageKind::DateTime
        | StorageKind::DateTime2
        | StorageKind::DateTimeOffset => format!("\"{raw}\".parse().unwrap()"),
        StorageKind::Guid => format!("Uuid::parse_str(\"{raw}\").unwrap()"),
        StorageKind::VarNumeric | StorageKind::Object => format!("\"{raw}\""),
    }
}

/// Escape a string literal body.
///
/// Backslash must be doubled before the other escapes so the characters they
/// introduce are not escaped twice.
fn escape_string(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Flavor;
    use crate::error::DataseedError;
    use crate::workbook::tests::products_sheet;
    use crate::workbook::MemoryWorkbook;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_null_serialization() {
        assert_eq!(serialize_value(None, StorageKind::String, "nvarchar", true), "None");
        assert_eq!(serialize_value(Some("NULL"), StorageKind::String, "nvarchar", true), "None");
        assert_eq!(serialize_value(Some("null"), StorageKind::String, "nvarchar", true), "None");
        // Not nullable: the text "NULL" is data.
        assert_eq!(
            serialize_value(Some("NULL"), StorageKind::String, "nvarchar", false),
            "\"NULL\""
        );
    }

    #[test]
    fn test_string_serialization_escapes() {
        assert_eq!(
            serialize_value(Some("O'Brien says \"hi\""), StorageKind::String, "nvarchar", false),
            "\"O'Brien says \\\"hi\\\"\""
        );
        assert_eq!(
            serialize_value(Some("line1\nline2\r"), StorageKind::AnsiString, "varchar", false),
            "\"line1\\nline2\\r\""
        );
    }

    #[test]
    fn test_escape_order_backslash_before_quote() {
        // Input: backslash followed by a quote. The backslash is doubled
        // first, then the quote is escaped; the output is not re-escaped.
        assert_eq!(
            serialize_value(Some("\\\""), StorageKind::String, "nvarchar", false),
            "\"\\\\\\\"\""
        );
    }

    #[test]
    fn test_boolean_serialization() {
        assert_eq!(serialize_value(Some("0"), StorageKind::Boolean, "bit", false), "false");
        assert_eq!(serialize_value(Some("1"), StorageKind::Boolean, "bit", false), "true");
        assert_eq!(serialize_value(Some("yes"), StorageKind::Boolean, "bit", false), "true");
    }

    #[test]
    fn test_binary_serialization() {
        // Variable binary: byte per character.
        assert_eq!(
            serialize_value(Some("AB"), StorageKind::Binary, "varbinary", false),
            "\"AB\".as_bytes().to_vec()"
        );
        // Fixed binary and versioning markers: little-endian numeric encoding.
        assert_eq!(
            serialize_value(Some("5"), StorageKind::Binary, "rowversion", false),
            "5u64.to_le_bytes().to_vec()"
        );
    }

    #[test]
    fn test_numeric_serialization_is_verbatim() {
        assert_eq!(serialize_value(Some("42"), StorageKind::Int32, "int", false), "42");
        assert_eq!(serialize_value(Some("-7"), StorageKind::Int64, "bigint", false), "-7");
        assert_eq!(
            serialize_value(Some("3.14"), StorageKind::Decimal, "decimal", false),
            "3.14"
        );
    }

    #[test]
    fn test_temporal_and_guid_serialization() {
        assert_eq!(
            serialize_value(Some("2024-05-01"), StorageKind::Date, "date", false),
            "\"2024-05-01\".parse().unwrap()"
        );
        assert_eq!(
            serialize_value(
                Some("0d9bb263-d847-4d10-a418-eb1c3a40dc75"),
                StorageKind::Guid,
                "uniqueidentifier",
                false
            ),
            "Uuid::parse_str(\"0d9bb263-d847-4d10-a418-eb1c3a40dc75\").unwrap()"
        );
    }

    #[test]
    fn test_fallback_serialization_quotes_raw_text() {
        assert_eq!(
            serialize_value(Some("whatever"), StorageKind::Object, "sql_variant", false),
            "\"whatever\""
        );
    }

    struct StubOpener {
        workbooks: HashMap<PathBuf, MemoryWorkbook>,
    }

    impl WorkbookOpener for StubOpener {
        fn open(&self, path: &Path) -> Result<Box<dyn Workbook>> {
            self.workbooks
                .get(path)
                .cloned()
                .map(|w| Box::new(w) as Box<dyn Workbook>)
                .ok_or_else(|| {
                    DataseedError::Config(format!("no workbook at {}", path.display()))
                })
        }
    }

    /// Renders every template as its model's JSON, one line per section.
    struct JsonRenderer {
        initializations: AtomicUsize,
    }

    impl JsonRenderer {
        fn new() -> Self {
            Self {
                initializations: AtomicUsize::new(0),
            }
        }
    }

    impl Renderer for JsonRenderer {
        fn initialize(&self) -> Result<()> {
            self.initializations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn render(&self, _template: &str, model: &Value) -> Result<String> {
            Ok(format!("{model}\n"))
        }
    }

    fn generator(output_path: PathBuf) -> (HelperGenerator, StubOpener) {
        let workbook = MemoryWorkbook::new().with_sheet(products_sheet());
        let config = GeneratorConfig {
            helper_name: "SeedData".to_string(),
            output_path,
            flavors: vec![Flavor {
                name: "Default".to_string(),
                workbook_path: PathBuf::from("default.xlsx"),
            }],
        };
        let opener = StubOpener {
            workbooks: HashMap::from([(PathBuf::from("default.xlsx"), workbook)]),
        };
        (HelperGenerator::new(config), opener)
    }

    #[test]
    fn test_end_to_end_generation() {
        let dir = tempfile::tempdir().unwrap();
        // Nested path: the generator must create missing directories.
        let output_path = dir.path().join("generated/helpers/seed_data.rs");
        let (generator, opener) = generator(output_path.clone());

        let renderer = JsonRenderer::new();
        generator.execute(&opener, &renderer).unwrap();

        let output = fs::read_to_string(&output_path).unwrap();

        // Auto-generated Version column is stripped from the rendered model...
        assert!(!output.contains("\"name\":\"Version\""));
        // ...and its values were skipped during extraction.
        assert!(!output.contains("100u64"));
        // Data rows for the surviving columns are present and serialized.
        assert!(output.contains("\\\"Widget\\\""));
        assert!(output.contains("\"has_identity_column\":true"));
        // Consolidated listing covers the table.
        assert!(output.contains("\"schema\":\"dbo\""));
    }

    #[test]
    fn test_no_flavors_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("never_written.rs");
        let config = GeneratorConfig {
            helper_name: "SeedData".to_string(),
            output_path: output_path.clone(),
            flavors: Vec::new(),
        };
        let opener = StubOpener {
            workbooks: HashMap::new(),
        };

        HelperGenerator::new(config)
            .execute(&opener, &JsonRenderer::new())
            .unwrap();
        assert!(!output_path.exists());
    }

    #[test]
    fn test_renderer_initialization_is_idempotent() {
        let renderer = JsonRenderer::new();
        initialize_renderer(&renderer).unwrap();
        initialize_renderer(&renderer).unwrap();
        // At most one initialization, regardless of how many runs happened
        // before in this process.
        assert!(renderer.initializations.load(Ordering::SeqCst) <= 1);
    }
}
