//! Portable type system and per-vendor type mapping tables.
//!
//! Each vendor maps its native type names to a `(SemanticType, StorageKind)`
//! pair. The mapping is total: an unrecognized native type falls back to the
//! opaque object pair so introspection never aborts on an unknown type.

use serde::{Deserialize, Serialize};

/// Portable value type a column maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticType {
    I64,
    I32,
    I16,
    U8,
    F64,
    F32,
    Decimal,
    Bool,
    String,
    Bytes,
    Date,
    Time,
    DateTime,
    DateTimeOffset,
    Uuid,
    Object,
}

impl SemanticType {
    /// Canonical name used in workbook metadata and rendered models.
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::I64 => "i64",
            SemanticType::I32 => "i32",
            SemanticType::I16 => "i16",
            SemanticType::U8 => "u8",
            SemanticType::F64 => "f64",
            SemanticType::F32 => "f32",
            SemanticType::Decimal => "decimal",
            SemanticType::Bool => "bool",
            SemanticType::String => "string",
            SemanticType::Bytes => "bytes",
            SemanticType::Date => "date",
            SemanticType::Time => "time",
            SemanticType::DateTime => "datetime",
            SemanticType::DateTimeOffset => "datetimeoffset",
            SemanticType::Uuid => "uuid",
            SemanticType::Object => "object",
        }
    }

    /// Parse a canonical name back into a semantic type.
    pub fn from_name(name: &str) -> Option<Self> {
        let t = match name.to_lowercase().as_str() {
            "i64" => SemanticType::I64,
            "i32" => SemanticType::I32,
            "i16" => SemanticType::I16,
            "u8" => SemanticType::U8,
            "f64" => SemanticType::F64,
            "f32" => SemanticType::F32,
            "decimal" => SemanticType::Decimal,
            "bool" => SemanticType::Bool,
            "string" => SemanticType::String,
            "bytes" => SemanticType::Bytes,
            "date" => SemanticType::Date,
            "time" => SemanticType::Time,
            "datetime" => SemanticType::DateTime,
            "datetimeoffset" => SemanticType::DateTimeOffset,
            "uuid" => SemanticType::Uuid,
            "object" => SemanticType::Object,
            _ => return None,
        };
        Some(t)
    }
}

/// Portable classification of a column's physical representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageKind {
    AnsiString,
    AnsiStringFixedLength,
    String,
    StringFixedLength,
    Binary,
    Boolean,
    Byte,
    Int16,
    Int32,
    Int64,
    Decimal,
    Single,
    Double,
    Date,
    Time,
    DateTime,
    DateTime2,
    DateTimeOffset,
    Guid,
    Xml,
    VarNumeric,
    Object,
}

impl StorageKind {
    /// Canonical name used in workbook metadata comments.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::AnsiString => "AnsiString",
            StorageKind::AnsiStringFixedLength => "AnsiStringFixedLength",
            StorageKind::String => "String",
            StorageKind::StringFixedLength => "StringFixedLength",
            StorageKind::Binary => "Binary",
            StorageKind::Boolean => "Boolean",
            StorageKind::Byte => "Byte",
            StorageKind::Int16 => "Int16",
            StorageKind::Int32 => "Int32",
            StorageKind::Int64 => "Int64",
            StorageKind::Decimal => "Decimal",
            StorageKind::Single => "Single",
            StorageKind::Double => "Double",
            StorageKind::Date => "Date",
            StorageKind::Time => "Time",
            StorageKind::DateTime => "DateTime",
            StorageKind::DateTime2 => "DateTime2",
            StorageKind::DateTimeOffset => "DateTimeOffset",
            StorageKind::Guid => "Guid",
            StorageKind::Xml => "Xml",
            StorageKind::VarNumeric => "VarNumeric",
            StorageKind::Object => "Object",
        }
    }

    /// Parse a canonical name back into a storage kind.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "AnsiString" => StorageKind::AnsiString,
            "AnsiStringFixedLength" => StorageKind::AnsiStringFixedLength,
            "String" => StorageKind::String,
            "StringFixedLength" => StorageKind::StringFixedLength,
            "Binary" => StorageKind::Binary,
            "Boolean" => StorageKind::Boolean,
            "Byte" => StorageKind::Byte,
            "Int16" => StorageKind::Int16,
            "Int32" => StorageKind::Int32,
            "Int64" => StorageKind::Int64,
            "Decimal" => StorageKind::Decimal,
            "Single" => StorageKind::Single,
            "Double" => StorageKind::Double,
            "Date" => StorageKind::Date,
            "Time" => StorageKind::Time,
            "DateTime" => StorageKind::DateTime,
            "DateTime2" => StorageKind::DateTime2,
            "DateTimeOffset" => StorageKind::DateTimeOffset,
            "Guid" => StorageKind::Guid,
            "Xml" => StorageKind::Xml,
            "VarNumeric" => StorageKind::VarNumeric,
            "Object" => StorageKind::Object,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the kind has a caller-declared length rather than a fixed width.
    pub fn is_variable_size(&self) -> bool {
        matches!(
            self,
            StorageKind::AnsiString
                | StorageKind::AnsiStringFixedLength
                | StorageKind::String
                | StorageKind::StringFixedLength
                | StorageKind::Binary
                | StorageKind::VarNumeric
                | StorageKind::Xml
        )
    }

    /// Native byte width for fixed scalar kinds, if the kind has one.
    pub fn fixed_width(&self) -> Option<i32> {
        let width = match self {
            StorageKind::Boolean | StorageKind::Byte => 1,
            StorageKind::Int16 => 2,
            StorageKind::Int32 | StorageKind::Single => 4,
            StorageKind::Int64 | StorageKind::Double => 8,
            StorageKind::Decimal => 16,
            _ => return None,
        };
        Some(width)
    }
}

/// Vendor type mapping table.
///
/// Wraps a lookup from native type name to the portable pair. Each supported
/// vendor supplies its own instance through its profile.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapping {
    lookup: fn(&str) -> (SemanticType, StorageKind),
}

impl TypeMapping {
    /// Map a native type name to its portable pair.
    ///
    /// Lookups are case-insensitive; unknown names map to the opaque fallback.
    pub fn map(&self, native_type: &str) -> (SemanticType, StorageKind) {
        (self.lookup)(&native_type.to_lowercase())
    }
}

/// Type mapping table for SQL Server.
pub const fn mssql_mapping() -> TypeMapping {
    TypeMapping { lookup: map_mssql }
}

/// Type mapping table for PostgreSQL.
pub const fn postgres_mapping() -> TypeMapping {
    TypeMapping { lookup: map_postgres }
}

fn map_mssql(native: &str) -> (SemanticType, StorageKind) {
    match native {
        "bigint" => (SemanticType::I64, StorageKind::Int64),
        "binary" => (SemanticType::Bytes, StorageKind::Binary),
        "bit" => (SemanticType::Bool, StorageKind::Boolean),
        "char" => (SemanticType::String, StorageKind::AnsiStringFixedLength),
        "date" => (SemanticType::Date, StorageKind::Date),
        "datetime" => (SemanticType::DateTime, StorageKind::DateTime),
        "datetime2" => (SemanticType::DateTime, StorageKind::DateTime2),
        "datetimeoffset" => (SemanticType::DateTimeOffset, StorageKind::DateTimeOffset),
        "decimal" => (SemanticType::Decimal, StorageKind::Decimal),
        "float" => (SemanticType::F64, StorageKind::Double),
        "image" => (SemanticType::Bytes, StorageKind::Binary),
        "int" => (SemanticType::I32, StorageKind::Int32),
        "money" => (SemanticType::Decimal, StorageKind::Decimal),
        "nchar" => (SemanticType::String, StorageKind::StringFixedLength),
        "ntext" => (SemanticType::String, StorageKind::String),
        "numeric" => (SemanticType::Decimal, StorageKind::Decimal),
        "nvarchar" => (SemanticType::String, StorageKind::String),
        "real" => (SemanticType::F32, StorageKind::Single),
        "rowversion" => (SemanticType::Bytes, StorageKind::Binary),
        "smalldatetime" => (SemanticType::DateTime, StorageKind::DateTime),
        "smallint" => (SemanticType::I16, StorageKind::Int16),
        "smallmoney" => (SemanticType::Decimal, StorageKind::Decimal),
        "sql_variant" => (SemanticType::Object, StorageKind::Object),
        "text" => (SemanticType::String, StorageKind::String),
        "time" => (SemanticType::Time, StorageKind::Time),
        "timestamp" => (SemanticType::Bytes, StorageKind::Binary),
        "tinyint" => (SemanticType::U8, StorageKind::Byte),
        "uniqueidentifier" => (SemanticType::Uuid, StorageKind::Guid),
        "varbinary" => (SemanticType::Bytes, StorageKind::Binary),
        "varchar" => (SemanticType::String, StorageKind::AnsiString),
        "xml" => (SemanticType::String, StorageKind::Xml),
        _ => (SemanticType::Object, StorageKind::Object),
    }
}

fn map_postgres(native: &str) -> (SemanticType, StorageKind) {
    match native {
        "bigint" | "int8" => (SemanticType::I64, StorageKind::Int64),
        "integer" | "int" | "int4" => (SemanticType::I32, StorageKind::Int32),
        "smallint" | "int2" => (SemanticType::I16, StorageKind::Int16),
        "boolean" | "bool" => (SemanticType::Bool, StorageKind::Boolean),
        "bytea" => (SemanticType::Bytes, StorageKind::Binary),
        "uuid" => (SemanticType::Uuid, StorageKind::Guid),
        "numeric" | "decimal" => (SemanticType::Decimal, StorageKind::Decimal),
        "money" => (SemanticType::Decimal, StorageKind::Decimal),
        "real" | "float4" => (SemanticType::F32, StorageKind::Single),
        "double precision" | "float8" => (SemanticType::F64, StorageKind::Double),
        "character" | "char" | "bpchar" => (SemanticType::String, StorageKind::StringFixedLength),
        "character varying" | "varchar" => (SemanticType::String, StorageKind::String),
        "text" => (SemanticType::String, StorageKind::String),
        "date" => (SemanticType::Date, StorageKind::Date),
        "time" | "time without time zone" => (SemanticType::Time, StorageKind::Time),
        "timestamp" | "timestamp without time zone" => (SemanticType::DateTime, StorageKind::DateTime),
        "timestamptz" | "timestamp with time zone" => {
            (SemanticType::DateTimeOffset, StorageKind::DateTimeOffset)
        }
        "xml" => (SemanticType::String, StorageKind::Xml),
        _ => (SemanticType::Object, StorageKind::Object),
    }
}
