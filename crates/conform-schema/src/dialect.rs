//! SQL Server dialect: type mapping, catalog canonicalization, and
//! default-literal formatting.
//!
//! Every logical type maps to exactly one native spelling, and both sides of
//! a reconciliation run are funneled through this module: model extraction
//! maps logical types forward, introspection maps catalog-reported types back
//! through the same table. A comparison therefore never sees `nvarchar`
//! against `NVARCHAR(MAX)`; it sees the canonical spelling on both sides.

use crate::{Literal, LogicalType};

/// Map a logical type to its SQL Server spelling.
///
/// Returns `None` for types the dialect cannot express natively: SQL Server
/// stores JSON in `NVARCHAR` columns and has no interval type, so neither has
/// exactly one native spelling. Unmapped types are rejected at extraction
/// time, before any DDL is generated.
pub fn native_type(logical: LogicalType) -> Option<&'static str> {
    match logical {
        LogicalType::SmallInt => Some("SMALLINT"),
        LogicalType::Integer => Some("INT"),
        LogicalType::BigInt => Some("BIGINT"),
        LogicalType::Real => Some("REAL"),
        LogicalType::Double => Some("FLOAT"),
        LogicalType::Boolean => Some("BIT"),
        LogicalType::Text => Some("NVARCHAR(MAX)"),
        LogicalType::Binary => Some("VARBINARY(MAX)"),
        LogicalType::Timestamp => Some("DATETIME"),
        LogicalType::Date => Some("DATE"),
        LogicalType::Time => Some("TIME"),
        LogicalType::Uuid => Some("UNIQUEIDENTIFIER"),
        LogicalType::Json | LogicalType::Interval => None,
    }
}

/// Reverse-map a catalog-reported type to a logical type, where the mapping
/// is lossless. The catalog reports lower-case base names plus a separate
/// `CHARACTER_MAXIMUM_LENGTH` (`-1` means `MAX`).
fn catalog_to_logical(data_type: &str, char_max_len: Option<i32>) -> Option<LogicalType> {
    match data_type {
        "smallint" => Some(LogicalType::SmallInt),
        "int" => Some(LogicalType::Integer),
        "bigint" => Some(LogicalType::BigInt),
        "real" => Some(LogicalType::Real),
        "float" => Some(LogicalType::Double),
        "bit" => Some(LogicalType::Boolean),
        "nvarchar" if char_max_len == Some(-1) => Some(LogicalType::Text),
        "varbinary" if char_max_len == Some(-1) => Some(LogicalType::Binary),
        "datetime" => Some(LogicalType::Timestamp),
        "date" => Some(LogicalType::Date),
        "time" => Some(LogicalType::Time),
        "uniqueidentifier" => Some(LogicalType::Uuid),
        _ => None,
    }
}

/// Canonical spelling for a catalog-reported column type.
///
/// Types that round-trip through a logical type take that type's native
/// spelling, so a live `nvarchar` column with unbounded length compares equal
/// to a model column declared `Text`. Anything else (`varchar`, bounded
/// `nvarchar(50)`, `geography`, ...) keeps its upper-cased, length-qualified
/// catalog form and never compares equal to a mapped model type, which makes
/// the differ re-type such columns toward the model's declaration.
pub fn canonical_catalog_type(data_type: &str, char_max_len: Option<i32>) -> String {
    let data_type = data_type.to_ascii_lowercase();

    if let Some(logical) = catalog_to_logical(&data_type, char_max_len)
        && let Some(native) = native_type(logical)
    {
        return native.to_string();
    }

    match char_max_len {
        Some(-1) => format!("{}(MAX)", data_type.to_ascii_uppercase()),
        Some(n) if n > 0 => format!("{}({})", data_type.to_ascii_uppercase(), n),
        _ => data_type.to_ascii_uppercase(),
    }
}

/// Strip the parenthesis wrapping SQL Server applies when it stores default
/// definitions: `(('CURRENT_TIMESTAMP'))` and `((0))` both come back from
/// `COLUMN_DEFAULT` wrapped, `(getdate())` singly so.
pub fn normalize_default(raw: &str) -> String {
    let mut text = raw.trim();
    while text.len() >= 2
        && text.starts_with('(')
        && text.ends_with(')')
        && parens_balanced(&text[1..text.len() - 1])
    {
        text = text[1..text.len() - 1].trim();
    }
    text.to_string()
}

/// True if the slice never closes a parenthesis it did not open.
fn parens_balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Formatting rule for default-value literals.
///
/// String- and timestamp-typed defaults are quoted; everything else renders
/// in its natural textual form. The rule is a named policy rather than a
/// hard-coded branch so a dialect swap can bring its own quoting.
pub trait DefaultLiteralPolicy {
    /// Render a literal as SQL text.
    fn render(&self, literal: &Literal) -> String;
}

/// SQL Server literal formatting: quoted strings and timestamps with embedded
/// quotes doubled, `1`/`0` booleans, raw text passed through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerLiterals;

impl DefaultLiteralPolicy for SqlServerLiterals {
    fn render(&self, literal: &Literal) -> String {
        match literal {
            Literal::Int(v) => v.to_string(),
            Literal::Float(v) => v.to_string(),
            Literal::Bool(v) => if *v { "1" } else { "0" }.to_string(),
            Literal::Text(v) => quote(v),
            Literal::Timestamp(v) => quote(&v.format("%Y-%m-%d %H:%M:%S").to_string()),
            Literal::Raw(v) => v.clone(),
        }
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
