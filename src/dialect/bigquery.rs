use crate::catalog::DataType;
use crate::plan::SqlValue;
use crate::query::HierarchyPart;
use super::{Dialect, RuntimeEngine};

/// BigQuery standard SQL. Every value is inlined as a literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigQuery;

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn quote_path(path: &str) -> String {
    format!("`{}`", path.replace('\\', "\\\\").replace('`', "\\`"))
}

impl Dialect for BigQuery {
    fn engine(&self) -> RuntimeEngine {
        RuntimeEngine::BigQuery
    }

    fn quote_ident(&self, ident: &str) -> String {
        quote_path(ident)
    }

    fn table_reference(&self, project: Option<&str>, dataset: &str, table: &str) -> String {
        let parts: Vec<&str> = [project.unwrap_or(""), dataset, table]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        quote_path(&parts.join("."))
    }

    fn date_part(&self, part: HierarchyPart, expr: &str) -> String {
        let ts = format!("CAST({} AS TIMESTAMP)", expr);
        match part {
            HierarchyPart::Half => {
                format!("CASE WHEN EXTRACT(MONTH FROM {}) <= 6 THEN 1 ELSE 2 END", ts)
            }
            // matches the ISO week Postgres reports
            HierarchyPart::Week => format!("EXTRACT(ISOWEEK FROM {})", ts),
            other => format!("EXTRACT({} FROM {})", other.to_string().to_uppercase(), ts),
        }
    }

    fn literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) => format!("{}", f),
            SqlValue::Text(s) => format!("'{}'", escape_string(s)),
        }
    }

    fn placeholder(&self, _position: usize) -> Option<String> {
        None
    }

    fn cast_type(&self, data_type: &DataType) -> Option<&'static str> {
        match data_type {
            DataType::I16 | DataType::I32 | DataType::I64 => Some("INT64"),
            DataType::F32 | DataType::F64 => Some("FLOAT64"),
            DataType::Decimal { .. } | DataType::Numeric => Some("NUMERIC"),
            DataType::Bool => Some("BOOL"),
            DataType::Date => Some("DATE"),
            DataType::Timestamp => Some("DATETIME"),
            DataType::TimestampTz => Some("TIMESTAMP"),
            DataType::Time => Some("TIME"),
            DataType::Json | DataType::Uuid | DataType::String | DataType::Other(_) => None,
        }
    }

    fn text_like(&self, expr: &str, pattern: &str, negated: bool) -> String {
        let op = if negated { "NOT LIKE" } else { "LIKE" };
        format!("LOWER(CAST({} AS STRING)) {} LOWER({})", expr, op, pattern)
    }
}
