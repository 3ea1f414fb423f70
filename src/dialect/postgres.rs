use crate::catalog::DataType;
use crate::plan::SqlValue;
use crate::query::HierarchyPart;
use super::{Dialect, RuntimeEngine};

/// Postgres row-store dialect. Values are bound as `$n` parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn engine(&self) -> RuntimeEngine {
        RuntimeEngine::Postgres
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn table_reference(&self, _project: Option<&str>, dataset: &str, table: &str) -> String {
        format!("{}.{}", self.quote_ident(dataset), self.quote_ident(table))
    }

    fn date_part(&self, part: HierarchyPart, expr: &str) -> String {
        let ts = format!("CAST({} AS TIMESTAMP)", expr);
        match part {
            HierarchyPart::Half => {
                format!("CASE WHEN EXTRACT(MONTH FROM {}) <= 6 THEN 1 ELSE 2 END", ts)
            }
            // fractional seconds would round up under a plain cast
            HierarchyPart::Second => {
                format!("CAST(FLOOR(EXTRACT(SECOND FROM {})) AS INTEGER)", ts)
            }
            other => format!(
                "CAST(EXTRACT({} FROM {}) AS INTEGER)",
                other.to_string().to_uppercase(),
                ts
            ),
        }
    }

    fn literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) => format!("{}", f),
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }

    fn placeholder(&self, position: usize) -> Option<String> {
        Some(format!("${}", position))
    }

    fn cast_type(&self, data_type: &DataType) -> Option<&'static str> {
        match data_type {
            DataType::I16 => Some("SMALLINT"),
            DataType::I32 => Some("INTEGER"),
            DataType::I64 => Some("BIGINT"),
            DataType::F32 => Some("REAL"),
            DataType::F64 => Some("DOUBLE PRECISION"),
            DataType::Decimal { .. } | DataType::Numeric => Some("NUMERIC"),
            DataType::Bool => Some("BOOLEAN"),
            DataType::Date => Some("DATE"),
            DataType::Timestamp => Some("TIMESTAMP"),
            DataType::TimestampTz => Some("TIMESTAMPTZ"),
            DataType::Time => Some("TIME"),
            DataType::Uuid => Some("UUID"),
            DataType::Json | DataType::String | DataType::Other(_) => None,
        }
    }

    fn text_like(&self, expr: &str, pattern: &str, negated: bool) -> String {
        let op = if negated { "NOT ILIKE" } else { "ILIKE" };
        format!("CAST({} AS TEXT) {} {}", expr, op, pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(Postgres.quote_ident("region"), "\"region\"");
        assert_eq!(Postgres.quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_table_reference() {
        assert_eq!(
            Postgres.table_reference(None, "tenant_a", "orders"),
            "\"tenant_a\".\"orders\""
        );
    }

    #[test]
    fn test_date_parts() {
        assert_eq!(
            Postgres.date_part(HierarchyPart::Year, "t0.\"created_at\""),
            "CAST(EXTRACT(YEAR FROM CAST(t0.\"created_at\" AS TIMESTAMP)) AS INTEGER)"
        );
        assert_eq!(
            Postgres.date_part(HierarchyPart::Half, "t0.\"d\""),
            "CASE WHEN EXTRACT(MONTH FROM CAST(t0.\"d\" AS TIMESTAMP)) <= 6 THEN 1 ELSE 2 END"
        );
        assert!(Postgres.date_part(HierarchyPart::Second, "x").contains("FLOOR"));
    }

    #[test]
    fn test_literals() {
        assert_eq!(Postgres.literal(&SqlValue::Text("O'Brien".into())), "'O''Brien'");
        assert_eq!(Postgres.literal(&SqlValue::Null), "NULL");
        assert_eq!(Postgres.literal(&SqlValue::Int(-3)), "-3");
        assert_eq!(Postgres.placeholder(2).as_deref(), Some("$2"));
    }
}
