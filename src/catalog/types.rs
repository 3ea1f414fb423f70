//! Declared column types of model tables

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Column types as declared by the table registry.
///
/// Registry types come from several ingestion paths (Postgres catalogs,
/// spreadsheets, warehouse schemas), so parsing accepts the common spellings
/// of each and keeps anything unrecognized as `Other`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataType {
    I16,
    I32,
    I64,
    F32,
    F64,
    /// Fixed-point decimal with precision and scale
    Decimal { precision: u8, scale: u8 },
    /// Arbitrary precision numeric without declared precision
    Numeric,
    Bool,
    #[default]
    String,
    Date,
    /// Timestamp without time zone
    Timestamp,
    /// Timestamp with time zone
    TimestampTz,
    Time,
    Json,
    Uuid,
    /// Unrecognized type name, compared as text
    Other(String),
}

impl DataType {
    /// Whether values of this type compare as plain text
    pub fn is_textual(&self) -> bool {
        matches!(self, DataType::String | DataType::Other(_))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::I16 => write!(f, "i16"),
            DataType::I32 => write!(f, "i32"),
            DataType::I64 => write!(f, "i64"),
            DataType::F32 => write!(f, "f32"),
            DataType::F64 => write!(f, "f64"),
            DataType::Decimal { precision, scale } => write!(f, "decimal({}, {})", precision, scale),
            DataType::Numeric => write!(f, "numeric"),
            DataType::Bool => write!(f, "bool"),
            DataType::String => write!(f, "string"),
            DataType::Date => write!(f, "date"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::TimestampTz => write!(f, "timestamptz"),
            DataType::Time => write!(f, "time"),
            DataType::Json => write!(f, "json"),
            DataType::Uuid => write!(f, "uuid"),
            DataType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Error when parsing a data type string
#[derive(Debug, Clone)]
pub struct ParseDataTypeError {
    pub input: String,
    pub message: String,
}

impl fmt::Display for ParseDataTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid data type '{}': {}", self.input, self.message)
    }
}

impl std::error::Error for ParseDataTypeError {}

impl FromStr for DataType {
    type Err = ParseDataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();

        for prefix in ["decimal(", "numeric("] {
            if lower.starts_with(prefix) && lower.ends_with(')') {
                return parse_decimal(&lower, prefix.len());
            }
        }

        let parsed = match lower.as_str() {
            "i16" | "int2" | "smallint" => DataType::I16,
            "i32" | "int" | "int4" | "integer" => DataType::I32,
            "i64" | "int8" | "long" | "bigint" | "int64" => DataType::I64,
            "f32" | "float4" | "real" => DataType::F32,
            "f64" | "float" | "float8" | "double" | "double precision" | "float64" => DataType::F64,
            "numeric" | "decimal" | "bignumeric" => DataType::Numeric,
            "bool" | "boolean" => DataType::Bool,
            "string" | "text" | "varchar" | "character varying" | "char" | "character" => {
                DataType::String
            }
            "date" => DataType::Date,
            "timestamp" | "datetime" | "timestamp without time zone" => DataType::Timestamp,
            "timestamptz" | "timestamp with time zone" => DataType::TimestampTz,
            "time" | "time without time zone" => DataType::Time,
            "json" | "jsonb" => DataType::Json,
            "uuid" => DataType::Uuid,
            "" => DataType::String,
            other => DataType::Other(other.to_string()),
        };
        Ok(parsed)
    }
}

fn parse_decimal(s: &str, prefix_len: usize) -> Result<DataType, ParseDataTypeError> {
    let inner = &s[prefix_len..s.len() - 1];
    let parts: Vec<&str> = inner.split(',').map(|p| p.trim()).collect();

    if parts.len() != 2 {
        return Err(ParseDataTypeError {
            input: s.to_string(),
            message: "decimal requires precision and scale, e.g., decimal(31, 7)".to_string(),
        });
    }

    let precision: u8 = parts[0].parse().map_err(|_| ParseDataTypeError {
        input: s.to_string(),
        message: "invalid precision".to_string(),
    })?;

    let scale: u8 = parts[1].parse().map_err(|_| ParseDataTypeError {
        input: s.to_string(),
        message: "invalid scale".to_string(),
    })?;

    if precision == 0 || precision > 76 {
        return Err(ParseDataTypeError {
            input: s.to_string(),
            message: "precision must be between 1 and 76".to_string(),
        });
    }

    if scale > precision {
        return Err(ParseDataTypeError {
            input: s.to_string(),
            message: "scale cannot exceed precision".to_string(),
        });
    }

    Ok(DataType::Decimal { precision, scale })
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DataType::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for DataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
