use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregation applied to a projected column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Aggregation {
    Sum,
    Avg,
    Count,
    CountDistinct,
    Min,
    Max,
    /// Plain column, participates in implicit grouping
    #[default]
    None,
    /// Plain column, same planning behavior as `None`
    Raw,
}

impl Aggregation {
    /// Whether this function collapses rows
    pub fn is_aggregate(&self) -> bool {
        !matches!(self, Aggregation::None | Aggregation::Raw)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Sum => write!(f, "sum"),
            Aggregation::Avg => write!(f, "avg"),
            Aggregation::Count => write!(f, "count"),
            Aggregation::CountDistinct => write!(f, "count_distinct"),
            Aggregation::Min => write!(f, "min"),
            Aggregation::Max => write!(f, "max"),
            Aggregation::None => write!(f, "none"),
            Aggregation::Raw => write!(f, "raw"),
        }
    }
}

/// Calendar component extracted from a date/time column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyPart {
    Year,
    Quarter,
    /// Synthesized: 1 for January..June, 2 otherwise
    Half,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

impl fmt::Display for HierarchyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HierarchyPart::Year => "year",
            HierarchyPart::Quarter => "quarter",
            HierarchyPart::Half => "half",
            HierarchyPart::Month => "month",
            HierarchyPart::Week => "week",
            HierarchyPart::Day => "day",
            HierarchyPart::Hour => "hour",
            HierarchyPart::Minute => "minute",
            HierarchyPart::Second => "second",
        };
        f.write_str(name)
    }
}

/// Filter operators understood by every dialect.
///
/// The short aliases (`eq`, `gt`, `=`, ...) are accepted on input so stored
/// policy documents written against older operator names keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    #[serde(alias = "eq", alias = "=")]
    Equals,
    #[serde(alias = "neq", alias = "!=", alias = "<>")]
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    #[serde(alias = "gt", alias = ">")]
    GreaterThan,
    #[serde(alias = "gte", alias = ">=")]
    GreaterOrEqual,
    #[serde(alias = "lt", alias = "<")]
    LessThan,
    #[serde(alias = "lte", alias = "<=")]
    LessOrEqual,
    Between,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

/// How a filter joins the expression accumulated before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalConnector {
    #[default]
    #[serde(alias = "and")]
    And,
    #[serde(alias = "or")]
    Or,
}

impl LogicalConnector {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalConnector::And => "AND",
            LogicalConnector::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

/// A selected output column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// Model table id or table name
    pub table_ref: String,
    pub column: String,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub hierarchy_part: Option<HierarchyPart>,
}

impl Projection {
    pub fn new(table_ref: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table_ref: table_ref.into(),
            column: column.into(),
            aggregation: Aggregation::None,
            alias: None,
            hierarchy_part: None,
        }
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_hierarchy_part(mut self, part: HierarchyPart) -> Self {
        self.hierarchy_part = Some(part);
        self
    }
}

/// An explicit GROUP BY key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupKey {
    pub table_ref: String,
    pub column: String,
    #[serde(default)]
    pub hierarchy_part: Option<HierarchyPart>,
}

/// An ORDER BY key.
///
/// Without a `table_ref` the column is looked up among the output aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderKey {
    #[serde(default)]
    pub table_ref: Option<String>,
    pub column: String,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub hierarchy_part: Option<HierarchyPart>,
    #[serde(default)]
    pub direction: SortDirection,
}

/// A user-supplied (or policy-derived) row filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub table_ref: String,
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub value2: Option<serde_json::Value>,
    #[serde(default)]
    pub hierarchy_part: Option<HierarchyPart>,
    #[serde(default)]
    pub logical_connector: LogicalConnector,
}

impl FilterSpec {
    pub fn new(
        table_ref: impl Into<String>,
        column: impl Into<String>,
        operator: FilterOperator,
        value: serde_json::Value,
    ) -> Self {
        Self {
            table_ref: table_ref.into(),
            column: column.into(),
            operator,
            value,
            value2: None,
            hierarchy_part: None,
            logical_connector: LogicalConnector::And,
        }
    }

    pub fn with_value2(mut self, value2: serde_json::Value) -> Self {
        self.value2 = Some(value2);
        self
    }

    pub fn with_connector(mut self, connector: LogicalConnector) -> Self {
        self.logical_connector = connector;
        self
    }

    pub fn with_hierarchy_part(mut self, part: HierarchyPart) -> Self {
        self.hierarchy_part = Some(part);
        self
    }
}

/// Request body for semantic queries, as sent by the dashboard UI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Data model to plan against; the tenant default when absent
    #[serde(default)]
    pub data_model_id: Option<String>,
    #[serde(default)]
    pub projections: Vec<Projection>,
    #[serde(default)]
    pub group_by: Vec<GroupKey>,
    #[serde(default)]
    pub order_by: Vec<OrderKey>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    /// Dashboard whose share grants scope this request
    #[serde(default)]
    pub dashboard_id: Option<String>,
    #[serde(default)]
    pub page_id: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}
