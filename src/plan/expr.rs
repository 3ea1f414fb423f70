//! Expression types for the logical plan

use crate::catalog::DataType;
use crate::query::{Aggregation, HierarchyPart, LogicalConnector};
use super::value::SqlValue;

/// A column of an aliased table in the FROM/JOIN list
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Table alias (`t0`, `t1`, ...)
    pub table_alias: String,
    /// Column name, quoted at emission
    pub name: String,
}

impl ColumnRef {
    pub fn new(table_alias: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table_alias: table_alias.into(),
            name: name.into(),
        }
    }
}

/// Scalar expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference
    Column(ColumnRef),
    /// Calendar component of a date/time expression
    DatePart {
        part: HierarchyPart,
        expr: Box<Expr>,
    },
    /// A value, bound or inlined depending on the dialect.
    /// `compare_as` is the type of the expression the value is compared with.
    Value {
        value: SqlValue,
        compare_as: Option<DataType>,
    },
    /// Binary comparison (e.g., a = b, a > 5)
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// expr BETWEEN low AND high
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    /// expr [NOT] IN (values)
    In {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },
    /// Case-insensitive pattern match over the text form of `expr`
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    /// IS NULL check
    IsNull(Box<Expr>),
    /// IS NOT NULL check
    IsNotNull(Box<Expr>),
    /// Two predicates joined by AND/OR, always emitted parenthesized
    Logical {
        left: Box<Expr>,
        op: LogicalConnector,
        right: Box<Expr>,
    },
    /// Aggregate function call
    Aggregate {
        func: Aggregation,
        expr: Box<Expr>,
    },
}

impl Expr {
    pub fn column(table_alias: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(table_alias, name))
    }

    pub fn value(value: SqlValue, compare_as: Option<DataType>) -> Self {
        Expr::Value { value, compare_as }
    }

    pub fn compare(self, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    /// `self <op> right`, nesting `self` on the left
    pub fn combine(self, op: LogicalConnector, right: Expr) -> Self {
        Expr::Logical {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    pub fn and(self, right: Expr) -> Self {
        self.combine(LogicalConnector::And, right)
    }

    pub fn or(self, right: Expr) -> Self {
        self.combine(LogicalConnector::Or, right)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
        }
    }
}
