//! Logical plan types (noun module)
//!
//! Represents a single SELECT statement over joined model tables, and the
//! compiled `QueryPlan` handed back to callers.

mod expr;
mod node;
mod value;

pub use expr::{BinaryOperator, ColumnRef, Expr};
pub use node::{
    JoinClause, OrderItem, OrderTarget, QueryPlan, SelectItem, SelectStatement, TableSource,
};
pub use value::SqlValue;
