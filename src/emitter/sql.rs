//! SQL emitter
//!
//! Transforms a SelectStatement into SQL text for one dialect, collecting
//! bound parameters for dialects that use placeholders.

use crate::catalog::DataType;
use crate::dialect::Dialect;
use crate::plan::{
    ColumnRef, Expr, JoinClause, OrderItem, OrderTarget, SelectStatement, SqlValue, TableSource,
};
use crate::query::{Aggregation, SortDirection};

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedSql {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Emit a multi-line SQL statement.
pub fn emit_sql(stmt: &SelectStatement, dialect: &dyn Dialect) -> EmittedSql {
    let mut writer = SqlWriter {
        dialect,
        params: Vec::new(),
    };
    let sql = writer.statement(stmt);
    EmittedSql {
        sql,
        params: writer.params,
    }
}

struct SqlWriter<'d> {
    dialect: &'d dyn Dialect,
    params: Vec<SqlValue>,
}

impl SqlWriter<'_> {
    // -----------------------------------------------------------------------
    // Clauses
    // -----------------------------------------------------------------------

    fn statement(&mut self, stmt: &SelectStatement) -> String {
        let items: Vec<String> = stmt
            .projections
            .iter()
            .map(|item| {
                let expr = self.expr(&item.expr);
                format!("{} AS {}", expr, self.dialect.quote_ident(&item.alias))
            })
            .collect();

        let mut lines = vec![
            format!("SELECT {}", items.join(", ")),
            format!("FROM {}", table_source(&stmt.from)),
        ];

        for join in &stmt.joins {
            lines.push(self.join(join));
        }

        if let Some(filter) = &stmt.filter {
            lines.push(format!("WHERE {}", self.expr(filter)));
        }

        if !stmt.group_by.is_empty() {
            let keys: Vec<String> = stmt.group_by.iter().map(|e| self.expr(e)).collect();
            lines.push(format!("GROUP BY {}", keys.join(", ")));
        }

        if !stmt.order_by.is_empty() {
            let keys: Vec<String> = stmt.order_by.iter().map(|o| self.order_item(o)).collect();
            lines.push(format!("ORDER BY {}", keys.join(", ")));
        }

        lines.push(format!("LIMIT {}", stmt.limit));
        lines.join("\n")
    }

    fn join(&mut self, join: &JoinClause) -> String {
        format!(
            "INNER JOIN {} ON {} = {}",
            table_source(&join.table),
            self.column(&join.left_key),
            self.column(&join.right_key),
        )
    }

    fn order_item(&mut self, item: &OrderItem) -> String {
        let target = match &item.target {
            OrderTarget::Alias(alias) => self.dialect.quote_ident(alias),
            OrderTarget::Expr(expr) => self.expr(expr),
        };
        let dir = match item.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        format!("{} {}", target, dir)
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Column(col) => self.column(col),
            Expr::DatePart { part, expr } => {
                let inner = self.expr(expr);
                self.dialect.date_part(*part, &inner)
            }
            Expr::Value { value, compare_as } => self.value(value, compare_as.as_ref()),
            Expr::BinaryOp { left, op, right } => {
                let l = self.expr(left);
                let r = self.expr(right);
                format!("{} {} {}", l, op.as_str(), r)
            }
            Expr::Between { expr, low, high } => {
                let e = self.expr(expr);
                let lo = self.expr(low);
                let hi = self.expr(high);
                format!("{} BETWEEN {} AND {}", e, lo, hi)
            }
            Expr::In { expr, values, negated } => {
                let needle = self.expr(expr);
                let vals: Vec<String> = values.iter().map(|v| self.expr(v)).collect();
                let kw = if *negated { "NOT IN" } else { "IN" };
                format!("{} {} ({})", needle, kw, vals.join(", "))
            }
            Expr::Like { expr, pattern, negated } => {
                let e = self.expr(expr);
                let p = self.expr(pattern);
                self.dialect.text_like(&e, &p, *negated)
            }
            Expr::IsNull(inner) => format!("{} IS NULL", self.expr(inner)),
            Expr::IsNotNull(inner) => format!("{} IS NOT NULL", self.expr(inner)),
            Expr::Logical { left, op, right } => {
                let l = self.expr(left);
                let r = self.expr(right);
                format!("({} {} {})", l, op.as_str(), r)
            }
            Expr::Aggregate { func, expr } => {
                let inner = self.expr(expr);
                match func {
                    Aggregation::Sum => format!("SUM({})", inner),
                    Aggregation::Avg => format!("AVG({})", inner),
                    Aggregation::Count => format!("COUNT({})", inner),
                    Aggregation::CountDistinct => format!("COUNT(DISTINCT {})", inner),
                    Aggregation::Min => format!("MIN({})", inner),
                    Aggregation::Max => format!("MAX({})", inner),
                    Aggregation::None | Aggregation::Raw => inner,
                }
            }
        }
    }

    fn column(&self, col: &ColumnRef) -> String {
        format!("{}.{}", col.table_alias, self.dialect.quote_ident(&col.name))
    }

    /// Render a value as a placeholder or literal.
    ///
    /// Text compared with a typed expression is cast to that type; scalars
    /// compared with a text column are sent as text.
    fn value(&mut self, value: &SqlValue, compare_as: Option<&DataType>) -> String {
        if *value == SqlValue::Null {
            return "NULL".to_string();
        }

        let value = match (value, compare_as) {
            (SqlValue::Text(_), _) | (_, None) => value.clone(),
            (other, Some(ty)) if ty.is_textual() => SqlValue::Text(other.to_text()),
            (other, Some(_)) => other.clone(),
        };

        let cast = match (&value, compare_as) {
            (SqlValue::Text(_), Some(ty)) => self.dialect.cast_type(ty),
            _ => None,
        };

        let rendered = match self.dialect.placeholder(self.params.len() + 1) {
            Some(placeholder) => {
                self.params.push(value);
                placeholder
            }
            None => self.dialect.literal(&value),
        };

        match cast {
            Some(ty) => format!("CAST({} AS {})", rendered, ty),
            None => rendered,
        }
    }
}

fn table_source(source: &TableSource) -> String {
    format!("{} {}", source.reference, source.alias)
}
