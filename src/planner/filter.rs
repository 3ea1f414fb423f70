//! Predicate compilation: FilterSpec -> Expr

use serde_json::Value;

use crate::catalog::DataType;
use crate::plan::{BinaryOperator, Expr, SqlValue};
use crate::query::{FilterOperator, FilterSpec, HierarchyPart};
use super::error::PlanError;
use super::scope::Scope;

/// Spellings the UI uses for "no value"
const NULL_SENTINELS: &[&str] = &["", "(blank)", "null", "undefined", "nan"];

/// Whether a filter value means SQL NULL
pub fn is_null_sentinel(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => NULL_SENTINELS.iter().any(|n| s.eq_ignore_ascii_case(n)),
        _ => false,
    }
}

/// Compile filters left to right.
///
/// The first filter seeds the expression; each later one is combined with
/// everything before it by its own connector.
pub fn compile_filters<'f, I>(scope: &Scope<'_>, filters: I) -> Result<Option<Expr>, PlanError>
where
    I: IntoIterator<Item = &'f FilterSpec>,
{
    let mut acc: Option<Expr> = None;
    for filter in filters {
        let expr = compile_filter(scope, filter)?;
        acc = Some(match acc {
            None => expr,
            Some(prev) => prev.combine(filter.logical_connector, expr),
        });
    }
    Ok(acc)
}

/// Compile one filter against its scoped column
pub fn compile_filter(scope: &Scope<'_>, filter: &FilterSpec) -> Result<Expr, PlanError> {
    let scoped = scope.column(&filter.table_ref, &filter.column)?;
    let (target, compare_as) = match filter.hierarchy_part {
        Some(part) => (date_part(part, Expr::Column(scoped.column)), Some(DataType::I32)),
        None => (Expr::Column(scoped.column), scoped.data_type),
    };
    let ctx = FilterContext {
        column: &filter.column,
        target,
        compare_as,
    };

    match filter.operator {
        FilterOperator::IsNull => Ok(Expr::IsNull(Box::new(ctx.target))),
        FilterOperator::IsNotNull => Ok(Expr::IsNotNull(Box::new(ctx.target))),
        FilterOperator::Equals | FilterOperator::NotEquals => {
            let negated = filter.operator == FilterOperator::NotEquals;
            if filter.value.is_array() {
                return ctx.membership(&filter.value, negated);
            }
            if is_null_sentinel(&filter.value) {
                return Ok(if negated {
                    Expr::IsNotNull(Box::new(ctx.target))
                } else {
                    Expr::IsNull(Box::new(ctx.target))
                });
            }
            let op = if negated { BinaryOperator::NotEq } else { BinaryOperator::Eq };
            let value = ctx.scalar(&filter.value)?;
            Ok(ctx.target.compare(op, value))
        }
        FilterOperator::GreaterThan => ctx.ordering(BinaryOperator::Gt, &filter.value),
        FilterOperator::GreaterOrEqual => ctx.ordering(BinaryOperator::GtEq, &filter.value),
        FilterOperator::LessThan => ctx.ordering(BinaryOperator::Lt, &filter.value),
        FilterOperator::LessOrEqual => ctx.ordering(BinaryOperator::LtEq, &filter.value),
        FilterOperator::Between => {
            let (low, high) = match (&filter.value, &filter.value2) {
                (Value::Array(pair), None) if pair.len() == 2 => (&pair[0], &pair[1]),
                (low, Some(high)) => (low, high),
                _ => return Err(ctx.invalid("between requires value and value2")),
            };
            if is_null_sentinel(low) || is_null_sentinel(high) {
                return Err(ctx.invalid("between requires value and value2"));
            }
            let low = ctx.scalar(low)?;
            let high = ctx.scalar(high)?;
            Ok(Expr::Between {
                expr: Box::new(ctx.target),
                low: Box::new(low),
                high: Box::new(high),
            })
        }
        FilterOperator::In => ctx.membership(&filter.value, false),
        FilterOperator::NotIn => ctx.membership(&filter.value, true),
        FilterOperator::Contains => ctx.like(&filter.value, "%", "%", false),
        FilterOperator::NotContains => ctx.like(&filter.value, "%", "%", true),
        FilterOperator::StartsWith => ctx.like(&filter.value, "", "%", false),
        FilterOperator::EndsWith => ctx.like(&filter.value, "%", "", false),
    }
}

fn date_part(part: HierarchyPart, expr: Expr) -> Expr {
    Expr::DatePart {
        part,
        expr: Box::new(expr),
    }
}

/// Escape LIKE metacharacters so the value matches literally
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

struct FilterContext<'f> {
    column: &'f str,
    target: Expr,
    compare_as: Option<DataType>,
}

impl FilterContext<'_> {
    fn invalid(&self, message: &str) -> PlanError {
        PlanError::InvalidFilter {
            column: self.column.to_string(),
            message: message.to_string(),
        }
    }

    fn scalar(&self, value: &Value) -> Result<Expr, PlanError> {
        let value = SqlValue::from_json(value)
            .ok_or_else(|| self.invalid("expected a scalar value"))?;
        Ok(Expr::value(value, self.compare_as.clone()))
    }

    fn ordering(self, op: BinaryOperator, value: &Value) -> Result<Expr, PlanError> {
        if is_null_sentinel(value) {
            return Err(self.invalid("comparison requires a value"));
        }
        let value = self.scalar(value)?;
        Ok(self.target.compare(op, value))
    }

    /// `IN` / `NOT IN`, folding null sentinels into an explicit NULL check
    fn membership(self, value: &Value, negated: bool) -> Result<Expr, PlanError> {
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            scalar => vec![scalar],
        };
        if items.is_empty() {
            return Err(self.invalid("list must not be empty"));
        }

        let has_null = items.iter().any(|v| is_null_sentinel(v));
        let values = items
            .into_iter()
            .filter(|v| !is_null_sentinel(v))
            .map(|v| self.scalar(v))
            .collect::<Result<Vec<_>, _>>()?;

        let null_check = |target: Expr| {
            if negated {
                Expr::IsNotNull(Box::new(target))
            } else {
                Expr::IsNull(Box::new(target))
            }
        };
        if values.is_empty() {
            return Ok(null_check(self.target));
        }

        let list = Expr::In {
            expr: Box::new(self.target.clone()),
            values,
            negated,
        };
        Ok(match (has_null, negated) {
            (false, _) => list,
            (true, false) => list.or(null_check(self.target)),
            (true, true) => list.and(null_check(self.target)),
        })
    }

    fn like(self, value: &Value, prefix: &str, suffix: &str, negated: bool) -> Result<Expr, PlanError> {
        let text = match value {
            Value::Null => return Err(self.invalid("pattern filters require a value")),
            other => SqlValue::from_json(other)
                .ok_or_else(|| self.invalid("expected a scalar value"))?
                .to_text(),
        };
        let pattern = format!("{}{}{}", prefix, escape_like(&text), suffix);
        Ok(Expr::Like {
            expr: Box::new(self.target),
            pattern: Box::new(Expr::value(SqlValue::Text(pattern), None)),
            negated,
        })
    }
}
