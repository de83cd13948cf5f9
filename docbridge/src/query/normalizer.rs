use crate::common::{SortOrder, DEFAULT_QUERY_LIMIT, MAX_DISJUNCTION_VALUES};
use crate::document::value_type_name;
use crate::errors::{DbError, DbResult, ErrorKind};
use serde_json::Value;
use std::fmt::{Display, Formatter};

use super::{QueryOptions, WhereClause};

/// One step of a collection scan, in the order the store applies them.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryConstraint {
    Where(WhereClause),
    OrderBy { field: String, order: SortOrder },
    Limit(u64),
}

impl Display for QueryConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryConstraint::Where(clause) => write!(f, "where({})", clause),
            QueryConstraint::OrderBy { field, order } => write!(f, "orderBy({}, {})", field, order),
            QueryConstraint::Limit(limit) => write!(f, "limit({})", limit),
        }
    }
}

/// Turns a query description into the constraint list a store applies.
///
/// The result is `[Where]` or `[OrderBy]` (or neither), always followed by a
/// single `Limit`. A condition wins over an ordering: when both are given the
/// ordering is dropped so that no composite index is ever required. Without an
/// explicit limit, [DEFAULT_QUERY_LIMIT] applies.
///
/// Fails with [ErrorKind::InvalidQuery] when a field name is empty, the limit
/// is zero, or a list operator gets something other than a non-empty array of
/// at most [MAX_DISJUNCTION_VALUES] values.
pub fn normalize(options: &QueryOptions) -> DbResult<Vec<QueryConstraint>> {
    let mut constraints = Vec::with_capacity(2);

    if let Some(clause) = &options.where_clause {
        validate_clause(clause)?;
        if let Some(order_by) = &options.order_by {
            log::debug!(
                "Dropping orderBy({}) in favour of where({}) to avoid a composite index",
                order_by,
                clause
            );
        }
        constraints.push(QueryConstraint::Where(clause.clone()));
    } else if let Some(order_by) = &options.order_by {
        if order_by.trim().is_empty() {
            return Err(DbError::new(
                "orderBy field name must not be empty",
                ErrorKind::InvalidQuery,
            ));
        }
        constraints.push(QueryConstraint::OrderBy {
            field: order_by.clone(),
            order: options.order.unwrap_or_default(),
        });
    }

    let limit = match options.limit {
        Some(0) => {
            return Err(DbError::new(
                "Query limit must be greater than zero",
                ErrorKind::InvalidQuery,
            ))
        }
        Some(limit) => limit,
        None => DEFAULT_QUERY_LIMIT,
    };
    constraints.push(QueryConstraint::Limit(limit));

    Ok(constraints)
}

fn validate_clause(clause: &WhereClause) -> DbResult<()> {
    if clause.field.trim().is_empty() {
        return Err(DbError::new(
            "where field name must not be empty",
            ErrorKind::InvalidQuery,
        ));
    }

    if clause.operator.takes_list() {
        match &clause.value {
            Value::Array(values) if values.is_empty() => {
                return Err(DbError::new(
                    &format!("'{}' requires at least one value", clause.operator),
                    ErrorKind::InvalidQuery,
                ));
            }
            Value::Array(values) if values.len() > MAX_DISJUNCTION_VALUES => {
                return Err(DbError::new(
                    &format!(
                        "'{}' supports at most {} values, got {}",
                        clause.operator,
                        MAX_DISJUNCTION_VALUES,
                        values.len()
                    ),
                    ErrorKind::InvalidQuery,
                ));
            }
            Value::Array(_) => {}
            other => {
                return Err(DbError::new(
                    &format!(
                        "'{}' requires an array value, found {}",
                        clause.operator,
                        value_type_name(other)
                    ),
                    ErrorKind::InvalidQuery,
                ));
            }
        }
    }
    Ok(())
}
