use crate::common::SortOrder;
use crate::errors::{DbError, DbResult, ErrorKind};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Comparison operator of a `where` condition.
///
/// Parses from and displays as the operator tokens used in query
/// descriptions (`"<"`, `"=="`, `"array-contains"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "array-contains")]
    ArrayContains,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not-in")]
    NotIn,
    #[serde(rename = "array-contains-any")]
    ArrayContainsAny,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEqual => "<=",
            FilterOperator::Equal => "==",
            FilterOperator::NotEqual => "!=",
            FilterOperator::GreaterThanOrEqual => ">=",
            FilterOperator::GreaterThan => ">",
            FilterOperator::ArrayContains => "array-contains",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not-in",
            FilterOperator::ArrayContainsAny => "array-contains-any",
        }
    }

    /// Operators whose value is a list of alternatives.
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            FilterOperator::In | FilterOperator::NotIn | FilterOperator::ArrayContainsAny
        )
    }
}

impl Display for FilterOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        let op = match s {
            "<" => FilterOperator::LessThan,
            "<=" => FilterOperator::LessThanOrEqual,
            "==" => FilterOperator::Equal,
            "!=" => FilterOperator::NotEqual,
            ">=" => FilterOperator::GreaterThanOrEqual,
            ">" => FilterOperator::GreaterThan,
            "array-contains" => FilterOperator::ArrayContains,
            "in" => FilterOperator::In,
            "not-in" => FilterOperator::NotIn,
            "array-contains-any" => FilterOperator::ArrayContainsAny,
            other => {
                return Err(DbError::new(
                    &format!("Unknown filter operator '{}'", other),
                    ErrorKind::InvalidQuery,
                ))
            }
        };
        Ok(op)
    }
}

/// A single filter condition: `field <operator> value`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WhereClause {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl WhereClause {
    pub fn new(field: &str, operator: FilterOperator, value: impl Into<Value>) -> Self {
        WhereClause {
            field: field.to_string(),
            operator,
            value: value.into(),
        }
    }
}

impl Display for WhereClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// Backend-agnostic query description.
///
/// Holds at most one `where` condition, or an ordering, plus an optional
/// limit. When a condition is present the ordering is ignored; see
/// [crate::query::normalize].
///
/// Serializes with the field names `where`, `orderBy`, `order` and `limit`.
///
/// ```rust,ignore
/// use docbridge::query::{field, order_by, QueryOptions};
/// use docbridge::common::SortOrder;
///
/// let recent = order_by("_modified", SortOrder::Descending).limit(20);
/// let admins = QueryOptions::filtered(field("roles").array_contains("admin"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<WhereClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Creates options ordered by `field_name`.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> QueryOptions {
    QueryOptions::new().sort_by(field_name, sort_order)
}

/// Creates options that only bound the number of results.
pub fn limit_to(limit: u64) -> QueryOptions {
    QueryOptions::new().limit(limit)
}

impl QueryOptions {
    pub fn new() -> QueryOptions {
        QueryOptions::default()
    }

    /// Creates options holding a single filter condition.
    pub fn filtered(clause: WhereClause) -> QueryOptions {
        QueryOptions::new().filter(clause)
    }

    pub fn filter(mut self, clause: WhereClause) -> QueryOptions {
        self.where_clause = Some(clause);
        self
    }

    pub fn where_field(self, field: &str, operator: FilterOperator, value: impl Into<Value>) -> QueryOptions {
        self.filter(WhereClause::new(field, operator, value))
    }

    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> QueryOptions {
        self.order_by = Some(field_name.to_string());
        self.order = Some(sort_order);
        self
    }

    pub fn limit(mut self, limit: u64) -> QueryOptions {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_tokens_round_trip() {
        let all = [
            "<", "<=", "==", "!=", ">=", ">", "array-contains", "in", "not-in", "array-contains-any",
        ];
        for token in all {
            let op: FilterOperator = token.parse().unwrap();
            assert_eq!(op.to_string(), token);
        }
        assert_eq!(
            "like".parse::<FilterOperator>().unwrap_err().kind(),
            &ErrorKind::InvalidQuery
        );
    }

    #[test]
    fn test_list_operators() {
        assert!(FilterOperator::In.takes_list());
        assert!(FilterOperator::NotIn.takes_list());
        assert!(FilterOperator::ArrayContainsAny.takes_list());
        assert!(!FilterOperator::ArrayContains.takes_list());
        assert!(!FilterOperator::Equal.takes_list());
    }

    #[test]
    fn test_builders() {
        let options = order_by("created", SortOrder::Descending).limit(5);
        assert_eq!(options.order_by.as_deref(), Some("created"));
        assert_eq!(options.order, Some(SortOrder::Descending));
        assert_eq!(options.limit, Some(5));
        assert!(options.where_clause.is_none());

        let options = limit_to(3).where_field("age", FilterOperator::GreaterThan, 21);
        assert_eq!(options.limit, Some(3));
        assert_eq!(
            options.where_clause,
            Some(WhereClause::new("age", FilterOperator::GreaterThan, 21))
        );
    }

    #[test]
    fn test_deserialize_query_description() {
        let options: QueryOptions = serde_json::from_value(json!({
            "where": { "field": "country", "operator": "==", "value": "NL" },
            "orderBy": "username",
            "order": "desc",
            "limit": 10
        }))
        .unwrap();

        assert_eq!(
            options.where_clause,
            Some(WhereClause::new("country", FilterOperator::Equal, "NL"))
        );
        assert_eq!(options.order_by.as_deref(), Some("username"));
        assert_eq!(options.order, Some(SortOrder::Descending));
        assert_eq!(options.limit, Some(10));
    }

    #[test]
    fn test_serialize_skips_absent_parts() {
        let json = serde_json::to_value(limit_to(7)).unwrap();
        assert_eq!(json, json!({ "limit": 7 }));
    }

    #[test]
    fn test_where_clause_display() {
        let clause = WhereClause::new("age", FilterOperator::LessThanOrEqual, 30);
        assert_eq!(clause.to_string(), "age <= 30");
    }
}
