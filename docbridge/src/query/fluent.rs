use serde_json::Value;

use super::{FilterOperator, WhereClause};

/// Creates a fluent condition builder for the specified field name.
///
/// ```rust,ignore
/// let adults = QueryOptions::filtered(field("age").gte(18));
/// let nordic = QueryOptions::filtered(field("country").in_list(vec!["NO", "SE", "DK"]));
/// ```
pub fn field(field_name: &str) -> FluentField {
    FluentField {
        field_name: field_name.to_string(),
    }
}

/// A builder for a [WhereClause] on one field.
pub struct FluentField {
    field_name: String,
}

impl FluentField {
    #[inline]
    fn clause(self, operator: FilterOperator, value: Value) -> WhereClause {
        WhereClause {
            field: self.field_name,
            operator,
            value,
        }
    }

    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> WhereClause {
        self.clause(FilterOperator::Equal, value.into())
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> WhereClause {
        self.clause(FilterOperator::NotEqual, value.into())
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> WhereClause {
        self.clause(FilterOperator::GreaterThan, value.into())
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> WhereClause {
        self.clause(FilterOperator::GreaterThanOrEqual, value.into())
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> WhereClause {
        self.clause(FilterOperator::LessThan, value.into())
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> WhereClause {
        self.clause(FilterOperator::LessThanOrEqual, value.into())
    }

    /// Matches documents whose array field contains `value`.
    #[inline]
    pub fn array_contains<T: Into<Value>>(self, value: T) -> WhereClause {
        self.clause(FilterOperator::ArrayContains, value.into())
    }

    /// Matches documents whose array field contains any of `values`.
    pub fn array_contains_any<T: Into<Value>>(self, values: Vec<T>) -> WhereClause {
        self.clause(FilterOperator::ArrayContainsAny, list(values))
    }

    /// Matches documents whose field equals one of `values`.
    pub fn in_list<T: Into<Value>>(self, values: Vec<T>) -> WhereClause {
        self.clause(FilterOperator::In, list(values))
    }

    /// Matches documents whose field equals none of `values`.
    pub fn not_in<T: Into<Value>>(self, values: Vec<T>) -> WhereClause {
        self.clause(FilterOperator::NotIn, list(values))
    }
}

fn list<T: Into<Value>>(values: Vec<T>) -> Value {
    Value::Array(values.into_iter().map(Into::into).collect())
}
