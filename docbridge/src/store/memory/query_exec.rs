use crate::common::{compare_values, same_type, values_equal, SortOrder};
use crate::document::Document;
use crate::query::{FilterOperator, QueryConstraint, WhereClause};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Runs a normalized constraint list over one collection.
///
/// Documents are visited in id order, so a query without an ordering returns
/// them sorted by id. An ordering excludes documents lacking the field and
/// breaks ties by id. The limit always applies last.
pub(crate) fn execute(collection: &BTreeMap<String, Document>, constraints: &[QueryConstraint]) -> Vec<Document> {
    let mut selected: Vec<(&String, &Document)> = collection.iter().collect();
    let mut limit = None;

    for constraint in constraints {
        match constraint {
            QueryConstraint::Where(clause) => {
                selected.retain(|(_, doc)| matches(doc, clause));
            }
            QueryConstraint::OrderBy { field, order } => {
                selected.retain(|(_, doc)| doc.get_path(field).is_some());
                selected.sort_by(|(id_a, a), (id_b, b)| {
                    let ord = match (a.get_path(field), b.get_path(field)) {
                        (Some(x), Some(y)) => compare_values(x, y),
                        _ => Ordering::Equal,
                    };
                    let ord = match order {
                        SortOrder::Ascending => ord,
                        SortOrder::Descending => ord.reverse(),
                    };
                    ord.then_with(|| id_a.cmp(id_b))
                });
            }
            QueryConstraint::Limit(n) => limit = Some(*n),
        }
    }

    let take = limit
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
        .unwrap_or(usize::MAX);
    selected
        .into_iter()
        .take(take)
        .map(|(_, doc)| doc.clone())
        .collect()
}

/// Whether a document satisfies a single condition. A missing field never matches.
pub(crate) fn matches(document: &Document, clause: &WhereClause) -> bool {
    let actual = match document.get_path(&clause.field) {
        Some(value) => value,
        None => return false,
    };
    let expected = &clause.value;

    match clause.operator {
        FilterOperator::Equal => values_equal(actual, expected),
        FilterOperator::NotEqual => !values_equal(actual, expected),
        FilterOperator::LessThan => range(actual, expected, |o| o == Ordering::Less),
        FilterOperator::LessThanOrEqual => range(actual, expected, |o| o != Ordering::Greater),
        FilterOperator::GreaterThan => range(actual, expected, |o| o == Ordering::Greater),
        FilterOperator::GreaterThanOrEqual => range(actual, expected, |o| o != Ordering::Less),
        FilterOperator::ArrayContains => match actual {
            Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
            _ => false,
        },
        FilterOperator::In => candidates(expected).any(|candidate| values_equal(actual, candidate)),
        FilterOperator::NotIn => {
            !actual.is_null() && !candidates(expected).any(|candidate| values_equal(actual, candidate))
        }
        FilterOperator::ArrayContainsAny => match actual {
            Value::Array(items) => items
                .iter()
                .any(|item| candidates(expected).any(|candidate| values_equal(item, candidate))),
            _ => false,
        },
    }
}

#[inline]
fn range(actual: &Value, expected: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    same_type(actual, expected) && accept(compare_values(actual, expected))
}

fn candidates(expected: &Value) -> impl Iterator<Item = &Value> {
    expected.as_array().into_iter().flatten()
}
