use serde_json::Value;
use std::cmp::Ordering;

/// Compare two floats with NaN ordered above every other number.
#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Rank of a value's type in the cross-type ordering:
/// null < bool < number < string < array < object.
#[inline]
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a.cmp(&b);
    }
    num_cmp_float(
        a.as_f64().unwrap_or(f64::NAN),
        b.as_f64().unwrap_or(f64::NAN),
    )
}

/// Total ordering over document values.
///
/// Values of different types order by type rank. Numbers compare by value
/// regardless of their integer/float representation. Arrays compare
/// element-wise, objects compare entry-wise in key order.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let ord = compare_values(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
        (Value::Object(a), Value::Object(b)) => {
            let mut left: Vec<_> = a.iter().collect();
            let mut right: Vec<_> = b.iter().collect();
            left.sort_by(|x, y| x.0.cmp(y.0));
            right.sort_by(|x, y| x.0.cmp(y.0));
            for ((ka, va), (kb, vb)) in left.iter().zip(right.iter()) {
                let ord = ka.cmp(kb).then_with(|| compare_values(va, vb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            left.len().cmp(&right.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Whether two values share a type for the purpose of range comparisons.
///
/// Range filters never match across types: `"10" > 5` is neither true nor false,
/// it simply excludes the document.
#[inline]
pub fn same_type(a: &Value, b: &Value) -> bool {
    type_rank(a) == type_rank(b)
}

/// Equality consistent with [compare_values], so `1` equals `1.0`.
#[inline]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_compare_across_representations() {
        assert_eq!(compare_values(&json!(1), &json!(1.0)), Ordering::Equal);
        assert_eq!(compare_values(&json!(2), &json!(1.5)), Ordering::Greater);
        assert_eq!(compare_values(&json!(-3), &json!(u64::MAX)), Ordering::Less);
        assert!(values_equal(&json!(10), &json!(10.0)));
    }

    #[test]
    fn test_type_rank_orders_mixed_values() {
        let mut values = vec![
            json!({"a": 1}),
            json!("text"),
            json!(null),
            json!([1]),
            json!(3),
            json!(true),
        ];
        values.sort_by(compare_values);
        assert_eq!(
            values,
            vec![json!(null), json!(true), json!(3), json!("text"), json!([1]), json!({"a": 1})]
        );
    }

    #[test]
    fn test_same_type() {
        assert!(same_type(&json!(1), &json!(2.5)));
        assert!(same_type(&json!("a"), &json!("b")));
        assert!(!same_type(&json!("10"), &json!(5)));
        assert!(!same_type(&json!(null), &json!(false)));
    }

    #[test]
    fn test_arrays_compare_elementwise_then_by_length() {
        assert_eq!(compare_values(&json!([1, 2]), &json!([1, 3])), Ordering::Less);
        assert_eq!(compare_values(&json!([1, 2]), &json!([1, 2, 0])), Ordering::Less);
        assert!(values_equal(&json!([1, "a"]), &json!([1.0, "a"])));
    }

    #[test]
    fn test_objects_compare_by_sorted_entries() {
        assert!(values_equal(&json!({"b": 1, "a": 2}), &json!({"a": 2, "b": 1})));
        assert_eq!(compare_values(&json!({"a": 1}), &json!({"a": 2})), Ordering::Less);
    }

    #[test]
    fn test_strings_and_bools() {
        assert_eq!(compare_values(&json!("apple"), &json!("banana")), Ordering::Less);
        assert_eq!(compare_values(&json!(false), &json!(true)), Ordering::Less);
        assert!(!values_equal(&json!("1"), &json!(1)));
    }
}
