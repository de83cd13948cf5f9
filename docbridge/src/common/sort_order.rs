use crate::errors::{DbError, DbResult, ErrorKind};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Specifies the direction for ordering query results.
///
/// Serialized as `"asc"` / `"desc"`, the tokens query descriptions use on the
/// wire.
///
/// ```text
/// let options = order_by("created", SortOrder::Descending);
/// let posts: Vec<Post> = client.query_collection(&posts, &options).await?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum SortOrder {
    /// Sort from smallest to largest value
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    /// Sort from largest to smallest value
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        match s {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            other => Err(DbError::new(
                &format!("Unknown sort order '{}', expected 'asc' or 'desc'", other),
                ErrorKind::InvalidQuery,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_order() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Ascending);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Descending);

        let err = "down".parse::<SortOrder>().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
    }

    #[test]
    fn test_sort_order_serde_tokens() {
        let json = serde_json::to_string(&SortOrder::Descending).unwrap();
        assert_eq!(json, "\"desc\"");
        let parsed: SortOrder = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(parsed, SortOrder::Ascending);
    }
}
