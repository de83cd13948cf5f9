//! Resolution of logical `(endpoint, id)` pairs to store locations.
//!
//! References are plain values: resolving the same inputs twice yields equal
//! references, and nothing is cached or registered with the store.

use crate::errors::{DbError, DbResult, ErrorKind};
use crate::query::{normalize, QueryConstraint, QueryOptions};
use std::fmt::{Display, Formatter};

/// A logical collection name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint(String);

impl Endpoint {
    /// Validates and wraps a collection name.
    ///
    /// The name must be non-empty and must not contain `/`, which separates
    /// the endpoint from the document id in a path.
    pub fn new(name: &str) -> DbResult<Self> {
        if name.trim().is_empty() {
            return Err(DbError::new(
                "Endpoint name must not be empty",
                ErrorKind::InvalidEndpoint,
            ));
        }
        if name.contains('/') {
            return Err(DbError::new(
                &format!("Endpoint name '{}' must not contain '/'", name),
                ErrorKind::InvalidEndpoint,
            ));
        }
        Ok(Endpoint(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for Endpoint {
    type Error = DbError;

    fn try_from(name: &str) -> DbResult<Self> {
        Endpoint::new(name)
    }
}

impl TryFrom<String> for Endpoint {
    type Error = DbError;

    fn try_from(name: String) -> DbResult<Self> {
        Endpoint::new(&name)
    }
}

/// Location of a whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    endpoint: Endpoint,
}

impl CollectionRef {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn path(&self) -> String {
        self.endpoint.to_string()
    }

    /// Narrows this collection to a single document.
    pub fn doc(&self, id: &str) -> DbResult<DocumentRef> {
        doc_ref(&self.endpoint, id)
    }
}

impl Display for CollectionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Location of one document within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    endpoint: Endpoint,
    id: String,
}

impl DocumentRef {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> CollectionRef {
        collection_ref(&self.endpoint)
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.endpoint, self.id)
    }
}

impl Display for DocumentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// A collection location together with the constraints to scan it with.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRef {
    collection: CollectionRef,
    constraints: Vec<QueryConstraint>,
}

impl QueryRef {
    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.collection.endpoint()
    }

    pub fn constraints(&self) -> &[QueryConstraint] {
        &self.constraints
    }
}

impl Display for QueryRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.collection)?;
        for constraint in &self.constraints {
            write!(f, " {}", constraint)?;
        }
        Ok(())
    }
}

/// Resolves a collection-level reference.
pub fn collection_ref(endpoint: &Endpoint) -> CollectionRef {
    CollectionRef {
        endpoint: endpoint.clone(),
    }
}

/// Resolves a document-level reference. Fails with [ErrorKind::InvalidId] for
/// an empty id or one containing `/`.
pub fn doc_ref(endpoint: &Endpoint, id: &str) -> DbResult<DocumentRef> {
    if id.is_empty() {
        return Err(DbError::new(
            &format!("Document id for endpoint '{}' must not be empty", endpoint),
            ErrorKind::InvalidId,
        ));
    }
    if id.contains('/') {
        return Err(DbError::new(
            &format!("Document id '{}' must not contain '/'", id),
            ErrorKind::InvalidId,
        ));
    }
    Ok(DocumentRef {
        endpoint: endpoint.clone(),
        id: id.to_string(),
    })
}

/// Resolves a collection reference and normalizes `options` against it.
pub fn query_ref(endpoint: &Endpoint, options: &QueryOptions) -> DbResult<QueryRef> {
    Ok(QueryRef {
        collection: collection_ref(endpoint),
        constraints: normalize(options)?,
    })
}
