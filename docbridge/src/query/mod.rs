//! Query descriptions and their translation into store constraints.
//!
//! A [QueryOptions] value describes *what* to fetch in backend-neutral terms:
//! one `where` condition, or an ordering, plus a limit. [normalize] turns it
//! into the ordered [QueryConstraint] list that a store provider applies to a
//! collection scan.
//!
//! ```rust,ignore
//! use docbridge::query::{field, normalize, QueryOptions};
//!
//! let options = QueryOptions::filtered(field("country").eq("NL")).limit(50);
//! let constraints = normalize(&options)?; // [where(country == "NL"), limit(50)]
//! ```

mod fluent;
mod normalizer;
mod options;

pub use fluent::*;
pub use normalizer::*;
pub use options::*;
