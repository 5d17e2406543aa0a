//! Surrogate key derivation.
//!
//! Each response gets a set of opaque tags an edge cache can purge by:
//!
//! - `p-<id>` for every content item on the page
//! - `tm-<type>` for the page's template classification
//! - `t-<id>` for taxonomy terms of a single item, or the term an archive
//!   was queried for
//! - `a-<id>` for the author of a single item

mod collection;
mod filter;
mod query;
mod snapshot;
mod template;

pub use collection::{SurrogateKey, SurrogateKeyCollection, SurrogateKeyCollector};
pub use filter::TaxonomyFilter;
pub use query::{
    ContentItem, QueriedObject, QueryResult, TaxonomySource, Term, non_negative_id,
};
pub use snapshot::QuerySnapshot;
pub use template::{TemplateType, UnknownTemplateType, classify};
