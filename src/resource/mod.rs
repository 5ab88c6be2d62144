//! Resource abstraction layer
//!
//! Generic machinery shared by every Redmine resource type. Endpoint layout
//! and field schemas are data (embedded JSON), so adding a resource type does
//! not touch the listing or payload code.
//!
//! # Architecture
//!
//! - [`registry`] - Loads resource definitions and field schemas from embedded JSON
//! - [`fetcher`] - Paginated "fetch all" with a per-instance listing cache
//! - [`cache`] - The snapshot the fetcher serves listings from
//! - [`collection`] - Fetched records and the name/id index
//! - [`payload`] - Ordered field maps and the document builder
//! - [`document`] - Immutable XML element tree and serializer

pub mod cache;
pub mod collection;
pub mod document;
pub mod fetcher;
pub mod payload;
mod registry;

pub use cache::{CollectionCache, Snapshot};
pub use collection::{IndexBy, Listing, NameIndex, ResourceCollection, ResourceId, ResourceRecord};
pub use document::{Content, Document, Element};
pub use fetcher::{CollectionFetcher, QueryParams, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use payload::{FieldValue, Params, PayloadBuilder};
pub use registry::*;
