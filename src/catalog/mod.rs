//! Stream catalog
//!
//! The fixed set of Solarvista streams, each backed by an embedded JSON
//! schema, plus loading of catalogs produced by an earlier discovery.
//!
//! # Overview
//!
//! - `discover` - build the catalog, selecting the requested datasources
//! - `Catalog` / `Stream` - catalog entries in the standard metadata form
//! - `StreamKind` - how a stream is fetched, resolved once per stream

mod discover;
mod types;

pub use discover::{discover, extract_datasource, BUILTIN_SCHEMAS};
pub use types::{Catalog, MetadataEntry, Stream, StreamKind, LAST_MODIFIED};
