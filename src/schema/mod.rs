//! Schema discovery and the schema graph.
//!
//! ```text
//! SchemaIntrospector ──text──► parse_schema_payload ──facts──► SchemaGraph::from_facts
//!                                                                   │
//!                                              SchemaCache (set once, process-wide)
//! ```

pub mod cache;
pub mod discovery;
pub mod facts;
pub mod graph;
pub mod introspect;

pub use cache::SchemaCache;
pub use discovery::{SchemaDiscovery, SchemaIntrospector};
pub use facts::{parse_schema_payload, ColumnFact, ForeignKeyRef, TableFact};
pub use graph::{ColumnNode, GraphExport, NodeId, SchemaEdge, SchemaGraph, SchemaNode, TableNode};
pub use introspect::{CatalogIntrospector, LlmIntrospector};
