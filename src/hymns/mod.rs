//! Rigveda verse corpus: records, queries, and the deity graph.

pub mod graph;
pub mod record;
pub mod store;

pub use graph::{DeityGraph, GraphLink, GraphNode, NodeKind};
pub use record::{LocatorPart, VerseRecord};
pub use store::{DeitySummary, StoreError, VerseStore, VerseSummary};
