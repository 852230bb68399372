//! Deity ↔ verse graph for the front-end visualization.
//!
//! Nodes are deities (keyed by lowercased name) and verse references; each
//! link says "this verse mentions this deity". Deity-to-deity relations are
//! not derived. Elements are wrapped in a `{"data": ...}` envelope, the shape
//! Cytoscape consumes.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use super::record::VerseRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Deity,
    Hymn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
}

/// Cytoscape element envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element<T> {
    pub data: T,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeityGraph {
    pub nodes: Vec<Element<GraphNode>>,
    pub links: Vec<Element<GraphLink>>,
}

/// Deity occurrences grouped by lowercased name, in first-seen order.
struct DeityMentions {
    key: String,
    label: String,
    references: Vec<String>,
}

/// Build the graph from records in load order.
///
/// Every deity occurrence produces a link, so a verse that lists the same
/// deity twice yields two identical links. Hymn nodes are created once per
/// reference string.
#[must_use]
pub fn build(records: &[VerseRecord]) -> DeityGraph {
    let mut mentions: Vec<DeityMentions> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();

    for record in records {
        let reference = record.reference();
        for deity in &record.deities {
            let key = deity.to_lowercase();
            let idx = *slot.entry(key.clone()).or_insert_with(|| {
                mentions.push(DeityMentions {
                    key,
                    label: deity.clone(),
                    references: Vec::new(),
                });
                mentions.len() - 1
            });
            mentions[idx].references.push(reference.clone());
        }
    }

    let mut graph: DiGraph<GraphNode, ()> = DiGraph::new();
    let mut ids: HashMap<String, NodeIndex> = HashMap::new();

    for m in mentions {
        let deity_ix = graph.add_node(GraphNode {
            id: m.key.clone(),
            label: m.label,
            kind: NodeKind::Deity,
        });
        ids.insert(m.key, deity_ix);

        for reference in m.references {
            let hymn_ix = *ids.entry(reference.clone()).or_insert_with(|| {
                graph.add_node(GraphNode {
                    id: reference.clone(),
                    label: reference,
                    kind: NodeKind::Hymn,
                })
            });
            graph.add_edge(deity_ix, hymn_ix, ());
        }
    }

    let nodes = graph
        .node_indices()
        .map(|ix| Element {
            data: graph[ix].clone(),
        })
        .collect();
    let links = graph
        .edge_references()
        .map(|e| Element {
            data: GraphLink {
                source: graph[e.source()].id.clone(),
                target: graph[e.target()].id.clone(),
            },
        })
        .collect();

    DeityGraph { nodes, links }
}
