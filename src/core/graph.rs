use petgraph::algo::tarjan_scc;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::{Directed, Graph};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::tree::{DependencyTree, Direction, NodeId, NodeRecord};
use super::{DependencyKind, EntityIdentity, Locality};

/// One distinct entity in a collapsed tree.
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub identity: EntityIdentity,
    pub line_start: usize,
    pub line_end: usize,
    pub is_target: bool,
    /// Shallowest depth at which the entity occurs in the tree.
    pub min_depth: usize,
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identity.name, self.identity.kind)
    }
}

/// Edge from dependent to dependency.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GraphEdge {
    pub kind: DependencyKind,
    pub locality: Locality,
}

impl fmt::Display for GraphEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

pub type EntityGraph = Graph<GraphNode, GraphEdge, Directed>;

/// Collects nodes and edges keyed by entity identity, so repeated tree
/// occurrences collapse into one graph node and parallel edges merge.
pub struct GraphBuilder {
    graph: EntityGraph,
    node_map: HashMap<EntityIdentity, NodeIndex>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            node_map: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&node.identity) {
            let existing = &mut self.graph[index];
            existing.min_depth = existing.min_depth.min(node.min_depth);
            existing.is_target |= node.is_target;
            return index;
        }
        let identity = node.identity.clone();
        let index = self.graph.add_node(node);
        self.node_map.insert(identity, index);
        index
    }

    /// Add `source -> target`; an existing edge keeps the more specific kind.
    pub fn add_edge(
        &mut self,
        source: &EntityIdentity,
        target: &EntityIdentity,
        edge: GraphEdge,
    ) -> Option<EdgeIndex> {
        let source_idx = *self.node_map.get(source)?;
        let target_idx = *self.node_map.get(target)?;
        if let Some(existing) = self.graph.find_edge(source_idx, target_idx) {
            let weight = &mut self.graph[existing];
            weight.kind = weight.kind.most_specific(edge.kind);
            return Some(existing);
        }
        Some(self.graph.add_edge(source_idx, target_idx, edge))
    }

    pub fn build(self) -> EntityGraph {
        self.graph
    }

    pub fn get_node_index(&self, identity: &EntityIdentity) -> Option<NodeIndex> {
        self.node_map.get(identity).copied()
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Groups of entities that depend on each other, each sorted by identity.
/// A single entity counts only when it depends on itself.
pub fn cycles(graph: &EntityGraph) -> Vec<Vec<EntityIdentity>> {
    let mut found: Vec<Vec<EntityIdentity>> = tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || graph.find_edge(component[0], component[0]).is_some()
        })
        .map(|component| {
            let mut members: Vec<EntityIdentity> = component
                .into_iter()
                .map(|index| graph[index].identity.clone())
                .collect();
            members.sort();
            members
        })
        .collect();
    found.sort();
    found
}

/// One tree position; serializes with exactly the [`NodeRecord`] fields.
#[derive(Debug, Clone, Serialize)]
pub struct ExportNode {
    #[serde(flatten)]
    pub record: NodeRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub dependency_type: DependencyKind,
    pub direction: Direction,
}

/// Uncollapsed node/edge view of a tree: one node per tree position and
/// one edge per parent link, pointing from dependent to dependency.
#[derive(Debug, Clone, Serialize)]
pub struct GraphExport {
    pub target: NodeId,
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
}

impl DependencyTree {
    /// Collapse the tree into a graph with one node per distinct entity.
    pub fn to_graph(&self) -> EntityGraph {
        let mut builder = GraphBuilder::new();
        for node in self.nodes() {
            builder.add_node(GraphNode {
                identity: node.identity(),
                line_start: node.entity.line_start,
                line_end: node.entity.line_end,
                is_target: node.is_root(),
                min_depth: node.depth,
            });
        }

        for node in self.nodes() {
            let (Some(parent_id), Some(kind), Some(locality), Some(direction)) = (
                node.parent_node_id,
                node.dependency_type,
                node.locality,
                node.direction,
            ) else {
                continue;
            };
            let Some(parent) = self.get(parent_id) else {
                continue;
            };

            let (parent_identity, identity) = (parent.identity(), node.identity());
            let (source, target) = match direction {
                Direction::Upstream => (&parent_identity, &identity),
                Direction::Downstream => (&identity, &parent_identity),
            };
            builder.add_edge(source, target, GraphEdge { kind, locality });
        }

        builder.build()
    }

    pub fn graph_export(&self) -> GraphExport {
        let nodes = self
            .nodes()
            .map(|node| ExportNode {
                record: node.record(),
            })
            .collect();

        let edges = self
            .nodes()
            .filter_map(|node| {
                let parent = node.parent_node_id?;
                let kind = node.dependency_type?;
                let direction = node.direction?;
                let (source, target) = match direction {
                    Direction::Upstream => (parent, node.node_id),
                    Direction::Downstream => (node.node_id, parent),
                };
                Some(ExportEdge {
                    source,
                    target,
                    dependency_type: kind,
                    direction,
                })
            })
            .collect();

        GraphExport {
            target: self.root_id(),
            nodes,
            edges,
        }
    }
}
