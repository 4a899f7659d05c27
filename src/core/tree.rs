//! Arena-backed dependency tree.
//!
//! Nodes live in a registry keyed by [`NodeId`] and point at their parent;
//! `children_index` is derived from those parent pointers and can be rebuilt
//! at any time. The same entity may occur at many positions (diamonds,
//! revisits), each with its own id.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{DependencyKind, Entity, EntityIdentity, EntityKind, Locality};
use crate::error::{LineageError, ParseWarning, Result};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique id of one tree position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// What the target depends on.
    Upstream,
    /// What depends on the target.
    Downstream,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Upstream, Direction::Downstream];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Upstream => "upstream",
            Direction::Downstream => "downstream",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occurrence of an entity at a specific tree position.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    pub node_id: NodeId,
    pub entity: Arc<Entity>,
    /// Kind of the edge from the parent; `None` marks the target itself.
    pub dependency_type: Option<DependencyKind>,
    pub locality: Option<Locality>,
    pub depth: usize,
    pub parent_node_id: Option<NodeId>,
    /// `None` only for the root, which heads both branches.
    pub direction: Option<Direction>,
    /// The entity already occurs on this node's path; never expanded.
    pub revisit: bool,
}

impl DependencyNode {
    pub fn name(&self) -> &str {
        &self.entity.name
    }

    pub fn kind(&self) -> EntityKind {
        self.entity.kind
    }

    pub fn file_path(&self) -> &Path {
        &self.entity.file_path
    }

    pub fn identity(&self) -> EntityIdentity {
        self.entity.identity()
    }

    pub fn is_root(&self) -> bool {
        self.parent_node_id.is_none()
    }

    pub fn dependency_label(&self) -> &'static str {
        self.dependency_type.map_or("target", DependencyKind::as_str)
    }

    pub fn record(&self) -> NodeRecord {
        NodeRecord {
            name: self.entity.name.clone(),
            entity_type: self.entity.kind,
            file_path: self.entity.file_path.display().to_string(),
            line_start: self.entity.line_start,
            line_end: self.entity.line_end,
            dependency_type: self.dependency_label().to_string(),
            depth: self.depth,
            parent_node_id: self.parent_node_id,
            node_id: self.node_id,
            direction: self.direction,
            revisit: self.revisit,
        }
    }
}

/// Flat, serializable shape of a node for tabular and file export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub entity_type: EntityKind,
    pub file_path: String,
    pub line_start: usize,
    pub line_end: usize,
    pub dependency_type: String,
    pub depth: usize,
    pub parent_node_id: Option<NodeId>,
    pub node_id: NodeId,
    pub direction: Option<Direction>,
    pub revisit: bool,
}

impl NodeRecord {
    pub const FIELDS: [&'static str; 11] = [
        "name",
        "entity_type",
        "file_path",
        "line_start",
        "line_end",
        "dependency_type",
        "depth",
        "parent_node_id",
        "node_id",
        "direction",
        "revisit",
    ];
}

#[derive(Debug, Clone)]
pub struct DependencyTree {
    root_id: NodeId,
    codebase_root: PathBuf,
    max_depth: Option<usize>,
    directions: Vec<Direction>,
    nodes: HashMap<NodeId, DependencyNode>,
    order: Vec<NodeId>,
    children_index: HashMap<NodeId, Vec<NodeId>>,
    skipped_files: Vec<ParseWarning>,
}

impl DependencyTree {
    pub fn new(target: Arc<Entity>, codebase_root: impl Into<PathBuf>) -> Self {
        let root_id = NodeId::next();
        let root = DependencyNode {
            node_id: root_id,
            entity: target,
            dependency_type: None,
            locality: None,
            depth: 0,
            parent_node_id: None,
            direction: None,
            revisit: false,
        };

        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);

        Self {
            root_id,
            codebase_root: codebase_root.into(),
            max_depth: None,
            directions: Vec::new(),
            nodes,
            order: vec![root_id],
            children_index: HashMap::new(),
            skipped_files: Vec::new(),
        }
    }

    /// Attach a child one level below `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        entity: Arc<Entity>,
        kind: DependencyKind,
        locality: Locality,
        direction: Direction,
        revisit: bool,
    ) -> Result<NodeId> {
        let depth = self.node(parent)?.depth + 1;
        let node_id = NodeId::next();
        self.nodes.insert(
            node_id,
            DependencyNode {
                node_id,
                entity,
                dependency_type: Some(kind),
                locality: Some(locality),
                depth,
                parent_node_id: Some(parent),
                direction: Some(direction),
                revisit,
            },
        );
        self.order.push(node_id);
        self.children_index.entry(parent).or_default().push(node_id);
        Ok(node_id)
    }

    pub(crate) fn record_build(&mut self, max_depth: Option<usize>, direction: Direction) {
        self.max_depth = max_depth;
        if !self.directions.contains(&direction) {
            self.directions.push(direction);
        }
    }

    pub(crate) fn set_skipped_files(&mut self, skipped: Vec<ParseWarning>) {
        self.skipped_files = skipped;
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn root(&self) -> &DependencyNode {
        &self.nodes[&self.root_id]
    }

    pub fn root_entity_identity(&self) -> EntityIdentity {
        self.root().identity()
    }

    pub fn codebase_root(&self) -> &Path {
        &self.codebase_root
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Directions that were expanded, in build order.
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Files that failed to parse while the tree was built.
    pub fn skipped_files(&self) -> &[ParseWarning] {
        &self.skipped_files
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, node_id: NodeId) -> Option<&DependencyNode> {
        self.nodes.get(&node_id)
    }

    pub fn node(&self, node_id: NodeId) -> Result<&DependencyNode> {
        self.nodes
            .get(&node_id)
            .ok_or(LineageError::NodeNotFound(node_id))
    }

    /// All nodes in insertion order (root first, then breadth-first per direction).
    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> + '_ {
        self.order.iter().map(move |id| &self.nodes[id])
    }

    pub fn children_of(&self, node_id: NodeId) -> Result<&[NodeId]> {
        self.node(node_id)?;
        Ok(self
            .children_index
            .get(&node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// Children of `node_id` on one side; only the root mixes both sides.
    pub fn children_in(&self, node_id: NodeId, direction: Direction) -> Result<Vec<&DependencyNode>> {
        Ok(self
            .children_of(node_id)?
            .iter()
            .map(|id| &self.nodes[id])
            .filter(|child| child.direction == Some(direction))
            .collect())
    }

    /// Whether `identity` occurs on the path from the root to `node_id`, inclusive.
    pub fn path_contains(&self, node_id: NodeId, identity: &EntityIdentity) -> bool {
        let mut current = self.nodes.get(&node_id);
        while let Some(node) = current {
            if node.entity.is(identity) {
                return true;
            }
            current = node.parent_node_id.and_then(|parent| self.nodes.get(&parent));
        }
        false
    }

    /// Nodes from the root down to `node_id`.
    pub fn dependency_chain(&self, node_id: NodeId) -> Result<Vec<&DependencyNode>> {
        let mut chain = vec![self.node(node_id)?];
        while let Some(parent) = chain[chain.len() - 1].parent_node_id {
            chain.push(self.node(parent)?);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Entity names from the root down to `node_id`.
    pub fn dependency_path(&self, node_id: NodeId) -> Result<Vec<String>> {
        Ok(self
            .dependency_chain(node_id)?
            .into_iter()
            .map(|node| node.entity.name.clone())
            .collect())
    }

    pub fn path_string(&self, node_id: NodeId) -> Result<String> {
        Ok(self.dependency_path(node_id)?.join(" -> "))
    }

    /// Every non-root node on one side, shallowest first.
    pub fn all_dependencies(&self, direction: Direction) -> Vec<&DependencyNode> {
        let mut nodes: Vec<&DependencyNode> = self
            .nodes()
            .filter(|node| node.direction == Some(direction))
            .collect();
        nodes.sort_by_key(|node| node.depth);
        nodes
    }

    /// All nodes partitioned by depth, insertion order kept within a depth.
    pub fn depths_grouped(&self) -> BTreeMap<usize, Vec<&DependencyNode>> {
        let mut groups: BTreeMap<usize, Vec<&DependencyNode>> = BTreeMap::new();
        for node in self.nodes() {
            groups.entry(node.depth).or_default().push(node);
        }
        groups
    }

    pub fn deepest(&self) -> usize {
        self.nodes().map(|node| node.depth).max().unwrap_or(0)
    }

    pub fn node_records(&self) -> Vec<NodeRecord> {
        self.nodes().map(DependencyNode::record).collect()
    }

    /// Recompute `children_index` from parent pointers.
    pub fn rebuild_children_index(&mut self) {
        let mut index: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for id in &self.order {
            if let Some(parent) = self.nodes[id].parent_node_id {
                index.entry(parent).or_default().push(*id);
            }
        }
        self.children_index = index;
    }

    /// Path of `file_path` relative to the codebase root when possible.
    pub fn display_path<'a>(&self, file_path: &'a Path) -> std::path::Display<'a> {
        file_path
            .strip_prefix(&self.codebase_root)
            .unwrap_or(file_path)
            .display()
    }
}
