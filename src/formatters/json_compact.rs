use anyhow::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::core::{DependencyKind, DependencyTree, Direction, EntityKind, NodeId};

/// Node/edge JSON with a shared file table, one node per tree position.
pub struct JsonCompactFormatter {
    /// Short keys and positional edges instead of full objects.
    minimal: bool,
}

impl JsonCompactFormatter {
    pub fn new() -> Self {
        Self { minimal: true }
    }

    pub fn with_minimal(mut self, minimal: bool) -> Self {
        self.minimal = minimal;
        self
    }

    pub fn format_to_file(&self, tree: &DependencyTree, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.format_tree(tree)?)?;
        Ok(())
    }

    pub fn format_tree(&self, tree: &DependencyTree) -> Result<String> {
        let export = tree.graph_export();

        let mut files: Vec<String> = Vec::new();
        let mut file_ids: HashMap<&str, usize> = HashMap::new();
        for node in &export.nodes {
            let path = node.record.file_path.as_str();
            if !file_ids.contains_key(path) {
                file_ids.insert(path, files.len());
                files.push(tree.display_path(Path::new(path)).to_string());
            }
        }

        // positions in the output array, not tree ids
        let positions: HashMap<NodeId, usize> = export
            .nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.record.node_id, position))
            .collect();

        let mut nodes: Vec<Value> = Vec::with_capacity(export.nodes.len());
        for node in &export.nodes {
            let record = &node.record;
            if self.minimal {
                let mut compact = json!({
                    "n": record.name,
                    "t": kind_code(record.entity_type),
                    "f": file_ids[record.file_path.as_str()],
                    "l": [record.line_start, record.line_end],
                    "d": record.depth,
                });
                if record.revisit {
                    compact["r"] = json!(1);
                }
                nodes.push(compact);
            } else {
                nodes.push(serde_json::to_value(node)?);
            }
        }

        let edges: Vec<Value> = export
            .edges
            .iter()
            .filter_map(|edge| {
                let src = *positions.get(&edge.source)?;
                let tgt = *positions.get(&edge.target)?;
                Some(if self.minimal {
                    json!([src, tgt, edge_code(edge.dependency_type), direction_code(edge.direction)])
                } else {
                    json!({
                        "src": src,
                        "tgt": tgt,
                        "type": edge.dependency_type,
                        "direction": edge.direction,
                    })
                })
            })
            .collect();

        let root = tree.root();
        let output = json!({
            "meta": {
                "target": root.name(),
                "kind": root.kind(),
                "nodes": nodes.len(),
                "edges": edges.len(),
                "max_depth": tree.max_depth(),
                "skipped": tree.skipped_files().len(),
                "format": if self.minimal { "compact" } else { "full" },
            },
            "files": files,
            "nodes": nodes,
            "edges": edges,
        });

        Ok(serde_json::to_string(&output)?)
    }
}

impl Default for JsonCompactFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_code(kind: EntityKind) -> u8 {
    match kind {
        EntityKind::Module => 0,
        EntityKind::Class => 1,
        EntityKind::Function => 2,
    }
}

fn edge_code(kind: DependencyKind) -> u8 {
    match kind {
        DependencyKind::Import => 0,
        DependencyKind::NameReference => 1,
        DependencyKind::AttributeAccess => 2,
        DependencyKind::FunctionCall => 3,
        DependencyKind::Instantiation => 4,
        DependencyKind::Inheritance => 5,
    }
}

fn direction_code(direction: Direction) -> u8 {
    match direction {
        Direction::Upstream => 0,
        Direction::Downstream => 1,
    }
}
