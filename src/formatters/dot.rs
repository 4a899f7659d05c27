use anyhow::Result;
use petgraph::dot::Dot;
use petgraph::visit::EdgeRef;
use std::fs;
use std::path::Path;

use crate::core::{DependencyTree, EntityGraph, Locality};

/// Graphviz rendering of the collapsed entity graph.
pub struct DotFormatter;

impl DotFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_tree(&self, tree: &DependencyTree) -> String {
        self.format_graph(&tree.to_graph())
    }

    pub fn format_graph(&self, graph: &EntityGraph) -> String {
        let dot = Dot::with_attr_getters(
            graph,
            &[],
            &|_, edge| match edge.weight().locality {
                Locality::Internal => "style=solid".to_string(),
                Locality::External => "style=dashed".to_string(),
            },
            &|_, (_, node)| {
                if node.is_target {
                    "shape=box style=bold".to_string()
                } else {
                    "shape=ellipse".to_string()
                }
            },
        );
        format!("{dot}")
    }

    pub fn format_to_file(&self, tree: &DependencyTree, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.format_tree(tree))?;
        Ok(())
    }
}

impl Default for DotFormatter {
    fn default() -> Self {
        Self::new()
    }
}
