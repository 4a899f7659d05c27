//! Plain-text renderings of a dependency tree.

use std::fmt::Write as _;

use crate::core::{cycles, DependencyNode, DependencyTree, Direction};

const SEPARATOR: &str = "==================================================";

fn direction_heading(direction: Direction) -> &'static str {
    match direction {
        Direction::Upstream => "UPSTREAM (what this depends on)",
        Direction::Downstream => "DOWNSTREAM (what depends on this)",
    }
}

impl DependencyTree {
    /// Upstream then downstream sections, one indented line per node.
    pub fn pretty_string(&self) -> String {
        let root = self.root();
        let mut out = String::new();
        let _ = writeln!(out, "Dependency tree for: {} ({})", root.name(), root.kind());
        let _ = writeln!(
            out,
            "   {}:{}-{}",
            self.display_path(root.file_path()),
            root.entity.line_start,
            root.entity.line_end
        );

        for &direction in self.directions() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}:", direction_heading(direction));
            let children = self.children_in(self.root_id(), direction).unwrap_or_default();
            if children.is_empty() {
                let _ = writeln!(out, "   (none)");
                continue;
            }
            self.write_branch(&mut out, &children, "   ");
        }

        out
    }

    fn write_branch(&self, out: &mut String, children: &[&DependencyNode], prefix: &str) {
        for (position, child) in children.iter().enumerate() {
            let last = position + 1 == children.len();
            let connector = if last { "└── " } else { "├── " };
            let _ = writeln!(out, "{prefix}{connector}{}", self.node_line(child));

            let grandchildren: Vec<&DependencyNode> = self
                .children_of(child.node_id)
                .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
                .unwrap_or_default();
            if !grandchildren.is_empty() {
                let extension = if last { "    " } else { "│   " };
                self.write_branch(out, &grandchildren, &format!("{prefix}{extension}"));
            }
        }
    }

    fn node_line(&self, node: &DependencyNode) -> String {
        let mut line = format!(
            "{} ({}) [{}] {}:{}-{}",
            node.name(),
            node.kind(),
            node.dependency_label(),
            self.display_path(node.file_path()),
            node.entity.line_start,
            node.entity.line_end
        );
        if node.revisit {
            line.push_str(" (cycle)");
        }
        line
    }

    /// Nodes grouped by depth, each with its root-to-node path.
    pub fn path_report(&self) -> String {
        let root = self.root();
        let mut out = String::new();
        let _ = writeln!(out, "Dependency paths for: {} ({})", root.name(), root.kind());
        let _ = writeln!(out, "{SEPARATOR}");

        for (depth, nodes) in self.depths_grouped() {
            let _ = writeln!(out);
            let noun = if nodes.len() == 1 { "node" } else { "nodes" };
            let _ = writeln!(out, "Depth {depth} ({} {noun})", nodes.len());
            for node in nodes {
                let side = node.direction.map_or("target", Direction::as_str);
                let _ = writeln!(
                    out,
                    "  [{side}] {} ({}) [{}]{}",
                    node.name(),
                    node.kind(),
                    node.dependency_label(),
                    if node.revisit { " (cycle)" } else { "" }
                );
                if let Ok(path) = self.path_string(node.node_id) {
                    let _ = writeln!(out, "      path: {path}");
                }
                let _ = writeln!(
                    out,
                    "      file: {}:{}-{}",
                    self.display_path(node.file_path()),
                    node.entity.line_start,
                    node.entity.line_end
                );
            }
        }

        out
    }
}

/// Short CLI renderings that do not belong on the tree itself.
pub struct TextFormatter {
    /// Entries shown per depth in the depth summary.
    depth_preview: usize,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self { depth_preview: 5 }
    }

    pub fn with_depth_preview(mut self, depth_preview: usize) -> Self {
        self.depth_preview = depth_preview;
        self
    }

    /// Numbered flat list per direction.
    pub fn render_list(&self, tree: &DependencyTree) -> String {
        let mut out = String::new();
        for &direction in tree.directions() {
            let nodes = tree.all_dependencies(direction);
            let _ = writeln!(out, "{} dependencies ({}):", direction, nodes.len());
            for (number, node) in nodes.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{:>4}. {} ({}) [{}] depth {} {}:{}",
                    number + 1,
                    node.name(),
                    node.kind(),
                    node.dependency_label(),
                    node.depth,
                    tree.display_path(node.file_path()),
                    node.entity.line_start
                );
            }
            let _ = writeln!(out);
        }
        out
    }

    /// Node counts per depth with the first few paths of each.
    pub fn render_depths(&self, tree: &DependencyTree) -> String {
        let mut out = String::new();
        for (depth, nodes) in tree.depths_grouped() {
            let _ = writeln!(out, "Depth {depth}: {} node(s)", nodes.len());
            for node in nodes.iter().take(self.depth_preview) {
                let path = tree.path_string(node.node_id).unwrap_or_default();
                let _ = writeln!(out, "   {} [{}]  {path}", node.name(), node.dependency_label());
            }
            if nodes.len() > self.depth_preview {
                let _ = writeln!(out, "   ... and {} more", nodes.len() - self.depth_preview);
            }
        }
        out
    }

    /// Collapsed graph summary: counts, edge list and cycles.
    pub fn render_graph(&self, tree: &DependencyTree) -> String {
        let graph = tree.to_graph();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Graph: {} entities, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        for edge in graph.raw_edges() {
            let source = &graph[edge.source()];
            let target = &graph[edge.target()];
            let _ = writeln!(
                out,
                "   {} -> {} [{}, {}]",
                source.identity.name, target.identity.name, edge.weight.kind, edge.weight.locality
            );
        }

        let found = cycles(&graph);
        if found.is_empty() {
            let _ = writeln!(out, "No cycles.");
        } else {
            let _ = writeln!(out, "Cycles ({}):", found.len());
            for cycle in found {
                let names: Vec<&str> = cycle.iter().map(|identity| identity.name.as_str()).collect();
                let _ = writeln!(out, "   {}", names.join(" <-> "));
            }
        }
        out
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}
