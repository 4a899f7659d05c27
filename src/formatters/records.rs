use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::core::{DependencyTree, NodeRecord};

/// Flat node records as pretty JSON or comma-separated text.
pub struct RecordsFormatter;

impl RecordsFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn to_json(&self, tree: &DependencyTree) -> Result<String> {
        Ok(serde_json::to_string_pretty(&tree.node_records())?)
    }

    /// Header row plus one row per node, in tree insertion order.
    pub fn to_csv(&self, tree: &DependencyTree) -> String {
        let mut out = NodeRecord::FIELDS.join(",");
        out.push('\n');
        for record in tree.node_records() {
            let row = [
                escape(&record.name),
                record.entity_type.to_string(),
                escape(&record.file_path),
                record.line_start.to_string(),
                record.line_end.to_string(),
                record.dependency_type,
                record.depth.to_string(),
                record
                    .parent_node_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                record.node_id.to_string(),
                record
                    .direction
                    .map(|direction| direction.to_string())
                    .unwrap_or_default(),
                record.revisit.to_string(),
            ];
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }

    pub fn csv_to_file(&self, tree: &DependencyTree, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.to_csv(tree))?;
        Ok(())
    }

    pub fn json_to_file(&self, tree: &DependencyTree, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.to_json(tree)?)?;
        Ok(())
    }
}

impl Default for RecordsFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
