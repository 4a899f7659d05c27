use anyhow::Result;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tree_sitter::{Language, Node as TSNode, Parser, Point, Tree};

pub struct TreeSitterParser {
    parser: Parser,
}

impl TreeSitterParser {
    pub fn new(language: Language) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(language)?;
        Ok(Self { parser })
    }

    pub fn parse_source(&mut self, source: &str, file_path: &Path) -> Result<Tree> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse file: {}", file_path.display()))?;
        Ok(tree)
    }
}

/// Buffered read sized to the file; invalid UTF-8 surfaces as `InvalidData`.
pub fn read_source(file_path: &Path) -> std::io::Result<String> {
    let file = File::open(file_path)?;
    let file_size = file.metadata()?.len() as usize;

    let mut reader = BufReader::with_capacity(file_size.clamp(1, 8192), file);
    let mut content = String::with_capacity(file_size);
    reader.read_to_string(&mut content)?;
    Ok(content)
}

pub fn extract_text<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

/// 1-based line of a node's first byte.
pub fn start_line(node: &TSNode) -> usize {
    node.start_position().row + 1
}

/// 1-based inclusive last line; a node ending at column 0 ends on the previous line.
pub fn end_line(node: &TSNode) -> usize {
    let Point { row, column } = node.end_position();
    if column == 0 && row > node.start_position().row {
        row
    } else {
        row + 1
    }
}

/// Line of the first ERROR or MISSING node, if the tree has any.
pub fn first_error_line(root: &TSNode) -> Option<usize> {
    if !root.has_error() {
        return None;
    }
    if root.is_error() || root.is_missing() {
        return Some(start_line(root));
    }
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if let Some(line) = first_error_line(&child) {
            return Some(line);
        }
    }
    Some(start_line(root))
}

/// Last identifier of a `dotted_name` (`a.b.c` -> `c`).
pub fn last_segment<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    let text = extract_text(node, source);
    text.rsplit('.').next().unwrap_or(text).trim()
}
