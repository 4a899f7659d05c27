use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use tree_sitter::Node as TSNode;

use super::common::{
    end_line, extract_text, first_error_line, last_segment, read_source, start_line,
    TreeSitterParser,
};
use super::{EntityParser, ParseOutcome};
use crate::core::{Entity, EntityKind, Reference, ReferenceContext};
use crate::error::ParseWarning;

/// Names never worth resolving: the implicit receivers.
const RECEIVERS: [&str; 2] = ["self", "cls"];

pub struct PythonEntityParser;

impl PythonEntityParser {
    pub fn new() -> Result<Self> {
        // Fail early if the grammar cannot be loaded by this tree-sitter build.
        TreeSitterParser::new(tree_sitter_python::language())?;
        Ok(Self)
    }

    /// Parse already-loaded source; `file_path` is recorded on every entity.
    pub fn parse_source(&self, source: &str, file_path: &Path) -> Result<ParseOutcome> {
        let mut parser = TreeSitterParser::new(tree_sitter_python::language())?;
        let tree = parser.parse_source(source, file_path)?;
        let root = tree.root_node();

        if let Some(line) = first_error_line(&root) {
            return Ok(ParseOutcome::skipped(ParseWarning::syntax(file_path, line)));
        }

        let source = source.as_bytes();
        let aliases = collect_aliases(&root, source);

        let mut entities = Vec::new();
        let mut module_refs = ReferenceCollector::new(source, &aliases);

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "function_definition" | "class_definition" => {
                    if let Some(entity) = self.definition_entity(&child, &child, source, &aliases, file_path) {
                        entities.push(entity);
                    }
                }
                "decorated_definition" => {
                    let definition = child.child_by_field_name("definition");
                    if let Some(entity) = definition.and_then(|definition| {
                        self.definition_entity(&child, &definition, source, &aliases, file_path)
                    }) {
                        entities.push(entity);
                    }
                }
                _ => module_refs.visit(&child),
            }
        }

        let module = Entity::new(
            module_name(file_path),
            EntityKind::Module,
            file_path,
            1,
            end_line(&root).max(1),
        )
        .with_references(module_refs.finish());
        entities.insert(0, module);

        debug!(
            file = %file_path.display(),
            entities = entities.len(),
            "parsed python file"
        );

        Ok(ParseOutcome::parsed(entities))
    }

    /// `outer` spans decorators when present; `definition` is the def/class node.
    fn definition_entity(
        &self,
        outer: &TSNode,
        definition: &TSNode,
        source: &[u8],
        aliases: &HashMap<String, String>,
        file_path: &Path,
    ) -> Option<Entity> {
        let name = extract_text(&definition.child_by_field_name("name")?, source);
        let kind = match definition.kind() {
            "function_definition" => EntityKind::Function,
            "class_definition" => EntityKind::Class,
            _ => return None,
        };

        let mut collector = ReferenceCollector::new(source, aliases);
        collector.visit(outer);

        Some(
            Entity::new(name, kind, file_path, start_line(outer), end_line(outer))
                .with_references(collector.finish()),
        )
    }
}

impl EntityParser for PythonEntityParser {
    fn parse(&self, file_path: &Path) -> ParseOutcome {
        let source = match read_source(file_path) {
            Ok(source) => source,
            Err(err) => return ParseOutcome::skipped(ParseWarning::io(file_path, &err)),
        };

        match self.parse_source(&source, file_path) {
            Ok(outcome) => outcome,
            Err(err) => ParseOutcome::skipped(ParseWarning::new(
                file_path,
                crate::error::ParseWarningKind::Syntax,
                err.to_string(),
            )),
        }
    }

    fn language_name(&self) -> &str {
        "python"
    }
}

/// `pkg/util.py` -> `util`; a package's `__init__.py` takes the directory name.
fn module_name(file_path: &Path) -> String {
    let stem = file_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    if stem == "__init__" {
        if let Some(dir) = file_path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
        {
            return dir.to_string();
        }
    }
    stem.to_string()
}

/// Module-level `import x as y` / `from m import x as y`: maps `y` to `x`.
fn collect_aliases(root: &TSNode, source: &[u8]) -> HashMap<String, String> {
    let mut aliases = HashMap::new();
    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        if !matches!(statement.kind(), "import_statement" | "import_from_statement") {
            continue;
        }
        let mut names = statement.walk();
        for imported in statement.children_by_field_name("name", &mut names) {
            if imported.kind() != "aliased_import" {
                continue;
            }
            let (Some(name), Some(alias)) = (
                imported.child_by_field_name("name"),
                imported.child_by_field_name("alias"),
            ) else {
                continue;
            };
            let original = last_segment(&name, source);
            let alias = extract_text(&alias, source);
            if original != alias {
                aliases.insert(alias.to_string(), original.to_string());
            }
        }
    }
    aliases
}

/// Walks one entity body and records mentions in source order, grouped by
/// `(name, context)`.
struct ReferenceCollector<'a> {
    source: &'a [u8],
    aliases: &'a HashMap<String, String>,
    references: Vec<Reference>,
    positions: HashMap<(String, ReferenceContext), usize>,
}

impl<'a> ReferenceCollector<'a> {
    fn new(source: &'a [u8], aliases: &'a HashMap<String, String>) -> Self {
        Self {
            source,
            aliases,
            references: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn finish(self) -> Vec<Reference> {
        self.references
    }

    fn record(&mut self, name: &str, context: ReferenceContext, line: usize) {
        if name.is_empty() || RECEIVERS.contains(&name) {
            return;
        }
        let aliases = self.aliases;
        let name = match context {
            ReferenceContext::ImportClause => name,
            _ => aliases.get(name).map(String::as_str).unwrap_or(name),
        };

        let key = (name.to_string(), context);
        match self.positions.get(&key) {
            Some(&position) => {
                let lines = &mut self.references[position].line_numbers;
                if lines.last() != Some(&line) {
                    lines.push(line);
                }
            }
            None => {
                self.positions.insert(key, self.references.len());
                self.references.push(Reference::new(name, context, line));
            }
        }
    }

    fn record_node(&mut self, node: &TSNode, context: ReferenceContext) {
        let text = extract_text(node, self.source);
        self.record(text, context, start_line(node));
    }

    fn visit(&mut self, node: &TSNode) {
        match node.kind() {
            "identifier" => self.record_node(node, ReferenceContext::BareName),
            "function_definition" => {
                if let Some(parameters) = node.child_by_field_name("parameters") {
                    self.visit_parameters(&parameters);
                }
                if let Some(return_type) = node.child_by_field_name("return_type") {
                    self.visit(&return_type);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit(&body);
                }
            }
            "lambda" => {
                if let Some(parameters) = node.child_by_field_name("parameters") {
                    self.visit_parameters(&parameters);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit(&body);
                }
            }
            "class_definition" => {
                if let Some(bases) = node.child_by_field_name("superclasses") {
                    self.visit_bases(&bases);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit(&body);
                }
            }
            "call" => {
                if let Some(function) = node.child_by_field_name("function") {
                    match function.kind() {
                        "identifier" => self.record_node(&function, ReferenceContext::Call),
                        "attribute" => self.visit_attribute(&function, ReferenceContext::Call),
                        _ => self.visit(&function),
                    }
                }
                if let Some(arguments) = node.child_by_field_name("arguments") {
                    self.visit(&arguments);
                }
            }
            "attribute" => self.visit_attribute(node, ReferenceContext::AttributeAccess),
            "keyword_argument" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(&value);
                }
            }
            "named_expression" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(&value);
                }
            }
            "assignment" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.visit_target(&left);
                }
                if let Some(annotation) = node.child_by_field_name("type") {
                    self.visit(&annotation);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.visit(&right);
                }
            }
            "for_statement" | "for_in_clause" => {
                let left = node.child_by_field_name("left").map(|left| left.id());
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if Some(child.id()) == left {
                        self.visit_target(&child);
                    } else {
                        self.visit(&child);
                    }
                }
            }
            "as_pattern" => {
                let alias = node.child_by_field_name("alias").map(|alias| alias.id());
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if Some(child.id()) != alias && child.kind() != "as_pattern_target" {
                        self.visit(&child);
                    }
                }
            }
            "import_statement" | "import_from_statement" => self.visit_import(node),
            "parameters" | "lambda_parameters" => self.visit_parameters(node),
            "future_import_statement" | "global_statement" | "nonlocal_statement" | "comment" => {}
            _ => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.visit(&child);
                }
            }
        }
    }

    /// `object.attribute`: the object is always an attribute access, the
    /// rightmost name takes `context`.
    fn visit_attribute(&mut self, node: &TSNode, context: ReferenceContext) {
        if let Some(object) = node.child_by_field_name("object") {
            match object.kind() {
                "identifier" => self.record_node(&object, ReferenceContext::AttributeAccess),
                "attribute" => self.visit_attribute(&object, ReferenceContext::AttributeAccess),
                _ => self.visit(&object),
            }
        }
        if let Some(attribute) = node.child_by_field_name("attribute") {
            self.record_node(&attribute, context);
        }
    }

    fn visit_bases(&mut self, bases: &TSNode) {
        let mut cursor = bases.walk();
        for base in bases.named_children(&mut cursor) {
            match base.kind() {
                "identifier" => self.record_node(&base, ReferenceContext::BaseClass),
                "attribute" => self.visit_attribute(&base, ReferenceContext::BaseClass),
                _ => self.visit(&base),
            }
        }
    }

    /// Parameter names bind; only annotations and defaults are reads.
    fn visit_parameters(&mut self, parameters: &TSNode) {
        let mut cursor = parameters.walk();
        for parameter in parameters.named_children(&mut cursor) {
            match parameter.kind() {
                "default_parameter" | "typed_parameter" | "typed_default_parameter" => {
                    for field in ["type", "value"] {
                        if let Some(child) = parameter.child_by_field_name(field) {
                            self.visit(&child);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Assignment targets bind names; attribute and subscript targets still read.
    fn visit_target(&mut self, target: &TSNode) {
        match target.kind() {
            "identifier" => {}
            "pattern_list" | "tuple_pattern" | "list_pattern" | "tuple" | "list"
            | "list_splat_pattern" | "parenthesized_expression" => {
                let mut cursor = target.walk();
                for child in target.named_children(&mut cursor) {
                    self.visit_target(&child);
                }
            }
            "attribute" => self.visit_attribute(target, ReferenceContext::AttributeAccess),
            _ => self.visit(target),
        }
    }

    fn visit_import(&mut self, node: &TSNode) {
        if node.kind() == "import_from_statement" {
            if let Some(module) = node.child_by_field_name("module_name") {
                self.record_imported_module(&module);
            }
        }

        let mut cursor = node.walk();
        for imported in node.children_by_field_name("name", &mut cursor) {
            let name = match imported.kind() {
                "aliased_import" => imported.child_by_field_name("name"),
                "dotted_name" => Some(imported),
                _ => None,
            };
            if let Some(name) = name {
                let line = start_line(&name);
                let segment = last_segment(&name, self.source);
                self.record(segment, ReferenceContext::ImportClause, line);
            }
        }
    }

    /// `from a.b import x` -> `b`; `from . import x` names no module.
    fn record_imported_module(&mut self, module: &TSNode) {
        let dotted = match module.kind() {
            "dotted_name" => Some(*module),
            "relative_import" => {
                let mut cursor = module.walk();
                let dotted = module
                    .named_children(&mut cursor)
                    .find(|child| child.kind() == "dotted_name");
                dotted
            }
            _ => None,
        };
        if let Some(dotted) = dotted {
            let segment = last_segment(&dotted, self.source);
            self.record(segment, ReferenceContext::ImportClause, start_line(&dotted));
        }
    }
}
