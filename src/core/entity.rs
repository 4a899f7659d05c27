use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Function,
    Class,
    Module,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Function, EntityKind::Class, EntityKind::Module];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Function => "function",
            EntityKind::Class => "class",
            EntityKind::Module => "module",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "function" | "def" => Ok(EntityKind::Function),
            "class" => Ok(EntityKind::Class),
            "module" => Ok(EntityKind::Module),
            other => {
                let expected: Vec<&str> = EntityKind::ALL.iter().map(|kind| kind.as_str()).collect();
                Err(format!(
                    "unknown entity kind `{other}`, expected one of: {}",
                    expected.join(", ")
                ))
            }
        }
    }
}

/// Where a mention sits syntactically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceContext {
    Call,           // name(...) or obj.name(...)
    AttributeAccess, // obj.name, or the obj of any attribute chain
    BaseClass,      // class X(name)
    ImportClause,   // import name / from m import name
    BareName,
}

/// A raw mention of a symbol inside an entity body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reference {
    pub symbol_name: String,
    pub line_numbers: Vec<usize>,
    pub context: ReferenceContext,
}

impl Reference {
    pub fn new(symbol_name: impl Into<String>, context: ReferenceContext, line: usize) -> Self {
        Self {
            symbol_name: symbol_name.into(),
            line_numbers: vec![line],
            context,
        }
    }

    pub fn first_line(&self) -> usize {
        self.line_numbers.first().copied().unwrap_or(0)
    }
}

/// The (file, name, kind) triple used for cycle checks and graph collapsing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityIdentity {
    pub file_path: PathBuf,
    pub name: String,
    pub kind: EntityKind,
}

impl fmt::Display for EntityIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.file_path.display(), self.kind)
    }
}

/// A named program unit: top-level function, class, or a whole module.
///
/// Entities are produced by an [`EntityParser`](crate::parsers::EntityParser)
/// and never change after that.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub file_path: PathBuf,
    pub line_start: usize,
    pub line_end: usize,
    pub raw_references: Vec<Reference>,
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        kind: EntityKind,
        file_path: impl Into<PathBuf>,
        line_start: usize,
        line_end: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            file_path: file_path.into(),
            line_start,
            line_end,
            raw_references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<Reference>) -> Self {
        self.raw_references = references;
        self
    }

    pub fn identity(&self) -> EntityIdentity {
        EntityIdentity {
            file_path: self.file_path.clone(),
            name: self.name.clone(),
            kind: self.kind,
        }
    }

    /// Cheap identity comparison without allocating.
    pub fn is(&self, identity: &EntityIdentity) -> bool {
        self.kind == identity.kind && self.name == identity.name && self.file_path == identity.file_path
    }

    pub fn mentions(&self, symbol_name: &str) -> bool {
        self.raw_references
            .iter()
            .any(|reference| reference.symbol_name == symbol_name)
    }
}
