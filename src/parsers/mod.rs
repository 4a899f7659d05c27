pub mod common;
pub mod python;

use std::path::Path;

use crate::core::Entity;
use crate::error::ParseWarning;

/// Entities found in one file plus anything that went wrong reading it.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub entities: Vec<Entity>,
    pub warnings: Vec<ParseWarning>,
}

impl ParseOutcome {
    pub fn parsed(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            warnings: Vec::new(),
        }
    }

    pub fn skipped(warning: ParseWarning) -> Self {
        Self {
            entities: Vec::new(),
            warnings: vec![warning],
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.entities.is_empty() && !self.warnings.is_empty()
    }
}

/// Turns one source file into entity records.
///
/// Must never fail: unreadable or malformed input yields an empty entity list
/// and a warning so the caller can keep scanning.
pub trait EntityParser: Send + Sync {
    fn parse(&self, file_path: &Path) -> ParseOutcome;

    fn language_name(&self) -> &str;
}

pub struct ParserFactory;

impl ParserFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn get_parser(&self, language: &str) -> anyhow::Result<Box<dyn EntityParser>> {
        match language {
            "python" => Ok(Box::new(python::PythonEntityParser::new()?)),
            _ => anyhow::bail!("Unsupported language: {}", language),
        }
    }
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}
