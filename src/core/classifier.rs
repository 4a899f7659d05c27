//! Turns raw mentions into typed, resolved dependency edges.
//!
//! Resolution is by declared name only. A mention first looks for a
//! definition in the mentioning entity's own file; local definitions shadow
//! everything else. Only when nothing local matches does it look at the rest
//! of the codebase root, where every match is kept so that ambiguous names
//! show up as several targets instead of one arbitrary pick. Mentions that
//! resolve nowhere are dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::{Entity, EntityIdentity, EntityIndex, EntityKind, Reference, ReferenceContext};

/// How one entity depends on another.
///
/// Variants are declared from least to most specific; `Ord` follows that order
/// and [`most_specific`](DependencyKind::most_specific) picks the winner when
/// several mentions point at the same target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Import,
    NameReference,
    AttributeAccess,
    FunctionCall,
    Instantiation,
    Inheritance,
}

impl DependencyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyKind::Import => "import",
            DependencyKind::NameReference => "name_reference",
            DependencyKind::AttributeAccess => "attribute_access",
            DependencyKind::FunctionCall => "function_call",
            DependencyKind::Instantiation => "instantiation",
            DependencyKind::Inheritance => "inheritance",
        }
    }

    pub fn most_specific(self, other: DependencyKind) -> DependencyKind {
        self.max(other)
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Locality {
    /// Target lives in the same file as the source.
    Internal,
    /// Target lives in another file under the root.
    External,
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locality::Internal => f.write_str("internal"),
            Locality::External => f.write_str("external"),
        }
    }
}

/// A classified edge between two entity identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub source: EntityIdentity,
    pub target: EntityIdentity,
    pub kind: DependencyKind,
    pub locality: Locality,
}

/// One resolved target of an entity, carrying the entity itself.
#[derive(Debug, Clone)]
pub struct ResolvedDependency {
    pub target: Arc<Entity>,
    pub kind: DependencyKind,
    pub locality: Locality,
    /// First line the target is mentioned on.
    pub line: usize,
}

impl ResolvedDependency {
    pub fn edge_from(&self, source: &Entity) -> DependencyEdge {
        DependencyEdge {
            source: source.identity(),
            target: self.target.identity(),
            kind: self.kind,
            locality: self.locality,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceClassifier;

impl ReferenceClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Entity kinds a mention in `context` may point at, in lookup order.
    pub fn candidate_kinds(context: ReferenceContext) -> &'static [EntityKind] {
        match context {
            ReferenceContext::Call => &[EntityKind::Class, EntityKind::Function],
            ReferenceContext::BaseClass => &[EntityKind::Class],
            ReferenceContext::ImportClause
            | ReferenceContext::AttributeAccess
            | ReferenceContext::BareName => {
                &[EntityKind::Function, EntityKind::Class, EntityKind::Module]
            }
        }
    }

    /// Dependency kind of a mention once its target kind is known.
    pub fn classify(context: ReferenceContext, target_kind: EntityKind) -> DependencyKind {
        match context {
            ReferenceContext::BaseClass => DependencyKind::Inheritance,
            ReferenceContext::ImportClause => DependencyKind::Import,
            ReferenceContext::AttributeAccess => DependencyKind::AttributeAccess,
            ReferenceContext::BareName => DependencyKind::NameReference,
            ReferenceContext::Call => match target_kind {
                EntityKind::Class => DependencyKind::Instantiation,
                EntityKind::Function => DependencyKind::FunctionCall,
                EntityKind::Module => DependencyKind::NameReference,
            },
        }
    }

    /// Resolve one mention made by `source` to zero or more targets.
    pub fn resolve_reference(
        &self,
        source: &Entity,
        reference: &Reference,
        index: &EntityIndex,
    ) -> Vec<ResolvedDependency> {
        let kinds = Self::candidate_kinds(reference.context);
        let name = reference.symbol_name.as_str();
        let line = reference.first_line();

        let internal: Vec<Arc<Entity>> = kinds
            .iter()
            .filter_map(|&kind| index.find(name, kind, &source.file_path))
            .collect();

        let (targets, locality) = if internal.is_empty() {
            let external = kinds
                .iter()
                .flat_map(|&kind| index.find_elsewhere(name, kind, &source.file_path))
                .collect();
            (external, Locality::External)
        } else {
            (internal, Locality::Internal)
        };

        let source_identity = source.identity();
        targets
            .into_iter()
            .filter(|target| !target.is(&source_identity))
            .map(|target| ResolvedDependency {
                kind: Self::classify(reference.context, target.kind),
                target,
                locality,
                line,
            })
            .collect()
    }

    /// All dependencies of `source`, one per target identity, ordered by
    /// first mention. Repeated targets keep the most specific kind.
    pub fn resolve_entity(&self, source: &Entity, index: &EntityIndex) -> Vec<ResolvedDependency> {
        let mut merged: Vec<ResolvedDependency> = Vec::new();
        for reference in &source.raw_references {
            for resolved in self.resolve_reference(source, reference, index) {
                let identity = resolved.target.identity();
                match merged.iter_mut().find(|existing| existing.target.is(&identity)) {
                    Some(existing) => {
                        existing.kind = existing.kind.most_specific(resolved.kind);
                        existing.line = existing.line.min(resolved.line);
                    }
                    None => merged.push(resolved),
                }
            }
        }
        merged
    }

    pub fn edges(&self, source: &Entity, index: &EntityIndex) -> Vec<DependencyEdge> {
        self.resolve_entity(source, index)
            .iter()
            .map(|resolved| resolved.edge_from(source))
            .collect()
    }
}
