//! Breadth-first construction of dependency trees.
//!
//! Each direction is expanded level by level from the target. A neighbour
//! that already occurs on the path from the root is recorded as a revisit
//! leaf and never expanded, which bounds the walk even without a depth limit.
//! Anything off the current path is expanded again, so diamonds appear once
//! per path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::tree::{DependencyTree, Direction, NodeId};
use super::{
    DependencyKind, Entity, EntityIdentity, EntityIndex, EntityKind, Locality, ReferenceClassifier,
};
use crate::error::{LineageError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Deepest level to create; `None` expands until the frontier is empty.
    pub max_depth: Option<usize>,
    /// Restrict the build to one side; `None` builds both.
    pub direction: Option<Direction>,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn directions(&self) -> Vec<Direction> {
        match self.direction {
            Some(direction) => vec![direction],
            None => Direction::BOTH.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
struct Neighbour {
    entity: Arc<Entity>,
    kind: DependencyKind,
    locality: Locality,
}

type Neighbours = Arc<[Neighbour]>;

/// Builds trees against one [`EntityIndex`], memoizing neighbour lookups per
/// entity so repeated occurrences cost nothing after the first.
pub struct DependencyTreeBuilder<'a> {
    index: &'a EntityIndex,
    classifier: ReferenceClassifier,
    upstream: HashMap<EntityIdentity, Neighbours>,
    downstream: HashMap<EntityIdentity, Neighbours>,
}

impl<'a> DependencyTreeBuilder<'a> {
    pub fn new(index: &'a EntityIndex) -> Self {
        Self {
            index,
            classifier: ReferenceClassifier::new(),
            upstream: HashMap::new(),
            downstream: HashMap::new(),
        }
    }

    pub fn index(&self) -> &EntityIndex {
        self.index
    }

    pub fn build(
        &mut self,
        target_file: &Path,
        target_name: &str,
        target_kind: EntityKind,
        options: &BuildOptions,
    ) -> Result<DependencyTree> {
        let target_file = target_file
            .canonicalize()
            .map_err(|err| LineageError::source_path(target_file, err))?;

        let target = self
            .index
            .load_target(&target_file)?
            .iter()
            .find(|entity| entity.kind == target_kind && entity.name == target_name)
            .cloned()
            .ok_or_else(|| LineageError::EntityNotFound {
                name: target_name.to_string(),
                kind: target_kind,
                path: target_file.clone(),
            })?;

        info!(
            target = %target.identity(),
            root = %self.index.root().display(),
            max_depth = ?options.max_depth,
            "building dependency tree"
        );

        // every eligible file is parsed once so skipped files are reported
        // no matter which files the expansion reaches
        let files = self.index.preload();
        debug!(files, "indexed codebase root");

        let mut tree = DependencyTree::new(target, self.index.root());
        for direction in options.directions() {
            self.expand(&mut tree, direction, options.max_depth)?;
        }
        tree.set_skipped_files(self.index.skipped_files());

        info!(
            nodes = tree.len(),
            deepest = tree.deepest(),
            skipped = tree.skipped_files().len(),
            "dependency tree complete"
        );
        Ok(tree)
    }

    fn expand(
        &mut self,
        tree: &mut DependencyTree,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> Result<()> {
        tree.record_build(max_depth, direction);

        let mut frontier: Vec<(NodeId, Arc<Entity>)> =
            vec![(tree.root_id(), Arc::clone(&tree.root().entity))];
        let mut depth = 0;

        while !frontier.is_empty() {
            if max_depth.is_some_and(|max| depth >= max) {
                debug!(%direction, depth, pending = frontier.len(), "depth limit reached");
                break;
            }

            let mut next = Vec::new();
            for (node_id, entity) in frontier {
                let neighbours = match direction {
                    Direction::Upstream => self.dependencies_of(&entity),
                    Direction::Downstream => self.dependents_of(&entity),
                };

                for neighbour in neighbours.iter() {
                    let revisit = tree.path_contains(node_id, &neighbour.entity.identity());
                    let child = tree.add_child(
                        node_id,
                        Arc::clone(&neighbour.entity),
                        neighbour.kind,
                        neighbour.locality,
                        direction,
                        revisit,
                    )?;
                    if !revisit {
                        next.push((child, Arc::clone(&neighbour.entity)));
                    }
                }
            }

            depth += 1;
            debug!(%direction, depth, expanded = next.len(), "level complete");
            frontier = next;
        }

        Ok(())
    }

    /// What `entity` depends on.
    fn dependencies_of(&mut self, entity: &Entity) -> Neighbours {
        let identity = entity.identity();
        if let Some(cached) = self.upstream.get(&identity) {
            return Arc::clone(cached);
        }

        let neighbours: Neighbours = self
            .classifier
            .resolve_entity(entity, self.index)
            .into_iter()
            .map(|resolved| Neighbour {
                entity: resolved.target,
                kind: resolved.kind,
                locality: resolved.locality,
            })
            .collect();
        self.upstream.insert(identity, Arc::clone(&neighbours));
        neighbours
    }

    /// Everything under the root whose resolved dependencies include `target`.
    fn dependents_of(&mut self, target: &Entity) -> Neighbours {
        let identity = target.identity();
        if let Some(cached) = self.downstream.get(&identity) {
            return Arc::clone(cached);
        }

        let mut dependents = Vec::new();
        for candidate in self.index.all_entities() {
            if candidate.is(&identity) || !candidate.mentions(&target.name) {
                continue;
            }
            let edge = self
                .dependencies_of(&candidate)
                .iter()
                .find(|dependency| dependency.entity.is(&identity))
                .map(|dependency| (dependency.kind, dependency.locality));
            if let Some((kind, locality)) = edge {
                dependents.push(Neighbour {
                    entity: candidate,
                    kind,
                    locality,
                });
            }
        }

        let neighbours: Neighbours = dependents.into();
        self.downstream.insert(identity, Arc::clone(&neighbours));
        neighbours
    }
}

/// One-shot build: index `codebase_root` (default: the target file's
/// directory) and build the tree for the named target.
pub fn build_dependency_tree(
    target_file: &Path,
    target_name: &str,
    target_kind: EntityKind,
    codebase_root: Option<&Path>,
    options: &BuildOptions,
) -> Result<DependencyTree> {
    if !target_file.is_file() {
        return Err(LineageError::source_path(target_file, "target file does not exist"));
    }

    let root = match codebase_root {
        Some(root) => root.to_path_buf(),
        None => default_root(target_file),
    };

    let index = EntityIndex::for_python(&root)?;
    DependencyTreeBuilder::new(&index).build(target_file, target_name, target_kind, options)
}

/// Directory of `target_file`, or `.` for a bare file name.
pub fn default_root(target_file: &Path) -> PathBuf {
    match target_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
