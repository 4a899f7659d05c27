use dashmap::DashMap;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use super::scanner::{FileScanner, ScanOptions};
use super::{Entity, EntityKind};
use crate::error::{LineageError, ParseWarning, ParseWarningKind, Result};
use crate::parsers::{EntityParser, ParserFactory};

/// Parsed entities of one file, shared between the cache and tree nodes.
pub type FileEntities = Arc<[Arc<Entity>]>;

type FileSlot = Arc<OnceLock<FileEntities>>;

/// Lazily parsed, per-file cache of entities under one codebase root.
///
/// Each file is parsed at most once per index. Lookups are lock-sharded
/// (`DashMap`) and every path owns a `OnceLock` slot, so concurrent first
/// requests for one file wait on a single parse outside the map's locks.
pub struct EntityIndex {
    root: PathBuf,
    parser: Box<dyn EntityParser>,
    scanner: FileScanner,
    files: DashMap<PathBuf, FileSlot>,
    skipped: DashMap<PathBuf, ParseWarning>,
    eligible: OnceLock<Vec<PathBuf>>,
    parse_calls: AtomicUsize,
}

impl EntityIndex {
    pub fn new(root: &Path, parser: Box<dyn EntityParser>) -> Result<Self> {
        let root = root
            .canonicalize()
            .map_err(|err| LineageError::source_path(root, err))?;
        if !root.is_dir() {
            return Err(LineageError::source_path(root, "codebase root is not a directory"));
        }

        Ok(Self {
            root,
            parser,
            scanner: FileScanner::new(),
            files: DashMap::new(),
            skipped: DashMap::new(),
            eligible: OnceLock::new(),
            parse_calls: AtomicUsize::new(0),
        })
    }

    pub fn for_python(root: &Path) -> Result<Self> {
        Self::for_language(root, "python")
    }

    pub fn for_language(root: &Path, language: &str) -> Result<Self> {
        let parser = ParserFactory::new()
            .get_parser(language)
            .map_err(|err| LineageError::ParserUnavailable(err.to_string()))?;
        Self::new(root, parser)
    }

    pub fn with_scan_options(mut self, options: ScanOptions) -> Self {
        self.scanner = FileScanner::with_options(options);
        self.eligible = OnceLock::new();
        self
    }

    /// Canonical codebase root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn language_name(&self) -> &str {
        self.parser.language_name()
    }

    /// Eligible files under the root, discovered once and sorted.
    pub fn eligible_files(&self) -> &[PathBuf] {
        self.eligible.get_or_init(|| match self.scanner.scan_paths(&self.root) {
            Ok(paths) => {
                debug!(root = %self.root.display(), files = paths.len(), "scanned codebase root");
                paths
            }
            Err(err) => {
                warn!(root = %self.root.display(), error = %err, "cannot scan codebase root");
                Vec::new()
            }
        })
    }

    /// Entities defined in `file_path`, parsing on first request.
    ///
    /// Files that fail to parse yield an empty list and are recorded in
    /// [`skipped_files`](Self::skipped_files).
    pub fn entities_in(&self, file_path: &Path) -> FileEntities {
        let slot = match self.files.get(file_path) {
            Some(slot) => Arc::clone(slot.value()),
            None => Arc::clone(self.files.entry(file_path.to_path_buf()).or_default().value()),
        };
        Arc::clone(slot.get_or_init(|| self.parse_file(file_path)))
    }

    fn parse_file(&self, file_path: &Path) -> FileEntities {
        let outcome = self.parser.parse(file_path);
        self.parse_calls.fetch_add(1, Ordering::Relaxed);

        if outcome.is_skipped() {
            for warning in &outcome.warnings {
                warn!(file = %file_path.display(), reason = %warning.message, "skipping file");
            }
            if let Some(warning) = outcome.warnings.first() {
                self.skipped.insert(file_path.to_path_buf(), warning.clone());
            }
        } else {
            debug!(file = %file_path.display(), entities = outcome.entities.len(), "parsed file");
            for warning in &outcome.warnings {
                debug!(file = %file_path.display(), reason = %warning.message, "parse warning");
            }
        }

        outcome.entities.into_iter().map(Arc::new).collect()
    }

    /// Load the build target's file; unlike scanned files, failure here is fatal.
    pub fn load_target(&self, file_path: &Path) -> Result<FileEntities> {
        if !file_path.is_file() {
            return Err(LineageError::source_path(file_path, "target file does not exist"));
        }

        let entities = self.entities_in(file_path);
        if let Some(warning) = self.skipped.get(file_path) {
            let warning = warning.value().clone();
            return Err(match warning.kind {
                ParseWarningKind::Io => LineageError::source_path(file_path, warning.message),
                _ => LineageError::Parse(warning),
            });
        }
        Ok(entities)
    }

    /// Entity named `name` of `kind` declared in `file_path`.
    pub fn find(&self, name: &str, kind: EntityKind, file_path: &Path) -> Option<Arc<Entity>> {
        self.entities_in(file_path)
            .iter()
            .find(|entity| entity.kind == kind && entity.name == name)
            .cloned()
    }

    /// Every matching declaration under the root, in file order.
    pub fn find_anywhere(&self, name: &str, kind: EntityKind) -> Vec<Arc<Entity>> {
        self.find_matching(name, kind, None)
    }

    /// Like [`find_anywhere`](Self::find_anywhere) but ignoring one file.
    pub fn find_elsewhere(&self, name: &str, kind: EntityKind, exclude: &Path) -> Vec<Arc<Entity>> {
        self.find_matching(name, kind, Some(exclude))
    }

    fn find_matching(&self, name: &str, kind: EntityKind, exclude: Option<&Path>) -> Vec<Arc<Entity>> {
        let mut found = Vec::new();
        for path in self.eligible_files() {
            if exclude == Some(path.as_path()) {
                continue;
            }
            found.extend(
                self.entities_in(path)
                    .iter()
                    .filter(|entity| entity.kind == kind && entity.name == name)
                    .cloned(),
            );
        }
        found
    }

    /// All entities under the root, in file then declaration order.
    pub fn all_entities(&self) -> Vec<Arc<Entity>> {
        self.eligible_files()
            .iter()
            .flat_map(|path| self.entities_in(path).iter().cloned().collect::<Vec<_>>())
            .collect()
    }

    /// Parse every eligible file up front, in parallel. Returns the file count.
    pub fn preload(&self) -> usize {
        let files = self.eligible_files();
        files.par_iter().for_each(|path| {
            self.entities_in(path);
        });
        files.len()
    }

    pub fn is_cached(&self, file_path: &Path) -> bool {
        self.files
            .get(file_path)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Files that failed to parse, sorted by path.
    pub fn skipped_files(&self) -> Vec<ParseWarning> {
        let mut skipped: Vec<ParseWarning> = self
            .skipped
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        skipped.sort_by(|a, b| a.path.cmp(&b.path));
        skipped
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            cached_files: self.files.iter().filter(|slot| slot.get().is_some()).count(),
            skipped_files: self.skipped.len(),
            parse_calls: self.parse_calls.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub cached_files: usize,
    pub skipped_files: usize,
    pub parse_calls: usize,
}
