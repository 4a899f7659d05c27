use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const DEFAULT_EXCLUDED_DIRS: [&str; 9] = [
    "__pycache__",
    "venv",
    "env",
    "node_modules",
    "build",
    "dist",
    "site-packages",
    ".venv",
    ".git",
];

/// Which files under a codebase root are eligible for parsing.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub extensions: Vec<String>,
    pub excluded_dirs: HashSet<String>,
    pub follow_links: bool,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self {
            extensions: vec!["py".to_string()],
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
            follow_links: false,
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_string())
            .collect();
        self
    }

    pub fn with_excluded_dir(mut self, name: impl Into<String>) -> Self {
        self.excluded_dirs.insert(name.into());
        self
    }

    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub extension: String,
}

pub struct FileScanner {
    options: ScanOptions,
}

impl FileScanner {
    pub fn new() -> Self {
        Self::with_options(ScanOptions::new())
    }

    pub fn with_options(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Eligible files under `root_path`, sorted by path.
    pub fn scan_directory(&self, root_path: &Path) -> Result<Vec<FileInfo>> {
        if !root_path.is_dir() {
            anyhow::bail!("not a directory: {}", root_path.display());
        }

        let entries: Vec<DirEntry> = WalkDir::new(root_path)
            .follow_links(self.options.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry))
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .collect();

        let mut files: Vec<FileInfo> = entries
            .par_iter()
            .filter_map(|entry| {
                let path = entry.path();
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .filter(|ext| self.options.extensions.iter().any(|e| e == ext))
                    .map(|extension| FileInfo {
                        path: path.to_path_buf(),
                        extension: extension.to_string(),
                    })
            })
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Convenience for callers that only need paths.
    pub fn scan_paths(&self, root_path: &Path) -> Result<Vec<PathBuf>> {
        let files = self
            .scan_directory(root_path)
            .with_context(|| format!("scanning {}", root_path.display()))?;
        Ok(files.into_iter().map(|f| f.path).collect())
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.') || self.options.excluded_dirs.contains(name))
            .unwrap_or(false)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}
