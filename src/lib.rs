//! # LINEAGE
//!
//! Entity-level dependency trees for Python codebases.
//!
//! Given a target function, class or module, LINEAGE walks the code under a
//! codebase root and builds a tree of what the target depends on (upstream)
//! and what depends on it (downstream). Dependencies are found by declared
//! name only; no code is imported or executed.
//!
//! ## Output Formats
//!
//! - **Tree**: indented text, one line per node
//! - **Paths**: every node with its root-to-node path, grouped by depth
//! - **Records**: flat JSON or CSV rows for tabular tools
//! - **JSON-Compact**: nodes and edges with a shared file table
//! - **DOT**: the collapsed entity graph for Graphviz
//!
//! ```no_run
//! use lineage::{build_dependency_tree, BuildOptions, EntityKind};
//! use std::path::Path;
//!
//! let tree = build_dependency_tree(
//!     Path::new("app/models.py"),
//!     "User",
//!     EntityKind::Class,
//!     None,
//!     &BuildOptions::new().with_max_depth(3),
//! )?;
//! println!("{}", tree.pretty_string());
//! # Ok::<(), lineage::LineageError>(())
//! ```

pub mod core;
pub mod error;
pub mod formatters;
pub mod parsers;

pub use crate::core::{
    build_dependency_tree, BuildOptions, DependencyKind, DependencyNode, DependencyTree,
    DependencyTreeBuilder, Direction, Entity, EntityIdentity, EntityIndex, EntityKind, NodeId,
    NodeRecord,
};
pub use crate::error::{LineageError, ParseWarning, Result};
