pub mod builder;
pub mod classifier;
pub mod entity;
pub mod graph;
pub mod index;
pub mod scanner;
pub mod tree;

pub use builder::{build_dependency_tree, default_root, BuildOptions, DependencyTreeBuilder};
pub use classifier::{
    DependencyEdge, DependencyKind, Locality, ReferenceClassifier, ResolvedDependency,
};
pub use entity::{Entity, EntityIdentity, EntityKind, Reference, ReferenceContext};
pub use graph::{cycles, EntityGraph, GraphBuilder, GraphEdge, GraphExport, GraphNode};
pub use index::{EntityIndex, FileEntities, IndexStats};
pub use scanner::{FileInfo, FileScanner, ScanOptions};
pub use tree::{DependencyNode, DependencyTree, Direction, NodeId, NodeRecord};
