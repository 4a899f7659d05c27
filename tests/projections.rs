use lineage::core::{build_dependency_tree, BuildOptions, Direction, EntityKind, NodeRecord};
use lineage::DependencyTree;
use std::fs;

/// `service` calls `repo` and `cache`; `repo` calls `cache`; `api` calls `service`.
fn layered_tree() -> (tempfile::TempDir, DependencyTree) {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(
        dir.path().join("layers.py"),
        "def cache():\n    pass\n\n\
         def repo():\n    return cache()\n\n\
         def service():\n    repo()\n    return cache()\n\n\
         def api():\n    return service()\n",
    )
    .unwrap();
    let tree = build_dependency_tree(
        &dir.path().join("layers.py"),
        "service",
        EntityKind::Function,
        None,
        &BuildOptions::new(),
    )
    .unwrap();
    (dir, tree)
}

#[test]
fn all_dependencies_is_depth_ordered_per_direction() {
    let (_dir, tree) = layered_tree();

    let up: Vec<_> = tree
        .all_dependencies(Direction::Upstream)
        .iter()
        .map(|n| (n.name().to_string(), n.depth))
        .collect();
    assert_eq!(
        up,
        vec![
            ("repo".to_string(), 1),
            ("cache".to_string(), 1),
            ("cache".to_string(), 2),
        ]
    );

    let down: Vec<_> = tree
        .all_dependencies(Direction::Downstream)
        .iter()
        .map(|n| n.name().to_string())
        .collect();
    assert_eq!(down, vec!["api"]);
}

#[test]
fn depths_grouped_keeps_insertion_order() {
    let (_dir, tree) = layered_tree();
    let groups = tree.depths_grouped();

    assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    let depth1: Vec<_> = groups[&1].iter().map(|n| n.name()).collect();
    assert_eq!(depth1, vec!["repo", "cache", "api"]);
    assert_eq!(groups[&0][0].node_id, tree.root_id());
    assert_eq!(groups.values().map(Vec::len).sum::<usize>(), tree.len());
}

#[test]
fn pretty_string_shows_both_sections() {
    let (_dir, tree) = layered_tree();
    let text = tree.pretty_string();

    assert!(text.starts_with("Dependency tree for: service (function)"));
    let up = text.find("UPSTREAM").unwrap();
    let down = text.find("DOWNSTREAM").unwrap();
    assert!(up < down);

    assert!(text.contains("├── repo (function) [function_call] layers.py:4-5"));
    assert!(text.contains("│   └── cache (function) [function_call] layers.py:1-2"));
    assert!(text.contains("└── api (function) [function_call] layers.py:11-12"));
}

#[test]
fn pretty_string_marks_cycles_and_empty_sections() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("loop.py");
    fs::write(&file, "def ping():\n    pong()\n\ndef pong():\n    ping()\n").unwrap();

    let options = BuildOptions::new().with_direction(Direction::Upstream);
    let tree = build_dependency_tree(&file, "ping", EntityKind::Function, None, &options).unwrap();
    let text = tree.pretty_string();
    assert!(text.contains("ping (function) [function_call] loop.py:1-2 (cycle)"));
    assert!(!text.contains("DOWNSTREAM"));

    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("solo.py");
    fs::write(&file, "def solo():\n    pass\n").unwrap();
    let tree = build_dependency_tree(&file, "solo", EntityKind::Function, None, &options).unwrap();
    assert!(tree.pretty_string().contains("(none)"));
}

#[test]
fn path_report_lists_every_node_with_its_path() {
    let (_dir, tree) = layered_tree();
    let report = tree.path_report();

    assert!(report.contains("Depth 0 (1 node)"));
    assert!(report.contains("Depth 1 (3 nodes)"));
    assert!(report.contains("Depth 2 (1 node)"));
    assert!(report.contains("path: service -> repo -> cache"));
    assert!(report.contains("[downstream] api (function) [function_call]"));
    assert!(report.contains("path: service -> api"));
}

#[test]
fn node_records_use_stable_field_names() {
    let (_dir, tree) = layered_tree();
    let records = tree.node_records();
    assert_eq!(records.len(), tree.len());

    let root = &records[0];
    assert_eq!(root.dependency_type, "target");
    assert_eq!(root.depth, 0);
    assert_eq!(root.parent_node_id, None);
    assert_eq!(root.entity_type, EntityKind::Function);

    let value = serde_json::to_value(&records[1]).unwrap();
    let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    let mut expected: Vec<String> = NodeRecord::FIELDS.iter().map(|f| f.to_string()).collect();
    expected.sort();
    let mut keys_sorted = keys.clone();
    keys_sorted.sort();
    assert_eq!(keys_sorted, expected);
    assert_eq!(value["dependency_type"], "function_call");
    assert_eq!(value["direction"], "upstream");
    assert_eq!(value["parent_node_id"], serde_json::json!(tree.root_id()));
}

#[test]
fn children_index_can_be_rebuilt_from_parents() {
    let (_dir, mut tree) = layered_tree();
    let before: Vec<Vec<_>> = tree
        .nodes()
        .map(|n| tree.children_of(n.node_id).unwrap().to_vec())
        .collect();

    tree.rebuild_children_index();

    let after: Vec<Vec<_>> = tree
        .nodes()
        .map(|n| tree.children_of(n.node_id).unwrap().to_vec())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn children_in_splits_the_root() {
    let (_dir, tree) = layered_tree();
    let root = tree.root_id();

    let up = tree.children_in(root, Direction::Upstream).unwrap();
    let down = tree.children_in(root, Direction::Downstream).unwrap();
    assert_eq!(up.len() + down.len(), tree.children_of(root).unwrap().len());
    assert!(up.iter().all(|n| n.direction == Some(Direction::Upstream)));
    assert_eq!(down[0].name(), "api");
}
