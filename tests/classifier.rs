use lineage::core::{
    DependencyKind, EntityIndex, EntityKind, Locality, ReferenceClassifier, ReferenceContext,
};
use rstest::rstest;
use std::fs;
use std::path::Path;

fn write(root: &Path, name: &str, content: &str) {
    fs::write(root.join(name), content).unwrap();
}

#[rstest]
#[case::call_function(ReferenceContext::Call, EntityKind::Function, DependencyKind::FunctionCall)]
#[case::call_class(ReferenceContext::Call, EntityKind::Class, DependencyKind::Instantiation)]
#[case::call_module(ReferenceContext::Call, EntityKind::Module, DependencyKind::NameReference)]
#[case::base_class(ReferenceContext::BaseClass, EntityKind::Class, DependencyKind::Inheritance)]
#[case::import_module(ReferenceContext::ImportClause, EntityKind::Module, DependencyKind::Import)]
#[case::import_function(ReferenceContext::ImportClause, EntityKind::Function, DependencyKind::Import)]
#[case::attribute(ReferenceContext::AttributeAccess, EntityKind::Module, DependencyKind::AttributeAccess)]
#[case::bare_name(ReferenceContext::BareName, EntityKind::Class, DependencyKind::NameReference)]
fn classify_by_context_and_target(
    #[case] context: ReferenceContext,
    #[case] target: EntityKind,
    #[case] expected: DependencyKind,
) {
    assert_eq!(ReferenceClassifier::classify(context, target), expected);
}

#[rstest]
#[case::import(DependencyKind::Import, DependencyKind::NameReference, DependencyKind::NameReference)]
#[case::call_vs_attribute(DependencyKind::AttributeAccess, DependencyKind::FunctionCall, DependencyKind::FunctionCall)]
#[case::inheritance_wins(DependencyKind::Inheritance, DependencyKind::Instantiation, DependencyKind::Inheritance)]
#[case::same(DependencyKind::Import, DependencyKind::Import, DependencyKind::Import)]
fn most_specific_kind_wins(
    #[case] a: DependencyKind,
    #[case] b: DependencyKind,
    #[case] expected: DependencyKind,
) {
    assert_eq!(a.most_specific(b), expected);
    assert_eq!(b.most_specific(a), expected);
}

#[test]
fn repeated_target_merges_into_most_specific_kind() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path(),
        "shapes.py",
        "class Base:\n    pass\n\nclass Child(Base):\n    def make(self):\n        return Base()\n",
    );
    let index = EntityIndex::for_python(dir.path()).unwrap();
    let child = index
        .find("Child", EntityKind::Class, &index.root().join("shapes.py"))
        .unwrap();

    let deps = ReferenceClassifier::new().resolve_entity(&child, &index);
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].target.name, "Base");
    assert_eq!(deps[0].kind, DependencyKind::Inheritance);
    assert_eq!(deps[0].locality, Locality::Internal);
    assert_eq!(deps[0].line, 4);
}

#[test]
fn local_definitions_shadow_other_files() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path(),
        "a.py",
        "def helper():\n    pass\n\ndef main():\n    return helper()\n",
    );
    write(dir.path(), "b.py", "def helper():\n    pass\n");
    let index = EntityIndex::for_python(dir.path()).unwrap();
    let a = index.root().join("a.py");
    let main = index.find("main", EntityKind::Function, &a).unwrap();

    let deps = ReferenceClassifier::new().resolve_entity(&main, &index);
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].target.file_path, a);
    assert_eq!(deps[0].locality, Locality::Internal);
    assert_eq!(deps[0].kind, DependencyKind::FunctionCall);
}

#[test]
fn ambiguous_external_names_resolve_to_every_match() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path(), "a.py", "def main():\n    return helper()\n");
    write(dir.path(), "b.py", "def helper():\n    pass\n");
    write(dir.path(), "c.py", "def helper():\n    pass\n");
    let index = EntityIndex::for_python(dir.path()).unwrap();
    let main = index
        .find("main", EntityKind::Function, &index.root().join("a.py"))
        .unwrap();

    let deps = ReferenceClassifier::new().resolve_entity(&main, &index);
    let files: Vec<_> = deps
        .iter()
        .map(|d| d.target.file_path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(files, vec!["b.py", "c.py"]);
    assert!(deps.iter().all(|d| d.locality == Locality::External));
}

#[test]
fn unresolved_and_self_mentions_are_dropped() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path(),
        "loop.py",
        "def again(n):\n    print(n)\n    return again(n - 1)\n",
    );
    let index = EntityIndex::for_python(dir.path()).unwrap();
    let again = index
        .find("again", EntityKind::Function, &index.root().join("loop.py"))
        .unwrap();

    assert!(ReferenceClassifier::new()
        .resolve_entity(&again, &index)
        .is_empty());
}

#[test]
fn imports_and_aliases_resolve_across_files() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path(), "util.py", "def helper():\n    pass\n");
    write(
        dir.path(),
        "app.py",
        "from util import helper as h\n\ndef main():\n    return h()\n",
    );
    let index = EntityIndex::for_python(dir.path()).unwrap();
    let app = index.root().join("app.py");
    let util = index.root().join("util.py");
    let classifier = ReferenceClassifier::new();

    let module = index.find("app", EntityKind::Module, &app).unwrap();
    let edges = classifier.edges(&module, &index);
    assert_eq!(edges.len(), 2);
    assert!(edges
        .iter()
        .all(|e| e.kind == DependencyKind::Import && e.locality == Locality::External));
    assert_eq!(edges[0].target.name, "util");
    assert_eq!(edges[0].target.kind, EntityKind::Module);
    assert_eq!(edges[1].target.name, "helper");
    assert_eq!(edges[1].target.file_path, util);

    let main = index.find("main", EntityKind::Function, &app).unwrap();
    let deps = classifier.resolve_entity(&main, &index);
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].target.name, "helper");
    assert_eq!(deps[0].kind, DependencyKind::FunctionCall);
}
