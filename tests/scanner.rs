use lineage::core::scanner::{FileScanner, ScanOptions};
use std::fs;
use std::path::Path;

fn touch<P: AsRef<Path>>(p: P) {
    fs::write(p, "# test\n").unwrap();
}

#[test]
fn scanner_keeps_python_files_sorted() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("b")).unwrap();
    fs::create_dir_all(root.join("a")).unwrap();

    touch(root.join("b/models.py"));
    touch(root.join("a/views.py"));
    touch(root.join("setup.py"));
    touch(root.join("a/readme.txt")); // ignored
    touch(root.join("b/stub.pyi")); // ignored

    let files = FileScanner::new().scan_directory(root).unwrap();

    let relative: Vec<_> = files
        .iter()
        .map(|f| f.path.strip_prefix(root).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        relative,
        vec![
            Path::new("a/views.py").to_path_buf(),
            Path::new("b/models.py").to_path_buf(),
            Path::new("setup.py").to_path_buf(),
        ]
    );
    assert!(files.iter().all(|f| f.extension == "py"));
}

#[test]
fn scanner_skips_hidden_and_excluded_dirs() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    for sub in ["__pycache__", "venv", ".hidden", "generated", "src"] {
        fs::create_dir_all(root.join(sub)).unwrap();
        touch(root.join(sub).join("mod.py"));
    }

    let scanner = FileScanner::with_options(ScanOptions::new().with_excluded_dir("generated"));
    let files = scanner.scan_paths(root).unwrap();

    assert_eq!(files, vec![root.join("src/mod.py")]);
}

#[test]
fn scanner_honours_custom_extensions() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    touch(root.join("a.py"));
    touch(root.join("b.pyi"));

    let scanner = FileScanner::with_options(ScanOptions::new().with_extensions([".py", "pyi"]));
    let files = scanner.scan_paths(root).unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(scanner.options().extensions, vec!["py", "pyi"]);
}

#[test]
fn scanning_a_file_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("single.py");
    touch(&file);

    assert!(FileScanner::new().scan_directory(&file).is_err());
}
