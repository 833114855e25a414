//! Ground-truth checks against fixture trees on disk

use std::collections::BTreeMap;
use std::time::Duration;
use verity_ground::{
    CheckLimits, EntryKind, FileSystemVerifier, SourceStructureVerifier, DEFAULT_MAX_FILE_SIZE,
};
use verity_test_utils::{SourceTree, SAMPLE_PYTHON};

#[tokio::test]
async fn fail_closed_for_missing_paths() {
    let tree = SourceTree::new();
    let fs = FileSystemVerifier::default();
    let structure = SourceStructureVerifier::default();
    let missing = tree.path("nonexistent_file.py");

    assert!(!fs.verify_path(&missing).await);
    assert!(!fs.verify_snippet(&missing, "def hello():").await);
    assert!(!structure.function_exists(&missing, "hello").await);
    assert!(!structure.class_exists(&missing, "Hello").await);
    assert!(!structure.import_exists(&missing, "os").await);
}

#[tokio::test]
async fn snippet_absent_from_file() {
    let tree = SourceTree::new();
    let file = tree.write("test.py", "def hello(): print('world')");
    let fs = FileSystemVerifier::default();

    assert!(!fs.verify_snippet(&file, "def goodbye():").await);
    assert!(fs.verify_snippet(&file, "print('world')").await);
}

#[tokio::test]
async fn whitespace_tolerance() {
    let tree = SourceTree::new();
    let file = tree.write("test.py", "def hello():\n pass");
    let fs = FileSystemVerifier::default();

    assert!(fs.verify_snippet(&file, "def hello( ):").await);
    assert!(fs.verify_snippet(&file, "def hello():\n\n        pass").await);
}

#[tokio::test]
async fn symbol_precision() {
    let tree = SourceTree::with_sample();
    let file = tree.path("main.py");
    let structure = SourceStructureVerifier::default();

    assert!(structure.function_exists(&file, "real_function").await);
    assert!(structure.function_exists(&file, "method").await);
    assert!(!structure.function_exists(&file, "fake_function").await);
    assert!(structure.class_exists(&file, "RealClass").await);
    assert!(!structure.class_exists(&file, "real_function").await);
    assert!(structure.import_exists(&file, "os").await);
    assert!(structure.import_exists(&file, "typing").await);
    assert!(structure.import_exists(&file, "Dict").await);
    assert!(!structure.import_exists(&file, "sys").await);
}

#[tokio::test]
async fn nested_tree_and_directory_structure() {
    let tree = SourceTree::new();
    tree.mkdir("src/empty");
    let lib = tree.write("src/pkg/lib.rs", "pub fn run() {}\npub struct Engine;\n");
    let fs = FileSystemVerifier::default();
    let structure = SourceStructureVerifier::default();

    let mut layout = BTreeMap::new();
    layout.insert(tree.path("src"), EntryKind::Directory);
    layout.insert(tree.path("src/empty"), EntryKind::Directory);
    layout.insert(lib.clone(), EntryKind::File);
    assert!(fs.verify_directory_structure(&layout).await);

    layout.insert(tree.path("src/pkg"), EntryKind::File);
    assert!(!fs.verify_directory_structure(&layout).await);

    assert!(structure.function_exists(&lib, "run").await);
    assert!(structure.class_exists(&lib, "Engine").await);
}

#[tokio::test]
async fn size_limit_applies_to_structure_checks() {
    let tree = SourceTree::with_sample();
    let file = tree.path("main.py");
    let tight = CheckLimits::new(Duration::from_secs(5), 8);
    let structure = SourceStructureVerifier::new(tight, true, 16);

    assert!(!structure.function_exists(&file, "real_function").await);
    assert!(
        SourceStructureVerifier::new(CheckLimits::new(Duration::from_secs(5), DEFAULT_MAX_FILE_SIZE), true, 16)
            .function_exists(&file, "real_function")
            .await
    );
    assert!(SAMPLE_PYTHON.len() > 8);
}

#[tokio::test]
async fn concurrent_queries_agree() {
    let tree = SourceTree::with_sample();
    let file = tree.path("main.py");
    let structure = SourceStructureVerifier::default();

    let checks = (0..16).map(|i| {
        let structure = structure.clone();
        let file = file.clone();
        tokio::spawn(async move {
            if i % 2 == 0 {
                structure.function_exists(&file, "real_function").await
            } else {
                !structure.function_exists(&file, "fake_function").await
            }
        })
    });

    for handle in checks.collect::<Vec<_>>() {
        assert!(handle.await.unwrap());
    }
}
