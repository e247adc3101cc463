//! Test which deletes succeed and that failed ones have no effect.

use crate::e2e_tests::helpers::*;

#[test]
fn test_internal_delete_leaves_tree_unchanged() {
    let file = TestFile::new();
    let mut tree = file.with_values(&[10, 30, 1, 11, 100, 5, 9]);
    let keys = [1, 5, 9, 10, 11, 30, 100, 50];

    let before: Vec<_> = keys
        .iter()
        .map(|&k| tree.seek(k).ok())
        .collect();

    for internal in [10, 11, 30, 9, 5] {
        assert!(!tree.delete(internal).expect("delete"), "{internal} has children");
    }

    let after: Vec<_> = keys
        .iter()
        .map(|&k| tree.seek(k).ok())
        .collect();
    assert_eq!(before, after);
    assert!(tree.free_offsets().is_empty());
}

#[test]
fn test_missing_delete_has_no_side_effects() {
    let file = TestFile::new();
    let tree = file.with_values(&[10, 30]);
    tree.close().expect("close");
    let before = std::fs::read(&file.path).expect("read");

    let mut tree = file.open();
    assert!(!tree.delete(77).expect("delete"));
    tree.close().expect("close");

    assert_eq!(std::fs::read(&file.path).expect("read"), before);
}

#[test]
fn test_leaves_can_be_deleted_bottom_up() {
    let file = TestFile::new();
    let mut tree = file.with_values(&[10, 30, 1, 11, 100, 5, 9]);

    // Each of these is a leaf by the time it is deleted.
    for value in [1, 5, 9, 100, 30, 11, 10] {
        assert!(tree.delete(value).expect("delete"), "{value} should be a leaf");
    }
    assert!(tree.is_empty().expect("is_empty"));
    assert_eq!(tree.len().expect("len"), 0);
    tree.verify().expect("verify");
}
