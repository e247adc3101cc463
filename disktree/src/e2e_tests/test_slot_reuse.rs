//! Test that deleted slots are reused by later inserts.

use crate::e2e_tests::helpers::*;

#[test]
fn test_insert_delete_insert_reuses_root_slot() {
    let file = TestFile::new();
    let mut tree = file.open();

    let ten = tree.insert(10).expect("insert 10");
    assert!(tree.delete(10).expect("delete 10"));
    let twenty = tree.insert(20).expect("insert 20");

    assert_eq!(twenty, ten);
    assert!(!tree.contains(10).expect("contains 10"));
    assert!(tree.contains(20).expect("contains 20"));
    tree.close().expect("close");

    assert_eq!(file.file_len(), slot(1));
}

#[test]
fn test_deleted_leaf_slot_is_next_write() {
    let file = TestFile::new();
    let mut tree = file.with_values(&[10, 30, 1, 11, 100, 5, 9]);

    let hundred = tree.seek(100).expect("seek 100");
    assert!(tree.delete(100).expect("delete 100"));
    assert!(!tree.contains(100).expect("contains 100"));

    assert_eq!(tree.insert(200).expect("insert 200"), hundred);
    assert_eq!(file.file_len(), slot(7));
    tree.verify().expect("verify");
}

#[test]
fn test_remove_frees_a_slot_too() {
    let file = TestFile::new();
    let mut tree = file.with_values(&[10, 30, 1, 11, 100, 5, 9]);

    assert!(tree.remove(30).expect("remove internal"));
    assert_eq!(tree.free_offsets().len(), 1);

    let reused = tree.insert(31).expect("insert");
    assert!(tree.free_offsets().is_empty());
    assert_eq!(tree.seek(31).expect("seek"), reused);
    assert_eq!(live_values(&tree).len(), 7);
    tree.verify().expect("verify");
}
