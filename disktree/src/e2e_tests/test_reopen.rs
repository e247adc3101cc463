//! Test that the tree and its free slots survive closing and reopening.

use crate::e2e_tests::helpers::*;

#[test]
fn test_tree_survives_reopen() {
    let file = TestFile::new();
    file.with_values(&[10, 30, 1, 11, 100, 5, 9])
        .close()
        .expect("close");

    let tree = file.open();
    assert_eq!(
        tree.in_order().expect("in_order"),
        vec![1, 5, 9, 10, 11, 30, 100]
    );
    assert_eq!(live_values(&tree), vec![10, 30, 1, 11, 100, 5, 9]);
}

#[test]
fn test_free_slots_survive_reopen_in_physical_order() {
    let file = TestFile::new();
    {
        let mut tree = file.with_values(&[10, 30, 1, 11, 100, 5, 9]);
        assert!(tree.delete(100).expect("delete 100"));
        assert!(tree.delete(1).expect("delete 1"));
        assert_eq!(tree.free_offsets(), vec![slot(4), slot(2)]);
        tree.close().expect("close");
    }

    let mut tree = file.open();
    assert_eq!(tree.free_offsets(), vec![slot(2), slot(4)]);
    assert_eq!(tree.insert(0).expect("insert"), slot(2));
    assert_eq!(tree.insert(500).expect("insert"), slot(4));
    assert_eq!(file.file_len(), slot(7));
    tree.verify().expect("verify");
}

#[test]
fn test_truncated_file_is_rejected() {
    let file = TestFile::new();
    file.with_values(&[10, 30]).close().expect("close");

    let handle = std::fs::OpenOptions::new()
        .write(true)
        .open(&file.path)
        .expect("open raw");
    handle.set_len(slot(2) - 3).expect("truncate");
    drop(handle);

    assert!(matches!(
        crate::tree::DiskTree::open(&file.path),
        Err(crate::tree::TreeError::Corruption(_))
    ));
}

#[test]
fn test_print_after_reopen() {
    let file = TestFile::new();
    {
        let mut tree = file.open();
        tree.insert(10).expect("insert");
        assert!(tree.delete(10).expect("delete"));
        tree.insert(20).expect("insert");
        tree.close().expect("close");
    }

    let tree = file.open();
    let mut out = Vec::new();
    tree.print(&mut out).expect("print");
    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "Value: 20, offset: 0, LeftOffset: -1, RightOffset: -1 {ROOT}\n-----------\n"
    );
}
