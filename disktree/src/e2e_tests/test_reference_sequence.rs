//! Test the reference insert sequence on a file-backed tree.

use crate::e2e_tests::helpers::*;

const SEQUENCE: [i32; 7] = [10, 30, 1, 11, 100, 5, 9];

#[test]
fn test_contains_after_reference_inserts() {
    let file = TestFile::new();
    let tree = file.with_values(&SEQUENCE);

    assert!(tree.contains(11).expect("contains 11"));
    assert!(!tree.contains(50).expect("contains 50"));
    for value in SEQUENCE {
        assert!(tree.contains(value).expect("contains"));
    }
}

#[test]
fn test_in_order_is_sorted() {
    let file = TestFile::new();
    let tree = file.with_values(&SEQUENCE);

    assert_eq!(
        tree.in_order().expect("in_order"),
        vec![1, 5, 9, 10, 11, 30, 100]
    );
    tree.verify().expect("verify");
}

#[test]
fn test_file_is_header_less_record_array() {
    let file = TestFile::new();
    let tree = file.with_values(&SEQUENCE);
    tree.close().expect("close");

    assert_eq!(file.file_len(), slot(7));

    let bytes = std::fs::read(&file.path).expect("read file");
    // Record 0 is the root and starts at byte 0.
    assert_eq!(&bytes[0..4], &10i32.to_le_bytes());
}

#[test]
fn test_duplicate_insert_keeps_lookups_working() {
    let file = TestFile::new();
    let mut tree = file.with_values(&SEQUENCE);

    tree.insert(11).expect("insert duplicate");
    assert!(tree.contains(11).expect("contains"));
    assert_eq!(
        tree.in_order().expect("in_order"),
        vec![1, 5, 9, 10, 11, 11, 30, 100]
    );
    tree.verify().expect("verify");
}
