//! End-to-end tests against a real record file.
//!
//! Each test file covers a specific scenario, opening, mutating, closing and
//! reopening a tree on disk.

#![cfg(test)]

mod helpers;

mod test_delete_rules;
mod test_reference_sequence;
mod test_reopen;
mod test_slot_reuse;
