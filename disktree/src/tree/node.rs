//! Node record layout and serialization.
//!
//! Every slot in the file is a fixed 20-byte record with no header or tag:
//!
//! - `value`: 4 bytes (i32, little-endian)
//! - `left_offset`: 8 bytes (i64, little-endian)
//! - `right_offset`: 8 bytes (i64, little-endian)
//!
//! A node's own offset is not stored; it is the position the record was read
//! from. Child links hold either the byte offset of another record or
//! `NO_CHILD`. Offset 0 is an ordinary address (it is where the root lives).
//!
//! A reclaimed slot is overwritten with a tombstone whose `left_offset` is
//! `FREE_MARKER`, so the free set can be rebuilt by scanning the file.

/// Size of one record on disk.
pub const NODE_SIZE: usize = 20;

/// `NODE_SIZE` as a file offset stride.
pub const NODE_SIZE_U64: u64 = 20;

/// Raw link value meaning "no child".
pub const NO_CHILD: i64 = -1;

/// Raw `left_offset` value marking a reclaimed slot.
pub const FREE_MARKER: i64 = -2;

/// Byte offset of a record in the file.
pub type Offset = u64;

/// Offset of the root record.
pub const ROOT_OFFSET: Offset = 0;

mod layout {
    pub const VALUE: usize = 0;
    pub const LEFT: usize = 4;
    pub const RIGHT: usize = 12;
}

/// A live tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub value: i32,
    /// Where this record lives. Reconstructed from the read position.
    pub offset: Offset,
    pub left: Option<Offset>,
    pub right: Option<Offset>,
}

impl Node {
    /// A childless node that has not been placed yet.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self {
            value,
            offset: ROOT_OFFSET,
            left: None,
            right: None,
        }
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.offset == ROOT_OFFSET
    }

    /// Serialize to the fixed on-disk layout.
    #[must_use]
    pub fn encode(&self) -> [u8; NODE_SIZE] {
        encode_raw(self.value, encode_link(self.left), encode_link(self.right))
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Value: {}, offset: {}, LeftOffset: {}, RightOffset: {}",
            self.value,
            self.offset,
            encode_link(self.left),
            encode_link(self.right)
        )
    }
}

/// One decoded slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Live(Node),
    Free { offset: Offset },
}

impl Record {
    /// Decode the record read from `offset`.
    pub fn decode(bytes: &[u8; NODE_SIZE], offset: Offset) -> Result<Self, NodeError> {
        if offset % NODE_SIZE_U64 != 0 {
            return Err(NodeError::Misaligned { offset });
        }

        let value = i32::from_le_bytes(field(bytes, layout::VALUE));
        let raw_left = i64::from_le_bytes(field(bytes, layout::LEFT));
        let raw_right = i64::from_le_bytes(field(bytes, layout::RIGHT));

        if raw_left == FREE_MARKER {
            return Ok(Self::Free { offset });
        }

        Ok(Self::Live(Node {
            value,
            offset,
            left: decode_link(raw_left, offset)?,
            right: decode_link(raw_right, offset)?,
        }))
    }

    #[must_use]
    pub const fn offset(&self) -> Offset {
        match self {
            Self::Live(node) => node.offset,
            Self::Free { offset } => *offset,
        }
    }
}

/// The tombstone written over a reclaimed slot.
#[must_use]
pub fn encode_free() -> [u8; NODE_SIZE] {
    encode_raw(0, FREE_MARKER, NO_CHILD)
}

fn encode_raw(value: i32, left: i64, right: i64) -> [u8; NODE_SIZE] {
    let mut buf = [0u8; NODE_SIZE];
    buf[layout::VALUE..layout::LEFT].copy_from_slice(&value.to_le_bytes());
    buf[layout::LEFT..layout::RIGHT].copy_from_slice(&left.to_le_bytes());
    buf[layout::RIGHT..NODE_SIZE].copy_from_slice(&right.to_le_bytes());
    buf
}

fn field<const N: usize>(bytes: &[u8; NODE_SIZE], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[at..at + N]);
    out
}

#[allow(clippy::cast_possible_wrap)]
const fn encode_link(link: Option<Offset>) -> i64 {
    match link {
        Some(offset) => offset as i64,
        None => NO_CHILD,
    }
}

fn decode_link(raw: i64, offset: Offset) -> Result<Option<Offset>, NodeError> {
    if raw == NO_CHILD {
        return Ok(None);
    }
    match u64::try_from(raw) {
        Ok(target) if target % NODE_SIZE_U64 == 0 => Ok(Some(target)),
        _ => Err(NodeError::BadLink { offset, raw }),
    }
}

/// Errors from decoding a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeError {
    /// The record was read from an offset that is not on a slot boundary.
    Misaligned { offset: Offset },
    /// A child link is neither `NO_CHILD` nor a slot boundary.
    BadLink { offset: Offset, raw: i64 },
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Misaligned { offset } => {
                write!(f, "offset {offset} is not a multiple of {NODE_SIZE}")
            }
            Self::BadLink { offset, raw } => {
                write!(f, "record at offset {offset} has invalid child link {raw}")
            }
        }
    }
}

impl std::error::Error for NodeError {}
