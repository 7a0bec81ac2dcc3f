//!
//! Secondary index kinds and their order-preserving key encodings.
//!

/// The closed set of secondary index types a contract table may carry.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum IndexKind {
    U64,
    U128,
    U128Pair,
    F64,
    F128,
}

impl IndexKind {
    pub const ALL: [IndexKind; 5] = [
        IndexKind::U64,
        IndexKind::U128,
        IndexKind::U128Pair,
        IndexKind::F64,
        IndexKind::F128,
    ];

    pub fn slot(self) -> usize {
        match self {
            IndexKind::U64 => 0,
            IndexKind::U128 => 1,
            IndexKind::U128Pair => 2,
            IndexKind::F64 => 3,
            IndexKind::F128 => 4,
        }
    }

    /// Bytes a row of this index occupies on the wire and in RAM billing.
    pub fn key_size(self) -> usize {
        match self {
            IndexKind::U64 => 8,
            IndexKind::U128 => 16,
            IndexKind::U128Pair => 32,
            IndexKind::F64 => 8,
            IndexKind::F128 => 16,
        }
    }
}

///
/// A typed secondary key value. Floats are carried as raw bit patterns;
/// NaN is rejected by the intrinsic layer before a value reaches the store.
///
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SecondaryValue {
    U64(u64),
    U128(u128),
    /// Ordered lexicographically, element 0 most significant.
    U128Pair([u128; 2]),
    F64(u64),
    F128(u128),
}

/// Order-preserving integer encoding of a secondary value; tuple compare
/// gives the index order for every kind.
pub type SortKey = (u128, u128);

#[inline]
fn fold_f64(bits: u64) -> u64 {
    // -0 and +0 must land on the same key
    let bits = if bits << 1 == 0 { 0 } else { bits };
    if bits >> 63 != 0 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

#[inline]
fn unfold_f64(folded: u64) -> u64 {
    if folded >> 63 != 0 {
        folded ^ (1 << 63)
    } else {
        !folded
    }
}

#[inline]
fn fold_f128(bits: u128) -> u128 {
    let bits = if bits << 1 == 0 { 0 } else { bits };
    if bits >> 127 != 0 {
        !bits
    } else {
        bits | (1 << 127)
    }
}

#[inline]
fn unfold_f128(folded: u128) -> u128 {
    if folded >> 127 != 0 {
        folded ^ (1 << 127)
    } else {
        !folded
    }
}

impl SecondaryValue {
    pub fn kind(self) -> IndexKind {
        match self {
            SecondaryValue::U64(_) => IndexKind::U64,
            SecondaryValue::U128(_) => IndexKind::U128,
            SecondaryValue::U128Pair(_) => IndexKind::U128Pair,
            SecondaryValue::F64(_) => IndexKind::F64,
            SecondaryValue::F128(_) => IndexKind::F128,
        }
    }

    pub fn sort_key(self) -> SortKey {
        match self {
            SecondaryValue::U64(v) => (v as u128, 0),
            SecondaryValue::U128(v) => (v, 0),
            SecondaryValue::U128Pair([hi, lo]) => (hi, lo),
            SecondaryValue::F64(bits) => (fold_f64(bits) as u128, 0),
            SecondaryValue::F128(bits) => (fold_f128(bits), 0),
        }
    }

    pub fn from_sort_key(kind: IndexKind, key: SortKey) -> SecondaryValue {
        match kind {
            IndexKind::U64 => SecondaryValue::U64(key.0 as u64),
            IndexKind::U128 => SecondaryValue::U128(key.0),
            IndexKind::U128Pair => SecondaryValue::U128Pair([key.0, key.1]),
            IndexKind::F64 => SecondaryValue::F64(unfold_f64(key.0 as u64)),
            IndexKind::F128 => SecondaryValue::F128(unfold_f128(key.0)),
        }
    }
}
