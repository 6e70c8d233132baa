//! The map side of a MapReduce (lite) system.
//!
//! A map task reads one input shard, hands it to an application map
//! function, and partitions the emitted key-value pairs into `n_reduce`
//! intermediate files. The partitioning hash ([`ihash`]) and the intermediate
//! naming convention ([`store::intermediate_name`]) are the only contract
//! between map tasks and the reduce tasks that later consume their output,
//! so both are pure functions of their inputs.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

pub mod codec;
pub mod error;
pub mod standalone;
pub mod store;
pub mod utils;
pub mod workload;

pub use error::{Error, ErrorKind};

/////////////////////////////////////////////////////////////////////////////
// Key-value pairs
/////////////////////////////////////////////////////////////////////////////

/// A single key-value pair.
///
/// Keys and values are arbitrary byte strings. Duplicates are meaningful:
/// a reduce task must see every occurrence of a key.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct KeyValue {
    /// The key.
    #[serde(with = "codec::text_bytes")]
    pub key: Bytes,
    /// The value.
    #[serde(with = "codec::text_bytes")]
    pub value: Bytes,
}

impl KeyValue {
    /// Construct a new key-value pair from the given key and value.
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/////////////////////////////////////////////////////////////////////////////
// Partitioning
/////////////////////////////////////////////////////////////////////////////

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a.
#[derive(Clone, Copy, Debug)]
pub struct Fnv32a(u32);

impl Default for Fnv32a {
    fn default() -> Self {
        Self(FNV32_OFFSET_BASIS)
    }
}

impl Hasher for Fnv32a {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u32::from(*byte);
            self.0 = self.0.wrapping_mul(FNV32_PRIME);
        }
    }

    fn finish(&self) -> u64 {
        u64::from(self.0)
    }
}

/// Hashes an intermediate key. Compute a reduce bucket for a given key
/// by calculating `ihash(key) % n_reduce`.
///
/// The result depends only on the key bytes, so every map task on every
/// machine routes a key to the same bucket.
pub fn ihash(key: &[u8]) -> u32 {
    let mut hasher = Fnv32a::default();
    hasher.write(key);
    (hasher.finish() & 0x7fff_ffff) as u32
}

/// The reduce bucket for `key` when there are `n_reduce` reduce tasks.
///
/// `n_reduce == 0` means no reduce phase is expected; everything lands in
/// bucket 0.
#[inline]
pub fn bucket_for(key: &[u8], n_reduce: u32) -> u32 {
    if n_reduce == 0 {
        0
    } else {
        ihash(key) % n_reduce
    }
}
