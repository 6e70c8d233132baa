//! A MapReduce-compatible implementation of word count.
//!

use crate::*;

/// Emits `(word, "1")` for every alphabetic word, lowercased.
pub fn map(_shard: &str, contents: &Bytes) -> Vec<KeyValue> {
    let s = String::from_utf8_lossy(contents);
    s.split(|c: char| !c.is_alphabetic())
        .filter(|s| !s.is_empty())
        .map(|word| KeyValue::new(word.to_lowercase(), "1"))
        .collect()
}
