use std::collections::BTreeMap;
use std::io;

use bytes::Bytes;

use super::{BucketKey, IntermediateStore};
use crate::codec;
use crate::error::{Error, Result};
use crate::KeyValue;

/// In-memory store holding the encoded form of every bucket.
///
/// Records go through the same codec as [`super::FsStore`], so whatever
/// round-trips here round-trips on disk.
#[derive(Clone, Debug, Default)]
pub struct MemStore {
    files: BTreeMap<BucketKey, Bytes>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded content stored under `key`.
    pub fn raw(&self, key: &BucketKey) -> Option<&Bytes> {
        self.files.get(key)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl IntermediateStore for MemStore {
    fn put(&mut self, key: &BucketKey, records: &[KeyValue]) -> io::Result<()> {
        let buf = codec::encode_records(records)?;
        self.files.insert(key.clone(), Bytes::from(buf));
        Ok(())
    }

    fn get(&self, key: &BucketKey) -> Result<Option<Vec<KeyValue>>> {
        let Some(buf) = self.files.get(key) else {
            return Ok(None);
        };
        codec::decode_records(buf)
            .map(Some)
            .map_err(|source| Error::Decode {
                name: key.name(),
                source,
            })
    }

    fn keys(&self, job: &str) -> Result<Vec<BucketKey>> {
        Ok(self.files.keys().filter(|k| k.job == job).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::read_bucket;

    #[test]
    fn stores_encoded_records() {
        let mut store = MemStore::new();
        let key = BucketKey::new("wc", 0, 0);
        store.put(&key, &[KeyValue::new("a", "1")]).unwrap();

        assert_eq!(
            &store.raw(&key).unwrap()[..],
            b"{\"key\":\"a\",\"value\":\"1\"}\n"
        );
        assert_eq!(store.get(&key).unwrap(), Some(vec![KeyValue::new("a", "1")]));
        assert_eq!(store.get(&BucketKey::new("wc", 0, 1)).unwrap(), None);
    }

    #[test]
    fn read_bucket_merges_map_tasks_in_order() {
        let mut store = MemStore::new();
        store
            .put(&BucketKey::new("wc", 1, 0), &[KeyValue::new("b", "1")])
            .unwrap();
        store
            .put(&BucketKey::new("wc", 0, 0), &[KeyValue::new("a", "1")])
            .unwrap();
        store
            .put(&BucketKey::new("wc", 0, 1), &[KeyValue::new("z", "1")])
            .unwrap();
        store
            .put(&BucketKey::new("other", 0, 0), &[KeyValue::new("x", "1")])
            .unwrap();

        assert_eq!(
            read_bucket(&store, "wc", 2, 0).unwrap(),
            vec![KeyValue::new("a", "1"), KeyValue::new("b", "1")]
        );
        assert_eq!(read_bucket(&store, "wc", 2, 1).unwrap(), vec![KeyValue::new("z", "1")]);
        assert!(read_bucket(&store, "wc", 2, 2).unwrap().is_empty());
    }

    #[test]
    fn read_bucket_ignores_map_tasks_beyond_the_count() {
        let mut store = MemStore::new();
        // left over from an earlier run of "wc" with two map tasks
        store
            .put(&BucketKey::new("wc", 1, 0), &[KeyValue::new("stale", "1")])
            .unwrap();
        store
            .put(&BucketKey::new("wc", 0, 0), &[KeyValue::new("fresh", "1")])
            .unwrap();

        assert_eq!(
            read_bucket(&store, "wc", 1, 0).unwrap(),
            vec![KeyValue::new("fresh", "1")]
        );
        assert!(read_bucket(&store, "wc", 0, 0).unwrap().is_empty());
    }
}
