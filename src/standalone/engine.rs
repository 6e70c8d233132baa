use bytes::Bytes;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, Read},
    path::Path,
};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::standalone::{EmptyBuckets, MapTask, MapTaskOptions, MapTaskReport};
use crate::store::{validate_job_name, BucketKey, IntermediateStore};
use crate::*;

// types related to this engine
type BucketIndex = u32;
pub type Buckets = BTreeMap<BucketIndex, Vec<KeyValue>>;

/// Reads the whole input shard into memory. The bytes are not interpreted.
pub fn load_shard(path: &Path) -> Result<Bytes> {
    let input_unavailable = |source: io::Error| Error::InputUnavailable {
        path: path.to_path_buf(),
        source,
    };
    let mut buf = Vec::new();
    {
        // a scope so that the file is closed right after reading
        let mut file = File::open(path).map_err(input_unavailable)?;
        file.read_to_end(&mut buf).map_err(input_unavailable)?;
    }
    Ok(Bytes::from(buf))
}

/// Calls the map function exactly once and hands back its output as is.
pub fn invoke_map<F>(shard_name: &str, contents: &Bytes, map_fn: F) -> Vec<KeyValue>
where
    F: FnOnce(&str, &Bytes) -> Vec<KeyValue>,
{
    map_fn(shard_name, contents)
}

/// Groups pairs by reduce bucket.
///
/// Within a bucket, pairs keep the order in which they were emitted. Only
/// buckets that received at least one pair are present.
pub fn partition(pairs: Vec<KeyValue>, n_reduce: u32) -> Buckets {
    let mut buckets = Buckets::new();
    for kv in pairs {
        let bucket_no = bucket_for(&kv.key, n_reduce);
        buckets.entry(bucket_no).or_default().push(kv);
    }
    buckets
}

/// Partitions `pairs` and stores each bucket under its intermediate name.
///
/// With `n_reduce == 0` everything goes to bucket 0, which is written even
/// when empty. Buckets are written in ascending order and the first failure
/// stops the task; buckets already written stay in place, to be overwritten
/// when the task is rerun.
pub fn partition_and_write<S>(
    store: &mut S,
    job: &str,
    map_task: u32,
    n_reduce: u32,
    pairs: Vec<KeyValue>,
    options: MapTaskOptions,
) -> Result<Vec<BucketKey>>
where
    S: IntermediateStore + ?Sized,
{
    validate_job_name(job)?;
    let mut buckets = partition(pairs, n_reduce);
    if n_reduce == 0 {
        buckets.entry(0).or_default();
    } else if options.empty_buckets == EmptyBuckets::Write {
        for bucket_no in 0..n_reduce {
            buckets.entry(bucket_no).or_default();
        }
    }

    let mut written = Vec::with_capacity(buckets.len());
    for (bucket_no, kvs) in buckets {
        let key = BucketKey::new(job, map_task, bucket_no);
        debug!("bucket {}: {} pairs -> {}", bucket_no, kvs.len(), key.name());
        store
            .put(&key, &kvs)
            .map_err(|source| Error::OutputUnwritable {
                name: key.name(),
                bucket: bucket_no,
                source,
            })?;
        written.push(key);
    }
    Ok(written)
}

/// Runs one map task end to end: load the shard, map it, partition the
/// output into `task.n_reduce` buckets and store them.
pub fn run_map_task<S, F>(
    store: &mut S,
    task: &MapTask,
    map_fn: F,
    options: MapTaskOptions,
) -> Result<MapTaskReport>
where
    S: IntermediateStore + ?Sized,
    F: FnOnce(&str, &Bytes) -> Vec<KeyValue>,
{
    validate_job_name(&task.job)?;
    info!(
        "map task {} of job {}: {} into {} buckets",
        task.map_task,
        task.job,
        task.input.display(),
        task.n_reduce
    );

    let contents = load_shard(&task.input)?;
    let pairs = invoke_map(&task.shard_name(), &contents, map_fn);
    let n_pairs = pairs.len();

    let written = partition_and_write(
        store,
        &task.job,
        task.map_task,
        task.n_reduce,
        pairs,
        options,
    )?;
    info!(
        "map task {} of job {} done: {} pairs in {} files",
        task.map_task,
        task.job,
        n_pairs,
        written.len()
    );
    Ok(MapTaskReport {
        pairs: n_pairs,
        written,
    })
}
