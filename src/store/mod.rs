//! Intermediate storage shared by map and reduce tasks.
//!
//! Map task `m` of job `j` stores the records destined for reduce task `r`
//! under [`intermediate_name`]`(j, m, r)`. The name depends on nothing else,
//! so a rerun of the same map task replaces exactly the files of the earlier
//! attempt, and a reduce task can find its inputs knowing only the job name
//! and the number of map tasks.

use std::io;

use tracing::trace;

use crate::error::{Error, Result};
use crate::KeyValue;

pub mod fs;
pub mod mem;

pub use self::fs::FsStore;
pub use self::mem::MemStore;

/// Every intermediate name starts with this prefix.
pub const INTERMEDIATE_PREFIX: &str = "mrtmp.";

/// Name of the intermediate file written by map task `map_task` of `job` for
/// reduce bucket `reduce`.
pub fn intermediate_name(job: &str, map_task: u32, reduce: u32) -> String {
    format!("{INTERMEDIATE_PREFIX}{job}-{map_task}-{reduce}")
}

/// Inverse of [`intermediate_name`].
///
/// The two indices are parsed from the right, so job names may themselves
/// contain `-`. Returns [`None`] for anything [`intermediate_name`] could
/// not have produced.
pub fn parse_intermediate_name(name: &str) -> Option<BucketKey> {
    let rest = name.strip_prefix(INTERMEDIATE_PREFIX)?;
    let (rest, reduce) = rest.rsplit_once('-')?;
    let (job, map_task) = rest.rsplit_once('-')?;
    let key = BucketKey::new(job, map_task.parse().ok()?, reduce.parse().ok()?);
    // rejects "+1", "01" and empty job names
    (validate_job_name(job).is_ok() && key.name() == name).then_some(key)
}

/// Job names end up in file names, so they must not be able to escape the
/// intermediate directory.
pub fn validate_job_name(job: &str) -> Result<()> {
    if job.is_empty() || job.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidJobName {
            job: job.to_string(),
        });
    }
    Ok(())
}

/// Identity of one intermediate file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    pub job: String,
    pub map_task: u32,
    pub reduce: u32,
}

impl BucketKey {
    pub fn new(job: impl Into<String>, map_task: u32, reduce: u32) -> Self {
        Self {
            job: job.into(),
            map_task,
            reduce,
        }
    }

    #[inline]
    pub fn name(&self) -> String {
        intermediate_name(&self.job, self.map_task, self.reduce)
    }
}

/// Where map tasks put their partitioned output.
pub trait IntermediateStore {
    /// Stores `records` under `key`, replacing whatever was there.
    ///
    /// A concurrent reader observes either the previous content or all of
    /// `records`, never a prefix.
    fn put(&mut self, key: &BucketKey, records: &[KeyValue]) -> io::Result<()>;

    /// Returns the records stored under `key`, or [`None`] if nothing was
    /// ever stored there.
    fn get(&self, key: &BucketKey) -> Result<Option<Vec<KeyValue>>>;

    /// Lists every stored key belonging to `job`, in ascending order.
    ///
    /// For inspection only; reduce tasks locate their inputs by name.
    fn keys(&self, job: &str) -> Result<Vec<BucketKey>>;
}

/// Collects all records of `job` destined for reduce bucket `reduce`, from
/// map tasks `0..n_map`, ordered by map task.
///
/// A map task that emitted nothing for this bucket may have left no file at
/// all; that contributes no records. Files of map indices outside `0..n_map`
/// are never read, whatever else the store holds.
pub fn read_bucket<S>(store: &S, job: &str, n_map: u32, reduce: u32) -> Result<Vec<KeyValue>>
where
    S: IntermediateStore + ?Sized,
{
    validate_job_name(job)?;
    let mut records = Vec::new();
    for map_task in 0..n_map {
        let key = BucketKey::new(job, map_task, reduce);
        if let Some(mut found) = store.get(&key)? {
            trace!("{}: {} records", key.name(), found.len());
            records.append(&mut found);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_convention() {
        assert_eq!(intermediate_name("wc", 0, 1), "mrtmp.wc-0-1");
        assert_eq!(BucketKey::new("wc", 12, 3).name(), "mrtmp.wc-12-3");
    }

    #[test]
    fn names_parse_back() {
        for key in [
            BucketKey::new("wc", 0, 0),
            BucketKey::new("my-job-7", 3, 11),
            BucketKey::new("a.b", 4294967295, 2),
        ] {
            assert_eq!(parse_intermediate_name(&key.name()), Some(key));
        }
    }

    #[test]
    fn dashed_job_names_do_not_collide() {
        let a = BucketKey::new("x-1", 2, 3);
        let b = BucketKey::new("x", 12, 3);
        let c = BucketKey::new("x-1-2", 3, 0);
        assert_ne!(a.name(), b.name());
        assert_ne!(a.name(), c.name());
        assert_eq!(parse_intermediate_name(&a.name()), Some(a));
    }

    #[test]
    fn foreign_names_are_rejected() {
        for name in [
            "mr-out-0",
            "mrtmp.wc-0",
            "mrtmp.-0-1",
            "mrtmp.wc-a-1",
            "mrtmp.wc-+1-2",
            "mrtmp.wc-01-2",
            ".mrtmp.wc-0-1.tmp",
        ] {
            assert_eq!(parse_intermediate_name(name), None, "{name}");
        }
    }

    #[test]
    fn job_names_are_validated() {
        assert!(validate_job_name("wc").is_ok());
        assert!(validate_job_name("job-1.v2").is_ok());
        for bad in ["", "../etc", "a/b", "a\\b", "nul\0"] {
            let err = validate_job_name(bad).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::InvalidTask);
        }
    }
}
