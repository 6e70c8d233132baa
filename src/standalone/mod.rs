use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod engine;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one map task and write its intermediate files
    Map {
        /// Name shared by every task of the job
        #[arg(short, long)]
        job: String,

        /// Index of this map task within the job
        #[arg(short, long)]
        map_task: u32,

        /// Input shard to read
        #[arg(short, long)]
        input: PathBuf,

        /// Number of reduce tasks (0 if there is no reduce phase)
        #[arg(short, long)]
        n_reduce: u32,

        // Name of the workload
        #[arg(short, long)]
        workload: String,

        /// Directory holding intermediate files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Also write a file for buckets that received no pairs
        #[arg(long)]
        write_empty: bool,

        /// Auxiliary arguments to pass to the MapReduce application.
        #[clap(value_parser, last = true)]
        args: Vec<String>,
    },
    /// Print every intermediate record of a job destined for one reduce task
    Dump {
        /// Name shared by every task of the job
        #[arg(short, long)]
        job: String,

        /// Number of map tasks in the job
        #[arg(short = 'm', long)]
        n_map: u32,

        /// Reduce bucket to read
        #[arg(short, long)]
        reduce: u32,

        /// Directory holding intermediate files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

/// Everything a map task needs to know, as handed out by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTask {
    pub job: String,
    pub map_task: u32,
    pub input: PathBuf,
    pub n_reduce: u32,
}

impl MapTask {
    pub fn new(
        job: impl Into<String>,
        map_task: u32,
        input: impl Into<PathBuf>,
        n_reduce: u32,
    ) -> Self {
        Self {
            job: job.into(),
            map_task,
            input: input.into(),
            n_reduce,
        }
    }

    /// The name the map function sees for this task's shard.
    pub fn shard_name(&self) -> String {
        self.input.to_string_lossy().into_owned()
    }
}

/// What to do with reduce buckets that received no pairs.
///
/// Reduce tasks treat a missing intermediate file as an empty one, so both
/// choices are read back identically.
///
/// `Skip` assumes a job name is not reused: a bucket that is empty in the
/// new run keeps the file an earlier run of the same name left for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyBuckets {
    /// Write nothing for them.
    #[default]
    Skip,
    /// Write an empty file for every bucket in `0..n_reduce`.
    Write,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MapTaskOptions {
    pub empty_buckets: EmptyBuckets,
}

/// Outcome of a successful map task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTaskReport {
    /// Number of pairs the map function emitted.
    pub pairs: usize,
    /// Intermediate files written, in bucket order.
    pub written: Vec<crate::store::BucketKey>,
}
