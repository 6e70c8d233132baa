use anyhow::*;
use clap::Parser;
use mrlite::standalone::{Args, Commands, EmptyBuckets, MapTask, MapTaskOptions};
use mrlite::store::{read_bucket, FsStore};
use mrlite::*;
use standalone::engine::run_map_task;
use std::io::{self, BufWriter, Write};
use std::path::Path;

fn run_map(
    task: MapTask,
    workload_name: &str,
    args: &[String],
    dir: &Path,
    options: MapTaskOptions,
) -> Result<()> {
    let map_fn = workload::named(workload_name, args)?;
    let mut store = FsStore::new(dir);
    let report = run_map_task(&mut store, &task, map_fn, options)
        .with_context(|| format!("map task {} of job {} failed", task.map_task, task.job))?;
    for key in &report.written {
        println!("{}", store.path_for(key).display());
    }
    Ok(())
}

fn dump(job: &str, n_map: u32, reduce: u32, dir: &Path) -> Result<()> {
    let store = FsStore::new(dir);
    let records = read_bucket(&store, job, n_map, reduce)?;
    let mut out = BufWriter::new(io::stdout().lock());
    codec::write_records(&mut out, &records)?;
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    utils::init_tracing();
    let args = Args::parse();
    match args.command {
        Commands::Map {
            job,
            map_task,
            input,
            n_reduce,
            workload,
            dir,
            write_empty,
            args,
        } => {
            let options = MapTaskOptions {
                empty_buckets: if write_empty {
                    EmptyBuckets::Write
                } else {
                    EmptyBuckets::Skip
                },
            };
            let task = MapTask::new(job, map_task, input, n_reduce);
            run_map(task, &workload, &args, &dir, options)
        }
        Commands::Dump {
            job,
            n_map,
            reduce,
            dir,
        } => dump(&job, n_map, reduce, &dir),
    }
}
