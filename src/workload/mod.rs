//! Converts MapReduce application names to map functions.
//!
//! # Example
//!
//! To get the word count application:
//! ```
//! # use anyhow::Result;
//! use mrlite::workload;
//! # fn main() -> Result<()> {
//! let wc = workload::named("wc", &[])?;
//! let pairs = wc("shard", &bytes::Bytes::from_static(b"a b a"));
//! assert_eq!(pairs.len(), 3);
//! # Ok(())
//! # }
//! ```

use crate::KeyValue;
use anyhow::{bail, Result};
use bytes::Bytes;
use clap::Parser;

pub mod grep;
pub mod wc;

/// A map function picked at runtime by name.
pub type NamedMapFn = Box<dyn Fn(&str, &Bytes) -> Vec<KeyValue>>;

/// Names accepted by [`named`].
pub const WORKLOADS: &[&str] = &["wc", "grep"];

/// Gets the map function of the workload named `name`, configured with the
/// auxiliary arguments `args`.
///
/// Returns an [`anyhow::Error`] if no application with the given name was
/// found or its arguments do not parse.
pub fn named(name: &str, args: &[String]) -> Result<NamedMapFn> {
    match name {
        "wc" => Ok(Box::new(wc::map)),
        "grep" => {
            let args = grep::Args::try_parse_from(args)?;
            Ok(Box::new(move |shard: &str, contents: &Bytes| {
                grep::map(shard, contents, &args.term)
            }))
        }
        _ => bail!("No app named `{}` found (known: {}).", name, WORKLOADS.join(", ")),
    }
}
