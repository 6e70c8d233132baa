//! A MapReduce-compatible implementation of `grep`.
//!

use crate::*;
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(no_binary_name = true)]
pub struct Args {
    #[clap(short, long, value_parser)]
    pub term: String,
}

/// Emits `(shard, "<line number>:<line>")` for each line containing `term`.
pub fn map(shard: &str, contents: &Bytes, term: &str) -> Vec<KeyValue> {
    let s = String::from_utf8_lossy(contents);
    s.lines()
        .enumerate()
        .filter(|(_, line)| line.contains(term))
        .map(|(i, line)| KeyValue::new(shard.to_string(), format!("{}:{}", i + 1, line)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_lines_with_numbers() {
        let contents = Bytes::from_static(b"alpha\nbeta\nalphabet\n");
        assert_eq!(
            map("in.txt", &contents, "alpha"),
            vec![
                KeyValue::new("in.txt", "1:alpha"),
                KeyValue::new("in.txt", "3:alphabet"),
            ]
        );
    }

    #[test]
    fn args_parse_without_binary_name() {
        let args = Args::try_parse_from(["--term", "x"]).unwrap();
        assert_eq!(args.term, "x");
    }
}
