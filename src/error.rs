use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure category of a map task, for callers deciding what to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input shard could not be read. Nothing was written.
    InputUnavailable,
    /// An intermediate file could not be written. Earlier buckets of the same
    /// attempt may exist; rerunning the task overwrites them.
    OutputUnwritable,
    /// The task descriptor was rejected before any I/O.
    InvalidTask,
    /// An intermediate file exists but cannot be read back.
    IntermediateUnreadable,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read input shard {}", path.display())]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write intermediate file {name} for bucket {bucket}")]
    OutputUnwritable {
        name: String,
        bucket: u32,
        #[source]
        source: io::Error,
    },

    #[error("invalid job name {job:?}: must be non-empty and free of path separators")]
    InvalidJobName { job: String },

    #[error("cannot read intermediate file {name}")]
    Unreadable {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed record in intermediate file {name}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InputUnavailable { .. } => ErrorKind::InputUnavailable,
            Error::OutputUnwritable { .. } => ErrorKind::OutputUnwritable,
            Error::InvalidJobName { .. } => ErrorKind::InvalidTask,
            Error::Unreadable { .. } | Error::Decode { .. } => {
                ErrorKind::IntermediateUnreadable
            }
        }
    }

    /// Whether rerunning the whole task may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InputUnavailable | ErrorKind::OutputUnwritable
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_retryability() {
        let input = Error::InputUnavailable {
            path: PathBuf::from("in.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(input.kind(), ErrorKind::InputUnavailable);
        assert!(input.is_retryable());
        assert_eq!(input.to_string(), "cannot read input shard in.txt");

        let output = Error::OutputUnwritable {
            name: "mrtmp.wc-0-1".to_string(),
            bucket: 1,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "ro"),
        };
        assert_eq!(output.kind(), ErrorKind::OutputUnwritable);
        assert!(output.is_retryable());

        let job = Error::InvalidJobName { job: String::new() };
        assert_eq!(job.kind(), ErrorKind::InvalidTask);
        assert!(!job.is_retryable());
    }
}
