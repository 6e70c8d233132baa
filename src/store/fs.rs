use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, trace};
use uuid::Uuid;

use super::{parse_intermediate_name, BucketKey, IntermediateStore, INTERMEDIATE_PREFIX};
use crate::codec;
use crate::error::{Error, Result};
use crate::KeyValue;

/// Intermediate files in one directory of a local or shared filesystem.
///
/// Files are first written to a hidden, uniquely named sibling and renamed
/// into place once flushed, so a half-written bucket is never visible under
/// its real name.
#[derive(Clone, Debug)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of the intermediate file for `key`.
    pub fn path_for(&self, key: &BucketKey) -> PathBuf {
        self.dir.join(key.name())
    }

    fn temp_path_for(&self, key: &BucketKey) -> PathBuf {
        self.dir.join(format!(".{}.{}.tmp", key.name(), Uuid::new_v4()))
    }
}

fn write_then_rename(tmp: &Path, dest: &Path, records: &[KeyValue]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(tmp)?);
    codec::write_records(&mut writer, records)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    // the file is closed here, before it becomes visible
    drop(file);
    fs::rename(tmp, dest)
}

impl IntermediateStore for FsStore {
    fn put(&mut self, key: &BucketKey, records: &[KeyValue]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let dest = self.path_for(key);
        let tmp = self.temp_path_for(key);
        trace!("writing {} records to {}", records.len(), tmp.display());

        let result = write_then_rename(&tmp, &dest, records);
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        } else {
            debug!("published {}", dest.display());
        }
        result
    }

    fn get(&self, key: &BucketKey) -> Result<Option<Vec<KeyValue>>> {
        let name = key.name();
        let file = match File::open(self.path_for(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::Unreadable { name, source }),
        };
        let records = codec::reader(BufReader::new(file))
            .collect::<serde_json::Result<Vec<_>>>()
            .map_err(|source| Error::Decode { name, source })?;
        Ok(Some(records))
    }

    fn keys(&self, job: &str) -> Result<Vec<BucketKey>> {
        let unreadable = |source: io::Error| Error::Unreadable {
            name: self.dir.display().to_string(),
            source,
        };
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(unreadable(e)),
        };

        let pattern = Pattern::new(&format!(
            "{}{}-*-*",
            Pattern::escape(INTERMEDIATE_PREFIX),
            Pattern::escape(job)
        ))
        .map_err(|e| unreadable(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(unreadable)?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !pattern.matches(name) {
                continue;
            }
            // "job-*-*" also matches files of "job-<n>", so check the parse
            if let Some(key) = parse_intermediate_name(name).filter(|k| k.job == job) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}
