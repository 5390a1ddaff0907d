//! Small filesystem helpers shared by the index and metadata writers.
//!
//! Writes go through a `<name>.tmp` sibling in two steps: [`stage`] fully
//! writes and flushes the temp file, [`StagedFile::commit`] renames it over
//! the target. Callers publishing several files stage all of them before
//! committing any.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use crate::errors::RagError;

/// `<path>.tmp` next to the target, so the final rename stays on one filesystem.
fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// A fully written temp file waiting to replace `target`.
///
/// Dropping it without [`commit`](StagedFile::commit) removes the temp file.
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Renames the temp file over the target.
    pub fn commit(mut self) -> Result<(), RagError> {
        fs::rename(&self.tmp, &self.target)?;
        self.committed = true;
        trace!("io_util::commit target={:?}", self.target);
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_file(&self.tmp) {
                warn!("could not remove staged file {:?}: {}", self.tmp, e);
            }
        }
    }
}

/// Writes the temp sibling of `path` without touching `path` itself.
///
/// Parent directories are created. On error nothing is left behind.
pub fn stage<F>(path: &Path, write: F) -> Result<StagedFile, RagError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), RagError>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_sibling(path);
    trace!("io_util::stage tmp={:?} target={:?}", tmp, path);

    let file = File::create(&tmp)?;
    let staged = StagedFile {
        tmp,
        target: path.to_path_buf(),
        committed: false,
    };
    let mut w = BufWriter::new(file);
    write(&mut w)?;
    w.flush()?;
    drop(w);

    Ok(staged)
}
