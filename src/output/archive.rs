// src/output/archive.rs
// =============================================================================
// Content-addressed archive of unique snapshot bodies.
//
// Every unique body becomes one file named by the hex SHA-1 of its bytes:
//
//   <dir>/a9993e364706816aba3e25717850c26c9cd0d89d
//
// Because the name is derived from the content, running the tool twice over
// the same responses rewrites the same files with the same bytes.
//
// Files are written to a temp file in the same directory and renamed into
// place, so a crash never leaves a half-written body under a hash name.
// =============================================================================

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

use super::OutputError;
use crate::dedup::ContentHash;

/// Writes unique bodies into one directory.
#[derive(Debug)]
pub struct ArchiveWriter {
    dir: PathBuf,
}

impl ArchiveWriter {
    /// Creates the target directory if needed and checks it is usable.
    pub fn create(dir: PathBuf) -> Result<Self, OutputError> {
        ensure_output_dir(&dir)?;
        Ok(Self { dir })
    }

    /// Persists one body under its hash and returns the final path.
    pub fn write(&self, hash: &ContentHash, body: &[u8]) -> Result<PathBuf, OutputError> {
        let target = self.dir.join(hash.to_hex());
        let file_error = |source: std::io::Error| OutputError::File {
            path: target.clone(),
            source,
        };

        // NamedTempFile is created 0600 on unix, and rename keeps the mode
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(file_error)?;
        tmp.write_all(body).map_err(file_error)?;
        tmp.flush().map_err(file_error)?;
        tmp.persist(&target).map_err(|e| file_error(e.error))?;

        debug!("Wrote {} byte(s) to {}", body.len(), target.display());
        Ok(target)
    }
}

fn ensure_output_dir(dir: &Path) -> Result<(), OutputError> {
    let dir_error = |source: std::io::Error| OutputError::OutputDir {
        path: dir.to_path_buf(),
        source,
    };

    if dir.exists() {
        let meta = fs::metadata(dir).map_err(dir_error)?;
        if !meta.is_dir() {
            return Err(dir_error(std::io::Error::new(
                std::io::ErrorKind::Other,
                "path exists and is not a directory",
            )));
        }
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(dir_error)
}
