//! Writing the finished report to disk.

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::ReportError;

/// File name used for every report written by the tool.
pub const DEFAULT_FILE_NAME: &str = "Research_Statistics_Report.pdf";

/// `<system temp dir>/Research_Statistics_Report.pdf`.
pub fn default_output_path() -> PathBuf {
    env::temp_dir().join(DEFAULT_FILE_NAME)
}

/// Writes `bytes` to `path` atomically and returns the absolute path written.
///
/// The data goes to a temporary file in the destination directory first, which
/// is renamed over `path` once complete. On failure the temporary file is
/// removed and any existing file at `path` is left untouched.
pub fn write_report(bytes: &[u8], path: &Path) -> Result<PathBuf, ReportError> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    let directory = path.parent().unwrap_or_else(|| Path::new("."));

    let mut file = NamedTempFile::new_in(directory)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(&path)?;

    log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}
