//! Output destinations for the final result set.

use crate::error::{ExtractError, Result};
use crate::results::ResultSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Consumes a finished [`ResultSet`]
pub trait ResultSink {
    /// Persist every location; returns how many lines were written
    fn write(&mut self, results: &ResultSet) -> Result<usize>;
}

/// Where the URL list goes. `-` means standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

impl OutputTarget {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path == Path::new("-") {
            Self::Stdout
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

/// Writes one location per line, no header.
///
/// File output is all-or-nothing: lines go to `<path>.tmp`, which is renamed over the
/// destination only after everything was flushed.
#[derive(Debug, Clone)]
pub struct LineSink {
    target: OutputTarget,
    sorted: bool,
}

impl LineSink {
    pub fn new(target: OutputTarget) -> Self {
        Self {
            target,
            sorted: false,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self::new(OutputTarget::from_path(path))
    }

    /// Emit lines in lexicographic order instead of set order
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    pub fn target(&self) -> &OutputTarget {
        &self.target
    }
}

impl ResultSink for LineSink {
    fn write(&mut self, results: &ResultSet) -> Result<usize> {
        match &self.target {
            OutputTarget::Stdout => {
                let stdout = io::stdout();
                write_lines(stdout.lock(), results, self.sorted)
                    .map_err(|err| ExtractError::sink_unavailable("<stdout>", err))
            }
            OutputTarget::File(path) => write_file_atomically(path, results, self.sorted)
                .map_err(|err| ExtractError::sink_unavailable(path, err)),
        }
    }
}

/// Write `results` to `writer`, one location per line
pub fn write_lines<W: Write>(mut writer: W, results: &ResultSet, sorted: bool) -> io::Result<usize> {
    let mut count = 0;
    if sorted {
        for location in results.sorted() {
            writeln!(writer, "{location}")?;
            count += 1;
        }
    } else {
        for location in results.iter() {
            writeln!(writer, "{location}")?;
            count += 1;
        }
    }
    writer.flush()?;
    Ok(count)
}

fn write_file_atomically(path: &Path, results: &ResultSet, sorted: bool) -> io::Result<usize> {
    let tmp = tmp_path(path);
    let written = write_then_rename(&tmp, path, results, sorted);
    if written.is_err() {
        if let Err(err) = fs::remove_file(&tmp) {
            if err.kind() != io::ErrorKind::NotFound {
                log::warn!("Failed to remove {}: {err}", tmp.display());
            }
        }
    }
    written
}

fn write_then_rename(tmp: &Path, path: &Path, results: &ResultSet, sorted: bool) -> io::Result<usize> {
    let mut writer = BufWriter::new(File::create(tmp)?);
    let count = write_lines(&mut writer, results, sorted)?;
    let file = writer.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    fs::rename(tmp, path)?;
    Ok(count)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
