//! Decompressed byte streams over index files.

use crate::error::{ExtractError, Result};
use flate2::bufread::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Read buffer for both the raw file and the decompressed stream
const BUFFER_SIZE: usize = 256 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// How the input bytes are encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Sniff the gzip magic bytes
    #[default]
    Auto,
    Gzip,
    Plain,
}

/// Where the index comes from. `-` means standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteSource {
    File(PathBuf),
    Stdin,
}

impl ByteSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path == Path::new("-") {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }

    /// Display name used in logs and errors
    pub fn name(&self) -> PathBuf {
        match self {
            Self::File(path) => path.clone(),
            Self::Stdin => PathBuf::from("<stdin>"),
        }
    }

    /// Open the source and return a buffered reader of decompressed JSON bytes.
    ///
    /// Failing to open the file or to read a valid gzip header is
    /// [`ExtractError::SourceUnavailable`]. Corruption further into the stream shows up
    /// later as read errors from the returned reader, reported as
    /// [`ExtractError::SourceCorrupt`].
    pub fn open(&self, compression: Compression) -> Result<Box<dyn BufRead>> {
        let raw: Box<dyn BufRead> = match self {
            Self::File(path) => {
                let file =
                    File::open(path).map_err(|err| ExtractError::source_unavailable(path, err))?;
                Box::new(BufReader::with_capacity(BUFFER_SIZE, file))
            }
            Self::Stdin => Box::new(BufReader::with_capacity(BUFFER_SIZE, io::stdin())),
        };
        decode(raw, compression).map_err(|err| ExtractError::source_unavailable(self.name(), err))
    }
}

/// Wrap `raw` in a gzip decoder when needed
pub fn decode<R: BufRead + 'static>(
    mut raw: R,
    compression: Compression,
) -> io::Result<Box<dyn BufRead>> {
    let has_magic = raw.fill_buf()?.starts_with(&GZIP_MAGIC);
    let gzip = match compression {
        Compression::Gzip if !has_magic => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "input is not a gzip stream",
            ));
        }
        Compression::Gzip => true,
        Compression::Plain => false,
        Compression::Auto => has_magic,
    };
    if !gzip {
        return Ok(Box::new(raw));
    }

    let mut decoded = BufReader::with_capacity(BUFFER_SIZE, MultiGzDecoder::new(raw));
    // The decoder parses the member header on first read
    decoded.fill_buf()?;
    log::debug!("Reading gzip-compressed input");
    Ok(Box::new(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::{Read, Write};

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn read_all(mut reader: Box<dyn BufRead>) -> String {
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn auto_detects_gzip_and_plain() {
        let packed = gzip(br#"{"a": 1}"#);
        let reader = decode(io::Cursor::new(packed), Compression::Auto).unwrap();
        assert_eq!(read_all(reader), r#"{"a": 1}"#);

        let reader = decode(io::Cursor::new(b"{}".to_vec()), Compression::Auto).unwrap();
        assert_eq!(read_all(reader), "{}");
    }

    #[test]
    fn forced_gzip_rejects_plain_bytes() {
        let err = decode(io::Cursor::new(b"{}".to_vec()), Compression::Gzip)
            .err()
            .expect("plain bytes are not gzip");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn corrupt_gzip_header_fails_at_open() {
        let mut packed = gzip(b"{}");
        // compression method byte
        packed[2] = 0;
        let err = decode(io::Cursor::new(packed.clone()), Compression::Auto)
            .err()
            .expect("bad header");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json.gz");
        std::fs::write(&path, packed).unwrap();
        let err = ByteSource::from_path(&path)
            .open(Compression::Gzip)
            .err()
            .expect("bad header");
        assert!(matches!(err, ExtractError::SourceUnavailable { .. }));
    }

    #[test]
    fn reads_concatenated_members() {
        let mut packed = gzip(br#"{"a": "#);
        packed.extend(gzip(b"[1, 2]}"));
        let reader = decode(io::Cursor::new(packed), Compression::Gzip).unwrap();
        assert_eq!(read_all(reader), r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = ByteSource::from_path(dir.path().join("missing.json.gz"));
        let err = source.open(Compression::Auto).err().expect("missing file");
        assert!(matches!(err, ExtractError::SourceUnavailable { .. }));
    }

    #[test]
    fn dash_means_stdin() {
        assert_eq!(ByteSource::from_path("-"), ByteSource::Stdin);
        assert_eq!(ByteSource::Stdin.name(), PathBuf::from("<stdin>"));
    }
}
