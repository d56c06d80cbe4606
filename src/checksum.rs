//! Content checksums and sidecar files
//!
//! Each ingested file gets an MD5 checksum sidecar written next to it
//! before relocation. The sidecar content follows the `md5sum -b` layout
//! so stock tooling can verify relocated files:
//!
//! ```text
//! <hex digest> *<basename>\n
//! ```

use crate::error::{ProcessError, ProcessResult};
use md5::{Digest, Md5};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Suffix appended to a file name to form its sidecar name
pub const SIDECAR_SUFFIX: &str = ".md5";

/// Separator between digest and basename inside a sidecar
const SEPARATOR: &str = " *";

/// Compute the MD5 checksum of a file, hex encoded
///
/// Streams the file through the hasher, so arbitrarily large archive
/// files do not get buffered in memory.
pub fn md5_hex(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Md5::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Path of the sidecar belonging to `file`
pub fn sidecar_path(file: &Path) -> PathBuf {
    let mut name = file
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    name.push(SIDECAR_SUFFIX);
    file.with_file_name(name)
}

/// Write the checksum sidecar for `file` next to it
///
/// Returns the path of the created sidecar. An empty digest is caller
/// misuse and gets `ProcessError::EmptyDigest` instead of producing a
/// sidecar that verifies nothing.
pub fn write_sidecar(file: &Path, digest: &str) -> ProcessResult<PathBuf> {
    if digest.is_empty() {
        return Err(ProcessError::EmptyDigest);
    }

    let basename = file
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| ProcessError::InvalidFileName { path: file.into() })?;

    let sidecar = sidecar_path(file);
    let content = format!("{digest}{SEPARATOR}{basename}\n");

    fs::write(&sidecar, content).map_err(|source| ProcessError::SidecarWrite {
        path: sidecar.clone(),
        source,
    })?;

    Ok(sidecar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_md5_known_vector() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("sample");
        fs::write(&file, "Test string").unwrap();

        let digest = md5_hex(&file).unwrap();
        assert_eq!(digest, "0fd3dbec9730101bff92acc820befc34");
    }

    #[test]
    fn test_md5_is_deterministic() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("data.bin");
        fs::write(&file, vec![0xABu8; 256 * 1024]).unwrap();

        assert_eq!(md5_hex(&file).unwrap(), md5_hex(&file).unwrap());
    }

    #[test]
    fn test_md5_missing_file() {
        let dir = tempdir().unwrap();
        assert!(md5_hex(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_sidecar_path() {
        let sidecar = sidecar_path(Path::new("/staging/a.warc.gz"));
        assert_eq!(sidecar, Path::new("/staging/a.warc.gz.md5"));
    }

    #[test]
    fn test_write_sidecar_content() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("sample");
        fs::write(&file, "Test string").unwrap();

        let sidecar = write_sidecar(&file, "0fd3dbec9730101bff92acc820befc34").unwrap();
        let content = fs::read_to_string(&sidecar).unwrap();
        assert_eq!(content, "0fd3dbec9730101bff92acc820befc34 *sample\n");
    }

    #[test]
    fn test_write_sidecar_rejects_empty_digest() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("sample");
        fs::write(&file, "Test string").unwrap();

        let err = write_sidecar(&file, "").unwrap_err();
        assert!(matches!(err, ProcessError::EmptyDigest));
        assert!(!sidecar_path(&file).exists());
    }

    #[test]
    fn test_write_sidecar_overwrites_stale_sidecar() {
        // A crash between sidecar write and relocation leaves a stale
        // sidecar behind; the next pass must simply replace it.
        let dir = tempdir().unwrap();
        let file = dir.path().join("sample");
        fs::write(&file, "Test string").unwrap();
        fs::write(sidecar_path(&file), "stale *sample\n").unwrap();

        let sidecar = write_sidecar(&file, "0fd3dbec9730101bff92acc820befc34").unwrap();
        let content = fs::read_to_string(&sidecar).unwrap();
        assert_eq!(content, "0fd3dbec9730101bff92acc820befc34 *sample\n");
    }
}
