//! Structural WARC validation
//!
//! Walks the record chain of a WARC file (plain or gzip-compressed) and
//! checks that every record is well formed: a `WARC/` version line, a
//! syntactically sound header block with a parseable `Content-Length`,
//! a body of exactly that many bytes, and the CRLF CRLF record boundary.
//!
//! A structural problem is a verdict (`Ok(false)`), not an error; only a
//! failure to open the file at all surfaces as `Err`. Read errors in the
//! middle of the stream count as structural problems too, since a
//! truncated gzip member is indistinguishable from a truncated record.

use crate::error::ValidateError;
use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Validator collaborator invoked by the file processor
///
/// `scratch_dir` is a caller-provided location for any temporary
/// buffering an implementation needs; the streaming WARC validator does
/// not use it.
pub trait Validate: Send + Sync {
    fn validate(&self, file: &Path, scratch_dir: &Path) -> Result<bool, ValidateError>;
}

/// Streaming structural validator for WARC files
#[derive(Debug, Default, Clone, Copy)]
pub struct WarcValidator;

impl Validate for WarcValidator {
    fn validate(&self, file: &Path, _scratch_dir: &Path) -> Result<bool, ValidateError> {
        let file = File::open(file)?;
        let mut reader = BufReader::new(file);

        // Sniff the magic without consuming it; the crawler sometimes
        // delivers uncompressed WARCs despite the .gz name.
        let gzipped = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

        let verdict = if gzipped {
            read_records(BufReader::new(MultiGzDecoder::new(reader)))
        } else {
            read_records(reader)
        };

        // Mid-stream failures are a verdict, not an error: the file is
        // structurally bad and belongs in the invalid tree.
        Ok(verdict.unwrap_or(false))
    }
}

/// Read records until EOF; Ok(true) iff at least one well-formed record
/// was found and nothing after it was malformed
fn read_records<R: BufRead>(mut reader: R) -> std::io::Result<bool> {
    let mut saw_record = false;
    loop {
        let Some(version) = read_header_line(&mut reader)? else {
            // Clean EOF between records
            return Ok(saw_record);
        };
        if !version.starts_with("WARC/") {
            return Ok(false);
        }

        let Some(content_length) = read_header_block(&mut reader)? else {
            return Ok(false);
        };

        // Skip the body, then expect the record boundary
        let copied = std::io::copy(
            &mut reader.by_ref().take(content_length),
            &mut std::io::sink(),
        )?;
        if copied != content_length {
            return Ok(false);
        }
        let mut boundary = [0u8; 4];
        if reader.read_exact(&mut boundary).is_err() || boundary != *b"\r\n\r\n" {
            return Ok(false);
        }

        saw_record = true;
    }
}

/// Read one CRLF-terminated line; None on clean EOF
fn read_header_line<R: BufRead>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Read the header block of one record up to its blank line
///
/// Returns the parsed Content-Length, or None when the block is
/// malformed (truncated, non-header line, or missing/bad Content-Length).
fn read_header_block<R: BufRead>(reader: &mut R) -> std::io::Result<Option<u64>> {
    let mut content_length = None;
    loop {
        let Some(line) = read_header_line(reader)? else {
            // EOF inside a header block means truncation
            return Ok(None);
        };
        if line.is_empty() {
            return Ok(content_length);
        }

        let Some((name, value)) = line.split_once(':') else {
            return Ok(None);
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            match value.trim().parse::<u64>() {
                Ok(length) => content_length = Some(length),
                Err(_) => return Ok(None),
            }
        }
    }
}
