//! Object store upload client
//!
//! Thin collaborator for the optional upload stage: PUT the file to
//! `<endpoint>/<bucket>/<basename>`, carrying the content MD5 as object
//! metadata so the remote side can verify integrity. Retry policy is out
//! of scope by design; a failed upload leaves the file in place.

use crate::checksum;
use crate::error::UploadError;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(300);
const WRITE_TIMEOUT: Duration = Duration::from_secs(300);

/// What the endpoint reported about a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInfo {
    /// Object key within the bucket
    pub key: String,

    /// Bytes uploaded
    pub size: u64,

    /// Entity tag reported by the endpoint, empty if absent
    pub etag: String,
}

/// Upload collaborator invoked by the file processor for validated files
pub trait Uploader: Send + Sync {
    fn upload(&self, file: &Path) -> Result<UploadInfo, UploadError>;
}

/// HTTP object store client
pub struct HttpUploader {
    agent: ureq::Agent,
    endpoint: String,
    bucket: String,
    token: Option<String>,
}

impl HttpUploader {
    /// Create a client for the configured endpoint
    pub fn new(endpoint: &str, bucket: &str, token: Option<&str>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .build();
        Self {
            agent,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            token: token.map(str::to_string),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

impl Uploader for HttpUploader {
    fn upload(&self, file: &Path) -> Result<UploadInfo, UploadError> {
        let key = file
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| UploadError::InvalidKey { path: file.into() })?
            .to_string();

        // The MD5 travels as metadata so the store can verify content
        let digest = checksum::md5_hex(file)?;
        let size = fs::metadata(file)?.len();
        let reader = File::open(file)?;

        debug!(key = %key, size, "uploading object");

        let mut request = self
            .agent
            .put(&self.object_url(&key))
            .set("Content-Length", &size.to_string())
            .set("x-amz-meta-md5", &digest);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let response = request.send(reader).map_err(|err| match err {
            ureq::Error::Status(status, _) => UploadError::Rejected {
                key: key.clone(),
                status,
            },
            transport => UploadError::Transport(Box::new(transport)),
        })?;

        let etag = response
            .header("ETag")
            .map(|etag| etag.trim_matches('"').to_string())
            .unwrap_or_default();

        Ok(UploadInfo { key, size, etag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_joining() {
        let uploader = HttpUploader::new("https://store.example.org/", "crawls", None);
        assert_eq!(
            uploader.object_url("a.warc.gz"),
            "https://store.example.org/crawls/a.warc.gz"
        );
    }

    #[test]
    fn test_upload_missing_file_is_io_error() {
        let uploader = HttpUploader::new("https://store.example.org", "crawls", None);
        let err = uploader.upload(Path::new("/nonexistent/a.warc.gz")).unwrap_err();
        assert!(matches!(err, UploadError::Io(_)));
    }
}
