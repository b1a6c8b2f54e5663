//! Temporary files backing config downloads
//!
//! A generated config is written to a uniquely named file and streamed as the
//! response body. The file belongs to the body: it is removed when the body is
//! dropped, which happens both after the last byte is sent and when the client
//! goes away mid-stream.

use axum::{
    body::{Body, BodyDataStream, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use futures::Stream;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tempfile::TempPath;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

const ARTIFACT_PREFIX: &str = "piagen-";
const ARTIFACT_SUFFIX: &str = ".conf";

/// Errors raised while materialising or serving an artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to create temporary file: {0}")]
    Create(#[source] io::Error),

    #[error("Failed to write temporary file: {0}")]
    Write(#[source] io::Error),

    #[error("Failed to open temporary file: {0}")]
    Open(#[source] io::Error),

    #[error("Failed to build download response: {0}")]
    Response(String),
}

/// A config file on disk, deleted when dropped
#[derive(Debug)]
pub struct TemporaryArtifact {
    path: PathBuf,
    guard: Option<TempPath>,
}

impl TemporaryArtifact {
    /// Create a unique file in `dir` holding `content`
    ///
    /// If writing fails the partially written file is removed before
    /// returning the error.
    pub fn create_in(dir: &Path, content: &str) -> Result<Self, ArtifactError> {
        let mut file = tempfile::Builder::new()
            .prefix(ARTIFACT_PREFIX)
            .suffix(ARTIFACT_SUFFIX)
            .tempfile_in(dir)
            .map_err(ArtifactError::Create)?;

        file.write_all(content.as_bytes())
            .map_err(ArtifactError::Write)?;
        file.flush().map_err(ArtifactError::Write)?;

        let guard = file.into_temp_path();
        let path = guard.to_path_buf();
        debug!("Created temp file: {}", path.display());

        Ok(Self {
            path,
            guard: Some(guard),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TemporaryArtifact {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };

        match guard.close() {
            Ok(()) => debug!("Cleaned up temp file: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Temp file already gone: {}", self.path.display())
            }
            Err(e) => error!("Failed to cleanup temp file {}: {}", self.path.display(), e),
        }
    }
}

/// Response body stream that keeps its artifact alive until dropped
struct ArtifactStream {
    inner: BodyDataStream,
    _artifact: TemporaryArtifact,
}

impl Stream for ArtifactStream {
    type Item = Result<Bytes, axum::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

/// Tie `artifact` to the lifetime of the response body
pub fn attach(response: Response, artifact: TemporaryArtifact) -> Response {
    let (parts, body) = response.into_parts();
    let stream = ArtifactStream {
        inner: body.into_data_stream(),
        _artifact: artifact,
    };
    Response::from_parts(parts, Body::from_stream(stream))
}

/// Write `content` to a temporary artifact in `dir` and build a response from it
///
/// `run` receives the artifact path. The artifact is released when the
/// returned response body is dropped, or immediately if `run` fails.
pub async fn with_artifact<F, Fut>(
    dir: &Path,
    content: &str,
    run: F,
) -> Result<Response, ArtifactError>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = Result<Response, ArtifactError>>,
{
    let artifact = TemporaryArtifact::create_in(dir, content)?;
    let response = run(artifact.path().to_path_buf()).await?;
    Ok(attach(response, artifact))
}

/// Stream the file at `path` as a plain text attachment named `filename`
pub async fn file_download(path: &Path, filename: &str) -> Result<Response, ArtifactError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(ArtifactError::Open)?;
    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .header(header::CONTENT_DISPOSITION, content_disposition(filename))
        .body(body)
        .map_err(|e| ArtifactError::Response(e.to_string()))
}

/// `attachment; filename="<filename>"`
///
/// Names that are not plain ASCII get an ASCII-only `filename` plus an RFC
/// 5987 `filename*` carrying the full UTF-8 name.
fn content_disposition(filename: &str) -> HeaderValue {
    let ascii: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .filter(|c| *c != '"' && *c != '\\')
        .collect();

    let value = if ascii == filename {
        format!("attachment; filename=\"{}\"", ascii)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii,
            percent_encode(filename)
        )
    };

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Percent-encode everything outside the RFC 5987 `attr-char` set
fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
