//! JSON-lines front-end: one request per input line, one result per output
//! line.
//!
//! Input lines are serialized [`Request`]s:
//!
//! ```text
//! {"type": "read", "path": "/users/andy123"}
//! {"type": "action", "path": "/email", "action": "send", "content": {...}}
//! ```
//!
//! Output lines are `{"ok": <response>}` or `{"error": {code, reason, message}}`.
//! Blank lines and lines starting with `#` are skipped.
//!
//! [`list_resources`] writes the documents of a collection instead, one per
//! line, without reading any input.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crest_core::{Connection, Context, Request, ResourceError, Response};

#[derive(thiserror::Error, Debug)]
pub enum FrontendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Resource(#[from] ResourceError),
}

/// Counts of handled lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontendStats {
    pub succeeded: usize,
    pub failed: usize,
}

/// Render a request outcome as an output line value.
pub fn render(result: &Result<Response, ResourceError>) -> Result<Value, FrontendError> {
    Ok(match result {
        Ok(response) => json!({"ok": serde_json::to_value(response)?}),
        Err(e) => json!({"error": e.to_json()}),
    })
}

fn parse_line(line: &str) -> Result<Request, ResourceError> {
    serde_json::from_str(line)
        .map_err(|e| ResourceError::bad_request(format!("Malformed request: {}", e)))
}

/// Serve requests from `input` until end of input.
///
/// Request failures are written as error lines and never stop the loop;
/// only I/O failures do.
pub async fn serve_lines<R, W>(
    connection: &Connection,
    input: R,
    mut output: W,
) -> Result<FrontendStats, FrontendError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = FrontendStats::default();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let result = match parse_line(line) {
            Ok(request) => connection.submit(&Context::root(), request).await,
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => stats.succeeded += 1,
            Err(_) => stats.failed += 1,
        }

        let mut rendered = serde_json::to_vec(&render(&result)?)?;
        rendered.push(b'\n');
        output.write_all(&rendered).await?;
    }

    output.flush().await?;
    tracing::debug!(
        succeeded = stats.succeeded,
        failed = stats.failed,
        "input exhausted"
    );
    Ok(stats)
}

/// Write the content of every document in the collection at `path`, in id
/// order. Returns the number of documents written.
pub async fn list_resources<W>(
    connection: &Connection,
    path: &str,
    mut output: W,
) -> Result<usize, FrontendError>
where
    W: AsyncWrite + Unpin,
{
    let listed = connection.query(&Context::root(), path).await?;
    for resource in &listed.resources {
        let mut line = serde_json::to_vec(&resource.content)?;
        line.push(b'\n');
        output.write_all(&line).await?;
    }
    output.flush().await?;
    Ok(listed.resources.len())
}
