//! Framing of raw request bytes.
//!
//! A request is read in two steps: `read_head` collects bytes until the
//! blank line ending the header block, and `read_body` completes the body
//! once the parser has told us how long it is.

use bytes::{Buf, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

use crate::config::ServerConfig;
use crate::http::error::RequestError;
use crate::http::parser::find_headers_end;

const TERMINATOR_LEN: usize = 4;

/// Bounds applied while reading one request.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    /// Bound on every individual read.
    pub idle_timeout: Duration,
    pub max_header_bytes: usize,
    /// Size of each read from the socket.
    pub read_buffer_size: usize,
    pub max_body_bytes: usize,
}

impl ReadLimits {
    pub fn from_config(cfg: &ServerConfig) -> Self {
        Self {
            idle_timeout: cfg.idle_timeout(),
            max_header_bytes: cfg.max_header_bytes,
            read_buffer_size: cfg.read_buffer_size.max(1),
            max_body_bytes: cfg.max_body_bytes,
        }
    }
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// Reads until the end of the header block.
///
/// Returns the header block (without the blank line) and whatever body
/// bytes arrived along with it.
pub async fn read_head<R>(
    stream: &mut R,
    limits: &ReadLimits,
) -> Result<(Vec<u8>, Vec<u8>), RequestError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(limits.read_buffer_size);
    let mut chunk = vec![0u8; limits.read_buffer_size];
    let mut scanned: usize = 0;

    loop {
        // The terminator may straddle two reads.
        let from = scanned.saturating_sub(TERMINATOR_LEN - 1);
        if let Some(pos) = find_headers_end(&buf[from..]) {
            let end = from + pos;
            if end > limits.max_header_bytes {
                return Err(RequestError::HeaderTooLarge {
                    limit: limits.max_header_bytes,
                });
            }

            let head = buf.split_to(end);
            buf.advance(TERMINATOR_LEN);
            return Ok((head.to_vec(), buf.to_vec()));
        }
        scanned = buf.len();

        if buf.len() > limits.max_header_bytes {
            return Err(RequestError::HeaderTooLarge {
                limit: limits.max_header_bytes,
            });
        }

        let n = read_chunk(stream, &mut chunk, limits.idle_timeout).await?;
        if n == 0 {
            return Err(RequestError::ConnectionClosed);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Completes a body of `content_length` bytes, starting from the bytes
/// already captured with the header block.
///
/// Bytes beyond `content_length` are discarded: one request per connection.
pub async fn read_body<R>(
    stream: &mut R,
    initial: Vec<u8>,
    content_length: usize,
    limits: &ReadLimits,
) -> Result<Vec<u8>, RequestError>
where
    R: AsyncRead + Unpin,
{
    if content_length > limits.max_body_bytes {
        return Err(RequestError::BodyTooLarge {
            declared: content_length,
            limit: limits.max_body_bytes,
        });
    }

    let mut body = BytesMut::from(&initial[..]);
    if body.len() >= content_length {
        body.truncate(content_length);
        return Ok(body.to_vec());
    }

    body.reserve(content_length - body.len());
    let mut chunk = vec![0u8; limits.read_buffer_size];

    while body.len() < content_length {
        let want = (content_length - body.len()).min(chunk.len());
        let n = read_chunk(stream, &mut chunk[..want], limits.idle_timeout).await?;
        if n == 0 {
            return Err(RequestError::TruncatedBody {
                expected: content_length,
                received: body.len(),
            });
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Ok(body.to_vec())
}

async fn read_chunk<R>(
    stream: &mut R,
    chunk: &mut [u8],
    idle: Duration,
) -> Result<usize, RequestError>
where
    R: AsyncRead + Unpin,
{
    match timeout(idle, stream.read(chunk)).await {
        Ok(Ok(n)) => Ok(n),
        Ok(Err(e)) => Err(RequestError::Io(e)),
        Err(_) => Err(RequestError::RequestTimeout),
    }
}
