use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";
const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Serializes a response into wire format.
///
/// - CR and LF are stripped from header names, values and the reason
///   phrase, so no value can start a new header line or a second response.
/// - `Content-Type` defaults to HTML and `Connection` to `close`.
/// - Any caller-supplied `Content-Length` is replaced by the real body
///   length.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let body = resp.body.as_bytes();
    let mut buf = Vec::with_capacity(256 + body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        strip_line_breaks(&resp.reason)
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    let mut has_content_type = false;
    let mut has_connection = false;

    for (k, v) in resp.headers.iter() {
        let name = strip_line_breaks(k);
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("Content-Length") {
            continue;
        }
        has_content_type |= name.eq_ignore_ascii_case("Content-Type");
        has_connection |= name.eq_ignore_ascii_case("Connection");

        write_header(&mut buf, name, &strip_line_breaks(v));
    }

    if !has_content_type {
        write_header(&mut buf, "Content-Type", DEFAULT_CONTENT_TYPE);
    }
    if !has_connection {
        write_header(&mut buf, "Connection", "close");
    }
    write_header(&mut buf, "Content-Length", &body.len().to_string());

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(body);

    buf
}

fn write_header(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

fn strip_line_breaks(value: &str) -> String {
    value.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .await?;

            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "connection closed while writing",
                ));
            }

            self.written += n;
        }

        stream.flush().await
    }
}
