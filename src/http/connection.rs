use std::mem;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::http::error::RequestError;
use crate::http::parser::parse_request_head;
use crate::http::reader::{read_body, read_head, ReadLimits};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::router::Router;
use crate::static_files::StaticResolver;

/// Everything a connection needs besides its socket. Built once at startup
/// and shared read-only by all connections.
#[derive(Debug)]
pub struct Dispatch {
    pub router: Router,
    pub statics: Option<StaticResolver>,
    pub limits: ReadLimits,
}

impl Dispatch {
    pub fn new(router: Router, statics: Option<StaticResolver>, limits: ReadLimits) -> Self {
        Self {
            router,
            statics,
            limits,
        }
    }
}

/// One accepted connection, driven through a single request-response
/// exchange. The stream is owned here and dropped when `run` returns.
pub struct Connection<S> {
    stream: S,
    id: u64,
    dispatch: Arc<Dispatch>,
    state: ConnectionState,
    /// Method and path, once known, for log records.
    target: Option<(String, String)>,
}

pub enum ConnectionState {
    AwaitHeaders,
    HeadersRead {
        head: Vec<u8>,
        initial_body: Vec<u8>,
    },
    BodyPending {
        request: Request,
        initial_body: Vec<u8>,
        content_length: usize,
    },
    BodyRead(Request),
    Resolved(ResponseWriter, StatusCode),
    ResponseSent,
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, id: u64, dispatch: Arc<Dispatch>) -> Self {
        Self {
            stream,
            id,
            dispatch,
            state: ConnectionState::AwaitHeaders,
            target: None,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let limits = self.dispatch.limits;

        loop {
            match mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitHeaders => {
                    self.state = match read_head(&mut self.stream, &limits).await {
                        Ok((head, initial_body)) => {
                            ConnectionState::HeadersRead { head, initial_body }
                        }
                        Err(e) => self.fail(e),
                    };
                }

                ConnectionState::HeadersRead { head, initial_body } => {
                    self.state = match parse_request_head(&head) {
                        Ok(request) => self.after_headers(request, initial_body),
                        Err(e) => self.fail(e.into()),
                    };
                }

                ConnectionState::BodyPending {
                    mut request,
                    initial_body,
                    content_length,
                } => {
                    let read =
                        read_body(&mut self.stream, initial_body, content_length, &limits).await;
                    self.state = match read {
                        Ok(body) => {
                            request.content_length = Some(body.len());
                            request.body = body;
                            ConnectionState::BodyRead(request)
                        }
                        Err(e) => self.fail(e),
                    };
                }

                ConnectionState::BodyRead(request) => {
                    let response = self.resolve(request).await;
                    let status = response.status;
                    self.state = ConnectionState::Resolved(ResponseWriter::new(&response), status);
                }

                ConnectionState::Resolved(mut writer, status) => {
                    let (method, path) = self.target.clone().unwrap_or_default();
                    info!(
                        conn_id = self.id,
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        bytes = writer.len(),
                        "Sending response"
                    );

                    let write = writer.write_to_stream(&mut self.stream);
                    match timeout(limits.idle_timeout, write).await {
                        Ok(Ok(())) => self.state = ConnectionState::ResponseSent,
                        Ok(Err(e)) => return Err(e.into()),
                        Err(_) => anyhow::bail!("timed out writing response"),
                    }
                }

                ConnectionState::ResponseSent => {
                    // Best effort: the peer may already be gone.
                    let _ = timeout(limits.idle_timeout, self.stream.shutdown()).await;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        debug!(conn_id = self.id, "Connection closed");
        Ok(())
    }

    /// Decides whether a body has to be read for a freshly parsed request.
    fn after_headers(&mut self, request: Request, initial_body: Vec<u8>) -> ConnectionState {
        debug!(
            conn_id = self.id,
            method = %request.method,
            path = %request.path,
            version = %request.version,
            query = ?request.query,
            headers = ?request.headers,
            "Parsed request"
        );
        self.target = Some((request.method.to_string(), request.path.clone()));

        match request.declared_content_length() {
            Some(content_length) => ConnectionState::BodyPending {
                request,
                initial_body,
                content_length,
            },
            None if request.method.requires_body() => {
                let method = request.method.to_string();
                self.fail(RequestError::MissingContentLength { method })
            }
            None => ConnectionState::BodyRead(request),
        }
    }

    /// Static files first, then routes, then 404.
    async fn resolve(&self, request: Request) -> Response {
        if let Some(statics) = &self.dispatch.statics {
            if let Some(entry) = statics.resolve(&request.path).await {
                debug!(
                    conn_id = self.id,
                    file = %entry.path.display(),
                    mime = entry.mime,
                    bytes = entry.len(),
                    "Serving static file"
                );
                return entry.into_response();
            }
        }

        let Some((route, params)) = self.dispatch.router.find(&request.path) else {
            return Response::not_found();
        };
        let route = route.clone();
        let pattern = route.pattern().to_string();

        // Handlers are plain functions and may block.
        let outcome = tokio::task::spawn_blocking(move || route.call(&params, &request)).await;

        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(conn_id = self.id, route = %pattern, error = %e, "Handler failed");
                Response::internal_error()
            }
            Err(e) => {
                error!(conn_id = self.id, route = %pattern, error = %e, "Handler panicked");
                Response::internal_error()
            }
        }
    }

    /// Maps a request failure onto the next state: an error page when the
    /// client can still be answered, otherwise straight to `Closed`.
    fn fail(&self, err: RequestError) -> ConnectionState {
        let path = self.target.as_ref().map(|(_, p)| p.as_str()).unwrap_or("-");

        match err.status() {
            Some(status) => {
                warn!(
                    conn_id = self.id,
                    path,
                    kind = err.kind(),
                    error = %err,
                    "Rejecting request"
                );
                let response = Response::error_page(status);
                ConnectionState::Resolved(ResponseWriter::new(&response), status)
            }
            None => {
                match err {
                    RequestError::ConnectionClosed => {
                        debug!(conn_id = self.id, "Peer closed before sending a request");
                    }
                    _ => {
                        warn!(
                            conn_id = self.id,
                            path,
                            kind = err.kind(),
                            error = %err,
                            "Dropping connection"
                        );
                    }
                }
                ConnectionState::Closed
            }
        }
    }
}
