//! Pattern-based request routing.
//!
//! ```text
//! Request path → Router → (Handler, Params) → Response
//! ```
//!
//! Patterns are made of literal segments and `<name>` placeholders, each
//! placeholder matching exactly one non-empty path segment:
//!
//! ```
//! # use lantern::router::Router;
//! # use lantern::http::response::Response;
//! let mut router = Router::new();
//! router
//!     .register("/user/<id>", |params, _req| {
//!         Ok(Response::ok(format!("User {}", params["id"])))
//!     })
//!     .unwrap();
//!
//! let (_route, params) = router.find("/user/42").unwrap();
//! assert_eq!(params["id"], "42");
//! ```
//!
//! Routes are tried in registration order and the first match wins. The
//! table is built before serving starts and only read afterwards, so it is
//! shared between connections without locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::http::request::Request;
use crate::http::response::Response;

/// Placeholder name to matched segment.
pub type Params = HashMap<String, String>;

/// A route handler. Errors become a generic 500 response.
pub type Handler = Arc<dyn Fn(&Params, &Request) -> anyhow::Result<Response> + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),
    #[error("pattern {pattern:?} has a malformed segment {segment:?}")]
    MalformedSegment { pattern: String, segment: String },
    #[error("pattern {pattern:?} uses placeholder <{name}> twice")]
    DuplicatePlaceholder { pattern: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(source: &str) -> Result<Self, RouteError> {
        let Some(rest) = source.strip_prefix('/') else {
            return Err(RouteError::MissingLeadingSlash(source.to_string()));
        };

        let mut segments = Vec::new();
        for raw in rest.split('/') {
            let segment = match raw.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                Some(name) if is_valid_name(name) => {
                    if segments.contains(&Segment::Param(name.to_string())) {
                        return Err(RouteError::DuplicatePlaceholder {
                            pattern: source.to_string(),
                            name: name.to_string(),
                        });
                    }
                    Segment::Param(name.to_string())
                }
                Some(_) => return Err(malformed(source, raw)),
                None if raw.contains('<') || raw.contains('>') => {
                    return Err(malformed(source, raw));
                }
                None => Segment::Literal(raw.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Anchored match of a whole path. Returns the captured placeholders.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut params = Params::new();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        // Leftover segments mean the pattern only matched a prefix.
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn malformed(pattern: &str, segment: &str) -> RouteError {
    RouteError::MalformedSegment {
        pattern: pattern.to_string(),
        segment: segment.to_string(),
    }
}

/// A registered (pattern, handler) pair.
#[derive(Clone)]
pub struct Route {
    pattern: Pattern,
    handler: Handler,
}

impl Route {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn call(&self, params: &Params, request: &Request) -> anyhow::Result<Response> {
        (self.handler)(params, request)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Ordered route table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a route after the ones already present.
    pub fn register<H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Fn(&Params, &Request) -> anyhow::Result<Response> + Send + Sync + 'static,
    {
        let pattern = Pattern::parse(pattern)?;
        self.routes.push(Route {
            pattern,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Finds the first route matching `path`.
    pub fn find(&self, path: &str) -> Option<(&Route, Params)> {
        self.routes
            .iter()
            .find_map(|route| route.pattern.matches(path).map(|params| (route, params)))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
