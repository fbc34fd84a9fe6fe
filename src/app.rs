//! Demo routes served by the `lantern` binary.

use anyhow::Result;
use std::time::SystemTime;

use crate::http::parser::parse_query;
use crate::http::request::{Query, Request};
use crate::http::response::{Response, StatusCode, escape_html, render_page};
use crate::router::{Params, RouteError, Router};

const ECHO_METHODS: &str = "POST, PUT, PATCH";

/// The demo route table.
pub fn router() -> Result<Router, RouteError> {
    let mut router = Router::new();
    router
        .register("/user/<user_id>", user_page)?
        .register("/posts/<post_id>", post_page)?
        .register("/search", search_page)?
        .register("/echo", echo_page)?
        .register("/time", time_page)?;
    Ok(router)
}

pub fn user_page(params: &Params, _req: &Request) -> Result<Response> {
    let user_id = escape_html(param(params, "user_id")?);
    let body = render_page(
        "User Page",
        &format!("Welcome {} !", user_id),
        &format!("\t<p>User {}</p>\n", user_id),
    );
    Ok(Response::html(StatusCode::Ok, body))
}

pub fn post_page(params: &Params, _req: &Request) -> Result<Response> {
    let post_id = escape_html(param(params, "post_id")?);
    let body = render_page(
        "Post Page",
        &format!("Post {}", post_id),
        &format!("\t<p>This page belongs to post {}</p>\n", post_id),
    );
    Ok(Response::html(StatusCode::Ok, body))
}

/// Lists the query parameters back to the client.
pub fn search_page(_params: &Params, req: &Request) -> Result<Response> {
    let mut content = String::from("\t<p>Query parameters received:</p>\n");
    content.push_str(&list_fields(&req.query));

    Ok(Response::html(
        StatusCode::Ok,
        render_page("Search Page", "Search Page", &content),
    ))
}

/// Current server time as an HTTP-date (always GMT).
pub fn time_page(_params: &Params, _req: &Request) -> Result<Response> {
    let now = httpdate::fmt_http_date(SystemTime::now());
    let body = render_page(
        "Current Time",
        "The Current Server Time",
        &format!("\t<p>{}</p>\n", now),
    );
    Ok(Response::html(StatusCode::Ok, body))
}

/// Mirrors a request body. Form bodies are decoded into fields; anything
/// else is echoed as escaped text. Methods that carry no body get 405.
pub fn echo_page(_params: &Params, req: &Request) -> Result<Response> {
    if !req.method.requires_body() {
        let mut response = Response::error_page(StatusCode::MethodNotAllowed);
        response.headers.insert("Allow", ECHO_METHODS);
        return Ok(response);
    }

    let method = escape_html(req.method.as_str());
    let mut content = format!("\t<p>{} request received</p>\n", method);

    let is_form = req
        .header("Content-Type")
        .map(|ct| ct.trim().starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if is_form {
        content.push_str("\t<p>Form fields:</p>\n");
        content.push_str(&list_fields(&parse_query(&req.body_text())));
    } else if !req.body.is_empty() {
        content.push_str(&format!("\t<pre>{}</pre>\n", escape_html(&req.body_text())));
    }

    Ok(Response::html(
        StatusCode::Ok,
        render_page("Echo", "Echo", &content),
    ))
}

fn param<'a>(params: &'a Params, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("route parameter <{}> missing", name))
}

/// Renders fields as an HTML list, keys sorted, repeated values joined
/// with commas.
fn list_fields(fields: &Query) -> String {
    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort();

    let mut out = String::from("\t<ul>\n");
    for key in keys {
        out.push_str(&format!(
            "\t\t<li>{}: {}</li>\n",
            escape_html(key),
            escape_html(&fields[key].join(","))
        ));
    }
    out.push_str("\t</ul>\n");
    out
}
