//! HTTP transport types for the Troia client.
//!
//! # Design
//! Requests and responses are described as plain data. `TroiaClient::build_*`
//! methods produce an `HttpRequest` without touching the network; a
//! `Transport` executes it and hands back an `HttpResponse`. Keeping the two
//! halves apart lets request construction be tested without a server.
//!
//! All fields use owned types (`String`, `Vec`) so values can be stored and
//! compared freely in tests.

/// HTTP method for a request. Troia only uses these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Body of a request that carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` key/value pairs.
    Form(Vec<(String, String)>),
    /// Pre-encoded `application/json` text.
    Json(String),
}

/// An HTTP request described as plain data.
///
/// `url` is absolute. `query` is appended by the transport, so it is kept
/// unencoded here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn get(url: String) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: String, form: Vec<(String, String)>) -> Self {
        Self {
            method: HttpMethod::Post,
            url,
            query: Vec::new(),
            body: Some(RequestBody::Form(form)),
        }
    }

    pub fn delete_json(url: String, json: String) -> Self {
        Self {
            method: HttpMethod::Delete,
            url,
            query: Vec::new(),
            body: Some(RequestBody::Json(json)),
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

/// An HTTP response described as plain data.
///
/// Returned by a `Transport` and consumed by `TroiaResponse::from_http`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}
