//! Executes `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the only place I/O happens. `UreqTransport` is the default:
//! one blocking call per request, no retries, HTTP error statuses returned as
//! data so the envelope can still be read.

use std::time::Duration;

use tracing::trace;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};

/// Something that can perform one HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// `timeout` bounds the whole call; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let query = request.query.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        let mut response = match (request.method, &request.body) {
            (HttpMethod::Get, _) => self.agent.get(&request.url).query_pairs(query).call()?,
            (HttpMethod::Post, Some(RequestBody::Form(form))) => self
                .agent
                .post(&request.url)
                .query_pairs(query)
                .send_form(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))?,
            (HttpMethod::Post, Some(RequestBody::Json(json))) => self
                .agent
                .post(&request.url)
                .query_pairs(query)
                .content_type("application/json")
                .send(json.as_bytes())?,
            (HttpMethod::Post, None) => self.agent.post(&request.url).query_pairs(query).send_empty()?,
            (HttpMethod::Delete, Some(RequestBody::Json(json))) => self
                .agent
                .delete(&request.url)
                .query_pairs(query)
                .force_send_body()
                .content_type("application/json")
                .send(json.as_bytes())?,
            (HttpMethod::Delete, Some(RequestBody::Form(form))) => self
                .agent
                .delete(&request.url)
                .query_pairs(query)
                .force_send_body()
                .send_form(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))?,
            (HttpMethod::Delete, None) => self.agent.delete(&request.url).query_pairs(query).call()?,
        };

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        trace!(status, body_len = body.len(), "troia response");

        Ok(HttpResponse { status, body })
    }
}
