//! Request builder and dispatcher for the Troia API.
//!
//! # Design
//! Every endpoint has a `build_*` method that produces an `HttpRequest` from
//! the endpoint table, and an executing method of the same name minus the
//! prefix that sends it through the `Transport` and wraps the answer in a
//! `TroiaResponse`. The client itself holds only its configuration and
//! transport, and carries no state between calls.

use std::time::Duration;

use tracing::debug;

use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::response::TroiaResponse;
use crate::transport::{Transport, UreqTransport};
use crate::types::{LabelChoosing, Params};

/// Blocking client for a Troia service.
#[derive(Debug, Clone)]
pub struct TroiaClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl TroiaClient<UreqTransport> {
    /// Client for `base_url` with a timeout in seconds; `<= 0` waits forever.
    pub fn new(base_url: &str, timeout_secs: f64) -> Self {
        Self::from_config(ClientConfig::new(base_url).with_timeout_secs(timeout_secs))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let config = config.normalized();
        let transport = UreqTransport::new(config.timeout);
        Self { config, transport }
    }
}

impl<T: Transport> TroiaClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config: config.normalized(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.config.timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn url(&self, endpoint: Endpoint, params: &[&str]) -> String {
        format!("{}{}", self.config.base_url, endpoint.path(params))
    }

    /// Resolve a redirect target: absolute URLs are used as-is, anything else
    /// is taken relative to the base URL.
    pub fn resolve_url(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!("{}{}", self.config.base_url, target.trim_start_matches('/'))
        }
    }

    // --- request builders ---

    pub fn build_get_status(&self) -> HttpRequest {
        HttpRequest::get(self.url(Endpoint::Status, &[]))
    }

    pub fn build_add_job(&self, params: Params) -> HttpRequest {
        HttpRequest::post(self.url(Endpoint::AddJob, &[]), params.into_pairs())
    }

    pub fn build_get_job(&self, job_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(Endpoint::GetJob, &[job_id]))
    }

    /// The job id travels in a JSON body `{"id": job_id}`.
    pub fn build_delete_job(&self, job_id: &str) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(&serde_json::json!({ "id": job_id })).map_err(ApiError::Serialization)?;
        Ok(HttpRequest::delete_json(self.url(Endpoint::DeleteJob, &[]), body))
    }

    pub fn build_compute(&self, job_id: &str) -> HttpRequest {
        HttpRequest::post(self.url(Endpoint::Compute, &[job_id]), Vec::new())
    }

    pub fn build_add_assigns(&self, job_id: &str, params: Params) -> HttpRequest {
        HttpRequest::post(self.url(Endpoint::AddAssigns, &[job_id]), params.into_pairs())
    }

    pub fn build_get_worker(&self, job_id: &str, worker_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(Endpoint::GetWorker, &[job_id, worker_id]))
    }

    pub fn build_get_workers(&self, job_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(Endpoint::GetWorkers, &[job_id]))
    }

    pub fn build_get_workers_cost(&self, job_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(Endpoint::GetWorkersCost, &[job_id]))
    }

    pub fn build_get_workers_quality_matrix(&self, job_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(Endpoint::GetWorkersQualityMatrix, &[job_id]))
    }

    pub fn build_get_workers_payment(&self, job_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(Endpoint::GetWorkersPayment, &[job_id]))
    }

    pub fn build_get_workers_quality_estimated(&self, job_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(Endpoint::GetWorkersQualityEstimated, &[job_id]))
    }

    pub fn build_get_workers_quality_evaluated(&self, job_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(Endpoint::GetWorkersQualityEvaluated, &[job_id]))
    }

    pub fn build_get_workers_quality_summary(&self, job_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(Endpoint::GetWorkersQualitySummary, &[job_id]))
    }

    pub fn build_get_objects_predictions(&self, job_id: &str, method: LabelChoosing) -> HttpRequest {
        HttpRequest::get(self.url(Endpoint::GetObjectsPredictions, &[job_id]))
            .with_query(vec![("labelChoosing".to_string(), method.as_str().to_string())])
    }

    pub fn build_get_response(&self, redirect_url: &str) -> HttpRequest {
        HttpRequest::get(self.resolve_url(redirect_url))
    }

    // --- operations ---

    /// Send `request` and wrap the answer. Exactly one transport call.
    pub fn send(&self, request: HttpRequest) -> Result<TroiaResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "troia request");
        let response = self.transport.execute(&request)?;
        TroiaResponse::from_http(response)
    }

    pub fn get_status(&self) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_status())
    }

    pub fn add_job(&self, params: Params) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_add_job(params))
    }

    pub fn get_job(&self, job_id: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_job(job_id))
    }

    pub fn delete_job(&self, job_id: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_delete_job(job_id)?)
    }

    pub fn compute(&self, job_id: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_compute(job_id))
    }

    pub fn add_assigns(&self, job_id: &str, params: Params) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_add_assigns(job_id, params))
    }

    pub fn get_worker(&self, job_id: &str, worker_id: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_worker(job_id, worker_id))
    }

    pub fn get_workers(&self, job_id: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_workers(job_id))
    }

    pub fn get_workers_cost(&self, job_id: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_workers_cost(job_id))
    }

    pub fn get_workers_quality_matrix(&self, job_id: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_workers_quality_matrix(job_id))
    }

    pub fn get_workers_payment(&self, job_id: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_workers_payment(job_id))
    }

    pub fn get_workers_quality_estimated(&self, job_id: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_workers_quality_estimated(job_id))
    }

    pub fn get_workers_quality_evaluated(&self, job_id: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_workers_quality_evaluated(job_id))
    }

    pub fn get_workers_quality_summary(&self, job_id: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_workers_quality_summary(job_id))
    }

    /// `method_code`: `None` or `Some(1)` asks for `MaxLikelihood`, any other
    /// code for `MinCost`.
    pub fn get_objects_predictions(&self, job_id: &str, method_code: Option<i64>) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_objects_predictions(job_id, LabelChoosing::from_code(method_code)))
    }

    /// Fetch the result behind a redirect the service handed out.
    pub fn get_response(&self, redirect_url: &str) -> Result<TroiaResponse, ApiError> {
        self.send(self.build_get_response(redirect_url))
    }

    /// Follow `response`'s `redirect`, if it has a string one.
    pub fn follow_redirect(&self, response: &TroiaResponse) -> Result<Option<TroiaResponse>, ApiError> {
        match response.redirect_str() {
            Some(url) => self.get_response(url).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::http::{HttpMethod, HttpResponse, RequestBody};
    use crate::types::Assignment;

    fn client() -> TroiaClient {
        TroiaClient::new("http://localhost:8080/troia", 0.2)
    }

    /// Records requests and answers each with a canned body.
    struct CannedTransport {
        body: String,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl CannedTransport {
        fn new(body: &str) -> Self {
            Self {
                body: body.to_string(),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for CannedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request.clone());
            Ok(HttpResponse {
                status: 200,
                body: self.body.clone(),
            })
        }
    }

    fn canned(body: &str) -> TroiaClient<CannedTransport> {
        TroiaClient::with_transport(ClientConfig::new("http://h"), CannedTransport::new(body))
    }

    #[test]
    fn base_url_gets_trailing_slash_once() {
        assert_eq!(client().base_url(), "http://localhost:8080/troia/");
        let already = TroiaClient::new("http://localhost:8080/troia/", 0.2);
        assert_eq!(already.base_url(), "http://localhost:8080/troia/");
    }

    #[test]
    fn timeout_coercion() {
        assert_eq!(TroiaClient::new("http://h", 0.0).timeout(), None);
        assert_eq!(TroiaClient::new("http://h", -5.0).timeout(), None);
        assert_eq!(TroiaClient::new("http://h", 2.0).timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn build_get_status_produces_correct_request() {
        let req = client().build_get_status();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/troia/status");
        assert!(req.query.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn build_get_job_embeds_id() {
        let req = client().build_get_job("42");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/troia/jobs/42");
    }

    #[test]
    fn build_get_job_encodes_id_as_one_segment() {
        let req = client().build_get_job("my job/2");
        assert_eq!(req.url, "http://localhost:8080/troia/jobs/my%20job%2F2");
    }

    #[test]
    fn build_add_job_sends_params_as_form() {
        let params = Params::new().with("id", "job-1").with("categories", r#"["a","b"]"#);
        let req = client().build_add_job(params);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/troia/jobs");
        assert_eq!(
            req.body,
            Some(RequestBody::Form(vec![
                ("id".to_string(), "job-1".to_string()),
                ("categories".to_string(), r#"["a","b"]"#.to_string()),
            ]))
        );
    }

    #[test]
    fn build_delete_job_sends_id_as_json_body() {
        let req = client().build_delete_job("job-1").unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://localhost:8080/troia/jobs");
        assert_eq!(req.body, Some(RequestBody::Json(r#"{"id":"job-1"}"#.to_string())));
    }

    #[test]
    fn build_compute_posts_without_fields() {
        let req = client().build_compute("7");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/troia/jobs/7/compute");
        assert_eq!(req.body, Some(RequestBody::Form(Vec::new())));
    }

    #[test]
    fn build_add_assigns_targets_job() {
        let params = Params::from_assignments(&[Assignment::new("w", "o", "l")]).unwrap();
        let req = client().build_add_assigns("7", params);
        assert_eq!(req.url, "http://localhost:8080/troia/jobs/7/assigns");
        match req.body {
            Some(RequestBody::Form(form)) => assert_eq!(form[0].0, "assigns"),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn build_get_worker_embeds_both_ids() {
        let req = client().build_get_worker("7", "worker1");
        assert_eq!(req.url, "http://localhost:8080/troia/jobs/7/workers/worker1/info");
    }

    #[test]
    fn build_worker_reports() {
        let c = client();
        let base = "http://localhost:8080/troia/jobs/7/workers";
        assert_eq!(c.build_get_workers("7").url, base);
        assert_eq!(c.build_get_workers_cost("7").url, format!("{base}/cost/estimated/"));
        assert_eq!(c.build_get_workers_quality_matrix("7").url, format!("{base}/quality/matrix/"));
        assert_eq!(c.build_get_workers_payment("7").url, format!("{base}/quality/payment/"));
        assert_eq!(c.build_get_workers_quality_estimated("7").url, format!("{base}/quality/estimated/"));
        assert_eq!(c.build_get_workers_quality_evaluated("7").url, format!("{base}/quality/evaluated/"));
        assert_eq!(c.build_get_workers_quality_summary("7").url, format!("{base}/quality/summary"));
    }

    #[test]
    fn build_get_objects_predictions_sets_label_choosing() {
        let req = client().build_get_objects_predictions("7", LabelChoosing::MinCost);
        assert_eq!(req.url, "http://localhost:8080/troia/jobs/7/objects/prediction");
        assert_eq!(req.query, vec![("labelChoosing".to_string(), "MinCost".to_string())]);
    }

    #[test]
    fn predictions_method_code_mapping() {
        let c = canned(r#"{"status":"OK"}"#);
        c.get_objects_predictions("7", None).unwrap();
        c.get_objects_predictions("7", Some(1)).unwrap();
        c.get_objects_predictions("7", Some(2)).unwrap();
        let labels: Vec<String> = c.transport().seen.borrow().iter().map(|r| r.query[0].1.clone()).collect();
        assert_eq!(labels, ["MaxLikelihood", "MaxLikelihood", "MinCost"]);
    }

    #[test]
    fn redirect_resolution() {
        let c = client();
        assert_eq!(c.resolve_url("responses/abc"), "http://localhost:8080/troia/responses/abc");
        assert_eq!(c.resolve_url("/responses/abc"), "http://localhost:8080/troia/responses/abc");
        assert_eq!(c.resolve_url("http://other:1/r/1"), "http://other:1/r/1");
        assert_eq!(c.resolve_url("https://other/r/1"), "https://other/r/1");
    }

    #[test]
    fn operations_send_exactly_one_request() {
        let c = canned(r#"{"status":"OK","result":{"jobs":0}}"#);
        let resp = c.get_status().unwrap();
        assert_eq!(resp.status_str(), Some("OK"));
        assert_eq!(c.transport().seen.borrow().len(), 1);
        assert_eq!(c.transport().seen.borrow()[0].url, "http://h/status");
    }

    #[test]
    fn follow_redirect_fetches_target() {
        let c = canned(r#"{"status":"OK","redirect":"responses/r1"}"#);
        let first = c.compute("7").unwrap();
        let followed = c.follow_redirect(&first).unwrap();
        assert!(followed.is_some());
        let seen = c.transport().seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].url, "http://h/responses/r1");
    }

    #[test]
    fn follow_redirect_without_redirect_is_none() {
        let c = canned(r#"{"status":"OK"}"#);
        let resp = c.get_status().unwrap();
        assert!(c.follow_redirect(&resp).unwrap().is_none());
        assert_eq!(c.transport().seen.borrow().len(), 1);
    }

    #[test]
    fn bad_body_surfaces_parse_error() {
        let c = canned("<html>oops</html>");
        let err = c.get_job("1").unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }
}
