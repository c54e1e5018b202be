//! Path templates for every Troia endpoint.
//!
//! Templates are relative to the service root and use `{}` for positional
//! substitution: the job id first, then the worker id.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// One remote endpoint the client knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Status,
    AddJob,
    GetJob,
    DeleteJob,
    Compute,
    AddAssigns,
    GetWorker,
    GetWorkers,
    GetWorkersCost,
    GetWorkersQualityMatrix,
    GetWorkersPayment,
    GetWorkersQualityEstimated,
    GetWorkersQualityEvaluated,
    GetWorkersQualitySummary,
    GetObjectsPredictions,
}

/// Characters escaped inside a single path segment. Everything that would
/// end the segment (`/`), start a query or fragment, or break the URI.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

impl Endpoint {
    /// The fixed path template for this endpoint.
    pub fn template(self) -> &'static str {
        match self {
            Endpoint::Status => "status",
            Endpoint::AddJob => "jobs",
            Endpoint::GetJob => "jobs/{}",
            Endpoint::DeleteJob => "jobs",
            Endpoint::Compute => "jobs/{}/compute",
            Endpoint::AddAssigns => "jobs/{}/assigns",
            Endpoint::GetWorker => "jobs/{}/workers/{}/info",
            Endpoint::GetWorkers => "jobs/{}/workers",
            Endpoint::GetWorkersCost => "jobs/{}/workers/cost/estimated/",
            Endpoint::GetWorkersQualityMatrix => "jobs/{}/workers/quality/matrix/",
            Endpoint::GetWorkersPayment => "jobs/{}/workers/quality/payment/",
            Endpoint::GetWorkersQualityEstimated => "jobs/{}/workers/quality/estimated/",
            Endpoint::GetWorkersQualityEvaluated => "jobs/{}/workers/quality/evaluated/",
            Endpoint::GetWorkersQualitySummary => "jobs/{}/workers/quality/summary",
            Endpoint::GetObjectsPredictions => "jobs/{}/objects/prediction",
        }
    }

    /// Number of `{}` placeholders in the template.
    pub fn arity(self) -> usize {
        self.template().matches("{}").count()
    }

    /// Format this endpoint's template with `params`.
    pub fn path(self, params: &[&str]) -> String {
        debug_assert_eq!(params.len(), self.arity(), "{self:?}: wrong number of path params");
        format_path(self.template(), params)
    }
}

/// Substitute `params` into the `{}` placeholders of `template`, in order.
/// Each param is percent-encoded as one path segment, so ids containing
/// spaces, `/`, `?` or `#` stay inside their segment.
///
/// Surplus placeholders are left in place and surplus params are ignored;
/// `Endpoint::path` asserts the counts match in debug builds.
pub fn format_path(template: &str, params: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + params.iter().map(|p| p.len()).sum::<usize>());
    let mut params = params.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match params.next() {
            Some(param) => out.extend(utf8_percent_encode(param, PATH_SEGMENT)),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}
