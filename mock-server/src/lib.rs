//! In-memory imitation of the Troia HTTP API.
//!
//! Answers every endpoint the client calls with the same envelope shape the
//! real service uses. Report endpoints answer asynchronously: they return a
//! `redirect` to `responses/{id}`, and the stored result is served from there.
//! Qualities and predictions are a plain majority vote, enough to give tests
//! deterministic numbers.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub worker: String,
    pub object: String,
    pub label: String,
}

#[derive(Clone, Debug, Default)]
pub struct Job {
    pub id: String,
    pub categories: Vec<String>,
    pub assigns: Vec<Assignment>,
    pub computed: bool,
}

#[derive(Deserialize)]
pub struct DeleteJob {
    pub id: String,
}

#[derive(Deserialize)]
pub struct PredictionQuery {
    #[serde(rename = "labelChoosing", default)]
    pub label_choosing: Option<String>,
}

#[derive(Default)]
pub struct Service {
    pub jobs: HashMap<String, Job>,
    pub responses: HashMap<String, Value>,
}

pub type Db = Arc<RwLock<Service>>;

type Reply = (StatusCode, Json<Value>);

#[derive(Clone, Copy, Debug)]
enum Report {
    Cost,
    QualityMatrix,
    Payment,
    QualityEstimated,
    QualityEvaluated,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Service::default()));
    Router::new()
        .route("/status", get(status))
        .route("/jobs", post(add_job).delete(delete_job))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/compute", post(compute))
        .route("/jobs/{id}/assigns", post(add_assigns))
        .route("/jobs/{id}/workers", get(get_workers))
        .route("/jobs/{id}/workers/{worker}/info", get(get_worker))
        .route(
            "/jobs/{id}/workers/cost/estimated/",
            get(|db: State<Db>, id: Path<String>| worker_report(db, id, Report::Cost)),
        )
        .route(
            "/jobs/{id}/workers/quality/matrix/",
            get(|db: State<Db>, id: Path<String>| worker_report(db, id, Report::QualityMatrix)),
        )
        .route(
            "/jobs/{id}/workers/quality/payment/",
            get(|db: State<Db>, id: Path<String>| worker_report(db, id, Report::Payment)),
        )
        .route(
            "/jobs/{id}/workers/quality/estimated/",
            get(|db: State<Db>, id: Path<String>| worker_report(db, id, Report::QualityEstimated)),
        )
        .route(
            "/jobs/{id}/workers/quality/evaluated/",
            get(|db: State<Db>, id: Path<String>| worker_report(db, id, Report::QualityEvaluated)),
        )
        .route("/jobs/{id}/workers/quality/summary", get(quality_summary))
        .route("/jobs/{id}/objects/prediction", get(predictions))
        .route("/responses/{rid}", get(stored_response))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock troia serving");
    }
    axum::serve(listener, app()).await
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn ok(result: Value) -> Reply {
    (
        StatusCode::OK,
        Json(json!({"status": "OK", "timestamp": timestamp(), "result": result})),
    )
}

fn error(message: String) -> Reply {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"status": "ERROR", "timestamp": timestamp(), "result": message})),
    )
}

fn missing_job(id: &str) -> Reply {
    error(format!("Job with ID {id} does not exist"))
}

/// Store `result` and point the caller at it.
fn redirect(service: &mut Service, result: Value) -> Reply {
    let rid = Uuid::new_v4().to_string();
    service
        .responses
        .insert(rid.clone(), json!({"status": "OK", "timestamp": timestamp(), "result": result}));
    (
        StatusCode::OK,
        Json(json!({"status": "OK", "timestamp": timestamp(), "redirect": format!("responses/{rid}")})),
    )
}

/// Majority label per object; ties go to the lexicographically smallest label.
pub fn majority_labels(assigns: &[Assignment]) -> BTreeMap<String, String> {
    let mut votes: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    for a in assigns {
        *votes.entry(&a.object).or_default().entry(&a.label).or_default() += 1;
    }
    votes
        .into_iter()
        .filter_map(|(object, counts)| {
            let mut best: Option<(&str, usize)> = None;
            for (label, count) in counts {
                if best.map_or(true, |(_, c)| count > c) {
                    best = Some((label, count));
                }
            }
            best.map(|(label, _)| (object.to_string(), label.to_string()))
        })
        .collect()
}

/// Fraction of each worker's labels that agree with the majority.
pub fn worker_agreement(assigns: &[Assignment]) -> BTreeMap<String, f64> {
    let majority = majority_labels(assigns);
    let mut tally: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for a in assigns {
        let entry = tally.entry(&a.worker).or_default();
        entry.1 += 1;
        if majority.get(&a.object) == Some(&a.label) {
            entry.0 += 1;
        }
    }
    tally
        .into_iter()
        .map(|(worker, (agree, total))| (worker.to_string(), agree as f64 / total as f64))
        .collect()
}

async fn status() -> Reply {
    ok(json!({"status": "OK", "deploy_time": timestamp()}))
}

async fn add_job(State(db): State<Db>, Form(form): Form<HashMap<String, String>>) -> Reply {
    let id = form.get("id").cloned().unwrap_or_else(|| Uuid::new_v4().to_string());
    let categories = match form.get("categories") {
        Some(raw) => match serde_json::from_str::<Vec<String>>(raw) {
            Ok(categories) => categories,
            Err(e) => return error(format!("Invalid categories: {e}")),
        },
        None => Vec::new(),
    };
    let mut service = db.write().await;
    if service.jobs.contains_key(&id) {
        return error(format!("Job with ID {id} already exists"));
    }
    service.jobs.insert(
        id.clone(),
        Job {
            id: id.clone(),
            categories,
            ..Job::default()
        },
    );
    ok(json!(format!("New job created with ID: {id}")))
}

async fn get_job(State(db): State<Db>, Path(id): Path<String>) -> Reply {
    let service = db.read().await;
    match service.jobs.get(&id) {
        Some(job) => ok(json!({
            "id": job.id,
            "categories": job.categories,
            "assigns": job.assigns.len(),
            "computed": job.computed,
        })),
        None => missing_job(&id),
    }
}

async fn delete_job(State(db): State<Db>, Json(input): Json<DeleteJob>) -> Reply {
    let mut service = db.write().await;
    match service.jobs.remove(&input.id) {
        Some(_) => ok(json!(format!("Removed job with ID: {}", input.id))),
        None => missing_job(&input.id),
    }
}

async fn compute(State(db): State<Db>, Path(id): Path<String>) -> Reply {
    let mut service = db.write().await;
    match service.jobs.get_mut(&id) {
        Some(job) => job.computed = true,
        None => return missing_job(&id),
    }
    redirect(&mut service, json!("Computation done"))
}

async fn add_assigns(
    State(db): State<Db>,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Reply {
    let assigns = match form.get("assigns").map(|raw| serde_json::from_str::<Vec<Assignment>>(raw)) {
        Some(Ok(assigns)) => assigns,
        Some(Err(e)) => return error(format!("Invalid assigns: {e}")),
        None => return error("Missing parameter: assigns".to_string()),
    };
    let mut service = db.write().await;
    let Some(job) = service.jobs.get_mut(&id) else {
        return missing_job(&id);
    };
    let added = assigns.len();
    job.assigns.extend(assigns);
    job.computed = false;
    ok(json!(format!("Assigns added: {added}")))
}

async fn get_workers(State(db): State<Db>, Path(id): Path<String>) -> Reply {
    let service = db.read().await;
    let Some(job) = service.jobs.get(&id) else {
        return missing_job(&id);
    };
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for a in &job.assigns {
        *counts.entry(&a.worker).or_default() += 1;
    }
    let workers: Vec<Value> = counts
        .into_iter()
        .map(|(name, assigns)| json!({"workerName": name, "assigns": assigns}))
        .collect();
    ok(json!(workers))
}

async fn get_worker(State(db): State<Db>, Path((id, worker)): Path<(String, String)>) -> Reply {
    let service = db.read().await;
    let Some(job) = service.jobs.get(&id) else {
        return missing_job(&id);
    };
    let assigns = job.assigns.iter().filter(|a| a.worker == worker).count();
    if assigns == 0 {
        return error(format!("Worker with ID {worker} does not exist"));
    }
    ok(json!({"workerName": worker, "assigns": assigns}))
}

async fn worker_report(State(db): State<Db>, Path(id): Path<String>, report: Report) -> Reply {
    let mut service = db.write().await;
    let Some(job) = service.jobs.get(&id) else {
        return missing_job(&id);
    };
    let result: Vec<Value> = match report {
        Report::QualityMatrix => {
            let mut matrix: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
            for a in &job.assigns {
                *matrix.entry(&a.worker).or_default().entry(&a.label).or_default() += 1;
            }
            matrix
                .into_iter()
                .map(|(worker, labels)| json!({"workerName": worker, "value": labels}))
                .collect()
        }
        _ => worker_agreement(&job.assigns)
            .into_iter()
            .map(|(worker, agreement)| {
                let value = match report {
                    Report::Cost => 1.0 - agreement,
                    _ => agreement,
                };
                json!({"workerName": worker, "value": value})
            })
            .collect(),
    };
    redirect(&mut service, json!(result))
}

async fn quality_summary(State(db): State<Db>, Path(id): Path<String>) -> Reply {
    let service = db.read().await;
    let Some(job) = service.jobs.get(&id) else {
        return missing_job(&id);
    };
    let agreement = worker_agreement(&job.assigns);
    let average = if agreement.is_empty() {
        0.0
    } else {
        agreement.values().sum::<f64>() / agreement.len() as f64
    };
    ok(json!({"workers": agreement.len(), "averageQuality": average}))
}

async fn predictions(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(query): Query<PredictionQuery>,
) -> Reply {
    let method = query.label_choosing.unwrap_or_else(|| "MaxLikelihood".to_string());
    if method != "MaxLikelihood" && method != "MinCost" {
        return error(format!("Unknown label choosing method: {method}"));
    }
    let mut service = db.write().await;
    let Some(job) = service.jobs.get(&id) else {
        return missing_job(&id);
    };
    let predictions: Vec<Value> = majority_labels(&job.assigns)
        .into_iter()
        .map(|(object, label)| json!({"objectName": object, "categoryName": label}))
        .collect();
    redirect(&mut service, json!({"labelChoosing": method, "predictions": predictions}))
}

async fn stored_response(State(db): State<Db>, Path(rid): Path<String>) -> Reply {
    let service = db.read().await;
    match service.responses.get(&rid) {
        Some(stored) => (StatusCode::OK, Json(stored.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"status": "ERROR", "timestamp": timestamp(), "result": format!("No response with ID {rid}")})),
        ),
    }
}
