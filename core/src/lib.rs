//! Blocking client for the Troia crowd-labeling service.
//!
//! # Overview
//! One method per remote endpoint: job lifecycle, assignments, worker
//! listings, quality/cost/payment reports and label predictions. Every call
//! returns a `TroiaResponse` envelope exposing the service's `status`,
//! `timestamp`, `redirect` and `result` fields as untyped JSON.
//!
//! # Design
//! - `TroiaClient` holds only its configuration and a `Transport`.
//! - Each operation is split into `build_*` (pure, produces an `HttpRequest`)
//!   and an executing method that sends it and parses the envelope.
//! - Path templates live in one static table in `endpoint`.
//! - The client never interprets `status` or the HTTP status code; failures
//!   are either transport errors or parse errors.
//!
//! ```no_run
//! use troia_core::{Params, TroiaClient};
//!
//! # fn main() -> Result<(), troia_core::ApiError> {
//! let client = TroiaClient::new("http://localhost:8080/troia", 5.0);
//! let job = client.add_job(Params::new().with("categories", r#"["pos","neg"]"#))?;
//! println!("{:?} {:?}", job.status(), job.result());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod response;
pub mod transport;
pub mod types;

pub use client::TroiaClient;
pub use config::ClientConfig;
pub use endpoint::{format_path, Endpoint};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use response::TroiaResponse;
pub use transport::{Transport, UreqTransport};
pub use types::{Assignment, LabelChoosing, Params};
