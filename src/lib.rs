//! # cloudconvert-flow
//!
//! Drive CloudConvert v2 jobs as one step of an automation pipeline.
//!
//! ## Why this crate?
//!
//! CloudConvert's job API is a multi-stage asynchronous protocol, not a
//! single request: a job is a DAG of tasks (imports feeding a processing
//! task feeding an export), uploads go to one-time presigned targets
//! returned only after submission, completion is observed through a
//! blocking long-poll on a separate domain, and one job can fan out into
//! many output files — or none, for metadata extraction. This crate owns
//! that choreography end to end and hands the host pipeline plain input
//! and output items.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input items
//!  │
//!  ├─ 1. Plan     build the task graph for the operation (+ options merge)
//!  ├─ 2. Submit   POST /v2/jobs — upload targets come back with the job
//!  ├─ 3. Upload   multipart push of source bytes to each one-time target
//!  ├─ 4. Wait     one blocking long-poll until the job is terminal
//!  ├─ 5. Extract  flatten export files / read the metadata payload
//!  └─ 6. Output   downloaded attachments paired back to their input items
//! ```
//!
//! Items are processed strictly sequentially — one remote job in flight at
//! a time, as deliberate backpressure on the remote API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloudconvert_flow::{
//!     run, BinaryData, ConvertParams, Credentials, InputItem, JobClient, Operation, RunConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = JobClient::new(Credentials::from_env().expect("CLOUDCONVERT_API_KEY"))?;
//!     let config = RunConfig::builder(Operation::Convert(ConvertParams {
//!         output_format: "pdf".into(),
//!         additional_options: None,
//!     }))
//!     .build()?;
//!
//!     let bytes = std::fs::read("report.docx")?;
//!     let items = vec![InputItem::from_binary("data", BinaryData::new(bytes, "report.docx"))];
//!
//!     let output = run(&client, &config, &items).await?;
//!     for item in &output.items {
//!         if let Some((key, data)) = &item.binary {
//!             eprintln!("{key}: {} ({} bytes)", data.file_name.as_deref().unwrap_or("?"), data.data.len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ccflow` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! cloudconvert-flow = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod items;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use auth::Credentials;
pub use client::{job_error_message, JobClient, JobClientBuilder};
pub use config::{
    ArchiveParams, CaptureWebsiteParams, ConvertParams, InputSource, MergeParams, Operation,
    OptimizeParams, RunConfig, RunConfigBuilder, ThumbnailFit, ThumbnailParams, WatermarkParams,
};
pub use error::{CloudConvertError, RunFailure};
pub use items::{BinaryData, InputItem, OutputItem};
pub use model::{Job, JobStatus, Task, TaskPlan, TaskResultFile, TaskSpec};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use run::{run, RunOutput};
