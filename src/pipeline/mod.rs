//! Pipeline stages for driving one CloudConvert job.
//!
//! Each submodule implements exactly one stage of the lifecycle, keeping the
//! stages independently testable against hand-built [`crate::model::Job`]
//! values without a live endpoint.
//!
//! ## Data Flow
//!
//! ```text
//! plan ──▶ submit ──▶ upload ──▶ wait ──▶ extract
//! (graph)  (client)   (bytes)   (poll)   (files/metadata)
//! ```
//!
//! 1. [`plan`]    — build the task graph for an operation and deep-merge the
//!    caller's additional options into the processing task
//! 2. [`upload`]  — resolve the upload payload and push it to the one-time
//!    target returned with the created job
//! 3. [`results`] — flatten export outputs, read metadata payloads, download
//!    exported files
//!
//! Submission and polling live on [`crate::client::JobClient`]; the
//! per-operation wiring of all stages is [`crate::run`].

pub mod plan;
pub mod results;
pub mod upload;
