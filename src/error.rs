//! Error types for the cloudconvert-flow library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CloudConvertError`] — a single unit of work cannot proceed: the caller
//!   supplied malformed input, the remote service rejected or failed the job,
//!   or transport broke mid-cycle. Returned as `Err(CloudConvertError)` from
//!   the client and pipeline functions.
//!
//! * [`RunFailure`] — the position-annotated form stored in
//!   [`crate::run::RunOutput`]. Per-item topologies can fail on item N after
//!   items 0..N produced outputs; the failure is recorded next to the outputs
//!   that were already emitted instead of erasing them.
//!
//! Remote errors keep the remote-supplied message and code verbatim. Transport
//! errors ([`CloudConvertError::Transport`]) wrap the underlying
//! `reqwest::Error` without reclassifying it.

use thiserror::Error;

/// All errors produced while driving a CloudConvert job.
#[derive(Debug, Error)]
pub enum CloudConvertError {
    // ── Caller input errors (raised before any remote call) ──────────────
    /// The free-form additional-options string did not parse as a JSON object.
    #[error("Additional options must be a valid JSON object: {detail}")]
    InvalidAdditionalOptions { detail: String },

    /// The named binary attachment does not exist on the input item.
    #[error("Input item {item} has no binary attachment named '{property}'")]
    MissingBinary { item: usize, property: String },

    /// The binary attachment exists but carries no filename.
    /// The upload form requires one; a nameless payload cannot be uploaded.
    #[error("No file name given for input file (item {item}, attachment '{property}')")]
    MissingFileName { item: usize, property: String },

    /// An aggregate operation (merge, archive) was invoked with no input items.
    #[error("Operation '{operation}' needs at least one input item")]
    NoInputItems { operation: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The constructed task graph is not a DAG or references a missing task.
    #[error("Invalid task plan: {detail}")]
    InvalidPlan { detail: String },

    // ── Remote job errors ─────────────────────────────────────────────────
    /// The remote service rejected the job submission with a structured error.
    #[error("{message} (Code: {code})")]
    JobRejected { message: String, code: String },

    /// The job reached terminal `error` status.
    ///
    /// `detail` aggregates every failed task's message and code, with
    /// cascading `INPUT_TASK_FAILED` tasks suppressed down to their root cause.
    #[error("{detail}")]
    JobFailed { job_id: String, detail: String },

    /// An `import/upload` task came back without a one-time upload target.
    #[error("Task '{task}' has no upload form; the job may not have been created correctly")]
    UploadTargetMissing { task: String },

    /// A completed job produced no export file where one was expected.
    #[error("Job '{job_id}' finished without an output file")]
    MissingOutput { job_id: String },

    /// A completed metadata job carried no metadata payload.
    #[error("Job '{job_id}' finished without a metadata result")]
    MissingMetadata { job_id: String },

    // ── Transport ─────────────────────────────────────────────────────────
    /// Network error or non-2xx response with no structured error body.
    /// Propagated unchanged from the HTTP layer.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A recorded failure for one unit of work inside a run.
///
/// Stored in [`crate::run::RunOutput`] so outputs emitted before the
/// failing unit survive. `item` is `None` when the failure belongs to an
/// aggregate job as a whole rather than to one input item.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    /// Index of the input item being processed when the failure occurred.
    pub item: Option<usize>,
    /// The underlying error.
    #[source]
    pub error: CloudConvertError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_rejected_display() {
        let e = CloudConvertError::JobRejected {
            message: "Invalid output format".into(),
            code: "INVALID_DATA".into(),
        };
        assert_eq!(e.to_string(), "Invalid output format (Code: INVALID_DATA)");
    }

    #[test]
    fn job_failed_display_is_verbatim_detail() {
        let e = CloudConvertError::JobFailed {
            job_id: "abc".into(),
            detail: "boom (Code: E1)".into(),
        };
        assert_eq!(e.to_string(), "boom (Code: E1)");
    }

    #[test]
    fn missing_file_name_display() {
        let e = CloudConvertError::MissingFileName {
            item: 2,
            property: "data".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("No file name"), "got: {msg}");
        assert!(msg.contains("item 2"), "got: {msg}");
    }

    #[test]
    fn run_failure_forwards_display() {
        let f = RunFailure {
            item: Some(1),
            error: CloudConvertError::InvalidAdditionalOptions {
                detail: "trailing comma".into(),
            },
        };
        assert!(f.to_string().contains("valid JSON object"));
    }
}
