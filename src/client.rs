//! HTTP client for the CloudConvert v2 job API.
//!
//! [`JobClient`] owns the connection pool, the credential capability, and the
//! endpoint configuration. Three calls make up the job lifecycle:
//!
//! 1. [`JobClient::create_job`] — `POST /v2/jobs` with the serialized task
//!    plan; returns the created job with its upload targets populated.
//! 2. [`JobClient::wait_for_job`] — one blocking GET against the sync domain.
//!    The remote side holds the request open until the job reaches a terminal
//!    state; no client-side timeout is layered on top, so the remote timeout
//!    is the only liveness bound.
//! 3. [`JobClient::list_output_formats`] — the operations catalog, used to
//!    present selectable output formats to a caller. Not part of the job
//!    lifecycle itself.
//!
//! Remote rejections with a structured error body surface as
//! [`CloudConvertError::JobRejected`] carrying the remote message and code
//! verbatim; anything else propagates as a transport error unchanged.

use crate::auth::Credentials;
use crate::error::CloudConvertError;
use crate::model::{Job, JobStatus, OperationDescriptor, TaskPlan, INPUT_TASK_FAILED};
use crate::pipeline::plan;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

/// Default base URL of the job API.
pub const API_BASE: &str = "https://api.cloudconvert.com";
/// Default base URL of the synchronous long-poll domain.
pub const SYNC_API_BASE: &str = "https://sync.api.cloudconvert.com";
/// Tag attached to every submitted job for remote-side bookkeeping.
pub const DEFAULT_JOB_TAG: &str = "ccflow";

/// Response envelope used by every JSON endpoint.
#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Structured error body the API returns on rejected requests.
#[derive(Deserialize)]
struct RemoteError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for submitting and tracking CloudConvert jobs.
#[derive(Debug, Clone)]
pub struct JobClient {
    http: reqwest::Client,
    credentials: Credentials,
    api_base: String,
    sync_base: String,
    tag: String,
}

impl JobClient {
    /// Create a client against the production endpoints.
    pub fn new(credentials: Credentials) -> Result<Self, CloudConvertError> {
        Self::builder(credentials).build()
    }

    /// Create a builder for endpoint/tag overrides (sandbox, tests).
    pub fn builder(credentials: Credentials) -> JobClientBuilder {
        JobClientBuilder {
            credentials,
            api_base: API_BASE.to_string(),
            sync_base: SYNC_API_BASE.to_string(),
            tag: DEFAULT_JOB_TAG.to_string(),
        }
    }

    /// The shared HTTP client, for unauthenticated upload/download calls.
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Submit a task plan and return the created job.
    ///
    /// The returned job's tasks are initially `waiting`; its `import/upload`
    /// tasks already carry their one-time upload targets.
    pub async fn create_job(&self, tasks: &TaskPlan) -> Result<Job, CloudConvertError> {
        plan::validate(tasks)?;

        debug!("Creating job with {} tasks", tasks.len());
        let response = self
            .credentials
            .apply(self.http.post(format!("{}/v2/jobs", self.api_base)))
            .json(&json!({ "tag": self.tag, "tasks": tasks }))
            .send()
            .await?;

        if let Err(status_error) = response.error_for_status_ref() {
            // Prefer the structured remote error; otherwise propagate the
            // transport error unchanged.
            if let Ok(RemoteError {
                code: Some(code),
                message,
            }) = response.json::<RemoteError>().await
            {
                return Err(CloudConvertError::JobRejected {
                    message: message.unwrap_or_else(|| "Job submission rejected".into()),
                    code,
                });
            }
            return Err(status_error.into());
        }

        let envelope: DataEnvelope<Job> = response.json().await?;
        info!("Created job {}", envelope.data.id);
        Ok(envelope.data)
    }

    /// Block until the job reaches a terminal state and return it.
    ///
    /// Issues one long-poll GET against the sync domain; the remote side
    /// holds the request open until the job is `finished` or `error`. On
    /// `error` the job's task failures are aggregated into
    /// [`CloudConvertError::JobFailed`], with cascading `INPUT_TASK_FAILED`
    /// tasks suppressed.
    pub async fn wait_for_job(&self, id: &str) -> Result<Job, CloudConvertError> {
        debug!("Waiting for job {id}");
        let envelope: DataEnvelope<Job> = self
            .credentials
            .apply(self.http.get(format!("{}/v2/jobs/{id}", self.sync_base)))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let job = envelope.data;
        if job.status == JobStatus::Error {
            return Err(CloudConvertError::JobFailed {
                job_id: job.id.clone(),
                detail: job_error_message(&job),
            });
        }
        info!("Job {} finished with {} tasks", job.id, job.tasks.len());
        Ok(job)
    }

    /// List the output formats the remote service offers for `operation`.
    ///
    /// Backed by `GET /v2/operations?filter[operation]={operation}`. Intended
    /// for presenting choices to a caller, not for runtime validation — the
    /// remote service stays the schema authority.
    pub async fn list_output_formats(
        &self,
        operation: &str,
    ) -> Result<Vec<String>, CloudConvertError> {
        let envelope: DataEnvelope<Vec<OperationDescriptor>> = self
            .credentials
            .apply(self.http.get(format!("{}/v2/operations", self.api_base)))
            .query(&[("filter[operation]", operation)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut formats: Vec<String> = Vec::new();
        for descriptor in envelope.data {
            if let Some(format) = descriptor.output_format {
                if !formats.contains(&format) {
                    formats.push(format);
                }
            }
        }
        Ok(formats)
    }
}

/// Builder for [`JobClient`].
#[derive(Debug)]
pub struct JobClientBuilder {
    credentials: Credentials,
    api_base: String,
    sync_base: String,
    tag: String,
}

impl JobClientBuilder {
    /// Override the job API base URL (e.g. the sandbox domain).
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = trim_trailing_slash(base.into());
        self
    }

    /// Override the sync long-poll base URL.
    pub fn sync_base(mut self, base: impl Into<String>) -> Self {
        self.sync_base = trim_trailing_slash(base.into());
        self
    }

    /// Override the tag attached to submitted jobs.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Build the client.
    ///
    /// The underlying HTTP client is built without a request timeout: the
    /// sync long-poll must stay open for as long as the remote job runs.
    pub fn build(self) -> Result<JobClient, CloudConvertError> {
        let http = reqwest::Client::builder().build()?;
        Ok(JobClient {
            http,
            credentials: self.credentials,
            api_base: self.api_base,
            sync_base: self.sync_base,
            tag: self.tag,
        })
    }
}

fn trim_trailing_slash(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

/// Aggregate a failed job's task errors into one user-facing message.
///
/// Every task with `status = error` whose code is not `INPUT_TASK_FAILED`
/// contributes `"<message> (Code: <code or '?'>)"`; the fragments are joined
/// with `"; "`. Tasks that failed only because an upstream dependency failed
/// carry no information beyond the root cause and are suppressed.
pub fn job_error_message(job: &Job) -> String {
    job.tasks
        .iter()
        .filter(|task| {
            task.status == JobStatus::Error && task.code.as_deref() != Some(INPUT_TASK_FAILED)
        })
        .map(|task| {
            format!(
                "{} (Code: {})",
                task.message.as_deref().unwrap_or_default(),
                task.code.as_deref().unwrap_or("?")
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job_with_tasks(tasks: serde_json::Value) -> Job {
        serde_json::from_value(json!({
            "id": "job-1",
            "status": "error",
            "tasks": tasks
        }))
        .unwrap()
    }

    #[test]
    fn error_message_suppresses_cascading_failures() {
        let job = job_with_tasks(json!([
            {
                "name": "export",
                "operation": "export/url",
                "status": "error",
                "code": "INPUT_TASK_FAILED",
                "message": "Input task has failed"
            },
            {
                "name": "process",
                "operation": "convert",
                "status": "error",
                "code": "E1",
                "message": "boom"
            }
        ]));
        assert_eq!(job_error_message(&job), "boom (Code: E1)");
    }

    #[test]
    fn error_message_joins_multiple_root_causes() {
        let job = job_with_tasks(json!([
            { "name": "a", "operation": "convert", "status": "error", "code": "E1", "message": "first" },
            { "name": "b", "operation": "convert", "status": "error", "code": "E2", "message": "second" },
            { "name": "c", "operation": "export/url", "status": "finished" }
        ]));
        assert_eq!(
            job_error_message(&job),
            "first (Code: E1); second (Code: E2)"
        );
    }

    #[test]
    fn error_message_uses_question_mark_for_missing_code() {
        let job = job_with_tasks(json!([
            { "name": "a", "operation": "convert", "status": "error", "message": "no code here" }
        ]));
        assert_eq!(job_error_message(&job), "no code here (Code: ?)");
    }

    #[test]
    fn error_message_ignores_non_error_tasks() {
        let job = job_with_tasks(json!([
            { "name": "a", "operation": "import/upload", "status": "finished" },
            { "name": "b", "operation": "convert", "status": "waiting" }
        ]));
        assert_eq!(job_error_message(&job), "");
    }

    #[test]
    fn builder_trims_trailing_slashes() {
        let client = JobClient::builder(Credentials::ApiKey("k".into()))
            .api_base("https://api.sandbox.cloudconvert.com/")
            .sync_base("https://sync.api.sandbox.cloudconvert.com//")
            .tag("test")
            .build()
            .unwrap();
        assert_eq!(client.api_base, "https://api.sandbox.cloudconvert.com");
        assert_eq!(client.sync_base, "https://sync.api.sandbox.cloudconvert.com");
    }
}
