//! Result extraction: pull output files and metadata out of a finished job.
//!
//! A single export task may yield several files (one input PDF exploded into
//! one PNG per page), and a job may in principle carry several export tasks;
//! [`job_export_files`] flattens them in task-then-file order so output
//! fan-out stays deterministic. Metadata jobs have no export task at all —
//! their payload is read straight off the finished `metadata` task.

use crate::client::JobClient;
use crate::error::CloudConvertError;
use crate::items::BinaryData;
use crate::model::{Job, JobStatus, TaskOperation, TaskResultFile};
use serde_json::{Map, Value};
use tracing::debug;

/// All output file descriptors of a job's finished `export/url` tasks,
/// flattened in task order, then within-task file order.
///
/// Unfinished export tasks contribute nothing: their `result` is not
/// populated yet and must not be guessed at.
pub fn job_export_files(job: &Job) -> Vec<TaskResultFile> {
    job.tasks
        .iter()
        .filter(|task| {
            task.operation == TaskOperation::ExportUrl.as_str()
                && task.status == JobStatus::Finished
        })
        .flat_map(|task| {
            task.result
                .as_ref()
                .and_then(|result| result.files.as_deref())
                .unwrap_or(&[])
        })
        .cloned()
        .collect()
}

/// The metadata object of the job's finished `metadata` task, if any.
pub fn job_metadata(job: &Job) -> Option<&Map<String, Value>> {
    job.tasks
        .iter()
        .find(|task| {
            task.operation == TaskOperation::Metadata.as_str()
                && task.status == JobStatus::Finished
        })
        .and_then(|task| task.result.as_ref())
        .and_then(|result| result.metadata.as_ref())
}

/// Download one exported file and wrap it as a binary attachment.
///
/// The export URL is a presigned link, so the request is unauthenticated.
/// The response's `content-type` header becomes the attachment's MIME type;
/// no checksum verification is performed — the remote metadata is trusted.
pub async fn download_output_file(
    client: &JobClient,
    file: &TaskResultFile,
) -> Result<BinaryData, CloudConvertError> {
    debug!("Downloading output file '{}'", file.filename);
    let response = client
        .http()
        .get(&file.url)
        .send()
        .await?
        .error_for_status()?;

    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let bytes = response.bytes().await?;
    debug!("Downloaded {} bytes for '{}'", bytes.len(), file.filename);

    Ok(BinaryData {
        data: bytes.to_vec(),
        file_name: Some(file.filename.clone()),
        mime_type,
    })
}
