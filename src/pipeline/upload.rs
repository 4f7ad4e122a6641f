//! Upload choreography: push source bytes to a job's one-time upload target.
//!
//! An `import/upload` task comes back from job creation carrying a form
//! descriptor (URL + required fields). The multipart request must replay
//! every required field verbatim and in the order given, with the file part
//! appended last — the target is an S3-style presigned POST and rejects
//! forms with the payload before the policy fields.
//!
//! Exactly one upload per task; there is no resumable or chunked path and no
//! retry. A failed upload aborts the whole item's processing.

use crate::client::JobClient;
use crate::config::InputSource;
use crate::error::CloudConvertError;
use crate::items::InputItem;
use crate::model::{Job, Task, TaskOperation};
use serde_json::Value;
use tracing::debug;

/// Bytes and file metadata for one upload.
#[derive(Debug)]
pub struct UploadPayload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

impl UploadPayload {
    /// Resolve the payload for `item` according to the configured source.
    ///
    /// Binary sourcing fails hard when the attachment is missing or carries
    /// no filename — a nameless binary cannot be uploaded. Text sourcing
    /// uses the caller-supplied filename and `text/plain`.
    pub fn resolve(
        source: &InputSource,
        item: &InputItem,
        item_index: usize,
    ) -> Result<Self, CloudConvertError> {
        match source {
            InputSource::Binary { property } => {
                let binary =
                    item.binary
                        .get(property)
                        .ok_or_else(|| CloudConvertError::MissingBinary {
                            item: item_index,
                            property: property.clone(),
                        })?;
                let filename =
                    binary
                        .file_name
                        .clone()
                        .ok_or_else(|| CloudConvertError::MissingFileName {
                            item: item_index,
                            property: property.clone(),
                        })?;
                Ok(UploadPayload {
                    bytes: binary.data.clone(),
                    filename,
                    content_type: binary.mime_type.clone(),
                })
            }
            InputSource::Text { content, filename } => Ok(UploadPayload {
                bytes: content.clone().into_bytes(),
                filename: filename.clone(),
                content_type: Some("text/plain".into()),
            }),
        }
    }
}

/// The Nth `import/upload` task of a job, in job-array order.
///
/// Returns `None` when the job has no such task at that position — operations
/// that source input by URL (capture-website) have no upload tasks at all.
pub fn job_upload_task(job: &Job, index: usize) -> Option<&Task> {
    job.tasks
        .iter()
        .filter(|task| task.operation == TaskOperation::ImportUpload.as_str())
        .nth(index)
}

/// Stream `payload` to the upload task's one-time target.
pub async fn upload_input_file(
    client: &JobClient,
    task: &Task,
    payload: UploadPayload,
) -> Result<(), CloudConvertError> {
    let form_spec = task
        .result
        .as_ref()
        .and_then(|result| result.form.as_ref())
        .ok_or_else(|| CloudConvertError::UploadTargetMissing {
            task: task.name.clone(),
        })?;

    debug!(
        "Uploading '{}' ({} bytes) for task '{}'",
        payload.filename,
        payload.bytes.len(),
        task.name
    );

    // Required form fields first, verbatim and in order; file part last.
    let mut form = reqwest::multipart::Form::new();
    for (key, value) in &form_spec.parameters {
        form = form.text(key.clone(), form_field_text(value));
    }

    let mut part =
        reqwest::multipart::Part::bytes(payload.bytes).file_name(payload.filename);
    if let Some(mime) = &payload.content_type {
        part = part.mime_str(mime)?;
    }
    form = form.part("file", part);

    client
        .http()
        .post(&form_spec.url)
        .multipart(form)
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}

/// Render one upload-form field value as form text.
///
/// The API sends strings; anything else is carried through as compact JSON
/// rather than rejected, since the remote service owns the form contract.
fn form_field_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::BinaryData;
    use serde_json::json;

    fn job_with_tasks(tasks: serde_json::Value) -> Job {
        serde_json::from_value(json!({
            "id": "job-1",
            "status": "waiting",
            "tasks": tasks
        }))
        .unwrap()
    }

    #[test]
    fn upload_task_lookup_is_zero_indexed() {
        let job = job_with_tasks(json!([
            { "name": "upload-0", "operation": "import/upload", "status": "waiting" },
            { "name": "process", "operation": "merge", "status": "waiting" },
            { "name": "upload-1", "operation": "import/upload", "status": "waiting" }
        ]));
        assert_eq!(job_upload_task(&job, 0).unwrap().name, "upload-0");
        assert_eq!(job_upload_task(&job, 1).unwrap().name, "upload-1");
        assert!(job_upload_task(&job, 2).is_none());
    }

    #[test]
    fn url_sourced_jobs_have_no_upload_task() {
        let job = job_with_tasks(json!([
            { "name": "process", "operation": "capture-website", "status": "waiting" },
            { "name": "export", "operation": "export/url", "status": "waiting" }
        ]));
        assert!(job_upload_task(&job, 0).is_none());
    }

    #[test]
    fn binary_payload_requires_filename() {
        let mut item = InputItem::from_binary(
            "data",
            BinaryData {
                data: vec![1, 2, 3],
                file_name: None,
                mime_type: Some("application/pdf".into()),
            },
        );
        let source = InputSource::Binary {
            property: "data".into(),
        };
        let err = UploadPayload::resolve(&source, &item, 0).unwrap_err();
        assert!(matches!(err, CloudConvertError::MissingFileName { .. }));

        item.binary.get_mut("data").unwrap().file_name = Some("doc.pdf".into());
        let payload = UploadPayload::resolve(&source, &item, 0).unwrap();
        assert_eq!(payload.filename, "doc.pdf");
        assert_eq!(payload.content_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn missing_binary_property_fails() {
        let item = InputItem::default();
        let source = InputSource::Binary {
            property: "data".into(),
        };
        let err = UploadPayload::resolve(&source, &item, 3).unwrap_err();
        assert!(matches!(
            err,
            CloudConvertError::MissingBinary { item: 3, .. }
        ));
    }

    #[test]
    fn text_payload_is_plain_text() {
        let source = InputSource::Text {
            content: "hello world".into(),
            filename: "note.txt".into(),
        };
        let payload = UploadPayload::resolve(&source, &InputItem::default(), 0).unwrap();
        assert_eq!(payload.bytes, b"hello world");
        assert_eq!(payload.filename, "note.txt");
        assert_eq!(payload.content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn form_field_text_passes_strings_verbatim() {
        assert_eq!(form_field_text(&json!("abc")), "abc");
        assert_eq!(form_field_text(&json!(42)), "42");
    }
}
