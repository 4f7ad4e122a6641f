//! Wire model for the CloudConvert v2 job API.
//!
//! Two halves live here:
//!
//! * The **submission** side — [`TaskSpec`] and [`TaskPlan`], built locally by
//!   [`crate::pipeline::plan`] and serialized into the `POST /v2/jobs` body.
//!   Task parameters are deliberately schemaless (a raw JSON map) because the
//!   remote service is the schema authority; we only pin down the fields that
//!   carry graph structure (`operation`, `input`).
//!
//! * The **response** side — [`Job`], [`Task`] and their result payloads, as
//!   deserialized from job creation and the sync long-poll. `Task::operation`
//!   stays a plain string here: the remote side may report task kinds this
//!   crate never submits, and an unknown kind must not break deserialization.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

// ── Submission side ──────────────────────────────────────────────────────

/// Remote capability a task invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskOperation {
    #[serde(rename = "import/upload")]
    ImportUpload,
    #[serde(rename = "import/url")]
    ImportUrl,
    #[serde(rename = "convert")]
    Convert,
    #[serde(rename = "merge")]
    Merge,
    #[serde(rename = "archive")]
    Archive,
    #[serde(rename = "thumbnail")]
    Thumbnail,
    #[serde(rename = "optimize")]
    Optimize,
    #[serde(rename = "watermark")]
    Watermark,
    #[serde(rename = "metadata")]
    Metadata,
    #[serde(rename = "capture-website")]
    CaptureWebsite,
    #[serde(rename = "export/url")]
    ExportUrl,
}

impl TaskOperation {
    /// The wire name of this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskOperation::ImportUpload => "import/upload",
            TaskOperation::ImportUrl => "import/url",
            TaskOperation::Convert => "convert",
            TaskOperation::Merge => "merge",
            TaskOperation::Archive => "archive",
            TaskOperation::Thumbnail => "thumbnail",
            TaskOperation::Optimize => "optimize",
            TaskOperation::Watermark => "watermark",
            TaskOperation::Metadata => "metadata",
            TaskOperation::CaptureWebsite => "capture-website",
            TaskOperation::ExportUrl => "export/url",
        }
    }
}

impl std::fmt::Display for TaskOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dependency reference(s) of a task, by task name.
///
/// Serialized untagged: a single name becomes a JSON string, multiple names a
/// JSON array. Order inside `Many` is meaningful — merge and archive process
/// their inputs in the caller-given sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TaskInput {
    One(String),
    Many(Vec<String>),
}

impl TaskInput {
    /// Iterate the referenced task names regardless of arity.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        match self {
            TaskInput::One(name) => std::slice::from_ref(name).iter(),
            TaskInput::Many(names) => names.iter(),
        }
        .map(String::as_str)
    }
}

/// One task descriptor in a job submission.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSpec {
    /// Remote capability this task invokes.
    pub operation: TaskOperation,
    /// Upstream task reference(s). Absent for import tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<TaskInput>,
    /// Operation-specific parameters, flattened into the task object.
    ///
    /// Key-presence is meaningful to the remote API: an absent optional
    /// parameter must stay absent, never appear as `null`.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl TaskSpec {
    /// A parameterless task for the given operation.
    pub fn new(operation: TaskOperation) -> Self {
        Self {
            operation,
            input: None,
            params: Map::new(),
        }
    }

    /// Set the single upstream dependency.
    pub fn with_input(mut self, name: impl Into<String>) -> Self {
        self.input = Some(TaskInput::One(name.into()));
        self
    }

    /// Set multiple upstream dependencies, preserving order.
    pub fn with_inputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input = Some(TaskInput::Many(names.into_iter().map(Into::into).collect()));
        self
    }

    /// Set an operation-specific parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// An insertion-ordered mapping of task name to [`TaskSpec`].
///
/// Serializes as the JSON object the `POST /v2/jobs` body expects, with tasks
/// in the order the plan builder created them.
#[derive(Debug, Clone, Default)]
pub struct TaskPlan {
    tasks: Vec<(String, TaskSpec)>,
}

impl TaskPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task. A task with the same name replaces the earlier one
    /// in place, keeping its original position.
    pub fn insert(&mut self, name: impl Into<String>, spec: TaskSpec) {
        let name = name.into();
        match self.tasks.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = spec,
            None => self.tasks.push((name, spec)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TaskSpec> {
        self.tasks
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.iter().any(|(n, _)| n == name)
    }

    /// Task names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|(n, _)| n.as_str())
    }

    /// `(name, spec)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskSpec)> {
        self.tasks.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Serialize for TaskPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tasks.len()))?;
        for (name, spec) in &self.tasks {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

// ── Response side ────────────────────────────────────────────────────────

/// Aggregate state of a job or task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Waiting,
    Processing,
    Finished,
    Error,
}

/// Task error code the remote side assigns to tasks that failed only because
/// an upstream dependency failed. Excluded from user-facing error messages.
pub const INPUT_TASK_FAILED: &str = "INPUT_TASK_FAILED";

/// A submitted job as reported by the remote service.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    /// Remote-assigned opaque identifier.
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// One node of a submitted job, as reported by the remote service.
#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    pub name: String,
    /// Wire name of the operation. Kept as a string on the response side so
    /// remote-introduced task kinds never break deserialization.
    pub operation: String,
    pub status: JobStatus,
    /// Error code, present when `status == Error`.
    #[serde(default)]
    pub code: Option<String>,
    /// Error message, present when `status == Error`.
    #[serde(default)]
    pub message: Option<String>,
    /// Operation-dependent result, present when `status == Finished`
    /// (and, for upload tasks, immediately after job creation).
    #[serde(default)]
    pub result: Option<TaskResult>,
}

/// Result payload of a finished task. Shape depends on the operation; the
/// fields are all optional and exactly one family is populated in practice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskResult {
    /// One-time upload target (import/upload tasks).
    #[serde(default)]
    pub form: Option<UploadForm>,
    /// Output file descriptors (export/url tasks).
    #[serde(default)]
    pub files: Option<Vec<TaskResultFile>>,
    /// Extracted metadata object (metadata tasks).
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// One-time upload target returned for an `import/upload` task.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadForm {
    /// URL to POST the multipart form to.
    pub url: String,
    /// Required form fields, to be replayed verbatim and in the order given
    /// before the file part.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Descriptor of one exported output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResultFile {
    pub url: String,
    pub filename: String,
}

/// One entry of the operations catalog
/// (`GET /v2/operations?filter[operation]=…`).
#[derive(Debug, Clone, Deserialize)]
pub struct OperationDescriptor {
    pub operation: String,
    #[serde(default)]
    pub input_format: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_spec_serializes_flat() {
        let spec = TaskSpec::new(TaskOperation::Convert)
            .with_input("upload")
            .with_param("output_format", "pdf");
        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            v,
            json!({ "operation": "convert", "input": "upload", "output_format": "pdf" })
        );
    }

    #[test]
    fn absent_input_is_not_serialized() {
        let spec = TaskSpec::new(TaskOperation::ImportUpload);
        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(v, json!({ "operation": "import/upload" }));
    }

    #[test]
    fn multi_input_preserves_order() {
        let spec = TaskSpec::new(TaskOperation::Merge).with_inputs(["upload-0", "upload-1", "upload-2"]);
        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(v["input"], json!(["upload-0", "upload-1", "upload-2"]));
    }

    #[test]
    fn plan_serializes_in_insertion_order() {
        let mut plan = TaskPlan::new();
        plan.insert("upload", TaskSpec::new(TaskOperation::ImportUpload));
        plan.insert(
            "process",
            TaskSpec::new(TaskOperation::Convert).with_input("upload"),
        );
        plan.insert(
            "export",
            TaskSpec::new(TaskOperation::ExportUrl).with_input("process"),
        );

        let body = serde_json::to_string(&plan).unwrap();
        let upload_pos = body.find("\"upload\"").unwrap();
        let process_pos = body.find("\"process\"").unwrap();
        let export_pos = body.find("\"export\"").unwrap();
        assert!(upload_pos < process_pos && process_pos < export_pos, "got: {body}");
    }

    #[test]
    fn plan_insert_replaces_in_place() {
        let mut plan = TaskPlan::new();
        plan.insert("a", TaskSpec::new(TaskOperation::ImportUpload));
        plan.insert("b", TaskSpec::new(TaskOperation::ExportUrl));
        plan.insert("a", TaskSpec::new(TaskOperation::ImportUrl));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(plan.get("a").unwrap().operation, TaskOperation::ImportUrl);
    }

    #[test]
    fn job_deserializes_from_api_shape() {
        let job: Job = serde_json::from_value(json!({
            "id": "48c34f07",
            "status": "waiting",
            "tag": "pipeline",
            "tasks": [
                {
                    "name": "upload",
                    "operation": "import/upload",
                    "status": "waiting",
                    "result": {
                        "form": {
                            "url": "https://upload.example/form",
                            "parameters": { "key": "abc", "signature": "s1" }
                        }
                    }
                },
                {
                    "name": "process",
                    "operation": "convert",
                    "status": "waiting"
                }
            ]
        }))
        .unwrap();

        assert_eq!(job.id, "48c34f07");
        assert_eq!(job.status, JobStatus::Waiting);
        let form = job.tasks[0].result.as_ref().unwrap().form.as_ref().unwrap();
        assert_eq!(form.url, "https://upload.example/form");
        // preserve_order: the form fields must replay in the order given
        let keys: Vec<_> = form.parameters.keys().collect();
        assert_eq!(keys, vec!["key", "signature"]);
    }

    #[test]
    fn unknown_task_operation_still_deserializes() {
        let task: Task = serde_json::from_value(json!({
            "name": "x",
            "operation": "import/s3",
            "status": "finished"
        }))
        .unwrap();
        assert_eq!(task.operation, "import/s3");
    }
}
