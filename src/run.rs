//! Operation dispatcher: one entry point wiring plan, submit, upload, wait
//! and extract into the full per-run state machine.
//!
//! ## Topologies
//!
//! * **Per-item** (convert, thumbnail, optimize, watermark, metadata,
//!   capture-website): one full job cycle per input item. Outputs carry the
//!   item's paired index; one item can fan out into several output items.
//! * **Aggregate** (merge, archive): one job covering all items, each
//!   contributing its own upload task, producing a single unpaired output.
//!
//! ## Why sequential?
//!
//! Items are processed strictly one after another, each awaiting its full
//! create → upload → wait → download cycle. This bounds concurrent remote
//! jobs to one — deliberate backpressure on the remote API at the cost of
//! wall-clock latency scaling linearly with item count. Any future
//! concurrency here must come with an explicit bound, not a silent
//! `buffer_unordered`.
//!
//! ## Partial success
//!
//! A failure aborts the run at that unit of work, but outputs emitted before
//! it are kept: [`RunOutput`] carries both. No retries happen at any stage,
//! and nothing is rolled back. Callers that want all-or-nothing semantics use
//! [`RunOutput::into_result`].

use crate::client::JobClient;
use crate::config::{Operation, RunConfig};
use crate::error::{CloudConvertError, RunFailure};
use crate::items::{InputItem, OutputItem};
use crate::model::TaskPlan;
use crate::pipeline::{plan, results, upload};
use crate::progress::RunProgressCallback;
use serde_json::Value;
use tracing::{info, warn};

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct RunOutput {
    /// Output items emitted before the run ended, in production order.
    pub items: Vec<OutputItem>,
    /// The failure that stopped the run, if any. Outputs in `items` were
    /// produced by units of work that completed before this failure.
    pub failure: Option<RunFailure>,
}

impl RunOutput {
    /// Whether every unit of work completed.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Treat any failure as an error, discarding partial outputs.
    pub fn into_result(self) -> Result<Vec<OutputItem>, RunFailure> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(self.items),
        }
    }
}

/// Execute one pipeline step: perform `config.operation` over `items`.
///
/// Returns `Err` only for failures raised before any remote call (malformed
/// additional options, an aggregate run with no items, plan validation).
/// Failures during the remote lifecycle are recorded in
/// [`RunOutput::failure`] so outputs of already-completed items survive.
pub async fn run(
    client: &JobClient,
    config: &RunConfig,
    items: &[InputItem],
) -> Result<RunOutput, CloudConvertError> {
    let total = items.len();
    info!(
        "Starting '{}' run over {} input item(s)",
        config.operation.name(),
        total
    );

    // Pre-flight: the plan (including additional-options parsing) is built
    // once, before any remote call is made.
    let task_plan = plan::build_plan(&config.operation, total)?;

    notify(config, |cb| cb.on_run_start(total));

    let output = if config.operation.is_aggregate() {
        run_aggregate(client, config, &task_plan, items).await
    } else {
        run_per_item(client, config, &task_plan, items).await
    };

    notify(config, |cb| cb.on_run_complete(total, output.items.len()));
    match &output.failure {
        None => info!("Run complete: {} output item(s)", output.items.len()),
        Some(failure) => warn!("Run stopped: {failure}"),
    }
    Ok(output)
}

/// One job cycle per input item, strictly sequential.
async fn run_per_item(
    client: &JobClient,
    config: &RunConfig,
    task_plan: &TaskPlan,
    items: &[InputItem],
) -> RunOutput {
    let total = items.len();
    let mut outputs: Vec<OutputItem> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        notify(config, |cb| cb.on_item_start(index, total));

        match process_item(client, config, task_plan, item, index).await {
            Ok(mut produced) => {
                notify(config, |cb| cb.on_item_complete(index, total, produced.len()));
                outputs.append(&mut produced);
            }
            Err(error) => {
                notify(config, |cb| cb.on_item_error(index, total, &error.to_string()));
                return RunOutput {
                    items: outputs,
                    failure: Some(RunFailure {
                        item: Some(index),
                        error,
                    }),
                };
            }
        }
    }

    RunOutput {
        items: outputs,
        failure: None,
    }
}

/// The full lifecycle for one input item.
async fn process_item(
    client: &JobClient,
    config: &RunConfig,
    task_plan: &TaskPlan,
    item: &InputItem,
    index: usize,
) -> Result<Vec<OutputItem>, CloudConvertError> {
    let created = client.create_job(task_plan).await?;

    // URL-sourced operations have no upload task; everything else does.
    if let Some(task) = upload::job_upload_task(&created, 0) {
        let payload = upload::UploadPayload::resolve(&config.input, item, index)?;
        upload::upload_input_file(client, task, payload).await?;
    }

    let completed = client.wait_for_job(&created.id).await?;

    if matches!(config.operation, Operation::Metadata) {
        // Metadata is the one operation with no export stage: the payload is
        // the job's own result, and no binary attachment is produced.
        let metadata =
            results::job_metadata(&completed).ok_or_else(|| CloudConvertError::MissingMetadata {
                job_id: completed.id.clone(),
            })?;
        return Ok(vec![OutputItem::from_json(
            Value::Object(metadata.clone()),
            Some(index),
        )]);
    }

    let mut produced = Vec::new();
    for file in results::job_export_files(&completed) {
        let data = results::download_output_file(client, &file).await?;
        produced.push(OutputItem::from_file(
            config.output_binary_key.clone(),
            data,
            Some(index),
        ));
    }
    Ok(produced)
}

/// One job covering all items; each item feeds its own upload task.
async fn run_aggregate(
    client: &JobClient,
    config: &RunConfig,
    task_plan: &TaskPlan,
    items: &[InputItem],
) -> RunOutput {
    let total = items.len();

    let created = match client.create_job(task_plan).await {
        Ok(job) => job,
        Err(error) => return aggregate_failure(None, error),
    };

    for (index, item) in items.iter().enumerate() {
        notify(config, |cb| cb.on_item_start(index, total));
        let uploaded = async {
            if let Some(task) = upload::job_upload_task(&created, index) {
                let payload = upload::UploadPayload::resolve(&config.input, item, index)?;
                upload::upload_input_file(client, task, payload).await?;
            }
            Ok::<(), CloudConvertError>(())
        }
        .await;

        match uploaded {
            // Uploads emit nothing; the combined output arrives with run completion.
            Ok(()) => notify(config, |cb| cb.on_item_complete(index, total, 0)),
            Err(error) => {
                notify(config, |cb| cb.on_item_error(index, total, &error.to_string()));
                return aggregate_failure(Some(index), error);
            }
        }
    }

    let completed = match client.wait_for_job(&created.id).await {
        Ok(job) => job,
        Err(error) => return aggregate_failure(None, error),
    };

    // Merge and archive combine everything into a single output file.
    let Some(file) = results::job_export_files(&completed).into_iter().next() else {
        return aggregate_failure(
            None,
            CloudConvertError::MissingOutput {
                job_id: completed.id.clone(),
            },
        );
    };

    match results::download_output_file(client, &file).await {
        Ok(data) => RunOutput {
            items: vec![OutputItem::from_file(
                config.output_binary_key.clone(),
                data,
                None,
            )],
            failure: None,
        },
        Err(error) => aggregate_failure(None, error),
    }
}

fn aggregate_failure(item: Option<usize>, error: CloudConvertError) -> RunOutput {
    RunOutput {
        items: Vec::new(),
        failure: Some(RunFailure { item, error }),
    }
}

fn notify(config: &RunConfig, event: impl FnOnce(&dyn RunProgressCallback)) {
    if let Some(callback) = &config.progress_callback {
        event(callback.as_ref());
    }
}
