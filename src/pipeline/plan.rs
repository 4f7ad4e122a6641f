//! Job-graph construction: turn an [`Operation`] into a [`TaskPlan`].
//!
//! Every plan follows the same skeleton: zero or more import tasks feed a
//! single `process` task, and (except for `metadata`, which downloads
//! nothing) an `export/url` task hangs off `process`. Local-file operations
//! import via `import/upload`; capture-website and the watermark image source
//! via `import/url`.
//!
//! Optional parameters follow the omission policy: a key is only inserted
//! when the caller supplied a non-empty value, because the remote API treats
//! key-presence as "set".
//!
//! Free-form additional options are deep-merged into the `process` task's
//! parameters: object values merge recursively, everything else (arrays
//! included) replaces the base value outright. The asymmetry is deliberate —
//! an override array is a complete replacement list, not an append.

use crate::config::Operation;
use crate::error::CloudConvertError;
use crate::model::{TaskInput, TaskOperation, TaskPlan, TaskSpec};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Name of the single upload task in per-item plans.
pub const UPLOAD_TASK: &str = "upload";
/// Name of the processing task in every plan.
pub const PROCESS_TASK: &str = "process";
/// Name of the export task in file-producing plans.
pub const EXPORT_TASK: &str = "export";
/// Name of the watermark image import task.
pub const WATERMARK_IMAGE_TASK: &str = "watermark-image";

/// Name of the Nth upload task in aggregate plans.
pub fn upload_task_name(index: usize) -> String {
    format!("upload-{index}")
}

/// Build the task graph for `operation`.
///
/// `item_count` is consulted only by aggregate operations (merge, archive),
/// which attach one upload task per input item; per-item operations build the
/// same three-task plan regardless of how many items the run covers.
pub fn build_plan(operation: &Operation, item_count: usize) -> Result<TaskPlan, CloudConvertError> {
    let mut plan = TaskPlan::new();

    match operation {
        Operation::Convert(p) => {
            plan.insert(UPLOAD_TASK, TaskSpec::new(TaskOperation::ImportUpload));
            plan.insert(
                PROCESS_TASK,
                TaskSpec::new(TaskOperation::Convert)
                    .with_input(UPLOAD_TASK)
                    .with_param("output_format", p.output_format.as_str()),
            );
            plan.insert(EXPORT_TASK, export_spec());
            apply_additional_options(&mut plan, p.additional_options.as_deref())?;
        }

        Operation::Thumbnail(p) => {
            let mut process = TaskSpec::new(TaskOperation::Thumbnail)
                .with_input(UPLOAD_TASK)
                .with_param("output_format", p.output_format.as_str());
            if let Some(width) = p.width {
                process = process.with_param("width", width);
            }
            if let Some(height) = p.height {
                process = process.with_param("height", height);
            }
            if let Some(fit) = p.fit {
                process = process.with_param("fit", fit.as_str());
            }
            plan.insert(UPLOAD_TASK, TaskSpec::new(TaskOperation::ImportUpload));
            plan.insert(PROCESS_TASK, process);
            plan.insert(EXPORT_TASK, export_spec());
            apply_additional_options(&mut plan, p.additional_options.as_deref())?;
        }

        Operation::Optimize(p) => {
            plan.insert(UPLOAD_TASK, TaskSpec::new(TaskOperation::ImportUpload));
            plan.insert(
                PROCESS_TASK,
                TaskSpec::new(TaskOperation::Optimize).with_input(UPLOAD_TASK),
            );
            plan.insert(EXPORT_TASK, export_spec());
            apply_additional_options(&mut plan, p.additional_options.as_deref())?;
        }

        Operation::Watermark(p) => {
            let mut process = TaskSpec::new(TaskOperation::Watermark).with_input(UPLOAD_TASK);
            if let Some(text) = non_empty(p.text.as_deref()) {
                process = process.with_param("text", text);
            }
            if let Some(size) = p.font_size {
                process = process.with_param("font_size", size);
            }
            if let Some(color) = non_empty(p.font_color.as_deref()) {
                process = process.with_param("font_color", color);
            }
            if let Some(pos) = non_empty(p.position_vertical.as_deref()) {
                process = process.with_param("position_vertical", pos);
            }
            if let Some(pos) = non_empty(p.position_horizontal.as_deref()) {
                process = process.with_param("position_horizontal", pos);
            }
            if let Some(margin) = p.margin_vertical {
                process = process.with_param("margin_vertical", margin);
            }
            if let Some(margin) = p.margin_horizontal {
                process = process.with_param("margin_horizontal", margin);
            }
            if let Some(opacity) = p.opacity {
                process = process.with_param("opacity", opacity);
            }
            let image_url = non_empty(p.image_url.as_deref());
            if image_url.is_some() {
                process = process.with_param("image", WATERMARK_IMAGE_TASK);
            }

            plan.insert(UPLOAD_TASK, TaskSpec::new(TaskOperation::ImportUpload));
            plan.insert(PROCESS_TASK, process);
            plan.insert(EXPORT_TASK, export_spec());
            if let Some(url) = image_url {
                plan.insert(
                    WATERMARK_IMAGE_TASK,
                    TaskSpec::new(TaskOperation::ImportUrl).with_param("url", url),
                );
            }
            apply_additional_options(&mut plan, p.additional_options.as_deref())?;
        }

        Operation::Metadata => {
            // Nothing is downloaded for metadata, so no export task exists.
            plan.insert(UPLOAD_TASK, TaskSpec::new(TaskOperation::ImportUpload));
            plan.insert(
                PROCESS_TASK,
                TaskSpec::new(TaskOperation::Metadata).with_input(UPLOAD_TASK),
            );
        }

        Operation::CaptureWebsite(p) => {
            plan.insert(
                PROCESS_TASK,
                TaskSpec::new(TaskOperation::CaptureWebsite)
                    .with_param("url", p.url.as_str())
                    .with_param("output_format", p.output_format.as_str()),
            );
            plan.insert(EXPORT_TASK, export_spec());
            apply_additional_options(&mut plan, p.additional_options.as_deref())?;
        }

        Operation::Merge(p) => {
            aggregate_plan(
                &mut plan,
                TaskOperation::Merge,
                &p.output_format,
                item_count,
                operation.name(),
            )?;
            apply_additional_options(&mut plan, p.additional_options.as_deref())?;
        }

        Operation::Archive(p) => {
            aggregate_plan(
                &mut plan,
                TaskOperation::Archive,
                &p.output_format,
                item_count,
                operation.name(),
            )?;
            apply_additional_options(&mut plan, p.additional_options.as_deref())?;
        }
    }

    Ok(plan)
}

/// One upload task per input item, all referenced in input order by a single
/// processing task.
fn aggregate_plan(
    plan: &mut TaskPlan,
    process_op: TaskOperation,
    output_format: &str,
    item_count: usize,
    operation_name: &str,
) -> Result<(), CloudConvertError> {
    if item_count == 0 {
        return Err(CloudConvertError::NoInputItems {
            operation: operation_name.to_string(),
        });
    }

    let upload_names: Vec<String> = (0..item_count).map(upload_task_name).collect();
    for name in &upload_names {
        plan.insert(name.clone(), TaskSpec::new(TaskOperation::ImportUpload));
    }
    plan.insert(
        PROCESS_TASK,
        TaskSpec::new(process_op)
            .with_inputs(upload_names)
            .with_param("output_format", output_format),
    );
    plan.insert(EXPORT_TASK, export_spec());
    Ok(())
}

fn export_spec() -> TaskSpec {
    TaskSpec::new(TaskOperation::ExportUrl).with_input(PROCESS_TASK)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

// ── Additional-options merging ───────────────────────────────────────────

/// Parse the free-form options string and deep-merge it into the `process`
/// task's parameters. `None` or blank input is a no-op; anything that is not
/// a JSON object is a hard error raised before any remote call.
fn apply_additional_options(
    plan: &mut TaskPlan,
    raw: Option<&str>,
) -> Result<(), CloudConvertError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    let overlay = parse_additional_options(raw)?;
    if let Some(process) = plan.get_mut(PROCESS_TASK) {
        merge_objects(&mut process.params, &overlay);
    }
    Ok(())
}

fn parse_additional_options(raw: &str) -> Result<Map<String, Value>, CloudConvertError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| CloudConvertError::InvalidAdditionalOptions {
            detail: e.to_string(),
        })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CloudConvertError::InvalidAdditionalOptions {
            detail: format!("expected an object, got {}", json_type_name(&other)),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Deep-merge `overlay` into `base`.
///
/// Object values merge recursively key-by-key; any other overlay value
/// (arrays included) replaces the base value outright.
pub fn merge_objects(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(key), overlay_value) {
            (Some(Value::Object(base_obj)), Value::Object(overlay_obj)) => {
                merge_objects(base_obj, overlay_obj);
            }
            _ => {
                base.insert(key.clone(), overlay_value.clone());
            }
        }
    }
}

// ── Structural validation ────────────────────────────────────────────────

/// Check the structural invariants of a plan: every `input` reference names a
/// task present in the same graph, and the dependency edges form a DAG.
///
/// The builders above can never violate these, but the check is cheap and
/// runs once per submission as a guard for hand-built plans.
pub fn validate(plan: &TaskPlan) -> Result<(), CloudConvertError> {
    for (name, spec) in plan.iter() {
        if let Some(input) = &spec.input {
            for dep in input.names() {
                if !plan.contains(dep) {
                    return Err(CloudConvertError::InvalidPlan {
                        detail: format!("task '{name}' references unknown task '{dep}'"),
                    });
                }
            }
        }
    }

    // Depth-first walk over input edges; a back edge means a cycle.
    const IN_STACK: u8 = 1;
    const DONE: u8 = 2;
    fn visit<'a>(
        plan: &'a TaskPlan,
        name: &'a str,
        state: &mut HashMap<&'a str, u8>,
    ) -> Result<(), CloudConvertError> {
        match state.get(name) {
            Some(&IN_STACK) => {
                return Err(CloudConvertError::InvalidPlan {
                    detail: format!("dependency cycle through task '{name}'"),
                })
            }
            Some(&DONE) => return Ok(()),
            _ => {}
        }
        state.insert(name, IN_STACK);
        if let Some(input) = plan.get(name).and_then(|spec| spec.input.as_ref()) {
            for dep in input.names() {
                visit(plan, dep, state)?;
            }
        }
        state.insert(name, DONE);
        Ok(())
    }

    let mut state = HashMap::new();
    for name in plan.names() {
        visit(plan, name, &mut state)?;
    }
    Ok(())
}
