//! End-to-end integration tests for cloudconvert-flow.
//!
//! These tests create real jobs against the live CloudConvert API and are
//! gated behind the `E2E_ENABLED` environment variable (plus a valid
//! `CLOUDCONVERT_API_KEY`) so they do not run in CI unless explicitly
//! requested. Point `--api-base`/`--sync-base` style overrides at the
//! sandbox domain via `CLOUDCONVERT_SANDBOX=1` to avoid consuming
//! production credits.
//!
//! Run with:
//!   E2E_ENABLED=1 CLOUDCONVERT_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_convert -- --nocapture

use cloudconvert_flow::{
    run, BinaryData, Credentials, InputItem, JobClient, MergeParams, Operation, RunConfig,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set and an API key is available.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        match cloudconvert_flow::Credentials::from_env() {
            Some(credentials) => credentials,
            None => {
                println!("SKIP — set CLOUDCONVERT_API_KEY to run e2e tests");
                return;
            }
        }
    }};
}

fn client_for(credentials: Credentials) -> JobClient {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let mut builder = JobClient::builder(credentials).tag("ccflow-e2e");
    if std::env::var("CLOUDCONVERT_SANDBOX").is_ok() {
        builder = builder
            .api_base("https://api.sandbox.cloudconvert.com")
            .sync_base("https://sync.api.sandbox.cloudconvert.com");
    }
    builder.build().expect("client construction")
}

/// A small but real plain-text input the API will accept for txt → pdf.
fn text_item(name: &str, body: &str) -> InputItem {
    InputItem::from_binary(
        "data",
        BinaryData::new(body.as_bytes().to_vec(), name).with_mime_type("text/plain"),
    )
}

// ── Live job tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_txt_to_pdf() {
    let credentials = e2e_skip_unless_ready!();
    let client = client_for(credentials);

    let config = RunConfig::builder(Operation::Convert(cloudconvert_flow::ConvertParams {
        output_format: "pdf".into(),
        additional_options: None,
    }))
    .build()
    .expect("config");

    let items = vec![text_item("hello.txt", "Hello from the e2e suite.\n")];
    let output = run(&client, &config, &items).await.expect("run");
    let outputs = output.into_result().expect("complete run");

    assert_eq!(outputs.len(), 1);
    let (key, data) = outputs[0].binary.as_ref().expect("binary attachment");
    assert_eq!(key, "data");
    assert!(data.data.starts_with(b"%PDF"), "expected a PDF payload");
    assert_eq!(outputs[0].paired_item, Some(0));
    println!(
        "✓ converted to {} ({} bytes)",
        data.file_name.as_deref().unwrap_or("?"),
        data.data.len()
    );
}

#[tokio::test]
async fn test_metadata_extraction() {
    let credentials = e2e_skip_unless_ready!();
    let client = client_for(credentials);

    let config = RunConfig::builder(Operation::Metadata)
        .build()
        .expect("config");

    let items = vec![text_item("meta.txt", "one line of text\n")];
    let output = run(&client, &config, &items).await.expect("run");
    let outputs = output.into_result().expect("complete run");

    assert_eq!(outputs.len(), 1);
    assert!(outputs[0].binary.is_none(), "metadata emits no attachment");
    assert!(
        outputs[0].json.as_object().is_some_and(|m| !m.is_empty()),
        "expected a non-empty metadata object, got: {}",
        outputs[0].json
    );
}

#[tokio::test]
async fn test_merge_two_files_single_output() {
    let credentials = e2e_skip_unless_ready!();
    let client = client_for(credentials);

    let config = RunConfig::builder(Operation::Merge(MergeParams {
        output_format: "pdf".into(),
        additional_options: None,
    }))
    .build()
    .expect("config");

    let items = vec![
        text_item("first.txt", "first document\n"),
        text_item("second.txt", "second document\n"),
    ];
    let output = run(&client, &config, &items).await.expect("run");
    let outputs = output.into_result().expect("complete run");

    // Aggregate operations collapse every input into one unpaired output.
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].paired_item, None);
    assert!(outputs[0].binary.is_some());
}

#[tokio::test]
async fn test_failure_keeps_outputs_of_earlier_items() {
    let credentials = e2e_skip_unless_ready!();
    let client = client_for(credentials);

    let config = RunConfig::builder(Operation::Convert(cloudconvert_flow::ConvertParams {
        output_format: "pdf".into(),
        additional_options: None,
    }))
    .build()
    .expect("config");

    // Item 0 converts fine; item 1 carries a nameless binary, which fails
    // its cycle after item 0's job already completed.
    let nameless = InputItem::from_binary(
        "data",
        BinaryData {
            data: b"orphan bytes".to_vec(),
            file_name: None,
            mime_type: None,
        },
    );
    let items = vec![text_item("first.txt", "survives the failure\n"), nameless];

    let output = run(&client, &config, &items).await.expect("run");

    assert_eq!(output.items.len(), 1, "item 0's output must be kept");
    assert_eq!(output.items[0].paired_item, Some(0));
    let failure = output.failure.as_ref().expect("run must record the failure");
    assert_eq!(failure.item, Some(1));
}

#[tokio::test]
async fn test_invalid_format_reports_remote_error() {
    let credentials = e2e_skip_unless_ready!();
    let client = client_for(credentials);

    let config = RunConfig::builder(Operation::Convert(cloudconvert_flow::ConvertParams {
        output_format: "not-a-real-format".into(),
        additional_options: None,
    }))
    .build()
    .expect("config");

    let items = vec![text_item("bad.txt", "payload\n")];
    let output = run(&client, &config, &items).await.expect("run");

    let failure = output.into_result().expect_err("run should fail");
    assert_eq!(failure.item, Some(0));
    println!("✓ remote rejection surfaced as: {failure}");
}

// ── Operations listing ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_convert_output_formats() {
    let credentials = e2e_skip_unless_ready!();
    let client = client_for(credentials);

    let formats = client
        .list_output_formats("convert")
        .await
        .expect("list_output_formats");
    assert!(
        formats.iter().any(|f| f == "pdf"),
        "convert should offer pdf, got {} formats",
        formats.len()
    );

    // Deduplicated: no format may appear twice.
    let mut seen = std::collections::HashSet::new();
    for format in &formats {
        assert!(seen.insert(format), "duplicate format '{format}'");
    }
}
