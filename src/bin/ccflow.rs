//! CLI binary for cloudconvert-flow.
//!
//! A thin shim over the library crate that maps CLI flags to a `RunConfig`,
//! reads local files as input items, and writes output attachments to disk.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cloudconvert_flow::{
    run, ArchiveParams, BinaryData, CaptureWebsiteParams, ConvertParams, Credentials, InputItem,
    JobClient, MergeParams, Operation, OptimizeParams, RunConfig, RunProgressCallback,
    ThumbnailFit, ThumbnailParams, WatermarkParams,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a steady spinner plus one log line per processed item.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl RunProgressCallback for CliProgress {
    fn on_item_start(&self, item: usize, total: usize) {
        self.bar.set_message(format!("item {}/{total}", item + 1));
    }

    fn on_item_complete(&self, item: usize, total: usize, outputs: usize) {
        self.bar.println(format!(
            "  {} Item {:>2}/{:<2}  {}",
            green("✓"),
            item + 1,
            total,
            dim(&format!("{outputs} output(s)")),
        ));
    }

    fn on_item_error(&self, item: usize, total: usize, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 120 {
            let head: String = error.chars().take(119).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Item {:>2}/{:<2}  {}",
            red("✗"),
            item + 1,
            total,
            red(&msg),
        ));
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert files to PDF
  ccflow convert --format pdf report.docx slides.pptx

  # Thumbnails with fixed width
  ccflow thumbnail --format png --width 320 photo.jpg

  # Merge several documents into one PDF
  ccflow merge --format pdf a.pdf b.pdf c.pdf

  # Extract metadata as JSON
  ccflow metadata document.pdf

  # Capture a website as PDF
  ccflow capture --url https://example.com --format pdf

  # List available output formats for an operation
  ccflow formats convert

The API key is read from --api-key or the CLOUDCONVERT_API_KEY environment
variable. Use RUST_LOG=cloudconvert_flow=debug for request-level logging."#;

#[derive(Parser)]
#[command(
    name = "ccflow",
    version,
    about = "Run CloudConvert jobs from the command line",
    after_help = AFTER_HELP
)]
struct Cli {
    /// CloudConvert API key.
    #[arg(long, env = "CLOUDCONVERT_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Override the job API base URL (e.g. the sandbox domain).
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Override the sync long-poll base URL.
    #[arg(long, global = true)]
    sync_base: Option<String>,

    /// Directory output files are written to.
    #[arg(short, long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Suppress the progress spinner.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert each file to a different format
    Convert {
        /// Target format, e.g. pdf
        #[arg(short, long)]
        format: String,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Merge all files into one document
    Merge {
        /// Target format of the merged document, e.g. pdf
        #[arg(short, long, default_value = "pdf")]
        format: String,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Pack all files into one archive
    Archive {
        /// Archive format, e.g. zip
        #[arg(short, long, default_value = "zip")]
        format: String,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Create a thumbnail of each file
    Thumbnail {
        /// Thumbnail image format, e.g. png
        #[arg(short, long, default_value = "png")]
        format: String,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Fit mode: max, crop or scale
        #[arg(long)]
        fit: Option<String>,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Shrink each file without changing its format
    Optimize {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Stamp text or an image onto each file
    Watermark {
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        font_size: Option<u32>,
        #[arg(long)]
        font_color: Option<String>,
        /// Vertical position: top, center or bottom
        #[arg(long)]
        position_vertical: Option<String>,
        /// Horizontal position: left, center or right
        #[arg(long)]
        position_horizontal: Option<String>,
        #[arg(long)]
        margin_vertical: Option<u32>,
        #[arg(long)]
        margin_horizontal: Option<u32>,
        /// Opacity in percent (0-100)
        #[arg(long)]
        opacity: Option<u32>,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Extract file metadata as JSON (no output file)
    Metadata {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Render a website to a file
    Capture {
        /// Website URL to capture
        #[arg(long)]
        url: String,
        /// Capture format, e.g. pdf or png
        #[arg(short, long, default_value = "pdf")]
        format: String,
        /// Free-form JSON object merged into the processing task
        #[arg(long)]
        options: Option<String>,
    },
    /// List output formats the API offers for an operation
    Formats {
        /// Operation name, e.g. convert, thumbnail
        operation: String,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Input files
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Free-form JSON object merged into the processing task
    #[arg(long)]
    options: Option<String>,
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(api_key) = cli.api_key.clone() else {
        bail!("No API key given. Pass --api-key or set CLOUDCONVERT_API_KEY.");
    };
    let mut builder = JobClient::builder(Credentials::ApiKey(api_key));
    if let Some(base) = &cli.api_base {
        builder = builder.api_base(base);
    }
    if let Some(base) = &cli.sync_base {
        builder = builder.sync_base(base);
    }
    let client = builder.build()?;

    match &cli.command {
        Command::Formats { operation } => {
            let formats = client.list_output_formats(operation).await?;
            if formats.is_empty() {
                eprintln!("No output formats found for operation '{operation}'");
            } else {
                for format in formats {
                    println!("{format}");
                }
            }
            Ok(())
        }
        Command::Capture { url, format, options } => {
            let operation = Operation::CaptureWebsite(CaptureWebsiteParams {
                url: url.clone(),
                output_format: format.clone(),
                additional_options: options.clone(),
            });
            // Capture sources its input by URL; one placeholder item drives
            // exactly one job cycle.
            execute(&cli, &client, operation, vec![InputItem::default()]).await
        }
        Command::Metadata { files } => {
            let items = read_items(files).await?;
            execute(&cli, &client, Operation::Metadata, items).await
        }
        Command::Convert { format, common } => {
            let operation = Operation::Convert(ConvertParams {
                output_format: format.clone(),
                additional_options: common.options.clone(),
            });
            let items = read_items(&common.files).await?;
            execute(&cli, &client, operation, items).await
        }
        Command::Merge { format, common } => {
            let operation = Operation::Merge(MergeParams {
                output_format: format.clone(),
                additional_options: common.options.clone(),
            });
            let items = read_items(&common.files).await?;
            execute(&cli, &client, operation, items).await
        }
        Command::Archive { format, common } => {
            let operation = Operation::Archive(ArchiveParams {
                output_format: format.clone(),
                additional_options: common.options.clone(),
            });
            let items = read_items(&common.files).await?;
            execute(&cli, &client, operation, items).await
        }
        Command::Thumbnail {
            format,
            width,
            height,
            fit,
            common,
        } => {
            let operation = Operation::Thumbnail(ThumbnailParams {
                output_format: format.clone(),
                width: *width,
                height: *height,
                fit: fit.as_deref().map(parse_fit).transpose()?,
                additional_options: common.options.clone(),
            });
            let items = read_items(&common.files).await?;
            execute(&cli, &client, operation, items).await
        }
        Command::Optimize { common } => {
            let operation = Operation::Optimize(OptimizeParams {
                additional_options: common.options.clone(),
            });
            let items = read_items(&common.files).await?;
            execute(&cli, &client, operation, items).await
        }
        Command::Watermark {
            text,
            image_url,
            font_size,
            font_color,
            position_vertical,
            position_horizontal,
            margin_vertical,
            margin_horizontal,
            opacity,
            common,
        } => {
            let operation = Operation::Watermark(WatermarkParams {
                text: text.clone(),
                image_url: image_url.clone(),
                font_size: *font_size,
                font_color: font_color.clone(),
                position_vertical: position_vertical.clone(),
                position_horizontal: position_horizontal.clone(),
                margin_vertical: *margin_vertical,
                margin_horizontal: *margin_horizontal,
                opacity: *opacity,
                additional_options: common.options.clone(),
            });
            let items = read_items(&common.files).await?;
            execute(&cli, &client, operation, items).await
        }
    }
}

fn parse_fit(value: &str) -> Result<ThumbnailFit> {
    match value {
        "max" => Ok(ThumbnailFit::Max),
        "crop" => Ok(ThumbnailFit::Crop),
        "scale" => Ok(ThumbnailFit::Scale),
        other => bail!("Unknown fit mode '{other}' (expected max, crop or scale)"),
    }
}

/// Read each path into an input item carrying one `data` attachment.
async fn read_items(files: &[PathBuf]) -> Result<Vec<InputItem>> {
    let mut items = Vec::with_capacity(files.len());
    for path in files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read input file '{}'", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("Input path '{}' has no file name", path.display()))?;
        items.push(InputItem::from_binary("data", BinaryData::new(bytes, file_name)));
    }
    Ok(items)
}

/// Run the operation and write results to the output directory.
async fn execute(
    cli: &Cli,
    client: &JobClient,
    operation: Operation,
    items: Vec<InputItem>,
) -> Result<()> {
    let mut builder = RunConfig::builder(operation);
    let progress = if cli.quiet { None } else { Some(CliProgress::new()) };
    if let Some(progress) = &progress {
        let callback: Arc<dyn RunProgressCallback> = progress.clone();
        builder = builder.progress_callback(callback);
    }
    let config = builder.build()?;

    let output = run(client, &config, &items).await?;
    if let Some(progress) = &progress {
        progress.finish();
    }

    let mut written = 0usize;
    for item in &output.items {
        match &item.binary {
            Some((_, data)) => {
                let path = write_attachment(&cli.output_dir, data).await?;
                eprintln!(
                    "{} {}  {}",
                    green("✔"),
                    path.display(),
                    dim(&format!("{} bytes", data.data.len()))
                );
                written += 1;
            }
            // Metadata outputs carry no attachment; print the payload.
            None => println!("{}", serde_json::to_string_pretty(&item.json)?),
        }
    }

    if let Some(failure) = output.failure {
        if written > 0 {
            eprintln!(
                "{} {} file(s) written before the failure",
                bold(&written.to_string()),
                dim("(kept)")
            );
        }
        bail!("{failure}");
    }
    Ok(())
}

async fn write_attachment(dir: &Path, data: &BinaryData) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;
    let file_name = data.file_name.as_deref().unwrap_or("output.bin");
    let path = dir.join(file_name);
    tokio::fs::write(&path, &data.data)
        .await
        .with_context(|| format!("Failed to write output file '{}'", path.display()))?;
    Ok(path)
}
