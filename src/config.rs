//! Run configuration: which operation to perform and how to source input.
//!
//! All per-run behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. Operation parameters are grouped per operation in
//! the [`Operation`] enum so unrelated knobs (thumbnail dimensions, watermark
//! styling, capture URL) never appear together on one flat struct.
//!
//! Every optional operation parameter follows the omission policy of the
//! remote API: `None` (or an empty string) means the key is never sent, since
//! the remote side treats key-presence as "set".

use crate::error::CloudConvertError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Pipeline operation plus its resolved parameters.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Convert each input file to a different format.
    Convert(ConvertParams),
    /// Merge all input files into one document.
    Merge(MergeParams),
    /// Pack all input files into one archive.
    Archive(ArchiveParams),
    /// Create a thumbnail of each input file.
    Thumbnail(ThumbnailParams),
    /// Shrink each input file without changing its format.
    Optimize(OptimizeParams),
    /// Stamp text or an image onto each input file.
    Watermark(WatermarkParams),
    /// Extract file metadata; no output file is produced.
    Metadata,
    /// Render a website to a file. Sources its input by URL, not upload.
    CaptureWebsite(CaptureWebsiteParams),
}

impl Operation {
    /// The pipeline-facing operation name (also the remote task kind for
    /// the processing task).
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Convert(_) => "convert",
            Operation::Merge(_) => "merge",
            Operation::Archive(_) => "archive",
            Operation::Thumbnail(_) => "thumbnail",
            Operation::Optimize(_) => "optimize",
            Operation::Watermark(_) => "watermark",
            Operation::Metadata => "metadata",
            Operation::CaptureWebsite(_) => "capture-website",
        }
    }

    /// Whether the operation runs one job covering all input items
    /// (merge/archive) rather than one job per item.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Operation::Merge(_) | Operation::Archive(_))
    }
}

/// Parameters for [`Operation::Convert`].
#[derive(Debug, Clone, Default)]
pub struct ConvertParams {
    /// Target format, e.g. `"pdf"`.
    pub output_format: String,
    /// Free-form JSON object merged into the processing task.
    pub additional_options: Option<String>,
}

/// Parameters for [`Operation::Merge`].
#[derive(Debug, Clone, Default)]
pub struct MergeParams {
    /// Target format of the merged document, e.g. `"pdf"`.
    pub output_format: String,
    pub additional_options: Option<String>,
}

/// Parameters for [`Operation::Archive`].
#[derive(Debug, Clone, Default)]
pub struct ArchiveParams {
    /// Archive format, e.g. `"zip"`.
    pub output_format: String,
    pub additional_options: Option<String>,
}

/// How a thumbnail is fitted into the requested dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFit {
    /// Fit within the bounds, keeping aspect ratio.
    Max,
    /// Fill the bounds, cropping overflow.
    Crop,
    /// Stretch to the bounds exactly.
    Scale,
}

impl ThumbnailFit {
    pub fn as_str(self) -> &'static str {
        match self {
            ThumbnailFit::Max => "max",
            ThumbnailFit::Crop => "crop",
            ThumbnailFit::Scale => "scale",
        }
    }
}

/// Parameters for [`Operation::Thumbnail`].
#[derive(Debug, Clone, Default)]
pub struct ThumbnailParams {
    /// Thumbnail image format, e.g. `"png"`.
    pub output_format: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: Option<ThumbnailFit>,
    pub additional_options: Option<String>,
}

/// Parameters for [`Operation::Optimize`].
#[derive(Debug, Clone, Default)]
pub struct OptimizeParams {
    pub additional_options: Option<String>,
}

/// Parameters for [`Operation::Watermark`].
///
/// Styling fields are all optional; the remote defaults apply to whatever
/// is left unset. `image_url`, when present, adds an `import/url` task for
/// the watermark image alongside the regular file upload.
#[derive(Debug, Clone, Default)]
pub struct WatermarkParams {
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub font_size: Option<u32>,
    pub font_color: Option<String>,
    pub position_vertical: Option<String>,
    pub position_horizontal: Option<String>,
    pub margin_vertical: Option<u32>,
    pub margin_horizontal: Option<u32>,
    /// Opacity in percent (0–100).
    pub opacity: Option<u32>,
    pub additional_options: Option<String>,
}

/// Parameters for [`Operation::CaptureWebsite`].
#[derive(Debug, Clone, Default)]
pub struct CaptureWebsiteParams {
    /// Website to capture.
    pub url: String,
    /// Capture format, e.g. `"pdf"` or `"png"`.
    pub output_format: String,
    pub additional_options: Option<String>,
}

/// Where the bytes for each upload task come from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Read the named binary attachment of the input item being processed.
    Binary {
        /// Attachment name, e.g. `"data"`.
        property: String,
    },
    /// Upload literal text content under a caller-supplied filename.
    Text { content: String, filename: String },
}

impl Default for InputSource {
    fn default() -> Self {
        InputSource::Binary {
            property: "data".into(),
        }
    }
}

/// Configuration for one dispatcher run.
///
/// Built via [`RunConfig::builder`].
///
/// # Example
/// ```rust
/// use cloudconvert_flow::{ConvertParams, Operation, RunConfig};
///
/// let config = RunConfig::builder(Operation::Convert(ConvertParams {
///     output_format: "pdf".into(),
///     additional_options: None,
/// }))
/// .build()
/// .unwrap();
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Operation to perform, with its parameters.
    pub operation: Operation,
    /// Source of upload bytes. Default: the `"data"` binary attachment.
    pub input: InputSource,
    /// Attachment name used for downloaded files on output items. Default: `"data"`.
    pub output_binary_key: String,
    /// Optional per-item progress hooks.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("operation", &self.operation)
            .field("input", &self.input)
            .field("output_binary_key", &self.output_binary_key)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for the given operation.
    pub fn builder(operation: Operation) -> RunConfigBuilder {
        RunConfigBuilder {
            config: RunConfig {
                operation,
                input: InputSource::default(),
                output_binary_key: "data".into(),
                progress_callback: None,
            },
        }
    }
}

/// Builder for [`RunConfig`].
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Source upload bytes from the named binary attachment of each item.
    pub fn binary_input(mut self, property: impl Into<String>) -> Self {
        self.config.input = InputSource::Binary {
            property: property.into(),
        };
        self
    }

    /// Source upload bytes from literal text content.
    pub fn text_input(mut self, content: impl Into<String>, filename: impl Into<String>) -> Self {
        self.config.input = InputSource::Text {
            content: content.into(),
            filename: filename.into(),
        };
        self
    }

    /// Attachment name for downloaded files on output items.
    pub fn output_binary_key(mut self, key: impl Into<String>) -> Self {
        self.config.output_binary_key = key.into();
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, CloudConvertError> {
        let c = &self.config;
        if c.output_binary_key.is_empty() {
            return Err(CloudConvertError::InvalidConfig(
                "Output binary key must not be empty".into(),
            ));
        }
        if let InputSource::Binary { property } = &c.input {
            if property.is_empty() {
                return Err(CloudConvertError::InvalidConfig(
                    "Binary input property name must not be empty".into(),
                ));
            }
        }
        if let InputSource::Text { filename, .. } = &c.input {
            if filename.is_empty() {
                return Err(CloudConvertError::InvalidConfig(
                    "Text input requires a filename".into(),
                ));
            }
        }
        match &c.operation {
            Operation::Convert(p) if p.output_format.is_empty() => {
                return Err(CloudConvertError::InvalidConfig(
                    "Convert requires an output format".into(),
                ));
            }
            Operation::CaptureWebsite(p) if p.url.is_empty() => {
                return Err(CloudConvertError::InvalidConfig(
                    "Capture-website requires a URL".into(),
                ));
            }
            _ => {}
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = RunConfig::builder(Operation::Metadata).build().unwrap();
        assert_eq!(config.output_binary_key, "data");
        assert!(matches!(
            config.input,
            InputSource::Binary { ref property } if property == "data"
        ));
    }

    #[test]
    fn convert_requires_output_format() {
        let err = RunConfig::builder(Operation::Convert(ConvertParams::default()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("output format"));
    }

    #[test]
    fn text_input_requires_filename() {
        let err = RunConfig::builder(Operation::Metadata)
            .text_input("hello", "")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("filename"));
    }

    #[test]
    fn aggregate_flag() {
        assert!(Operation::Merge(MergeParams::default()).is_aggregate());
        assert!(Operation::Archive(ArchiveParams::default()).is_aggregate());
        assert!(!Operation::Metadata.is_aggregate());
        assert!(!Operation::Convert(ConvertParams::default()).is_aggregate());
    }

    #[test]
    fn operation_names_match_wire_names() {
        assert_eq!(Operation::Metadata.name(), "metadata");
        assert_eq!(
            Operation::CaptureWebsite(CaptureWebsiteParams::default()).name(),
            "capture-website"
        );
    }
}
