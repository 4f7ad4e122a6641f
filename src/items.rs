//! Boundary data shapes exchanged with the host pipeline.
//!
//! The host runtime hands the dispatcher a list of [`InputItem`]s, each
//! optionally carrying named binary attachments, and receives a list of
//! [`OutputItem`]s back. These types carry no behaviour beyond construction
//! helpers — all orchestration logic lives in [`crate::run`].

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A binary payload with its file metadata.
///
/// Used both for input attachments (bytes to upload) and for downloaded
/// output files (bytes plus the content-type the remote server reported).
#[derive(Clone, Default)]
pub struct BinaryData {
    /// Raw file bytes.
    pub data: Vec<u8>,
    /// Original filename, when known. Required for uploads.
    pub file_name: Option<String>,
    /// MIME type, when known.
    pub mime_type: Option<String>,
}

impl BinaryData {
    /// Build a binary payload from bytes and a filename.
    pub fn new(data: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            data,
            file_name: Some(file_name.into()),
            mime_type: None,
        }
    }

    /// Attach a MIME type.
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }
}

impl fmt::Debug for BinaryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryData")
            .field("len", &self.data.len())
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// One unit of pipeline input.
#[derive(Debug, Clone, Default)]
pub struct InputItem {
    /// Structured payload from the upstream pipeline step. Not interpreted
    /// by this crate; carried for host-side bookkeeping only.
    pub json: Value,
    /// Named binary attachments.
    pub binary: BTreeMap<String, BinaryData>,
}

impl InputItem {
    /// Build an item holding a single binary attachment under `property`.
    pub fn from_binary(property: impl Into<String>, data: BinaryData) -> Self {
        let mut binary = BTreeMap::new();
        binary.insert(property.into(), data);
        Self {
            json: Value::Object(Default::default()),
            binary,
        }
    }
}

/// One unit of pipeline output.
///
/// Per-item operations set `paired_item` to the index of the input item the
/// output came from; a single input can fan out into several output items
/// (e.g. one PNG per PDF page), all sharing that index. Aggregate operations
/// (merge, archive) produce one output with no pairing — the result is
/// intrinsically many-to-one.
#[derive(Debug, Clone, Default)]
pub struct OutputItem {
    /// Scalar/metadata payload. An empty object for file-producing
    /// operations; the extracted metadata object for `metadata`.
    pub json: Value,
    /// At most one named binary attachment holding downloaded file bytes.
    pub binary: Option<(String, BinaryData)>,
    /// Index of the originating input item, when outputs correspond 1:1.
    pub paired_item: Option<usize>,
}

impl OutputItem {
    /// An output carrying a downloaded file under the attachment name `key`.
    pub fn from_file(key: impl Into<String>, data: BinaryData, paired_item: Option<usize>) -> Self {
        Self {
            json: Value::Object(Default::default()),
            binary: Some((key.into(), data)),
            paired_item,
        }
    }

    /// An output carrying only a JSON payload (metadata operation).
    pub fn from_json(json: Value, paired_item: Option<usize>) -> Self {
        Self {
            json,
            binary: None,
            paired_item,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_debug_hides_bytes() {
        let bin = BinaryData::new(vec![0u8; 4096], "report.pdf").with_mime_type("application/pdf");
        let dbg = format!("{bin:?}");
        assert!(dbg.contains("4096"), "got: {dbg}");
        assert!(dbg.contains("report.pdf"));
        assert!(!dbg.contains("[0"), "raw bytes must not be printed: {dbg}");
    }

    #[test]
    fn from_binary_indexes_by_property() {
        let item = InputItem::from_binary("data", BinaryData::new(vec![1, 2, 3], "a.txt"));
        assert!(item.binary.contains_key("data"));
        assert_eq!(item.binary["data"].data, vec![1, 2, 3]);
    }

    #[test]
    fn output_from_json_has_no_binary() {
        let out = OutputItem::from_json(serde_json::json!({"pages": 3}), Some(0));
        assert!(out.binary.is_none());
        assert_eq!(out.paired_item, Some(0));
    }
}
