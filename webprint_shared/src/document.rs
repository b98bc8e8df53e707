// Uploaded documents and their preview locators
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// How a document reaches the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Image,
    Text,
    /// Word-processor formats. Must go through the converter before preview.
    Convertible,
}

impl DocumentKind {
    /// Infer the kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "gif" => Some(Self::Image),
            "txt" => Some(Self::Text),
            "doc" | "docx" => Some(Self::Convertible),
            _ => None,
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn needs_conversion(&self) -> bool {
        matches!(self, Self::Convertible)
    }
}

/// A document held in memory. Cloning shares the bytes.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    kind: DocumentKind,
    bytes: Arc<[u8]>,
}

impl Document {
    pub fn new(name: impl Into<String>, kind: DocumentKind, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            kind,
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name with its extension swapped for `.pdf`.
    pub fn pdf_name(&self) -> String {
        let stem = Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name);
        format!("{stem}.pdf")
    }
}

/// Where a rendered preview can be fetched, plus its page count when the renderer knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewLocator {
    pub path: String,
    pub page_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(DocumentKind::from_file_name("report.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_file_name("scan.jpeg"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_file_name("notes.txt"), Some(DocumentKind::Text));
        assert_eq!(
            DocumentKind::from_file_name("thesis.final.docx"),
            Some(DocumentKind::Convertible)
        );
        assert_eq!(DocumentKind::from_file_name("archive.zip"), None);
        assert_eq!(DocumentKind::from_file_name("README"), None);
    }

    #[test]
    fn test_pdf_name() {
        let doc = Document::new("thesis.final.docx", DocumentKind::Convertible, vec![1u8, 2, 3]);
        assert_eq!(doc.pdf_name(), "thesis.final.pdf");
        assert_eq!(doc.len(), 3);
    }
}
