// src/file_manager.rs - Loading documents to print
use std::path::Path;

use thiserror::Error;
use tokio::fs;
use webprint_shared::Document;

use crate::config::DocumentsConfig;

#[derive(Debug, Error)]
pub enum FileManagerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File type not allowed: {0}")]
    NotAllowed(String),
    #[error("No file name in path: {0}")]
    NoFileName(String),
}

#[derive(Debug, Clone)]
pub struct FileManager {
    documents: DocumentsConfig,
}

impl FileManager {
    pub fn new(documents: DocumentsConfig) -> Self {
        Self { documents }
    }

    /// Read a document from disk, rejecting extensions outside the allow list.
    pub async fn load_document(&self, path: &str) -> Result<Document, FileManagerError> {
        let name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FileManagerError::NoFileName(path.to_string()))?
            .to_string();
        let kind = self
            .documents
            .classify(&name)
            .ok_or_else(|| FileManagerError::NotAllowed(name.clone()))?;
        tracing::info!("Reading document: {}", path);
        let bytes = fs::read(path).await?;
        tracing::debug!(document = %name, ?kind, size = bytes.len(), "Document loaded");
        Ok(Document::new(name, kind, bytes))
    }
}
