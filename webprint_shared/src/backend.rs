//! The print backend seam: the print queue, converter and status source the
//! orchestration talks to.

use async_trait::async_trait;
use thiserror::Error;

use crate::capabilities::PrinterCapabilities;
use crate::document::{Document, PreviewLocator};
use crate::print_job::{BackendJobStatus, JobId, JobParameters, ParameterError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Invalid job parameters: {0}")]
    Validation(String),
    #[error("Conversion failed: {0}")]
    Conversion(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Print backend error: {0}")]
    Backend(String),
    #[error("Print backend unreachable: {0}")]
    Transport(String),
}

impl From<ParameterError> for BackendError {
    fn from(e: ParameterError) -> Self {
        BackendError::Validation(e.to_string())
    }
}

#[async_trait]
pub trait PrintBackend: Send + Sync + 'static {
    /// Printer identifiers in backend order.
    async fn list_printers(&self) -> Result<Vec<String>, BackendError>;

    /// Fails with [`BackendError::NotFound`] for an unknown printer.
    async fn get_capabilities(&self, printer_id: &str) -> Result<PrinterCapabilities, BackendError>;

    /// Converts a document into a previewable PDF.
    async fn render_preview(&self, document: &Document) -> Result<PreviewLocator, BackendError>;

    async fn submit_job(&self, params: &JobParameters, document: &Document) -> Result<JobId, BackendError>;

    /// Fails with [`BackendError::NotFound`] once the id is unknown to the backend.
    async fn get_job_status(&self, job_id: JobId) -> Result<BackendJobStatus, BackendError>;
}
