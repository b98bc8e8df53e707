//! Submitting single jobs to the print backend.

use std::sync::Arc;

use thiserror::Error;
use webprint_shared::{BackendError, Document, JobParameters, ParameterError, PrintBackend, PrintJob};

use crate::page_range::PageSelection;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Invalid job parameters: {0}")]
    Parameters(#[from] ParameterError),
    #[error("Page range '{0}' selects no pages")]
    EmptyPageRange(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Sends fully built [`JobParameters`] to the backend and records the accepted job.
#[derive(Clone)]
pub struct JobSubmitter {
    backend: Arc<dyn PrintBackend>,
}

impl JobSubmitter {
    pub fn new(backend: Arc<dyn PrintBackend>) -> Self {
        Self { backend }
    }

    /// Normalizes user page-range text against the document's page count.
    ///
    /// Blank text means every page and yields `None`. Text that parses to no pages is
    /// rejected here so nothing reaches the backend.
    pub fn prepare_page_range(
        spec: Option<&str>,
        total_pages: Option<u32>,
    ) -> Result<Option<String>, SubmitError> {
        match PageSelection::from_spec(spec, total_pages) {
            PageSelection::All => Ok(None),
            PageSelection::Pages(set) if set.is_empty() => Err(SubmitError::EmptyPageRange(
                spec.unwrap_or_default().trim().to_string(),
            )),
            PageSelection::Pages(set) => Ok(Some(set.to_string())),
        }
    }

    /// One backend submission. Each call creates a new backend job, so resubmitting the
    /// same parameters is safe.
    pub async fn submit(&self, params: &JobParameters, document: &Document) -> Result<PrintJob, SubmitError> {
        tracing::info!(
            printer = params.printer_id(),
            document = document.name(),
            copies = params.copies(),
            pages = params.page_range().unwrap_or("all"),
            "Submitting print job"
        );
        match self.backend.submit_job(params, document).await {
            Ok(job_id) => {
                tracing::info!(%job_id, printer = params.printer_id(), "Print job accepted");
                Ok(PrintJob::new(job_id, params.clone()))
            }
            Err(e) => {
                tracing::error!(printer = params.printer_id(), "Print submission failed: {}", e);
                Err(e.into())
            }
        }
    }
}
