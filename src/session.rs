//! One operator's print flow: pick a printer, preview, submit, track.
//!
//! Nothing here is global. The selected printer and its capabilities live in the
//! session, and every submission builds fresh [`JobParameters`] from a [`PrintRequest`].

use std::sync::Arc;

use thiserror::Error;
use webprint_shared::{
    BackendError, Document, JobParameters, JobParametersBuilder, ParameterError, PreviewLocator,
    PrintBackend, PrintJob, PrinterCapabilities,
};

use crate::capabilities::{CapabilityState, fetch_capabilities};
use crate::config::{Config, DefaultsConfig};
use crate::duplex::{DuplexError, DuplexPlanner};
use crate::submission::{JobSubmitter, SubmitError};
use crate::tracker::JobStatusTracker;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No printer selected")]
    NoPrinterSelected,
    #[error(transparent)]
    Parameters(#[from] ParameterError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Duplex(#[from] DuplexError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// What the operator filled in. Unset options fall back to the printer's defaults.
#[derive(Debug, Clone)]
pub struct PrintRequest {
    pub document: Document,
    pub copies: u32,
    pub page_range: Option<String>,
    pub paper_size: Option<String>,
    pub color_mode: Option<String>,
    pub quality: Option<String>,
    pub duplex: bool,
    /// Page count from rendering the document, if known.
    pub total_pages: Option<u32>,
}

impl PrintRequest {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            copies: 1,
            page_range: None,
            paper_size: None,
            color_mode: None,
            quality: None,
            duplex: false,
            total_pages: None,
        }
    }
}

pub enum PrintOutcome {
    Single(PrintJob),
    /// Odd pages are submitted; the planner waits for the operator.
    Duplex(DuplexPlanner),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Native format; the client renders the original bytes.
    Direct,
    Rendered(PreviewLocator),
    /// Conversion failed. Printing the original may still work.
    Unavailable { reason: String },
}

#[derive(Debug, Clone)]
struct SelectedPrinter {
    id: String,
    capabilities: CapabilityState,
}

pub struct PrintSession {
    backend: Arc<dyn PrintBackend>,
    preferred: DefaultsConfig,
    tracker: JobStatusTracker,
    selected: Option<SelectedPrinter>,
}

impl PrintSession {
    pub fn new(backend: Arc<dyn PrintBackend>, config: &Config) -> Self {
        let tracker = JobStatusTracker::new(backend.clone(), config.tracker.poll_interval());
        Self {
            backend,
            preferred: config.defaults.clone(),
            tracker,
            selected: None,
        }
    }

    pub async fn printers(&self) -> Result<Vec<String>, SessionError> {
        let printers = self.backend.list_printers().await?;
        tracing::debug!(count = printers.len(), "Listed printers");
        Ok(printers)
    }

    /// Switches printers. Capabilities and defaults are fetched fresh; a fetch failure
    /// leaves the printer selected with every option disabled.
    pub async fn select_printer(&mut self, printer_id: &str) -> &CapabilityState {
        let capabilities =
            fetch_capabilities(self.backend.as_ref(), printer_id, &self.preferred).await;
        tracing::info!(printer = printer_id, available = capabilities.is_available(), "Printer selected");
        let selected = self.selected.insert(SelectedPrinter {
            id: printer_id.to_string(),
            capabilities,
        });
        &selected.capabilities
    }

    pub fn selected_printer(&self) -> Option<&str> {
        self.selected.as_ref().map(|s| s.id.as_str())
    }

    pub fn capabilities(&self) -> Option<&CapabilityState> {
        self.selected.as_ref().map(|s| &s.capabilities)
    }

    /// Builder for the selected printer, seeded with its current defaults.
    pub fn parameters(&self) -> Result<JobParametersBuilder, SessionError> {
        let selected = self.selected.as_ref().ok_or(SessionError::NoPrinterSelected)?;
        let defaults = selected.capabilities.defaults();
        Ok(JobParameters::builder(selected.id.clone())
            .paper_size(defaults.paper_size)
            .color_mode(defaults.color_mode)
            .quality(defaults.quality))
    }

    pub fn tracker(&self) -> &JobStatusTracker {
        &self.tracker
    }

    pub async fn preview(&self, document: &Document) -> Result<Preview, SessionError> {
        if !document.kind().needs_conversion() {
            return Ok(Preview::Direct);
        }
        match self.backend.render_preview(document).await {
            Ok(locator) => Ok(Preview::Rendered(locator)),
            Err(BackendError::Conversion(reason)) => {
                tracing::warn!(document = document.name(), "Preview unavailable: {}", reason);
                Ok(Preview::Unavailable { reason })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Page count as reported by the renderer, or `None` if it cannot tell.
    pub async fn page_count(&self, document: &Document) -> Option<u32> {
        match self.backend.render_preview(document).await {
            Ok(locator) => locator.page_count,
            Err(e) => {
                tracing::debug!(document = document.name(), "No page count: {}", e);
                None
            }
        }
    }

    /// Submits a request. Single-sided requests return the accepted job; duplex requests
    /// return the planner after its odd-page pass. All validation happens before the
    /// first backend submission.
    pub async fn print(&self, request: PrintRequest) -> Result<PrintOutcome, SessionError> {
        let selected = self.selected.as_ref().ok_or(SessionError::NoPrinterSelected)?;
        let submitter = JobSubmitter::new(self.backend.clone());

        if request.duplex {
            let base = self.build_parameters(selected, &request, request.page_range.clone())?;
            let mut planner =
                DuplexPlanner::new(submitter, request.document, base, request.total_pages)?;
            planner.start().await?;
            return Ok(PrintOutcome::Duplex(planner));
        }

        let page_range =
            JobSubmitter::prepare_page_range(request.page_range.as_deref(), request.total_pages)?;
        let params = self.build_parameters(selected, &request, page_range)?;
        let job = submitter.submit(&params, &request.document).await?;
        Ok(PrintOutcome::Single(job))
    }

    fn build_parameters(
        &self,
        selected: &SelectedPrinter,
        request: &PrintRequest,
        page_range: Option<String>,
    ) -> Result<JobParameters, ParameterError> {
        let defaults = selected.capabilities.defaults();
        let empty = PrinterCapabilities::default();
        let caps = selected.capabilities.capabilities().unwrap_or(&empty);
        JobParameters::builder(selected.id.clone())
            .copies(request.copies)
            .page_range(page_range)
            .paper_size(request.paper_size.clone().or(defaults.paper_size))
            .color_mode(request.color_mode.clone().or(defaults.color_mode))
            .quality(request.quality.clone().or(defaults.quality))
            .title(format!("webprint - {}", request.document.name()))
            .build(caps)
    }
}
