use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::PrinterCapabilities;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("No printer selected")]
    MissingPrinter,
    #[error("Copies must be at least 1")]
    ZeroCopies,
    #[error("Paper size '{0}' is not supported by this printer")]
    UnsupportedMedia(String),
    #[error("Color mode '{0}' is not supported by this printer")]
    UnsupportedColorMode(String),
    #[error("Print quality '{0}' is not supported by this printer")]
    UnsupportedQuality(String),
}

/// Backend-assigned job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Canceled,
    Aborted,
    /// Backend vocabulary this crate does not model, kept verbatim.
    Other(String),
}

impl JobState {
    /// Maps a backend state name. Never fails: unknown names become [`JobState::Other`].
    pub fn from_backend(state: &str) -> Self {
        match state.trim() {
            "pending" => JobState::Pending,
            "processing" => JobState::Processing,
            "completed" => JobState::Completed,
            "canceled" => JobState::Canceled,
            "aborted" => JobState::Aborted,
            other => JobState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Canceled => "canceled",
            JobState::Aborted => "aborted",
            JobState::Other(s) => s,
        }
    }

    /// No further change is expected once a job reaches one of these.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Canceled | JobState::Aborted)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for JobState {
    fn from(s: String) -> Self {
        JobState::from_backend(&s)
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_str().to_string()
    }
}

/// Raw status as the backend reports it, before any mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendJobStatus {
    pub state: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    pub reason: String,
}

impl JobStatus {
    pub fn new(state: JobState, reason: impl Into<String>) -> Self {
        Self { state, reason: reason.into() }
    }

    pub fn pending() -> Self {
        Self::new(JobState::Pending, "job-accepted")
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

impl From<BackendJobStatus> for JobStatus {
    fn from(raw: BackendJobStatus) -> Self {
        Self {
            state: JobState::from_backend(&raw.state),
            reason: raw.reason,
        }
    }
}

/// Everything the backend needs to run one job. Immutable once built, and only
/// built through [`JobParametersBuilder`]; there is no way around its checks:
///
/// ```compile_fail
/// let params: webprint_shared::JobParameters =
///     serde_json::from_str(r#"{"printer_id":"office","copies":0}"#).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobParameters {
    printer_id: String,
    copies: u32,
    page_range: Option<String>,
    paper_size: Option<String>,
    color_mode: Option<String>,
    quality: Option<String>,
    title: Option<String>,
}

impl JobParameters {
    pub fn builder(printer_id: impl Into<String>) -> JobParametersBuilder {
        JobParametersBuilder {
            printer_id: printer_id.into(),
            copies: 1,
            page_range: None,
            paper_size: None,
            color_mode: None,
            quality: None,
            title: None,
        }
    }

    pub fn printer_id(&self) -> &str {
        &self.printer_id
    }

    pub fn copies(&self) -> u32 {
        self.copies
    }

    pub fn page_range(&self) -> Option<&str> {
        self.page_range.as_deref()
    }

    pub fn paper_size(&self) -> Option<&str> {
        self.paper_size.as_deref()
    }

    pub fn color_mode(&self) -> Option<&str> {
        self.color_mode.as_deref()
    }

    pub fn quality(&self) -> Option<&str> {
        self.quality.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Copy of these parameters restricted to `page_range`. Used to derive the two
    /// halves of a manual duplex job from one base set of parameters.
    pub fn with_page_range(&self, page_range: impl Into<String>) -> Self {
        Self {
            page_range: Some(page_range.into()),
            ..self.clone()
        }
    }

    /// Re-checks the option fields against a capability snapshot.
    pub fn check_against(&self, caps: &PrinterCapabilities) -> Result<(), ParameterError> {
        if self.printer_id.trim().is_empty() {
            return Err(ParameterError::MissingPrinter);
        }
        if self.copies == 0 {
            return Err(ParameterError::ZeroCopies);
        }
        if let Some(media) = &self.paper_size {
            if !caps.supports_media(media) {
                return Err(ParameterError::UnsupportedMedia(media.clone()));
            }
        }
        if let Some(mode) = &self.color_mode {
            if !caps.supports_color_mode(mode) {
                return Err(ParameterError::UnsupportedColorMode(mode.clone()));
            }
        }
        if let Some(quality) = &self.quality {
            if !caps.supports_quality(quality) {
                return Err(ParameterError::UnsupportedQuality(quality.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JobParametersBuilder {
    printer_id: String,
    copies: u32,
    page_range: Option<String>,
    paper_size: Option<String>,
    color_mode: Option<String>,
    quality: Option<String>,
    title: Option<String>,
}

impl JobParametersBuilder {
    pub fn copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }

    /// Blank text is treated as "no restriction".
    pub fn page_range(mut self, page_range: Option<String>) -> Self {
        self.page_range = page_range.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn paper_size(mut self, paper_size: Option<String>) -> Self {
        self.paper_size = paper_size;
        self
    }

    pub fn color_mode(mut self, color_mode: Option<String>) -> Self {
        self.color_mode = color_mode;
        self
    }

    pub fn quality(mut self, quality: Option<String>) -> Self {
        self.quality = quality;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Validates against the selected printer's capabilities.
    pub fn build(self, caps: &PrinterCapabilities) -> Result<JobParameters, ParameterError> {
        let params = self.build_unchecked()?;
        params.check_against(caps)?;
        Ok(params)
    }

    /// Builds without a capability snapshot. Printer and copies are still checked;
    /// the option fields are left for the backend to reject.
    pub fn build_unchecked(self) -> Result<JobParameters, ParameterError> {
        if self.printer_id.trim().is_empty() {
            return Err(ParameterError::MissingPrinter);
        }
        if self.copies == 0 {
            return Err(ParameterError::ZeroCopies);
        }
        Ok(JobParameters {
            printer_id: self.printer_id,
            copies: self.copies,
            page_range: self.page_range,
            paper_size: self.paper_size,
            color_mode: self.color_mode,
            quality: self.quality,
            title: self.title,
        })
    }
}

/// A job the backend accepted. Only the status moves after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintJob {
    id: JobId,
    parameters: JobParameters,
    status: JobStatus,
}

impl PrintJob {
    pub fn new(id: JobId, parameters: JobParameters) -> Self {
        Self {
            id,
            parameters,
            status: JobStatus::pending(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn parameters(&self) -> &JobParameters {
        &self.parameters
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn observe(&mut self, status: JobStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> PrinterCapabilities {
        PrinterCapabilities::new(
            ["iso_a4_210x297mm", "na_letter_8.5x11in"],
            ["color", "monochrome"],
            ["draft", "normal"],
        )
    }

    #[test]
    fn test_backend_vocabulary_maps_verbatim() {
        assert_eq!(JobState::from_backend("pending"), JobState::Pending);
        assert_eq!(JobState::from_backend("completed"), JobState::Completed);
        assert_eq!(
            JobState::from_backend("pending-held"),
            JobState::Other("pending-held".to_string())
        );
        assert!(JobState::from_backend("aborted").is_terminal());
        assert!(!JobState::from_backend("processing-stopped").is_terminal());
    }

    #[test]
    fn test_builder_rejects_unsupported_options() {
        let err = JobParameters::builder("office")
            .paper_size(Some("iso_a3_297x420mm".to_string()))
            .build(&caps())
            .unwrap_err();
        assert_eq!(err, ParameterError::UnsupportedMedia("iso_a3_297x420mm".to_string()));

        let err = JobParameters::builder("office")
            .quality(Some("high".to_string()))
            .build(&caps())
            .unwrap_err();
        assert!(matches!(err, ParameterError::UnsupportedQuality(_)));

        let err = JobParameters::builder("office").copies(0).build(&caps()).unwrap_err();
        assert_eq!(err, ParameterError::ZeroCopies);

        let err = JobParameters::builder("  ").build(&caps()).unwrap_err();
        assert_eq!(err, ParameterError::MissingPrinter);
    }

    #[test]
    fn test_unset_options_are_always_valid() {
        let params = JobParameters::builder("office")
            .copies(2)
            .page_range(Some("   ".to_string()))
            .build(&PrinterCapabilities::default())
            .unwrap();
        assert_eq!(params.copies(), 2);
        assert_eq!(params.page_range(), None);
        assert_eq!(params.paper_size(), None);
    }

    #[test]
    fn test_with_page_range_keeps_other_fields() {
        let base = JobParameters::builder("office")
            .copies(3)
            .color_mode(Some("monochrome".to_string()))
            .build(&caps())
            .unwrap();
        let odd = base.with_page_range("1,3,5");
        assert_eq!(odd.page_range(), Some("1,3,5"));
        assert_eq!(odd.copies(), 3);
        assert_eq!(odd.color_mode(), Some("monochrome"));
        assert_eq!(base.page_range(), None);
    }

    #[test]
    fn test_print_job_starts_pending() {
        let params = JobParameters::builder("office").build_unchecked().unwrap();
        let mut job = PrintJob::new(JobId(17), params);
        assert_eq!(job.status().state, JobState::Pending);
        job.observe(JobStatus::new(JobState::Completed, "job-completed-successfully"));
        assert!(job.status().is_terminal());
    }
}
