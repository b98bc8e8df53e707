// Call-counting print backend for orchestration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use webprint_shared::{
    BackendError, BackendJobStatus, Document, DocumentKind, JobId, JobParameters, PreviewLocator,
    PrintBackend, PrinterCapabilities,
};

#[derive(Default)]
pub struct MockBackend {
    pub printers: Vec<(String, PrinterCapabilities)>,
    pub caps_error: Option<BackendError>,
    pub preview_error: Option<BackendError>,
    statuses: Mutex<VecDeque<Result<BackendJobStatus, BackendError>>>,
    submit_failures: Mutex<VecDeque<BackendError>>,
    submitted: Mutex<Vec<JobParameters>>,
    next_id: AtomicU64,
    pub list_calls: AtomicUsize,
    pub caps_calls: AtomicUsize,
    pub preview_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            printers: vec![
                (
                    "office".to_string(),
                    PrinterCapabilities::new(
                        ["na_letter_8.5x11in", "iso_a4_210x297mm"],
                        ["monochrome"],
                        ["draft", "normal"],
                    ),
                ),
                (
                    "lobby".to_string(),
                    PrinterCapabilities::new(
                        ["iso_a3_297x420mm"],
                        ["color", "monochrome"],
                        Vec::<String>::new(),
                    ),
                ),
            ],
            next_id: AtomicU64::new(100),
            ..Default::default()
        }
    }

    pub fn with_caps_error(mut self, error: BackendError) -> Self {
        self.caps_error = Some(error);
        self
    }

    pub fn with_preview_error(mut self, error: BackendError) -> Self {
        self.preview_error = Some(error);
        self
    }

    /// Status answers in order. Once exhausted, polls answer `processing`.
    pub fn script_statuses<I>(&self, statuses: I)
    where
        I: IntoIterator<Item = Result<(&'static str, &'static str), BackendError>>,
    {
        let mut queue = self.statuses.lock().unwrap();
        for s in statuses {
            queue.push_back(s.map(|(state, reason)| BackendJobStatus {
                state: state.to_string(),
                reason: reason.to_string(),
            }));
        }
    }

    pub fn fail_next_submit(&self, error: BackendError) {
        self.submit_failures.lock().unwrap().push_back(error);
    }

    pub fn submitted(&self) -> Vec<JobParameters> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        [
            &self.list_calls,
            &self.caps_calls,
            &self.preview_calls,
            &self.submit_calls,
            &self.status_calls,
        ]
        .iter()
        .map(|c| Self::calls(c))
        .sum()
    }
}

#[async_trait]
impl PrintBackend for MockBackend {
    async fn list_printers(&self) -> Result<Vec<String>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.printers.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn get_capabilities(&self, printer_id: &str) -> Result<PrinterCapabilities, BackendError> {
        self.caps_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.caps_error {
            return Err(e.clone());
        }
        self.printers
            .iter()
            .find(|(name, _)| name == printer_id)
            .map(|(_, caps)| caps.clone())
            .ok_or_else(|| BackendError::NotFound(printer_id.to_string()))
    }

    async fn render_preview(&self, document: &Document) -> Result<PreviewLocator, BackendError> {
        self.preview_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.preview_error {
            return Err(e.clone());
        }
        Ok(PreviewLocator {
            path: format!("converted/{}", document.pdf_name()),
            page_count: Some(5),
        })
    }

    async fn submit_job(&self, params: &JobParameters, _document: &Document) -> Result<JobId, BackendError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.submit_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        self.submitted.lock().unwrap().push(params.clone());
        Ok(JobId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn get_job_status(&self, _job_id: JobId) -> Result<BackendJobStatus, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(BackendJobStatus {
                state: "processing".to_string(),
                reason: "job-printing".to_string(),
            })
        })
    }
}

pub fn pdf(name: &str) -> Document {
    Document::new(name, DocumentKind::Pdf, vec![0u8; 128])
}

pub fn docx(name: &str) -> Document {
    Document::new(name, DocumentKind::Convertible, vec![0u8; 128])
}
