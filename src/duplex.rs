//! Manual duplex: odd pages first, the operator flips the stack, then even pages.
//!
//! The print queue only ever sees single-sided jobs. [`DuplexPlanner`] is the two-phase
//! state machine around the operator gate:
//!
//! ```text
//! Idle -> OddSubmitted -> AwaitingFlip -> EvenSubmitted -> Done
//!                              |   ^            |
//!                              |   +-- EvenFailed (retry with confirm_flip)
//!                              +-> Canceled
//! ```
//!
//! Phase two is only reachable through [`DuplexPlanner::confirm_flip`]; nothing advances
//! on a timer. Canceling skips phase two and leaves the odd-page job running.

use thiserror::Error;
use webprint_shared::{Document, JobId, JobParameters, PrintJob};

use crate::page_range::PageSet;
use crate::submission::{JobSubmitter, SubmitError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplexPhase {
    Idle,
    /// Transient: passed through inside `start` and only seen in debug logs.
    OddSubmitted,
    AwaitingFlip,
    /// Transient: passed through inside `confirm_flip` and only seen in debug logs.
    EvenSubmitted,
    /// Phase two was rejected; the even pages are still held for a retry.
    EvenFailed,
    Done,
    Canceled,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DuplexError {
    #[error("Manual duplex needs the document's page count")]
    UnknownPageCount,
    #[error("Manual duplex cannot be combined with a page range ('{0}'); clear one of them")]
    ConflictingPageRange(String),
    #[error("Document has no pages to print")]
    NoPages,
    #[error("Cannot {action} while the duplex job is {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: DuplexPhase,
    },
    #[error("Odd-page pass failed: {0}")]
    OddPass(#[source] SubmitError),
    #[error("Even-page pass failed: {0}")]
    EvenPass(#[source] SubmitError),
}

/// Held only between the two phases.
#[derive(Debug, Clone)]
struct DuplexPlan {
    odd_job: JobId,
    even_pages: PageSet,
}

pub struct DuplexPlanner {
    submitter: JobSubmitter,
    document: Document,
    base: JobParameters,
    odd_pages: PageSet,
    even_pages: PageSet,
    phase: DuplexPhase,
    plan: Option<DuplexPlan>,
    odd_job: Option<PrintJob>,
    even_job: Option<PrintJob>,
    note: Option<String>,
}

impl DuplexPlanner {
    /// Checks every precondition up front. Nothing is sent to the backend here.
    pub fn new(
        submitter: JobSubmitter,
        document: Document,
        base: JobParameters,
        total_pages: Option<u32>,
    ) -> Result<Self, DuplexError> {
        if let Some(range) = base.page_range() {
            return Err(DuplexError::ConflictingPageRange(range.to_string()));
        }
        let total = match total_pages {
            Some(total) => total,
            None => return Err(DuplexError::UnknownPageCount),
        };
        let odd_pages = PageSet::odd(total);
        if odd_pages.is_empty() {
            return Err(DuplexError::NoPages);
        }
        Ok(Self {
            submitter,
            document,
            base,
            odd_pages,
            even_pages: PageSet::even(total),
            phase: DuplexPhase::Idle,
            plan: None,
            odd_job: None,
            even_job: None,
            note: None,
        })
    }

    pub fn phase(&self) -> DuplexPhase {
        self.phase
    }

    pub fn odd_pages(&self) -> &PageSet {
        &self.odd_pages
    }

    pub fn even_pages(&self) -> &PageSet {
        &self.even_pages
    }

    pub fn odd_job(&self) -> Option<&PrintJob> {
        self.odd_job.as_ref()
    }

    pub fn even_job(&self) -> Option<&PrintJob> {
        self.even_job.as_ref()
    }

    /// Operator-facing remark, e.g. when no second pass is needed.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// True while the operator has to flip the stack and confirm.
    pub fn awaiting_flip(&self) -> bool {
        matches!(self.phase, DuplexPhase::AwaitingFlip | DuplexPhase::EvenFailed)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, DuplexPhase::Done | DuplexPhase::Canceled)
    }

    /// Phase one: submit the odd pages. On failure the planner stays `Idle`.
    pub async fn start(&mut self) -> Result<&PrintJob, DuplexError> {
        if self.phase != DuplexPhase::Idle {
            return Err(self.invalid("start"));
        }
        let params = self.base.with_page_range(self.odd_pages.to_string());
        let job = self
            .submitter
            .submit(&params, &self.document)
            .await
            .map_err(DuplexError::OddPass)?;
        self.set_phase(DuplexPhase::OddSubmitted);
        tracing::info!(job_id = %job.id(), pages = %self.odd_pages, "Duplex odd-page pass submitted");

        if self.even_pages.is_empty() {
            self.note = Some("Single page document, no second pass needed".to_string());
            self.set_phase(DuplexPhase::Done);
            tracing::info!(job_id = %job.id(), "Duplex finished after one pass");
        } else {
            self.plan = Some(DuplexPlan {
                odd_job: job.id(),
                even_pages: self.even_pages.clone(),
            });
            self.set_phase(DuplexPhase::AwaitingFlip);
            tracing::info!(job_id = %job.id(), "Waiting for operator to flip the stack");
        }
        Ok(self.odd_job.insert(job))
    }

    /// Phase two: the operator flipped the stack, submit the even pages.
    ///
    /// Allowed again after a failed phase two; every attempt is a fresh backend job.
    pub async fn confirm_flip(&mut self) -> Result<&PrintJob, DuplexError> {
        if !self.awaiting_flip() {
            return Err(self.invalid("confirm the flip"));
        }
        let plan = match self.plan.clone() {
            Some(plan) => plan,
            None => return Err(self.invalid("confirm the flip")),
        };
        let params = self.base.with_page_range(plan.even_pages.to_string());
        match self.submitter.submit(&params, &self.document).await {
            Ok(job) => {
                self.set_phase(DuplexPhase::EvenSubmitted);
                tracing::info!(
                    job_id = %job.id(),
                    odd_job_id = %plan.odd_job,
                    pages = %plan.even_pages,
                    "Duplex even-page pass submitted"
                );
                self.plan = None;
                self.set_phase(DuplexPhase::Done);
                Ok(self.even_job.insert(job))
            }
            Err(e) => {
                tracing::warn!(odd_job_id = %plan.odd_job, "Even-page pass failed, retry possible: {}", e);
                self.set_phase(DuplexPhase::EvenFailed);
                Err(DuplexError::EvenPass(e))
            }
        }
    }

    /// Skips phase two. The odd-page job is left to finish.
    pub fn cancel_flip(&mut self) -> Result<(), DuplexError> {
        if !self.awaiting_flip() {
            return Err(self.invalid("cancel the flip"));
        }
        if let Some(plan) = self.plan.take() {
            tracing::info!(odd_job_id = %plan.odd_job, "Duplex canceled before even-page pass");
        }
        self.set_phase(DuplexPhase::Canceled);
        Ok(())
    }

    fn set_phase(&mut self, phase: DuplexPhase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "Duplex phase change");
        self.phase = phase;
    }

    fn invalid(&self, action: &'static str) -> DuplexError {
        DuplexError::InvalidTransition {
            action,
            phase: self.phase,
        }
    }
}
