pub mod event_queue;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use webprint_shared::{
    BackendError, BackendJobStatus, Document, DocumentKind, JobId, JobParameters, PreviewLocator,
    PrintBackend, PrinterCapabilities,
};

use crate::simulator::event_queue::{SimClock, SimEvent, SimEventQueue};

/// Simulated print queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_printers")]
    pub printers: Vec<SimPrinterConfig>,
    /// How long a job stays `pending` before the printer picks it up.
    #[serde(default = "default_pending_ms")]
    pub pending_ms: u64,
    /// How long a job stays `processing`.
    #[serde(default = "default_processing_ms")]
    pub processing_ms: u64,
    /// Chance in [0, 1] that a job ends `aborted` instead of `completed`.
    #[serde(default)]
    pub abort_probability: f64,
    #[serde(default = "default_true")]
    pub converter_available: bool,
    /// Used to estimate page counts from document size.
    #[serde(default = "default_bytes_per_page")]
    pub bytes_per_page: usize,
    #[serde(default = "default_first_job_id")]
    pub first_job_id: u64,
    /// How long a finished job stays queryable before the queue forgets it.
    #[serde(default = "default_retention_ms")]
    pub retention_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            printers: default_printers(),
            pending_ms: default_pending_ms(),
            processing_ms: default_processing_ms(),
            abort_probability: 0.0,
            converter_available: true,
            bytes_per_page: default_bytes_per_page(),
            first_job_id: default_first_job_id(),
            retention_ms: default_retention_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimPrinterConfig {
    pub name: String,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub color_modes: Vec<String>,
    #[serde(default)]
    pub qualities: Vec<String>,
    /// A printer that is not accepting jobs rejects submissions.
    #[serde(default = "default_true")]
    pub accepting: bool,
    /// Jobs on a stopped printer stall in `processing-stopped`.
    #[serde(default)]
    pub stopped: bool,
}

impl SimPrinterConfig {
    pub fn capabilities(&self) -> PrinterCapabilities {
        PrinterCapabilities::new(
            self.media.iter().cloned(),
            self.color_modes.iter().cloned(),
            self.qualities.iter().cloned(),
        )
    }
}

fn default_printers() -> Vec<SimPrinterConfig> {
    vec![
        SimPrinterConfig {
            name: "office_laser".to_string(),
            media: vec![
                "na_letter_8.5x11in".to_string(),
                "iso_a4_210x297mm".to_string(),
                "iso_a5_148x210mm".to_string(),
            ],
            color_modes: vec!["monochrome".to_string()],
            qualities: vec!["draft".to_string(), "normal".to_string(), "high".to_string()],
            accepting: true,
            stopped: false,
        },
        SimPrinterConfig {
            name: "lobby_inkjet".to_string(),
            media: vec!["iso_a4_210x297mm".to_string(), "iso_a3_297x420mm".to_string()],
            color_modes: vec!["color".to_string(), "monochrome".to_string()],
            qualities: vec!["normal".to_string(), "high".to_string()],
            accepting: true,
            stopped: false,
        },
    ]
}
fn default_pending_ms() -> u64 { 2000 }
fn default_processing_ms() -> u64 { 5000 }
fn default_true() -> bool { true }
fn default_bytes_per_page() -> usize { 3000 }
fn default_first_job_id() -> u64 { 1 }
fn default_retention_ms() -> u64 { 60_000 }

#[derive(Debug)]
enum ClockMode {
    /// Simulation time follows tokio time since the backend was created.
    Wall(Instant),
    /// Simulation time only moves through [`SimulatedBackend::advance`].
    Manual,
}

#[derive(Debug)]
struct SimJob {
    printer: String,
    status: BackendJobStatus,
    /// Simulation time at which the job reached a terminal state.
    finished_at: Option<Duration>,
}

fn is_terminal(state: &str) -> bool {
    matches!(state, "completed" | "canceled" | "aborted")
}

#[derive(Debug)]
struct SimState {
    clock: SimClock,
    events: SimEventQueue,
    jobs: HashMap<JobId, SimJob>,
    next_id: u64,
    retention: Duration,
}

impl SimState {
    /// Applies every event due at the current simulation time, then forgets jobs that
    /// finished more than the retention window ago.
    fn drain_due(&mut self) {
        let now = self.clock.current_time;
        while let Some(event) = self.events.pop_due(now) {
            if let Some(job) = self.jobs.get_mut(&event.job_id) {
                tracing::debug!(job_id = %event.job_id, printer = %job.printer, state = event.state, "Simulated job transition");
                job.status = BackendJobStatus {
                    state: event.state.to_string(),
                    reason: event.reason.to_string(),
                };
                if is_terminal(event.state) {
                    job.finished_at = Some(event.timestamp);
                }
            }
        }
        let retention = self.retention;
        self.jobs.retain(|job_id, job| match job.finished_at {
            Some(finished) if finished + retention <= now => {
                tracing::debug!(%job_id, "Simulated job expired from history");
                false
            }
            _ => true,
        });
    }
}

/// In-memory print queue whose jobs move through IPP-style states on a simulation clock.
#[derive(Debug)]
pub struct SimulatedBackend {
    config: SimulatorConfig,
    mode: ClockMode,
    reachable: AtomicBool,
    state: Mutex<SimState>,
}

impl SimulatedBackend {
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_mode(config, ClockMode::Wall(Instant::now()))
    }

    /// A backend whose clock only moves when [`advance`](Self::advance) is called.
    pub fn with_manual_clock(config: SimulatorConfig) -> Self {
        Self::with_mode(config, ClockMode::Manual)
    }

    fn with_mode(config: SimulatorConfig, mode: ClockMode) -> Self {
        tracing::info!(
            printers = config.printers.len(),
            "Simulated print backend initialized"
        );
        let next_id = config.first_job_id;
        let retention = Duration::from_millis(config.retention_ms);
        Self {
            config,
            mode,
            reachable: AtomicBool::new(true),
            state: Mutex::new(SimState {
                clock: SimClock::new(),
                events: SimEventQueue::new(),
                jobs: HashMap::new(),
                next_id,
                retention,
            }),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Advances a manual clock. Has no effect in wall-clock mode.
    pub async fn advance(&self, dt: Duration) {
        if let ClockMode::Manual = self.mode {
            let mut state = self.state.lock().await;
            state.clock.advance(dt);
            state.drain_due();
        }
    }

    /// Makes every call fail with a transport error while `false`.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Cancels a job at the device, as an operator standing at the printer would.
    pub async fn cancel_job(&self, job_id: JobId) -> Result<(), BackendError> {
        let mut state = self.lock_synced().await;
        state.events.discard_job(job_id);
        let now = state.clock.current_time;
        let job = state
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| BackendError::NotFound(format!("job {job_id}")))?;
        if is_terminal(&job.status.state) {
            return Err(BackendError::Backend(format!(
                "job {job_id} already {}",
                job.status.state
            )));
        }
        job.status = BackendJobStatus {
            state: "canceled".to_string(),
            reason: "job-canceled-at-device".to_string(),
        };
        job.finished_at = Some(now);
        tracing::info!(%job_id, "Simulated job canceled at device");
        Ok(())
    }

    pub async fn job_count(&self) -> usize {
        self.state.lock().await.jobs.len()
    }

    fn check_reachable(&self) -> Result<(), BackendError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Transport("simulated print daemon is down".to_string()))
        }
    }

    fn printer(&self, printer_id: &str) -> Result<&SimPrinterConfig, BackendError> {
        self.config
            .printers
            .iter()
            .find(|p| p.name == printer_id)
            .ok_or_else(|| BackendError::NotFound(format!("printer '{printer_id}'")))
    }

    async fn lock_synced(&self) -> tokio::sync::MutexGuard<'_, SimState> {
        let mut state = self.state.lock().await;
        if let ClockMode::Wall(started) = self.mode {
            state.clock.advance_to(started.elapsed());
        }
        state.drain_due();
        state
    }

    fn estimate_pages(&self, document: &Document) -> u32 {
        match document.kind() {
            DocumentKind::Image => 1,
            _ => {
                let per_page = self.config.bytes_per_page.max(1);
                document.len().div_ceil(per_page).max(1) as u32
            }
        }
    }
}

#[async_trait]
impl PrintBackend for SimulatedBackend {
    async fn list_printers(&self) -> Result<Vec<String>, BackendError> {
        self.check_reachable()?;
        Ok(self.config.printers.iter().map(|p| p.name.clone()).collect())
    }

    async fn get_capabilities(&self, printer_id: &str) -> Result<PrinterCapabilities, BackendError> {
        self.check_reachable()?;
        Ok(self.printer(printer_id)?.capabilities())
    }

    async fn render_preview(&self, document: &Document) -> Result<PreviewLocator, BackendError> {
        self.check_reachable()?;
        if document.is_empty() {
            return Err(BackendError::Conversion(format!(
                "'{}' is empty or malformed",
                document.name()
            )));
        }
        let path = if document.kind().needs_conversion() {
            if !self.config.converter_available {
                return Err(BackendError::Conversion(
                    "document converter not found".to_string(),
                ));
            }
            format!("converted/{}", document.pdf_name())
        } else {
            format!("uploads/{}", document.name())
        };
        Ok(PreviewLocator {
            path,
            page_count: Some(self.estimate_pages(document)),
        })
    }

    async fn submit_job(&self, params: &JobParameters, document: &Document) -> Result<JobId, BackendError> {
        self.check_reachable()?;
        let printer = self.printer(params.printer_id())?;
        params.check_against(&printer.capabilities())?;
        if document.kind().needs_conversion() && !self.config.converter_available {
            return Err(BackendError::Conversion(
                "document converter not found".to_string(),
            ));
        }
        if !printer.accepting {
            return Err(BackendError::Backend(format!(
                "printer '{}' is not accepting jobs",
                printer.name
            )));
        }

        let aborts = self.config.abort_probability > 0.0
            && rand::random::<f64>() < self.config.abort_probability;
        let mut state = self.lock_synced().await;
        let job_id = JobId(state.next_id);
        state.next_id += 1;
        let now = state.clock.current_time;
        let picked_up = now + Duration::from_millis(self.config.pending_ms);
        let finished = picked_up + Duration::from_millis(self.config.processing_ms);

        if printer.stopped {
            state.events.push(SimEvent {
                timestamp: picked_up,
                job_id,
                state: "processing-stopped",
                reason: "printer-stopped",
            });
        } else {
            state.events.push(SimEvent {
                timestamp: picked_up,
                job_id,
                state: "processing",
                reason: "job-printing",
            });
            state.events.push(if aborts {
                SimEvent {
                    timestamp: finished,
                    job_id,
                    state: "aborted",
                    reason: "aborted-by-system",
                }
            } else {
                SimEvent {
                    timestamp: finished,
                    job_id,
                    state: "completed",
                    reason: "job-completed-successfully",
                }
            });
        }
        state.jobs.insert(
            job_id,
            SimJob {
                printer: printer.name.clone(),
                status: BackendJobStatus {
                    state: "pending".to_string(),
                    reason: "none".to_string(),
                },
                finished_at: None,
            },
        );
        state.drain_due();
        tracing::info!(
            %job_id,
            printer = %printer.name,
            document = document.name(),
            copies = params.copies(),
            pages = params.page_range().unwrap_or("all"),
            "Simulated job queued"
        );
        Ok(job_id)
    }

    async fn get_job_status(&self, job_id: JobId) -> Result<BackendJobStatus, BackendError> {
        self.check_reachable()?;
        let state = self.lock_synced().await;
        state
            .jobs
            .get(&job_id)
            .map(|job| job.status.clone())
            .ok_or_else(|| BackendError::NotFound(format!("job {job_id}")))
    }
}
