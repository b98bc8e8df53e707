// webprint_shared: types and traits shared between the host and the simulated backend

pub mod backend;
pub mod capabilities;
pub mod document;
pub mod print_job;

pub use backend::{BackendError, PrintBackend};
pub use capabilities::PrinterCapabilities;
pub use document::{Document, DocumentKind, PreviewLocator};
pub use print_job::{
    BackendJobStatus, JobId, JobParameters, JobParametersBuilder, JobState, JobStatus,
    ParameterError, PrintJob,
};
