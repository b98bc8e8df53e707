// webprint: print-job orchestration for a driverless web print service

pub mod capabilities;
pub mod config;
pub mod duplex;
pub mod file_manager;
pub mod logging;
pub mod page_range;
pub mod session;
pub mod submission;
pub mod tracker;

pub use capabilities::{CapabilityState, ParameterDefaults};
pub use duplex::{DuplexError, DuplexPhase, DuplexPlanner};
pub use page_range::{PageSelection, PageSet};
pub use session::{Preview, PrintOutcome, PrintRequest, PrintSession, SessionError};
pub use submission::{JobSubmitter, SubmitError};
pub use tracker::{JobStatusTracker, JobUpdate, TrackError, TrackerHandle};
