mod common;

use std::sync::Arc;
use std::time::Duration;

use common::MockBackend;
use futures_util::StreamExt;
use tokio_test::{assert_err, assert_ok};
use webprint::{JobStatusTracker, TrackError};
use webprint_shared::{BackendError, JobId, JobParameters, JobState, PrintJob};
use webprint_simulator::{SimulatedBackend, SimulatorConfig};

const TICK: Duration = Duration::from_millis(5);

fn tracker(backend: &Arc<MockBackend>) -> JobStatusTracker {
    JobStatusTracker::new(backend.clone(), TICK)
}

#[tokio::test]
async fn test_polling_stops_after_terminal_state() {
    let backend = Arc::new(MockBackend::new());
    backend.script_statuses([
        Ok(("processing", "job-printing")),
        Ok(("completed", "job-completed-successfully")),
    ]);

    let updates: Vec<_> = tracker(&backend).track(JobId(1)).collect().await;
    let states: Vec<JobState> = updates
        .into_iter()
        .map(|u| assert_ok!(u).status.state)
        .collect();
    assert_eq!(
        states,
        vec![JobState::Pending, JobState::Processing, JobState::Completed]
    );

    tokio::time::sleep(TICK * 10).await;
    assert_eq!(MockBackend::calls(&backend.status_calls), 2);
}

#[tokio::test]
async fn test_first_update_is_pending_without_backend_call() {
    let backend = Arc::new(MockBackend::new());
    let stream = tracker(&backend).track(JobId(3));
    futures_util::pin_mut!(stream);

    let first = assert_ok!(stream.next().await.unwrap());
    assert_eq!(first.job_id, JobId(3));
    assert_eq!(first.status.state, JobState::Pending);
    assert_eq!(first.status.reason, "job-accepted");
    assert_eq!(MockBackend::calls(&backend.status_calls), 0);
}

#[tokio::test]
async fn test_unchanged_status_is_not_repeated() {
    let backend = Arc::new(MockBackend::new());
    backend.script_statuses([
        Ok(("processing", "job-printing")),
        Ok(("processing", "job-printing")),
        Ok(("processing", "media-empty")),
        Ok(("canceled", "job-canceled-by-user")),
    ]);

    let updates: Vec<_> = tracker(&backend).track(JobId(2)).collect().await;
    let reasons: Vec<String> = updates
        .into_iter()
        .map(|u| u.unwrap().status.reason)
        .collect();
    assert_eq!(
        reasons,
        vec!["job-accepted", "job-printing", "media-empty", "job-canceled-by-user"]
    );
    assert_eq!(MockBackend::calls(&backend.status_calls), 4);
}

#[tokio::test]
async fn test_poll_failure_is_reported_once_and_stops() {
    let backend = Arc::new(MockBackend::new());
    backend.script_statuses([
        Ok(("processing", "job-printing")),
        Err(BackendError::Transport("connection refused".to_string())),
    ]);

    let updates: Vec<_> = tracker(&backend).track(JobId(4)).collect().await;
    assert_eq!(updates.len(), 3);
    let err = assert_err!(updates[2].clone());
    assert_eq!(
        err,
        TrackError::Poll {
            job_id: JobId(4),
            source: BackendError::Transport("connection refused".to_string()),
        }
    );

    tokio::time::sleep(TICK * 10).await;
    assert_eq!(MockBackend::calls(&backend.status_calls), 2);
}

#[tokio::test]
async fn test_vanished_job_ends_tracking() {
    let backend = Arc::new(MockBackend::new());
    backend.script_statuses([Err(BackendError::NotFound("job 9".to_string()))]);

    let updates: Vec<_> = tracker(&backend).track(JobId(9)).collect().await;
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[1], Err(TrackError::NotFound(JobId(9))));
}

#[tokio::test]
async fn test_unknown_backend_state_is_passed_through() {
    let backend = Arc::new(MockBackend::new());
    backend.script_statuses([
        Ok(("held-for-review", "job-hold-until-specified")),
        Ok(("aborted", "job-aborted-by-system")),
    ]);

    let status = assert_ok!(tracker(&backend).watch(JobId(5)).finish().await);
    assert_eq!(status.state, JobState::Aborted);
    assert_eq!(status.reason, "job-aborted-by-system");

    backend.script_statuses([Ok(("held-for-review", "job-hold-until-specified"))]);
    let stream = tracker(&backend).track(JobId(6));
    futures_util::pin_mut!(stream);
    stream.next().await;
    let update = assert_ok!(stream.next().await.unwrap());
    assert_eq!(update.status.state, JobState::Other("held-for-review".to_string()));
    assert!(!update.status.is_terminal());
}

#[tokio::test]
async fn test_updates_are_recorded_on_the_job() {
    let backend = Arc::new(MockBackend::new());
    backend.script_statuses([
        Ok(("processing", "job-printing")),
        Ok(("completed", "job-completed-successfully")),
    ]);
    let params = JobParameters::builder("office").build_unchecked().unwrap();
    let mut job = PrintJob::new(JobId(11), params.clone());
    let mut other = PrintJob::new(JobId(12), params);

    let mut handle = tracker(&backend).watch(JobId(11));
    assert_ok!(handle.next_into(&mut job).await.unwrap());
    assert_eq!(job.status().state, JobState::Pending);
    assert_ok!(handle.next_into(&mut job).await.unwrap());
    assert_eq!(job.status().state, JobState::Processing);

    let update = assert_ok!(handle.next_into(&mut other).await.unwrap());
    assert_eq!(update.status.state, JobState::Completed);
    assert_eq!(other.status().state, JobState::Pending);
    assert!(handle.next_into(&mut job).await.is_none());
    assert_eq!(job.status().state, JobState::Processing);
}

#[tokio::test]
async fn test_dropping_handle_stops_polling() {
    let backend = Arc::new(MockBackend::new());
    let mut handle = tracker(&backend).watch(JobId(8));
    assert_eq!(handle.job_id(), JobId(8));
    assert_ok!(handle.next().await.unwrap());
    assert_ok!(handle.next().await.unwrap());
    drop(handle);

    tokio::time::sleep(TICK * 2).await;
    let after_drop = MockBackend::calls(&backend.status_calls);
    tokio::time::sleep(TICK * 10).await;
    assert_eq!(MockBackend::calls(&backend.status_calls), after_drop);
}

#[tokio::test]
async fn test_independent_trackers_on_simulated_backend() {
    let config = SimulatorConfig {
        pending_ms: 10,
        processing_ms: 20,
        ..SimulatorConfig::default()
    };
    let backend = Arc::new(SimulatedBackend::new(config));
    let tracker = JobStatusTracker::new(backend.clone(), TICK);
    let session_tracker = tracker.clone();

    let first = submit(&backend, "office_laser").await;
    let second = submit(&backend, "lobby_inkjet").await;
    assert_ne!(first, second);

    let a = tracker.watch(first);
    let b = session_tracker.watch(second);
    backend.cancel_job(second).await.unwrap();

    let (a, b) = tokio::join!(a.finish(), b.finish());
    assert_eq!(assert_ok!(a).state, JobState::Completed);
    assert_eq!(assert_ok!(b).state, JobState::Canceled);
}

async fn submit(backend: &SimulatedBackend, printer: &str) -> JobId {
    use webprint_shared::{Document, DocumentKind, PrintBackend};
    let params = JobParameters::builder(printer).build_unchecked().unwrap();
    let doc = Document::new("flyer.pdf", DocumentKind::Pdf, vec![0u8; 10]);
    backend.submit_job(&params, &doc).await.unwrap()
}
