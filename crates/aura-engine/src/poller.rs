use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use aura_contracts::analysis::{ImageRef, TryOnResult, TryOnStatus};
use aura_contracts::errors::AuraError;
use aura_contracts::jobs::{Job, JobStatus};

use crate::request::TransportPayload;

pub const MAX_POLL_ATTEMPTS: u32 = 30;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Handle the backend uses to address one submitted synthesis job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTicket {
    pub owner_id: String,
    pub person_tag: String,
    pub garment_tag: String,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The backend answered synchronously; nothing to poll.
    Done(TryOnResult),
    /// The job is processing; poll the ticket until terminal.
    Accepted(JobTicket),
}

#[derive(Debug, Clone)]
pub enum PollOutcome {
    Completed(Vec<ImageRef>),
    Failed(String),
    Pending(JobStatus),
}

/// Seam between the poller and the HTTP client; faked in tests.
pub trait TryOnTransport {
    fn submit(&self, owner_id: &str, payload: &TransportPayload)
        -> Result<SubmitOutcome, AuraError>;
    fn poll(&self, ticket: &JobTicket) -> Result<PollOutcome, AuraError>;
}

/// Cooperative cancellation for an in-flight poll loop. Cloning shares the
/// flag; the caller keeps one clone and hands the other to the poll call.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}

/// Drives one submit→poll→terminal run.
///
/// Strictly sequential: one outstanding request at a time, the next poll only
/// after the previous one resolved and the interval elapsed. A transport
/// error during a poll is swallowed and counted as a non-terminal attempt;
/// exhausting the budget yields `JobTimeout` regardless.
pub fn run<T: TryOnTransport + ?Sized>(
    transport: &T,
    owner_id: &str,
    payload: &TransportPayload,
    config: PollConfig,
    cancel: &CancelFlag,
) -> Result<(TryOnResult, Job), AuraError> {
    let mut job = Job::submitted();

    let ticket = match transport.submit(owner_id, payload)? {
        SubmitOutcome::Done(result) => {
            job.observe(JobStatus::Completed);
            job.result = Some(result.clone());
            return Ok((result, job));
        }
        SubmitOutcome::Accepted(ticket) => {
            job.observe(JobStatus::Processing);
            ticket
        }
    };

    for attempt in 1..=config.max_attempts {
        if cancel.is_cancelled() {
            return Err(AuraError::Cancelled);
        }

        let outcome = transport.poll(&ticket);
        job.record_attempt();
        match outcome {
            Ok(PollOutcome::Completed(images)) => {
                job.observe(JobStatus::Completed);
                let result = TryOnResult {
                    status: TryOnStatus::Completed,
                    images,
                };
                job.result = Some(result.clone());
                return Ok((result, job));
            }
            Ok(PollOutcome::Failed(message)) => {
                job.observe(JobStatus::Failed);
                job.error_message = Some(message.clone());
                return Err(AuraError::JobFailed(message));
            }
            Ok(PollOutcome::Pending(status)) => {
                job.observe(status);
            }
            // Counted, not fatal; the next attempt may reach the backend.
            Err(AuraError::RemoteUnavailable(_)) => {}
            Err(err) => return Err(err),
        }

        if attempt < config.max_attempts {
            thread::sleep(config.interval);
        }
    }

    Err(AuraError::JobTimeout {
        attempts: job.attempts_made,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    struct ScriptedTransport {
        submit: SubmitOutcome,
        polls: RefCell<VecDeque<Result<PollOutcome, AuraError>>>,
        poll_calls: RefCell<u32>,
    }

    impl ScriptedTransport {
        fn accepted(polls: Vec<Result<PollOutcome, AuraError>>) -> Self {
            Self {
                submit: SubmitOutcome::Accepted(JobTicket {
                    owner_id: "ada".to_string(),
                    person_tag: "user".to_string(),
                    garment_tag: "clothing".to_string(),
                }),
                polls: RefCell::new(polls.into()),
                poll_calls: RefCell::new(0),
            }
        }

        fn poll_calls(&self) -> u32 {
            *self.poll_calls.borrow()
        }
    }

    impl TryOnTransport for ScriptedTransport {
        fn submit(
            &self,
            _owner_id: &str,
            _payload: &TransportPayload,
        ) -> Result<SubmitOutcome, AuraError> {
            Ok(self.submit.clone())
        }

        fn poll(&self, _ticket: &JobTicket) -> Result<PollOutcome, AuraError> {
            *self.poll_calls.borrow_mut() += 1;
            self.polls
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(PollOutcome::Pending(JobStatus::Processing)))
        }
    }

    fn fast_config() -> PollConfig {
        PollConfig {
            interval: Duration::ZERO,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }

    fn empty_payload() -> TransportPayload {
        crate::request::build(
            &aura_contracts::analysis::AnalysisRequest::TryOnSynthesis {
                person_image: aura_contracts::analysis::ImageRef::new("data:image/jpeg;base64,AA=="),
                garment_image: aura_contracts::analysis::ImageRef::new("data:image/jpeg;base64,AA=="),
            },
            Some(&aura_contracts::identity::Identity::new("ada", "Ada L.")),
        )
        .expect("payload builds")
    }

    fn completed(urls: &[&str]) -> Result<PollOutcome, AuraError> {
        Ok(PollOutcome::Completed(
            urls.iter().map(|url| ImageRef::new(*url)).collect(),
        ))
    }

    #[test]
    fn completion_on_the_last_attempt_succeeds_after_thirty_polls() {
        let mut polls: Vec<Result<PollOutcome, AuraError>> = (0..29)
            .map(|_| Ok(PollOutcome::Pending(JobStatus::Processing)))
            .collect();
        polls.push(completed(&["a.jpg", "b.jpg"]));
        let transport = ScriptedTransport::accepted(polls);

        let (result, job) = run(
            &transport,
            "ada",
            &empty_payload(),
            fast_config(),
            &CancelFlag::new(),
        )
        .expect("poll completes");

        assert_eq!(transport.poll_calls(), 30);
        assert_eq!(job.attempts_made, 30);
        assert_eq!(result.status, TryOnStatus::Completed);
        assert_eq!(result.images.len(), 2);
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn never_terminal_times_out_after_exactly_thirty_attempts() {
        let transport = ScriptedTransport::accepted(Vec::new());
        let err = run(
            &transport,
            "ada",
            &empty_payload(),
            fast_config(),
            &CancelFlag::new(),
        )
        .unwrap_err();

        assert_eq!(err, AuraError::JobTimeout { attempts: 30 });
        assert_eq!(transport.poll_calls(), 30);
    }

    #[test]
    fn backend_failure_terminates_on_that_attempt() {
        let transport = ScriptedTransport::accepted(vec![
            Ok(PollOutcome::Pending(JobStatus::Processing)),
            Ok(PollOutcome::Pending(JobStatus::Processing)),
            Ok(PollOutcome::Failed("garment could not be fitted".to_string())),
        ]);
        let err = run(
            &transport,
            "ada",
            &empty_payload(),
            fast_config(),
            &CancelFlag::new(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            AuraError::JobFailed("garment could not be fitted".to_string())
        );
        assert_eq!(transport.poll_calls(), 3);
    }

    #[test]
    fn transport_errors_are_swallowed_and_counted() {
        let transport = ScriptedTransport::accepted(vec![
            Err(AuraError::RemoteUnavailable("connection failed".to_string())),
            Err(AuraError::RemoteUnavailable("connection failed".to_string())),
            completed(&["a.jpg"]),
        ]);
        let (result, job) = run(
            &transport,
            "ada",
            &empty_payload(),
            fast_config(),
            &CancelFlag::new(),
        )
        .expect("recovers after flaky polls");

        assert_eq!(transport.poll_calls(), 3);
        assert_eq!(job.attempts_made, 3);
        assert_eq!(result.images.len(), 1);
    }

    #[test]
    fn synchronous_submission_performs_zero_polls() {
        let transport = ScriptedTransport {
            submit: SubmitOutcome::Done(TryOnResult {
                status: TryOnStatus::Completed,
                images: vec![ImageRef::new("a.jpg")],
            }),
            polls: RefCell::new(VecDeque::new()),
            poll_calls: RefCell::new(0),
        };
        let (result, job) = run(
            &transport,
            "ada",
            &empty_payload(),
            fast_config(),
            &CancelFlag::new(),
        )
        .expect("synchronous result");

        assert_eq!(transport.poll_calls(), 0);
        assert_eq!(job.attempts_made, 0);
        assert_eq!(result.status, TryOnStatus::Completed);
    }

    #[test]
    fn cancellation_short_circuits_before_the_next_poll() {
        let transport = ScriptedTransport::accepted(Vec::new());
        let cancel = CancelFlag::new();
        cancel.cancel();

        let err = run(&transport, "ada", &empty_payload(), fast_config(), &cancel).unwrap_err();
        assert_eq!(err, AuraError::Cancelled);
        assert_eq!(transport.poll_calls(), 0);
    }

    #[test]
    fn reported_status_never_regresses_the_job() {
        let transport = ScriptedTransport::accepted(vec![
            Ok(PollOutcome::Pending(JobStatus::Processing)),
            Ok(PollOutcome::Pending(JobStatus::Submitted)),
            completed(&["a.jpg"]),
        ]);
        let (_, job) = run(
            &transport,
            "ada",
            &empty_payload(),
            fast_config(),
            &CancelFlag::new(),
        )
        .expect("completes");
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.attempts_made, 3);
    }
}
