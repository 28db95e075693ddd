use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{PollError, ProviderError};

/// One status observation for an asynchronous remote job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded {
        result_urls: Vec<String>,
        cost_time_ms: Option<u64>,
    },
    Failed {
        code: Option<String>,
        message: String,
    },
}

/// Terminal result of a completed poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded {
        result_urls: Vec<String>,
        cost_time_ms: Option<u64>,
    },
    Failed {
        code: Option<String>,
        message: String,
    },
}

/// A provider that can report the current status of a job by id.
pub trait JobStatusSource {
    fn job_status(
        &self,
        task_id: &str,
    ) -> impl std::future::Future<Output = Result<JobStatus, ProviderError>> + Send;
}

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_wait: Duration,
    /// Extra attempts after a transport failure before giving up.
    pub transport_retries: u32,
}

/// Polls `source` until the job reaches a terminal state or the wait budget
/// is exhausted. The budget is checked before each request, so the loop
/// overshoots `max_wait` by at most one interval, and a budget smaller than
/// the interval still yields exactly one status request.
pub async fn await_completion<S: JobStatusSource>(
    source: &S,
    task_id: &str,
    settings: PollSettings,
) -> Result<JobOutcome, PollError> {
    let started = Instant::now();
    let mut transport_failures = 0u32;

    loop {
        let waited = started.elapsed();
        if waited >= settings.max_wait {
            return Err(PollError::Timeout {
                waited_ms: waited.as_millis() as u64,
            });
        }

        match source.job_status(task_id).await {
            Ok(JobStatus::Pending) => {
                debug!("Job {task_id} still pending after {} ms", waited.as_millis());
            }
            Ok(JobStatus::Succeeded {
                result_urls,
                cost_time_ms,
            }) => {
                return Ok(JobOutcome::Succeeded {
                    result_urls,
                    cost_time_ms,
                });
            }
            Ok(JobStatus::Failed { code, message }) => {
                return Ok(JobOutcome::Failed { code, message });
            }
            Err(ProviderError::Transport(err))
                if transport_failures < settings.transport_retries =>
            {
                transport_failures += 1;
                warn!(
                    "Transient poll failure for job {task_id} \
                     ({transport_failures}/{}): {err}",
                    settings.transport_retries
                );
            }
            Err(err) => return Err(err.into()),
        }

        tokio::time::sleep(settings.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Replays a scripted status sequence, repeating the final element.
    struct ScriptedSource {
        script: Vec<JobStatus>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(script: Vec<JobStatus>) -> Self {
            ScriptedSource {
                script,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl JobStatusSource for ScriptedSource {
        async fn job_status(&self, _task_id: &str) -> Result<JobStatus, ProviderError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.script[index.min(self.script.len() - 1)].clone())
        }
    }

    fn settings(interval_ms: u64, max_wait_ms: u64) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(interval_ms),
            max_wait: Duration::from_millis(max_wait_ms),
            transport_retries: 0,
        }
    }

    fn success(url: &str) -> JobStatus {
        JobStatus::Succeeded {
            result_urls: vec![url.to_string()],
            cost_time_ms: Some(5000),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_after_pending_states() {
        let source = ScriptedSource::new(vec![
            JobStatus::Pending,
            JobStatus::Pending,
            success("https://cdn.example/out.png"),
        ]);
        let started = Instant::now();

        let outcome = await_completion(&source, "task-1", settings(10, 35))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            JobOutcome::Succeeded {
                result_urls: vec!["https://cdn.example/out.png".to_string()],
                cost_time_ms: Some(5000),
            }
        );
        assert_eq!(source.calls(), 3);
        // two pending responses cost two full sleep intervals
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_the_job_never_terminates() {
        let source = ScriptedSource::new(vec![JobStatus::Pending]);
        let started = Instant::now();

        let err = await_completion(&source, "task-2", settings(10, 35))
            .await
            .unwrap_err();

        match err {
            PollError::Timeout { waited_ms } => assert!(waited_ms >= 35),
            other => panic!("expected timeout, got {other:?}"),
        }
        // overshoot is bounded by one interval
        assert!(started.elapsed() <= Duration::from_millis(45));
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_smaller_than_interval_still_polls_once() {
        let source = ScriptedSource::new(vec![JobStatus::Pending]);

        let err = await_completion(&source, "task-3", settings(50, 10))
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Timeout { .. }));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_a_terminal_outcome_not_an_error() {
        let source = ScriptedSource::new(vec![
            JobStatus::Pending,
            JobStatus::Failed {
                code: Some("422".to_string()),
                message: "content policy".to_string(),
            },
        ]);

        let outcome = await_completion(&source, "task-4", settings(10, 100))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            JobOutcome::Failed {
                code: Some("422".to_string()),
                message: "content policy".to_string(),
            }
        );
    }

    struct FlakySource {
        failures_before_success: usize,
        calls: AtomicUsize,
    }

    impl JobStatusSource for FlakySource {
        async fn job_status(&self, _task_id: &str) -> Result<JobStatus, ProviderError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            if index < self.failures_before_success {
                // a reqwest::Error cannot be constructed directly; a remote
                // error stands in for a non-retried provider failure below,
                // and this variant for a retried one
                Err(ProviderError::Remote {
                    status: 500,
                    detail: "transient".to_string(),
                })
            } else {
                Ok(JobStatus::Succeeded {
                    result_urls: vec![],
                    cost_time_ms: None,
                })
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn provider_errors_abort_the_loop() {
        let source = FlakySource {
            failures_before_success: 1,
            calls: AtomicUsize::new(0),
        };

        let err = await_completion(&source, "task-5", settings(10, 100))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PollError::Provider(ProviderError::Remote { status: 500, .. })
        ));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
