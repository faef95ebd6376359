use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, LinkError, Result};

use super::hardware::DataChannel;

/// Shared flag checked by the controller between retries and polls.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        Default::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// How control commands are retried while the surface is unavailable.
///
/// The n-th consecutive failure waits `n * backoff_unit` before the next attempt. Without
/// `max_attempts` a command is retried until it succeeds or the sweep is cancelled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub backoff_unit: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            backoff_unit: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn unbounded(backoff_unit: Duration) -> RetryPolicy {
        RetryPolicy {
            backoff_unit,
            max_attempts: None,
        }
    }

    pub fn bounded(backoff_unit: Duration, max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            backoff_unit,
            max_attempts: Some(max_attempts),
        }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }

    /// Runs `op` until it succeeds, the attempts run out or `cancel` is raised.
    pub fn run<T>(
        &self,
        command: &'static str,
        cancel: &CancellationToken,
        mut op: impl FnMut() -> std::result::Result<T, LinkError>,
    ) -> Result<T> {
        let mut attempt = 0u32;
        loop {
            cancel.check()?;
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(source) => {
                    if self.max_attempts.map_or(false, |max| attempt >= max) {
                        return Err(Error::HardwareUnreachable {
                            command,
                            attempts: attempt,
                            source,
                        });
                    }
                    let wait = self.backoff(attempt);
                    warn!(command, attempt, ?wait, error = %source, "control surface unavailable, retrying");
                    thread::sleep(wait);
                }
            }
        }
    }
}

/// How the data channel is polled for a buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    pub interval: Duration,
    // None waits indefinitely.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_millis(10),
            deadline: None,
        }
    }
}

impl PollPolicy {
    /// Blocks until `channel` has a buffer ready.
    pub fn wait_ready<D: DataChannel>(
        &self,
        channel: &mut D,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let started = Instant::now();
        loop {
            cancel.check()?;
            match channel.poll(self.interval) {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(error) => warn!(%error, "data channel poll failed"),
            }
            if let Some(deadline) = self.deadline {
                if started.elapsed() >= deadline {
                    return Err(Error::DataTimeout(deadline));
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use num::complex::Complex32;

    use super::{CancellationToken, PollPolicy, RetryPolicy};
    use crate::{
        error::{Error, LinkError},
        sweep::hardware::DataChannel,
    };

    fn flaky(failures: u32) -> impl FnMut() -> Result<u32, LinkError> {
        let mut calls = 0;
        move || {
            calls += 1;
            if calls <= failures {
                Err(LinkError::Unavailable("busy".into()))
            } else {
                Ok(calls)
            }
        }
    }

    #[test]
    fn backoff_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(3), Duration::from_secs(3));
        assert_eq!(policy.max_attempts, None);
    }

    #[test]
    fn unbounded_retries_until_success() {
        let policy = RetryPolicy::unbounded(Duration::ZERO);
        let calls = policy
            .run("gain", &CancellationToken::new(), flaky(5))
            .unwrap();
        assert_eq!(calls, 6);
    }

    #[test]
    fn bounded_retries_give_up() {
        let policy = RetryPolicy::bounded(Duration::ZERO, 3);
        let err = policy
            .run("gain", &CancellationToken::new(), flaky(5))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::HardwareUnreachable {
                command: "gain",
                attempts: 3,
                ..
            }
        ));
    }

    #[test]
    fn cancelled_token_stops_retrying() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = RetryPolicy::unbounded(Duration::ZERO)
            .run("gain", &cancel, flaky(0))
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    struct Stalled {
        remaining: u32,
    }

    impl DataChannel for Stalled {
        fn poll(&mut self, _: Duration) -> Result<bool, LinkError> {
            if self.remaining == 0 {
                return Ok(true);
            }
            self.remaining -= 1;
            Ok(false)
        }

        fn recv(&mut self) -> Result<Vec<Complex32>, LinkError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn poll_waits_for_data() {
        let mut channel = Stalled { remaining: 4 };
        PollPolicy::default()
            .wait_ready(&mut channel, &CancellationToken::new())
            .unwrap();
        assert_eq!(channel.remaining, 0);
    }

    #[test]
    fn poll_deadline_times_out() {
        let mut channel = Stalled {
            remaining: u32::MAX,
        };
        let policy = PollPolicy {
            interval: Duration::ZERO,
            deadline: Some(Duration::ZERO),
        };
        let err = policy
            .wait_ready(&mut channel, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::DataTimeout(_)));
    }
}
