//! Named retry policy: fixed-interval backoff with an explicit distinction
//! between "not yet available" and "permanently rejected".
//!
//! Startup dependencies (the shared log file, the durable store) are expected
//! to appear eventually, so the default policies are unbounded. Anything the
//! operation reports as `Rejected` is surfaced immediately and never retried.

use std::thread;
use std::time::Duration;

use crate::core::errors::{DtpError, Result};

/// One attempt's verdict, produced by the operation under retry.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// The dependency is available; stop retrying.
    Ready(T),
    /// Transient unavailability; sleep the policy interval and try again.
    NotYet(String),
    /// Permanent failure; propagate without further attempts.
    Rejected(DtpError),
}

/// Fixed-interval retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Sleep between attempts.
    pub interval: Duration,
    /// Attempt limit; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retry forever at a fixed interval. The long-running-service default.
    #[must_use]
    pub const fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Retry at most `max_attempts` times.
    #[must_use]
    pub const fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    /// Drive `op` until it yields `Ready` or `Rejected`, or the attempt
    /// limit is exhausted.
    pub fn run<T>(&self, what: &str, mut op: impl FnMut() -> RetryOutcome<T>) -> Result<T> {
        match self.run_cancellable(what, || false, &mut op)? {
            Some(value) => Ok(value),
            // Unreachable: the cancel predicate above never fires.
            None => Err(DtpError::Runtime {
                details: format!("retry for {what} cancelled"),
            }),
        }
    }

    /// Like [`Self::run`], but checks `cancel` between attempts and returns
    /// `Ok(None)` when it fires, so a shutdown signal during a startup wait
    /// exits cleanly instead of erroring.
    pub fn run_cancellable<T>(
        &self,
        what: &str,
        cancel: impl Fn() -> bool,
        mut op: impl FnMut() -> RetryOutcome<T>,
    ) -> Result<Option<T>> {
        let mut attempts: u32 = 0;
        loop {
            if cancel() {
                eprintln!("[DTP-RETRY] shutdown requested while waiting for {what}");
                return Ok(None);
            }

            match op() {
                RetryOutcome::Ready(value) => return Ok(Some(value)),
                RetryOutcome::Rejected(err) => return Err(err),
                RetryOutcome::NotYet(reason) => {
                    attempts = attempts.saturating_add(1);
                    if let Some(max) = self.max_attempts
                        && attempts >= max
                    {
                        return Err(DtpError::Runtime {
                            details: format!(
                                "gave up waiting for {what} after {attempts} attempts: {reason}"
                            ),
                        });
                    }
                    eprintln!(
                        "[DTP-RETRY] {what} not ready ({reason}), retry in {:?}",
                        self.interval
                    );
                    thread::sleep(self.interval);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_on_first_attempt() {
        let policy = RetryPolicy::unbounded(Duration::from_millis(1));
        let value: i32 = policy.run("store", || RetryOutcome::Ready(42)).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn retries_until_ready() {
        let policy = RetryPolicy::unbounded(Duration::from_millis(1));
        let mut calls = 0;
        let value: &str = policy
            .run("log file", || {
                calls += 1;
                if calls < 3 {
                    RetryOutcome::NotYet("file absent".to_string())
                } else {
                    RetryOutcome::Ready("open")
                }
            })
            .unwrap();
        assert_eq!(value, "open");
        assert_eq!(calls, 3);
    }

    #[test]
    fn rejected_is_immediate() {
        let policy = RetryPolicy::unbounded(Duration::from_millis(1));
        let mut calls = 0;
        let err = policy
            .run::<()>("store", || {
                calls += 1;
                RetryOutcome::Rejected(DtpError::InvalidConfig {
                    details: "bad path".to_string(),
                })
            })
            .unwrap_err();
        assert_eq!(calls, 1);
        assert_eq!(err.code(), "DTP-1001");
    }

    #[test]
    fn bounded_policy_gives_up() {
        let policy = RetryPolicy::bounded(Duration::from_millis(1), 3);
        let mut calls = 0;
        let err = policy
            .run::<()>("store", || {
                calls += 1;
                RetryOutcome::NotYet("still down".to_string())
            })
            .unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(err.code(), "DTP-3900");
    }

    #[test]
    fn cancel_yields_none() {
        let policy = RetryPolicy::unbounded(Duration::from_millis(1));
        let result = policy
            .run_cancellable::<()>("log file", || true, || {
                RetryOutcome::NotYet("never checked".to_string())
            })
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn cancel_checked_between_attempts() {
        let policy = RetryPolicy::unbounded(Duration::from_millis(1));
        let mut calls = 0;
        let cancelled = std::cell::Cell::new(false);
        let result = policy
            .run_cancellable::<()>(
                "store",
                || cancelled.get(),
                || {
                    calls += 1;
                    cancelled.set(true);
                    RetryOutcome::NotYet("down".to_string())
                },
            )
            .unwrap();
        assert!(result.is_none());
        assert_eq!(calls, 1);
    }
}
