//! Fixed-interval polling with a hard timeout
//!
//! Every waiting loop in this crate shares the same mechanism: a
//! [`RetryPolicy`] value picked by the call site and a condition that is
//! retried until it reports `Ok(true)` or the timeout elapses.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use thiserror::Error;
use tracing::debug;

/// Interval and timeout of a polling loop
///
/// The interval is fixed; there is no backoff. Call sites pick their own
/// concrete values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub const fn new(interval: Duration, timeout: Duration) -> RetryPolicy {
        RetryPolicy { interval, timeout }
    }
}

/// Error returned by [`poll_until`] when the condition never became true
#[derive(Debug, Error)]
#[error("condition was not satisfied within {timeout:?}")]
pub struct PollTimeout {
    pub timeout: Duration,
}

/// Retries `condition` at the policy's fixed interval until it returns
/// `Ok(true)` or the timeout elapses.
///
/// The first attempt is made immediately. A condition returning an error
/// counts as "not yet true" and is retried; only the timeout produces
/// [`PollTimeout`].
pub fn poll_until<F>(policy: RetryPolicy, mut condition: F) -> Result<(), PollTimeout>
where
    F: FnMut() -> Result<bool>,
{
    let deadline = Instant::now() + policy.timeout;
    loop {
        match condition() {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(error) => debug!("condition check failed, retrying: {:#}", error),
        }
        if Instant::now() + policy.interval > deadline {
            return Err(PollTimeout {
                timeout: policy.timeout,
            });
        }
        thread::sleep(policy.interval);
    }
}

/// Polls `condition` like [`poll_until`] and panics with `failure_message`
/// on timeout.
///
/// A timeout is a non-recoverable outcome for the enclosing test; the
/// panic carries the descriptive message supplied by the call site.
pub fn assert_eventually<F>(policy: RetryPolicy, failure_message: &str, condition: F)
where
    F: FnMut() -> Result<bool>,
{
    if poll_until(policy, condition).is_err() {
        panic!("{}", failure_message);
    }
}
