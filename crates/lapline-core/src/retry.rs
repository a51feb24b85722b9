//! Fixed-interval retry for rate-limited requests
//!
//! Only "too many requests" is worth retrying against the race API; every
//! other failure goes straight back to the caller. The loop below is bounded
//! by [`RetryPolicy::max_retries`] and reports exhaustion as a value, not an
//! error, so the caller decides how to surface it.

use std::time::Duration;

/// Retries after the initial attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Pause before each retry. Fixed, never grows.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

/// Blocking pause. Swapped for a recorder in tests.
pub trait Pause {
    fn pause(&self, duration: Duration);
}

impl<P: Pause + ?Sized> Pause for &P {
    fn pause(&self, duration: Duration) {
        (**self).pause(duration);
    }
}

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// What a single attempt produced.
#[derive(Debug, PartialEq, Eq)]
pub enum Attempt<T> {
    Ready(T),
    RateLimited { status: u16 },
}

/// Terminal state of the retry loop.
#[derive(Debug, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Success { value: T, retries: u32 },
    /// Every attempt was rate limited; `status` is the last one observed
    Exhausted { status: u16, attempts: u32 },
}

/// Run `attempt_fn` until it is not rate limited or the retry budget is spent.
///
/// Hard errors from `attempt_fn` are returned immediately with no pause.
pub fn retry_rate_limited<T, E>(
    label: &str,
    policy: &RetryPolicy,
    pause: &dyn Pause,
    mut attempt_fn: impl FnMut() -> Result<Attempt<T>, E>,
) -> Result<RetryOutcome<T>, E> {
    let mut retries = 0u32;
    loop {
        match attempt_fn()? {
            Attempt::Ready(value) => {
                if retries > 0 {
                    log::info!("{label}: successful pull after {} tries", retries + 1);
                }
                return Ok(RetryOutcome::Success { value, retries });
            }
            Attempt::RateLimited { status } if retries < policy.max_retries => {
                retries += 1;
                log::warn!(
                    "{label}: HTTP {status} (rate limited), retry {retries}/{} in {:?}",
                    policy.max_retries,
                    policy.backoff
                );
                pause.pause(policy.backoff);
            }
            Attempt::RateLimited { status } => {
                log::error!(
                    "{label}: still rate limited after {} retries (HTTP {status})",
                    policy.max_retries
                );
                return Ok(RetryOutcome::Exhausted {
                    status,
                    attempts: retries + 1,
                });
            }
        }
    }
}
