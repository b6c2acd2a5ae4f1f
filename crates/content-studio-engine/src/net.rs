//! Request resilience helpers: bounded retry with exponential backoff and
//! last-request-wins bookkeeping for overlapping fetches.

use std::time::Duration;

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`,
    /// capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy runs out of attempts. `sleep` is called between attempts.
pub fn retry_with_backoff<T, E>(
    policy: &RetryPolicy,
    mut sleep: impl FnMut(Duration),
    mut op: impl FnMut(u32) -> Result<T, E>,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && is_retryable(&err) => {
                let delay = policy.delay_for(attempt);
                log::warn!("Attempt {attempt}/{max_attempts} failed: {err}; retrying in {delay:?}");
                sleep(delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Identifies one request issued through a [`LatestRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

/// Last-request-wins slot for a single resource.
///
/// Each fetch takes a ticket with [`begin`](Self::begin). A completed
/// response is applied only if no newer ticket has been issued since, so a
/// slow response can never overwrite the result of a later request.
#[derive(Debug)]
pub struct LatestRequest<T> {
    issued: u64,
    value: Option<T>,
    loading: bool,
}

impl<T> Default for LatestRequest<T> {
    fn default() -> Self {
        Self {
            issued: 0,
            value: None,
            loading: false,
        }
    }
}

impl<T> LatestRequest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> RequestTicket {
        self.issued += 1;
        self.loading = true;
        RequestTicket(self.issued)
    }

    /// Apply `value` if `ticket` is the newest. Returns whether it was applied.
    pub fn complete(&mut self, ticket: RequestTicket, value: T) -> bool {
        if ticket.0 != self.issued {
            log::debug!(
                "Dropping stale response {} (latest is {})",
                ticket.0,
                self.issued
            );
            return false;
        }
        self.value = Some(value);
        self.loading = false;
        true
    }

    /// Mark the newest request as failed, keeping the previous value.
    pub fn fail(&mut self, ticket: RequestTicket) -> bool {
        if ticket.0 != self.issued {
            return false;
        }
        self.loading = false;
        true
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

/// Progress of an upload in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.sent.min(self.total) * 100) / self.total) as u8
    }
}

/// Callback invoked by upload collaborators as bytes are sent.
pub type ProgressCallback<'a> = dyn FnMut(UploadProgress) + 'a;
