//! Bounded retry wrapper around any price history source.
//!
//! Transient failures are retried after the policy's backoff; a symbol that
//! is simply unavailable is returned at once.

use crate::domain::error::ProfitHighError;
use crate::domain::price_bar::PriceBar;
use crate::domain::run_config::RetryPolicy;
use crate::ports::price_history_port::PriceHistoryPort;
use chrono::NaiveDate;
use std::thread;
use tracing::warn;

pub struct RetryingPriceSource<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: PriceHistoryPort> RetryingPriceSource<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn with_retry<T>(
        &self,
        what: &str,
        op: impl Fn() -> Result<T, ProfitHighError>,
    ) -> Result<T, ProfitHighError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        what,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "fetch failed, retrying"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<P: PriceHistoryPort> PriceHistoryPort for RetryingPriceSource<P> {
    fn fetch_weekly(
        &self,
        symbol: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProfitHighError> {
        self.with_retry(symbol, || self.inner.fetch_weekly(symbol, start_date))
    }

    fn list_symbols(&self) -> Result<Vec<String>, ProfitHighError> {
        self.with_retry("symbol list", || self.inner.list_symbols())
    }
}
