//! Circuit breaker for calls to weather providers and the LLM
//!
//! # States
//!
//! - **Closed**: calls pass through
//! - **Open**: calls fail fast without reaching the service
//! - **Half-Open**: a few calls are let through to probe for recovery
//!
//! Only errors that are [`Retryable`] count as failures: a location that does
//! not exist or a rejected API key says nothing about the service being down.

use std::{
    fmt,
    future::Future,
    time::{Duration, Instant},
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::retry::Retryable;

/// Thresholds of a circuit breaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Consecutive half-open successes that close it again
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
    /// Seconds the circuit stays open before probing
    #[serde(default = "default_half_open_timeout")]
    pub half_open_timeout_secs: u64,
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_success_threshold() -> u32 {
    2
}

const fn default_half_open_timeout() -> u64 {
    30
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
            half_open_timeout_secs: default_half_open_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Error of a call made through a circuit breaker
#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open; the service was not called
    Open(String),
    /// The service was called and failed
    Service(E),
}

impl<E: fmt::Display> fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(name) => write!(
                f,
                "Circuit breaker open for service '{name}': service is temporarily unavailable"
            ),
            Self::Service(e) => write!(f, "{e}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CircuitBreakerError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(_) => None,
            Self::Service(e) => Some(e),
        }
    }
}

struct Counters {
    state: CircuitState,
    failures: u32,
    successes: u32,
    opened_at: Option<Instant>,
}

/// Circuit breaker around one external service
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    counters: RwLock<Counters>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, CircuitBreakerConfig::default())
    }

    #[must_use]
    pub fn with_config(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            counters: RwLock::new(Counters {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                opened_at: None,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state; an expired open circuit moves to half-open here
    #[must_use]
    pub fn state(&self) -> CircuitState {
        let mut counters = self.counters.write();
        if counters.state == CircuitState::Open {
            let timeout = Duration::from_secs(self.config.half_open_timeout_secs);
            if counters.opened_at.is_some_and(|at| at.elapsed() >= timeout) {
                debug!(service = %self.name, "Circuit transitioning from Open to HalfOpen");
                counters.state = CircuitState::HalfOpen;
                counters.successes = 0;
            }
        }
        counters.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    fn on_success(&self) {
        let mut counters = self.counters.write();
        counters.failures = 0;
        if counters.state == CircuitState::HalfOpen {
            counters.successes += 1;
            if counters.successes >= self.config.success_threshold {
                info!(service = %self.name, "Circuit transitioning from HalfOpen to Closed");
                counters.state = CircuitState::Closed;
                counters.successes = 0;
                counters.opened_at = None;
            }
        }
    }

    fn on_failure(&self) {
        let mut counters = self.counters.write();
        counters.failures += 1;
        counters.successes = 0;

        let trip = match counters.state {
            CircuitState::Closed => counters.failures >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };
        if trip {
            warn!(
                service = %self.name,
                failures = counters.failures,
                "Circuit transitioning to Open"
            );
            counters.state = CircuitState::Open;
            counters.opened_at = Some(Instant::now());
            counters.failures = 0;
        }
    }

    /// Run `f` unless the circuit is open, and record its outcome
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + fmt::Display,
    {
        if self.is_open() {
            warn!(service = %self.name, "Circuit breaker preventing call to service");
            return Err(CircuitBreakerError::Open(self.name.clone()));
        }

        match f().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            },
            Err(e) => {
                if e.is_retryable() {
                    warn!(service = %self.name, error = %e, "Service call failed");
                    self.on_failure();
                } else {
                    // the service answered, so it is up
                    self.on_success();
                }
                Err(CircuitBreakerError::Service(e))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Down(bool);

    impl fmt::Display for Down {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("down")
        }
    }

    impl Retryable for Down {
        fn is_retryable(&self) -> bool {
            self.0
        }
    }

    fn breaker(threshold: u32, timeout_secs: u64) -> CircuitBreaker {
        CircuitBreaker::with_config(
            "test",
            CircuitBreakerConfig {
                failure_threshold: threshold,
                success_threshold: 1,
                half_open_timeout_secs: timeout_secs,
            },
        )
    }

    async fn fail(cb: &CircuitBreaker, transient: bool) -> Result<(), CircuitBreakerError<Down>> {
        cb.call(|| async move { Err::<(), _>(Down(transient)) }).await
    }

    #[tokio::test]
    async fn opens_after_threshold_and_fails_fast() {
        let cb = breaker(2, 60);
        let _ = fail(&cb, true).await;
        assert_eq!(cb.state(), CircuitState::Closed);
        let _ = fail(&cb, true).await;
        assert_eq!(cb.state(), CircuitState::Open);

        let result = cb.call(|| async { Ok::<_, Down>(1) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::Open(name)) if name == "test"));
    }

    #[tokio::test]
    async fn permanent_errors_do_not_trip() {
        let cb = breaker(1, 60);
        for _ in 0..3 {
            assert!(matches!(
                fail(&cb, false).await,
                Err(CircuitBreakerError::Service(_))
            ));
        }
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_success_closes() {
        let cb = breaker(1, 0);
        let _ = fail(&cb, true).await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        let result = cb.call(|| async { Ok::<_, Down>("ok") }).await;
        assert!(result.is_ok());
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_failure_reopens() {
        let cb = breaker(1, 0);
        let _ = fail(&cb, true).await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        let _ = fail(&cb, true).await;
        // zero timeout moves it straight back to half-open on the next look
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.counters.read().opened_at.is_some());
    }

    #[test]
    fn open_error_message() {
        let err: CircuitBreakerError<Down> = CircuitBreakerError::Open("nws".into());
        assert!(err.to_string().contains("'nws'"));
    }
}
