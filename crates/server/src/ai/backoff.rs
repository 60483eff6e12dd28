use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Pauses AI calls after a run of consecutive failures.
///
/// After the cooldown exactly one trial call is let through. Its success
/// resumes normal traffic, its failure pauses calls again. A trial that
/// never reports back is abandoned after another cooldown.
pub struct FailureBackoff {
    threshold: u32,
    cooldown: Duration,
    state: Mutex<BackoffState>,
}

#[derive(Default)]
struct BackoffState {
    consecutive_failures: u32,
    paused_until: Option<Instant>,
    trial_started: Option<Instant>,
}

impl FailureBackoff {
    /// A `threshold` of 0 never pauses.
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            state: Mutex::new(BackoffState::default()),
        }
    }

    /// `Err(remaining)` while calls are paused or a trial call is in flight
    pub fn check(&self) -> Result<(), Duration> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        if let Some(until) = state.paused_until {
            if now < until {
                return Err(until - now);
            }
            state.paused_until = None;
            state.trial_started = Some(now);
            tracing::info!("AI cooldown elapsed, allowing one trial call");
            return Ok(());
        }

        if let Some(started) = state.trial_started {
            let deadline = started + self.cooldown;
            if now < deadline {
                return Err(deadline - now);
            }
            state.trial_started = Some(now);
        }
        Ok(())
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = BackoffState::default();
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        if self.threshold > 0 && state.consecutive_failures >= self.threshold {
            state.paused_until = Some(Instant::now() + self.cooldown);
            state.trial_started = None;
            tracing::warn!(
                failures = state.consecutive_failures,
                cooldown_secs = self.cooldown.as_secs_f64(),
                "Pausing AI calls after repeated failures"
            );
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .consecutive_failures
    }
}
