//! Conflict retry loop.

use crate::config::RetryPolicy;
use crate::error::{ModelError, ModelResult};
use tracing::{debug, warn};

/// Result of one optimistic attempt.
#[derive(Debug)]
pub(crate) enum Attempt<T> {
    /// The batch was applied.
    Committed(T),
    /// A watched key changed before commit.
    Conflict,
}

/// Runs `attempt` until it commits, fails, or the policy gives up.
///
/// Attempts are numbered from 1. Errors from an attempt end the loop
/// immediately.
pub(crate) fn run<T, F>(
    policy: &RetryPolicy,
    operation: &'static str,
    entity_type: &str,
    mut attempt: F,
) -> ModelResult<T>
where
    F: FnMut(u32) -> ModelResult<Attempt<T>>,
{
    let mut number = 1u32;
    loop {
        let delay = policy.delay_before(number);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        match attempt(number)? {
            Attempt::Committed(value) => return Ok(value),
            Attempt::Conflict if policy.allows_retry_after(number) => {
                debug!(entity_type, operation, attempt = number, "conflict, retrying");
                number = number.saturating_add(1);
            }
            Attempt::Conflict => {
                warn!(entity_type, operation, attempts = number, "giving up after conflicts");
                return Err(ModelError::Contention { attempts: number });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn returns_first_commit() {
        let mut calls = 0;
        let result = run(&RetryPolicy::unbounded(), "insert", "User", |n| {
            calls += 1;
            Ok(if n < 4 {
                Attempt::Conflict
            } else {
                Attempt::Committed(n)
            })
        });
        assert_eq!(result.unwrap(), 4);
        assert_eq!(calls, 4);
    }

    #[test]
    fn error_stops_loop() {
        let mut calls = 0;
        let result: ModelResult<()> = run(&RetryPolicy::unbounded(), "update", "User", |_| {
            calls += 1;
            Err(ModelError::unique_violation("email"))
        });
        assert_eq!(result.unwrap_err().violated_field(), Some("email"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn bounded_policy_gives_up() {
        let policy = RetryPolicy::bounded(3).with_initial_delay(Duration::from_micros(1));
        let mut calls = 0;
        let result: ModelResult<()> = run(&policy, "delete", "User", |_| {
            calls += 1;
            Ok(Attempt::Conflict)
        });
        assert!(matches!(result, Err(ModelError::Contention { attempts: 3 })));
        assert_eq!(calls, 3);
    }
}
