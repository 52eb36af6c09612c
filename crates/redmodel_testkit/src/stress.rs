//! Stress tests for redmodel.
//!
//! These helpers drive one repository from many threads at once. Each
//! thread opens its own connections, as separate processes would.

use parking_lot::Mutex;
use redmodel_core::{EntityId, ModelError, Repository};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Operations rejected by a unique constraint.
    pub violations: usize,
    /// Operations that failed for any other reason.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Returns operations per second.
    #[must_use]
    pub fn ops_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.total_ops as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Unique violations: {}", self.violations);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second());
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Operations per thread.
    pub operations_per_thread: usize,
    /// Number of distinct unique values the threads compete for.
    pub distinct_values: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            operations_per_thread: 50,
            distinct_values: 16,
        }
    }
}

/// Outcome of racing inserts of one unique value.
#[derive(Debug, Clone)]
pub struct RaceOutcome {
    /// Ids of the inserts that committed.
    pub winners: Vec<EntityId>,
    /// Number of inserts rejected as duplicates.
    pub violations: usize,
    /// Any other errors, rendered.
    pub errors: Vec<String>,
}

/// Starts `threads` inserts of a `User` with the same email at once.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn race_inserts(repo: &Repository, threads: usize, email: &str) -> RaceOutcome {
    let barrier = Arc::new(Barrier::new(threads));
    let winners = Mutex::new(Vec::new());
    let errors = Mutex::new(Vec::new());
    let violations = AtomicUsize::new(0);

    thread::scope(|scope| {
        for i in 0..threads {
            let barrier = Arc::clone(&barrier);
            let (winners, errors, violations) = (&winners, &errors, &violations);
            scope.spawn(move || {
                let mut user = repo
                    .new_entity()
                    .with("email", email)
                    .with("nickname", format!("racer{i}"));
                barrier.wait();
                match repo.put(&mut user) {
                    Ok(id) => winners.lock().push(id),
                    Err(ModelError::UniquePropertyViolation { .. }) => {
                        violations.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => errors.lock().push(e.to_string()),
                }
            });
        }
    });

    RaceOutcome {
        winners: winners.into_inner(),
        violations: violations.into_inner(),
        errors: errors.into_inner(),
    }
}

/// Runs a mix of inserts, email changes and deletes over a small pool of
/// emails from many threads.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn stress_mixed_operations(repo: &Repository, config: &StressConfig) -> StressTestResult {
    let successful = AtomicUsize::new(0);
    let violations = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for t in 0..config.threads {
            let (successful, violations, failed) = (&successful, &violations, &failed);
            scope.spawn(move || {
                let mut mine = Vec::new();
                for op in 0..config.operations_per_thread {
                    let email = format!("u{}@x.com", (t * 7 + op) % config.distinct_values.max(1));
                    let result = match op % 4 {
                        0 | 1 => {
                            let mut user = repo.new_entity().with("email", email.as_str());
                            let saved = repo.put(&mut user).map(|_| ());
                            if saved.is_ok() {
                                mine.push(user);
                            }
                            saved
                        }
                        2 => match mine.last_mut() {
                            Some(user) => {
                                user.set("email", email.as_str());
                                repo.put(user).map(|_| ())
                            }
                            None => Ok(()),
                        },
                        _ => match mine.pop() {
                            Some(mut user) => repo.delete(&mut user),
                            None => Ok(()),
                        },
                    };
                    match result {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(ModelError::UniquePropertyViolation { .. }) => {
                            violations.fetch_add(1, Ordering::Relaxed)
                        }
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            });
        }
    });

    let successful = successful.into_inner();
    let violations = violations.into_inner();
    let failed = failed.into_inner();
    StressTestResult {
        total_ops: successful + violations + failed,
        successful_ops: successful,
        violations,
        failed_ops: failed,
        duration: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::audit_type;
    use crate::fixtures::TestRepository;

    #[test]
    fn test_race_has_one_winner() {
        let users = TestRepository::memory();
        let outcome = race_inserts(&users, 8, "race@x.com");

        assert_eq!(outcome.winners.len(), 1, "{outcome:?}");
        assert_eq!(outcome.violations, 7);
        assert!(outcome.errors.is_empty());

        let owner = users.find_id("email", "race@x.com").unwrap();
        assert_eq!(owner, Some(outcome.winners[0]));
    }

    #[test]
    fn test_repeated_races() {
        let users = TestRepository::memory();
        for round in 0..10 {
            let email = format!("r{round}@x.com");
            let outcome = race_inserts(&users, 4, &email);
            assert_eq!(outcome.winners.len(), 1);
            assert_eq!(outcome.violations, 3);
        }
        let audit = audit_type(&mut users.connection(), "User").unwrap();
        assert!(audit.is_clean(), "{audit:?}");
    }

    #[test]
    fn test_mixed_operations_stay_consistent() {
        let users = TestRepository::memory();
        let config = StressConfig {
            threads: 4,
            operations_per_thread: 40,
            distinct_values: 6,
        };
        let result = stress_mixed_operations(&users, &config);

        assert_eq!(result.failed_ops, 0, "{result:?}");
        assert!(result.successful_ops > 0);
        let audit = audit_type(&mut users.connection(), "User").unwrap();
        assert!(audit.is_clean(), "{audit:?}");
    }
}
