//! Cross-crate integration test helpers.
//!
//! [`IntegrationHarness`] applies operations to a repository and to a
//! plain reference model side by side, and checks after each step that the
//! store agrees with the model.

use crate::audit::audit_type;
use crate::fixtures::{user_schema, TestRepository};
use crate::generators::UserOperation;
use redmodel_core::{Entity, ModelError, RepositoryConfig, Value};

/// A test harness for model-based testing of a `User` repository.
pub struct IntegrationHarness {
    /// The repository under test.
    pub users: TestRepository,
    /// Entities the model believes are saved.
    saved: Vec<Entity>,
}

impl IntegrationHarness {
    /// Creates a harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(RepositoryConfig::default())
    }

    /// Creates a harness with the given configuration.
    pub fn with_config(config: RepositoryConfig) -> Self {
        Self {
            users: TestRepository::with_config(user_schema(), config),
            saved: Vec::new(),
        }
    }

    /// Applies one operation and asserts the outcome the model predicts.
    ///
    /// # Panics
    ///
    /// Panics if the repository disagrees with the model.
    pub fn apply(&mut self, op: &UserOperation) {
        match op {
            UserOperation::Insert { email, nickname } => {
                let taken = self.owner_of(email).is_some();
                let mut user = self
                    .users
                    .new_entity()
                    .with("email", email.as_str())
                    .with("nickname", nickname.as_str());
                let result = self.users.put(&mut user);
                if taken {
                    Self::expect_violation(result.map(|_| ()));
                    assert!(user.id().is_none());
                } else {
                    result.expect("insert of a free email failed");
                    self.saved.push(user);
                }
            }
            UserOperation::ChangeEmail { slot, email } => {
                if self.saved.is_empty() {
                    return;
                }
                let idx = slot % self.saved.len();
                let taken = self.owner_of(email).is_some_and(|owner| owner != idx);
                let previous = self.saved[idx].get("email").cloned().unwrap_or(Value::Null);

                let user = &mut self.saved[idx];
                user.set("email", email.as_str());
                let result = self.users.put(user);
                if taken {
                    Self::expect_violation(result.map(|_| ()));
                    user.set("email", previous);
                } else {
                    result.expect("update to a free email failed");
                }
            }
            UserOperation::Delete { slot } => {
                if self.saved.is_empty() {
                    return;
                }
                let idx = slot % self.saved.len();
                let mut user = self.saved.remove(idx);
                self.users.delete(&mut user).expect("delete failed");
                assert!(user.id().is_none());
            }
        }
    }

    /// Verifies that the store matches the model.
    ///
    /// # Panics
    ///
    /// Panics on any mismatch.
    pub fn verify_all(&self) {
        for user in &self.saved {
            let id = user.id().expect("saved entity has an id");
            let loaded = self
                .users
                .get(id)
                .expect("get failed")
                .expect("saved entity missing");
            assert_eq!(&loaded, user, "stored state of {id} differs");

            let email = user.get("email").cloned().unwrap_or(Value::Null);
            assert_eq!(
                self.users.find_id("email", email).expect("lookup failed"),
                Some(id)
            );
        }

        let audit = audit_type(&mut self.users.connection(), "User").expect("audit failed");
        assert!(audit.is_clean(), "{audit:?}");
        assert_eq!(audit.reports.len(), self.saved.len());

        let claimed = self
            .users
            .dump()
            .keys()
            .filter(|key| key.starts_with("User:email:"))
            .count();
        assert_eq!(claimed, self.saved.len(), "orphaned unique keys");
    }

    /// Returns the number of entities the model holds.
    pub fn tracked_count(&self) -> usize {
        self.saved.len()
    }

    fn owner_of(&self, email: &str) -> Option<usize> {
        self.saved
            .iter()
            .position(|user| user.get("email").and_then(Value::as_text) == Some(email))
    }

    fn expect_violation(result: Result<(), ModelError>) {
        match result {
            Err(ModelError::UniquePropertyViolation { field }) => assert_eq!(field, "email"),
            other => panic!("expected a unique violation, got {other:?}"),
        }
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{operation_sequence_strategy, PropTestConfig};
    use proptest::prelude::*;
    use redmodel_core::Format;

    #[test]
    fn test_integration_harness() {
        let mut harness = IntegrationHarness::new();
        harness.apply(&UserOperation::Insert {
            email: "a@x.com".into(),
            nickname: "al".into(),
        });
        harness.apply(&UserOperation::Insert {
            email: "a@x.com".into(),
            nickname: "again".into(),
        });
        harness.apply(&UserOperation::Insert {
            email: "b@x.com".into(),
            nickname: "bo".into(),
        });
        harness.apply(&UserOperation::ChangeEmail {
            slot: 0,
            email: "b@x.com".into(),
        });
        harness.apply(&UserOperation::ChangeEmail {
            slot: 0,
            email: "c@x.com".into(),
        });
        harness.apply(&UserOperation::Delete { slot: 1 });

        assert_eq!(harness.tracked_count(), 1);
        harness.verify_all();
    }

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn operation_sequences_keep_index_consistent(ops in operation_sequence_strategy(1, 40)) {
            let mut harness = IntegrationHarness::new();
            for op in &ops {
                harness.apply(op);
            }
            harness.verify_all();
        }

        #[test]
        fn cbor_sequences_keep_index_consistent(ops in operation_sequence_strategy(1, 20)) {
            let mut harness = IntegrationHarness::with_config(
                RepositoryConfig::new().format(Format::Cbor).strict_delete(true),
            );
            for op in &ops {
                harness.apply(op);
            }
            harness.verify_all();
        }
    }
}
