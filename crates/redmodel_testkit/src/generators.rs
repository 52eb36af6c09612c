//! Property-based test generators using proptest.
//!
//! Provides strategies for names, attribute values and operation
//! sequences that respect the naming rules.

use proptest::prelude::*;
use redmodel_core::{AttributeMap, Value};

/// Strategy for generating valid entity type names.
pub fn type_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating valid property names, including ones with a
/// leading underscore.
pub fn property_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z_][A-Za-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating storable extension names.
pub fn extension_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("x[a-z0-9_]{0,10}").expect("Invalid regex")
}

/// Strategy for generating names that break the naming rules.
pub fn invalid_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[0-9][a-z]{0,8}").expect("Invalid regex"),
        prop::string::string_regex("[a-z]{1,4}[-: .][a-z]{0,4}").expect("Invalid regex"),
        prop::string::string_regex("_[a-z]{0,8}").expect("Invalid regex"),
    ]
}

/// Strategy for generating scalar values. Floats are always finite.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        prop::string::string_regex("[ -~]{0,16}")
            .expect("Invalid regex")
            .prop_map(Value::Text),
    ]
}

/// Strategy for generating nested values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Map),
        ]
    })
}

/// Strategy for generating extension maps with storable names.
pub fn extensions_strategy() -> impl Strategy<Value = AttributeMap> {
    prop::collection::btree_map(extension_name_strategy(), value_strategy(), 0..5)
}

/// Strategy for generating emails from a small pool, so that sequences
/// collide often.
pub fn contended_email_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[abc]{1,2}@x\\.com").expect("Invalid regex")
}

/// An operation against a `User` repository.
#[derive(Debug, Clone)]
pub enum UserOperation {
    /// Save a new user.
    Insert {
        /// Email (unique).
        email: String,
        /// Nickname.
        nickname: String,
    },
    /// Change the email of a previously saved user.
    ChangeEmail {
        /// Index into the saved users, modulo their count.
        slot: usize,
        /// New email.
        email: String,
    },
    /// Delete a previously saved user.
    Delete {
        /// Index into the saved users, modulo their count.
        slot: usize,
    },
}

/// Strategy for generating user operations.
pub fn user_operation_strategy() -> impl Strategy<Value = UserOperation> {
    prop_oneof![
        3 => (contended_email_strategy(), "[a-z]{0,6}")
            .prop_map(|(email, nickname)| UserOperation::Insert { email, nickname }),
        2 => (any::<usize>(), contended_email_strategy())
            .prop_map(|(slot, email)| UserOperation::ChangeEmail { slot, email }),
        1 => any::<usize>().prop_map(|slot| UserOperation::Delete { slot }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<UserOperation>> {
    prop::collection::vec(user_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
