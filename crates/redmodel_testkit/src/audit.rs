//! Store integrity auditing.
//!
//! Checks the bookkeeping of stored entities against the key layout in
//! both directions. Every unique key in a reverse key set must hold the id
//! of the entity that owns the set, and the entity's data key must exist.
//! Every unique key of a type must in turn be listed by the reverse key
//! set of the id it holds.

use redmodel_core::index::{data_key, reverse_key_set_key};
use redmodel_core::transaction::allocator;
use redmodel_core::{EntityId, ModelResult, Store};
use redmodel_store::StoreError;
use std::collections::btree_map::{BTreeMap, Entry};
use std::fmt;

/// One problem found by an audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditIssue {
    /// The reverse key set exists but the data key does not.
    MissingData {
        /// The absent data key.
        key: String,
    },
    /// A listed unique key does not exist.
    DanglingMember {
        /// The unique key.
        key: String,
    },
    /// A listed unique key holds another entity's id.
    ForeignMember {
        /// The unique key.
        key: String,
        /// The id it holds.
        owner: EntityId,
    },
    /// A listed unique key holds something that is not an id.
    CorruptMember {
        /// The unique key.
        key: String,
    },
    /// A unique key holds this entity's id but its reverse key set does not
    /// list the key.
    UnlistedKey {
        /// The unique key.
        key: String,
    },
}

impl fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingData { key } => write!(f, "data key {key} is missing"),
            Self::DanglingMember { key } => write!(f, "unique key {key} does not exist"),
            Self::ForeignMember { key, owner } => {
                write!(f, "unique key {key} belongs to id {owner}")
            }
            Self::CorruptMember { key } => write!(f, "unique key {key} does not hold an id"),
            Self::UnlistedKey { key } => {
                write!(f, "unique key {key} is missing from the reverse key set")
            }
        }
    }
}

/// Audit result for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    /// The entity type.
    pub entity_type: String,
    /// The audited id.
    pub id: EntityId,
    /// Whether the data key exists.
    pub data_present: bool,
    /// Members of the reverse key set.
    pub unique_keys: Vec<String>,
    /// Problems found.
    pub issues: Vec<AuditIssue>,
}

impl AuditReport {
    /// Returns true if no problems were found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if nothing at all is stored for the entity.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        !self.data_present && self.unique_keys.is_empty()
    }
}

/// Audits one entity.
///
/// An entity with neither data nor reverse key set is reported absent and
/// clean.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn audit_entity(
    store: &mut dyn Store,
    entity_type: &str,
    id: EntityId,
) -> ModelResult<AuditReport> {
    let data = data_key(entity_type, id);
    let data_present = store.exists(&data)?;
    let members = store.smembers(&reverse_key_set_key(entity_type, id))?;

    let mut issues = Vec::new();
    if !data_present && !members.is_empty() {
        issues.push(AuditIssue::MissingData { key: data });
    }
    for member in &members {
        match store.get(member)? {
            None => issues.push(AuditIssue::DanglingMember {
                key: member.clone(),
            }),
            Some(bytes) => match EntityId::from_stored(&bytes) {
                Some(owner) if owner == id => {}
                Some(owner) => issues.push(AuditIssue::ForeignMember {
                    key: member.clone(),
                    owner,
                }),
                None => issues.push(AuditIssue::CorruptMember {
                    key: member.clone(),
                }),
            },
        }
    }

    Ok(AuditReport {
        entity_type: entity_type.to_owned(),
        id,
        data_present,
        unique_keys: members.into_iter().collect(),
        issues,
    })
}

/// Audit result for a whole entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAudit {
    /// The entity type.
    pub entity_type: String,
    /// One report per stored or damaged entity, ordered by id.
    pub reports: Vec<AuditReport>,
    /// Unique keys whose value is not an id of any entity.
    pub unowned_keys: Vec<String>,
}

impl TypeAudit {
    /// Returns true if no problems were found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unowned_keys.is_empty() && self.reports.iter().all(AuditReport::is_clean)
    }

    /// Returns the number of problems found.
    #[must_use]
    pub fn problem_count(&self) -> usize {
        self.unowned_keys.len() + self.reports.iter().map(|r| r.issues.len()).sum::<usize>()
    }
}

/// Audits a whole entity type.
///
/// Every id the type's counter has issued is audited as by
/// [`audit_entity`]. The type's unique keys are then scanned and each one
/// is checked against the reverse key set of the id it holds. Absent
/// entities are left out unless a unique key still points at them.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the counter is corrupt.
pub fn audit_type(store: &mut dyn Store, entity_type: &str) -> ModelResult<TypeAudit> {
    let last = allocator::peek(store, entity_type)?;
    let mut reports = BTreeMap::new();
    for raw in 1..=last {
        let id = EntityId::new(raw);
        reports.insert(id, audit_entity(store, entity_type, id)?);
    }

    let mut unowned_keys = Vec::new();
    for key in unique_keys_of(store, entity_type)? {
        let bytes = match store.get(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => continue,
            Err(StoreError::WrongType { .. }) => {
                unowned_keys.push(key);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let Some(owner) = EntityId::from_stored(&bytes) else {
            unowned_keys.push(key);
            continue;
        };
        let report = match reports.entry(owner) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(audit_entity(store, entity_type, owner)?),
        };
        if !report.unique_keys.contains(&key) {
            report.issues.push(AuditIssue::UnlistedKey { key });
        }
    }

    Ok(TypeAudit {
        entity_type: entity_type.to_owned(),
        reports: reports
            .into_values()
            .filter(|r| !r.is_absent() || !r.is_clean())
            .collect(),
        unowned_keys,
    })
}

/// Lists the unique keys of a type: every `{type}:{field}:{value}` key.
/// The counter, data keys and reverse key sets are skipped.
fn unique_keys_of(store: &mut dyn Store, entity_type: &str) -> ModelResult<Vec<String>> {
    let prefix = format!("{entity_type}:");
    let keys = store.keys_with_prefix(&prefix)?;
    Ok(keys
        .into_iter()
        .filter(|key| {
            let rest = &key[prefix.len()..];
            match rest.split_once(':') {
                Some((head, _)) => !head.bytes().all(|b| b.is_ascii_digit()),
                None => false,
            }
        })
        .collect())
}
