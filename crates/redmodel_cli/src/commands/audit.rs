//! Audit command implementation.

use redmodel_core::{EntityId, Store};
use redmodel_testkit::{audit_entity, audit_type, AuditReport, TypeAudit};

/// Runs the audit command. Fails if any problem is found.
pub fn run(
    store: &mut dyn Store,
    entity_type: &str,
    id: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let audit = match id {
        Some(id) => {
            let report = audit_entity(store, entity_type, EntityId::new(id))?;
            TypeAudit {
                entity_type: entity_type.to_owned(),
                reports: vec![report],
                unowned_keys: Vec::new(),
            }
        }
        None => audit_type(store, entity_type)?,
    };

    println!("Auditing {} {} entities", audit.reports.len(), entity_type);
    println!();
    for report in &audit.reports {
        print_report(report);
    }
    for key in &audit.unowned_keys {
        println!("{key}: does not hold an id");
    }

    let problems = audit.problem_count();
    println!();
    if problems > 0 {
        println!("✗ Audit FAILED: {problems} problem(s)");
        return Err(format!("{problems} integrity problem(s) found").into());
    }
    println!("✓ Audit passed");
    Ok(())
}

fn print_report(report: &AuditReport) {
    if report.is_absent() && report.is_clean() {
        println!("{}:{}: not stored", report.entity_type, report.id);
        return;
    }
    let status = if report.is_clean() { "ok" } else { "damaged" };
    println!(
        "{}:{}: {} ({} unique keys)",
        report.entity_type,
        report.id,
        status,
        report.unique_keys.len()
    );
    for issue in &report.issues {
        println!("  - {issue}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redmodel_testkit::TestRepository;

    #[test]
    fn clean_store_passes() {
        let users = TestRepository::memory();
        users.add_user("a@x.com", "al");
        users.add_user("b@x.com", "bo");

        assert!(run(&mut users.connection(), "User", None).is_ok());
        assert!(run(&mut users.connection(), "User", Some(1)).is_ok());
    }

    #[test]
    fn damage_fails() {
        let users = TestRepository::memory();
        users.add_user("a@x.com", "al");
        users
            .connection()
            .delete(&["User:email:a@x.com".to_string()])
            .unwrap();

        assert!(run(&mut users.connection(), "User", None).is_err());
    }

    #[test]
    fn stray_unique_key_fails() {
        let users = TestRepository::memory();
        users.add_user("a@x.com", "al");
        users
            .connection()
            .set("User:email:stale@x.com", b"1")
            .unwrap();

        assert!(run(&mut users.connection(), "User", Some(1)).is_ok());
        assert!(run(&mut users.connection(), "User", None).is_err());
    }
}
