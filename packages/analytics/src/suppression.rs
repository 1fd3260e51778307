//! Cross-signal suppression.
//!
//! A fraud suspect that is also a boom town is explained by migration and
//! gets suppressed. Without boom context every suspect stays high risk.

use std::collections::HashSet;

use drishti_analytics_models::{AuditStatus, FraudAuditEntry, FraudSuspect, LocationProfile};
use drishti_enrolment_models::LocationKey;

/// Classifies each suspect against the boom town set.
///
/// `None` and an empty slice both mean no suppression context. Output
/// holds every suspect exactly once: high risk first, then ascending
/// severity within each status.
#[must_use]
pub fn merge(
    suspects: Vec<FraudSuspect>,
    boom_towns: Option<&[LocationProfile]>,
) -> Vec<FraudAuditEntry> {
    let boom_keys: HashSet<&LocationKey> = boom_towns
        .unwrap_or_default()
        .iter()
        .map(|p| &p.key)
        .collect();

    if boom_keys.is_empty() && !suspects.is_empty() {
        log::warn!(
            "No boom town context; marking all {} suspects high risk",
            suspects.len()
        );
    }

    let mut entries: Vec<FraudAuditEntry> = suspects
        .into_iter()
        .map(|suspect| {
            let audit_status = if boom_keys.contains(&suspect.key) {
                AuditStatus::Suppressed
            } else {
                AuditStatus::HighRisk
            };
            FraudAuditEntry {
                suspect,
                audit_status,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        a.audit_status.cmp(&b.audit_status).then_with(|| {
            a.suspect
                .severity_score
                .total_cmp(&b.suspect.severity_score)
        })
    });

    let suppressed = entries
        .iter()
        .filter(|e| e.audit_status == AuditStatus::Suppressed)
        .count();
    log::info!(
        "Audit: {} high risk, {suppressed} suppressed",
        entries.len() - suppressed
    );

    entries
}
