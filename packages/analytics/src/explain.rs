//! Human-readable reasons for model-flagged suspects.

/// Raw (unscaled) metrics the rules read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuspectMetrics {
    pub weekend_activity: f64,
    pub velocity_q3: f64,
    pub bio_rate: f64,
    pub max_velocity: f64,
}

/// Reason emitted when no rule fires.
pub const FALLBACK_REASON: &str = "Statistical Pattern Anomaly";

type Rule = (fn(&SuspectMetrics) -> bool, &'static str);

/// Rules in reporting order.
const RULES: [Rule; 4] = [
    (|m| m.weekend_activity > 0.4, "Suspicious Weekend Activity"),
    (|m| m.velocity_q3 > 50.0, "Sustained High Speed"),
    (|m| m.bio_rate < 0.1, "Abnormally Low Bio Updates"),
    (|m| m.max_velocity > 150.0, "Impossible Speed Spike"),
];

/// Every reason that applies to `metrics`, in fixed rule order. Never
/// empty.
#[must_use]
pub fn reasons(metrics: &SuspectMetrics) -> Vec<&'static str> {
    let fired: Vec<&'static str> = RULES
        .iter()
        .filter(|(applies, _)| applies(metrics))
        .map(|(_, reason)| *reason)
        .collect();

    if fired.is_empty() {
        vec![FALLBACK_REASON]
    } else {
        fired
    }
}

/// [`reasons`] joined with `", "`.
#[must_use]
pub fn explain(metrics: &SuspectMetrics) -> String {
    reasons(metrics).join(", ")
}
