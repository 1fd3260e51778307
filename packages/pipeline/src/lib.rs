#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Orchestration for enrolment signal runs.
//!
//! The derived table is built once and shared read-only. In a
//! multi-horizon run each horizon slices, aggregates and detects on its own
//! blocking task. The fraud suspects are merged against the boom horizon's
//! output only after both tasks finish. A full-history run does the same
//! over the whole table with no slicing.

pub mod config;
pub mod progress;
pub mod report;

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use drishti_analytics::{
    AnalyticsError, aggregate, compute_thresholds, detect_boom_towns, detect_digital_dark_zones,
    detect_fraud_suspects, detect_ghost_villages, horizon::window_start, merge, reference_date,
    slice_window,
};
use drishti_analytics_models::{
    AuditStatus, DetectionParams, DetectionResult, DigitalDarkZone, FraudAuditEntry,
    FraudSuspect, Horizon, LocationProfile, Thresholds,
};
use drishti_enrolment_models::DerivedRecord;
use drishti_features::{FeatureError, derive_features, load_master_csv};
use serde::Serialize;
use strum::IntoEnumIterator as _;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

pub use config::{ConfigError, PipelineConfig};
pub use progress::{NullProgress, ProgressCallback, null_progress};

/// Errors that can occur during a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input loading failed.
    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// Detection failed.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Report CSV could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Run summary could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A horizon task panicked or was cancelled.
    #[error("Horizon task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The table has no records, so no reference date exists.
    #[error("No usable records; cannot determine a reference date")]
    NoRecords,
}

/// Which kind of run produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunMode {
    /// Independent lookback window per signal.
    MultiHorizon,
    /// One profile set over the entire table.
    FullHistory,
}

/// What one horizon saw and produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonSummary {
    /// Which signal this horizon feeds.
    pub horizon: Horizon,
    /// Window length, `None` for a full-history run.
    pub window_days: Option<u32>,
    /// First date included, `None` for a full-history run.
    pub window_start: Option<NaiveDate>,
    /// Records inside the window.
    pub records: usize,
    /// Distinct locations inside the window.
    pub locations: usize,
    /// Cutoffs derived from this horizon's population.
    pub thresholds: Thresholds,
    /// Rows the horizon's detector emitted.
    pub detections: usize,
}

/// Everything a run detected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReport {
    pub mode: RunMode,
    /// Latest date in the input; every window ends here.
    pub reference_date: NaiveDate,
    /// Total derived records.
    pub total_records: usize,
    /// Model seed used for the fraud horizon.
    pub seed: u64,
    pub horizons: Vec<HorizonSummary>,
    pub boom_towns: Vec<LocationProfile>,
    pub ghost_villages: Vec<LocationProfile>,
    pub digital_dark_zones: Vec<DigitalDarkZone>,
    /// Suspects after suppression, high risk first.
    pub fraud_audit: Vec<FraudAuditEntry>,
}

impl SignalReport {
    /// Summary for `horizon`, if it ran.
    #[must_use]
    pub fn horizon(&self, horizon: Horizon) -> Option<&HorizonSummary> {
        self.horizons.iter().find(|h| h.horizon == horizon)
    }

    /// Number of audit entries with `status`.
    #[must_use]
    pub fn audit_count(&self, status: AuditStatus) -> usize {
        self.fraud_audit
            .iter()
            .filter(|e| e.audit_status == status)
            .count()
    }

    /// All signals as tagged results: fraud, boom, ghost, digital.
    #[must_use]
    pub fn detections(&self) -> Vec<DetectionResult> {
        self.fraud_audit
            .iter()
            .cloned()
            .map(DetectionResult::FraudSuspect)
            .chain(self.boom_towns.iter().cloned().map(DetectionResult::BoomTown))
            .chain(
                self.ghost_villages
                    .iter()
                    .cloned()
                    .map(DetectionResult::GhostVillage),
            )
            .chain(
                self.digital_dark_zones
                    .iter()
                    .cloned()
                    .map(DetectionResult::DigitalDarkZone),
            )
            .collect()
    }
}

/// Loads the master CSV and derives per-record features.
///
/// # Errors
///
/// * If the file cannot be read or violates the input contract
/// * If it contains no usable records
pub fn load_table(path: &Path) -> Result<Vec<DerivedRecord>, PipelineError> {
    let records = load_master_csv(path)?;
    Ok(derive_features(records))
}

/// One horizon's detector output.
enum Signals {
    Fraud(Vec<FraudSuspect>),
    Boom(Vec<LocationProfile>),
    Ghost(Vec<LocationProfile>),
    Digital(Vec<DigitalDarkZone>),
}

impl Signals {
    const fn empty(horizon: Horizon) -> Self {
        match horizon {
            Horizon::Fraud => Self::Fraud(Vec::new()),
            Horizon::Boom => Self::Boom(Vec::new()),
            Horizon::Ghost => Self::Ghost(Vec::new()),
            Horizon::Digital => Self::Digital(Vec::new()),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Fraud(v) => v.len(),
            Self::Boom(v) | Self::Ghost(v) => v.len(),
            Self::Digital(v) => v.len(),
        }
    }
}

/// Runs the detector for `horizon` over an already sliced population.
fn detect(
    horizon: Horizon,
    profiles: &[LocationProfile],
    thresholds: &Thresholds,
    params: &DetectionParams,
) -> Result<Signals, AnalyticsError> {
    Ok(match horizon {
        Horizon::Fraud => Signals::Fraud(detect_fraud_suspects(profiles, &params.fraud)?),
        Horizon::Boom => Signals::Boom(detect_boom_towns(profiles, thresholds, &params.boom)),
        Horizon::Ghost => Signals::Ghost(detect_ghost_villages(profiles, thresholds)),
        Horizon::Digital => Signals::Digital(detect_digital_dark_zones(
            profiles,
            thresholds,
            &params.digital,
        )),
    })
}

/// Slice, aggregate, threshold and detect for one horizon.
fn run_horizon(
    table: &[DerivedRecord],
    reference: NaiveDate,
    horizon: Horizon,
    window_days: u32,
    params: &DetectionParams,
) -> Result<(HorizonSummary, Signals), AnalyticsError> {
    let slice = slice_window(table, reference, window_days);
    let start = window_start(reference, window_days);

    if slice.is_empty() {
        log::warn!("{horizon} horizon ({window_days} days from {start}) is empty; skipping");
        let summary = HorizonSummary {
            horizon,
            window_days: Some(window_days),
            window_start: Some(start),
            records: 0,
            locations: 0,
            thresholds: Thresholds::default(),
            detections: 0,
        };
        return Ok((summary, Signals::empty(horizon)));
    }

    let profiles = aggregate(slice.iter().copied());
    let thresholds = compute_thresholds(&profiles, params);
    let signals = detect(horizon, &profiles, &thresholds, params)?;

    log::info!(
        "{horizon} horizon: {} records, {} locations, {} detections",
        slice.len(),
        profiles.len(),
        signals.len()
    );
    log::debug!("{horizon} thresholds: {thresholds:?}");

    let summary = HorizonSummary {
        horizon,
        window_days: Some(window_days),
        window_start: Some(start),
        records: slice.len(),
        locations: profiles.len(),
        thresholds,
        detections: signals.len(),
    };
    Ok((summary, signals))
}

/// Runs every horizon concurrently and merges fraud against boom output.
///
/// # Errors
///
/// * If `records` is empty
/// * If the anomaly model rejects its parameters
/// * If a horizon task panics
pub async fn run_multi_horizon(
    records: Vec<DerivedRecord>,
    config: &PipelineConfig,
    progress: Arc<dyn ProgressCallback>,
) -> Result<SignalReport, PipelineError> {
    let reference = reference_date(&records).ok_or(PipelineError::NoRecords)?;
    let total_records = records.len();
    log::info!("Reference date {reference}; {total_records} records");

    let table = Arc::new(records);
    let params = Arc::new(config.detection.clone());
    progress.set_total(Horizon::iter().len() as u64);

    let tasks: Vec<_> = Horizon::iter()
        .map(|horizon| {
            let table = Arc::clone(&table);
            let params = Arc::clone(&params);
            let progress = Arc::clone(&progress);
            let days = config.horizons.days(horizon);
            tokio::task::spawn_blocking(move || {
                let outcome = run_horizon(&table, reference, horizon, days, &params);
                progress.set_message(format!("{horizon} horizon done"));
                progress.inc(1);
                outcome
            })
        })
        .collect();

    let mut report = SignalReport {
        mode: RunMode::MultiHorizon,
        reference_date: reference,
        total_records,
        seed: config.detection.fraud.seed,
        horizons: Vec::new(),
        boom_towns: Vec::new(),
        ghost_villages: Vec::new(),
        digital_dark_zones: Vec::new(),
        fraud_audit: Vec::new(),
    };
    let mut suspects = Vec::new();

    for task in tasks {
        let (summary, signals) = task.await??;
        report.horizons.push(summary);
        match signals {
            Signals::Fraud(s) => suspects = s,
            Signals::Boom(b) => report.boom_towns = b,
            Signals::Ghost(g) => report.ghost_villages = g,
            Signals::Digital(d) => report.digital_dark_zones = d,
        }
    }

    report.fraud_audit = merge(suspects, Some(report.boom_towns.as_slice()));
    progress.finish(format!(
        "{} high risk, {} suppressed",
        report.audit_count(AuditStatus::HighRisk),
        report.audit_count(AuditStatus::Suppressed)
    ));

    Ok(report)
}

/// Runs every detector over the whole table as one population.
///
/// Volumes here accumulate over every date, so the fraud scoring floor and
/// the digital action label come from their full-history settings.
///
/// # Errors
///
/// * If `records` is empty
/// * If the anomaly model rejects its parameters
pub fn run_full_history(
    records: &[DerivedRecord],
    params: &DetectionParams,
) -> Result<SignalReport, PipelineError> {
    let reference = reference_date(records).ok_or(PipelineError::NoRecords)?;
    let params = &params.for_full_history();
    let profiles = aggregate(records);
    let thresholds = compute_thresholds(&profiles, params);
    log::info!(
        "Full history: {} records, {} locations",
        records.len(),
        profiles.len()
    );
    log::debug!("Full-history thresholds: {thresholds:?}");

    let boom_towns = detect_boom_towns(&profiles, &thresholds, &params.boom);
    let ghost_villages = detect_ghost_villages(&profiles, &thresholds);
    let digital_dark_zones = detect_digital_dark_zones(&profiles, &thresholds, &params.digital);
    let suspects = detect_fraud_suspects(&profiles, &params.fraud)?;

    let summary = |horizon, detections| HorizonSummary {
        horizon,
        window_days: None,
        window_start: None,
        records: records.len(),
        locations: profiles.len(),
        thresholds,
        detections,
    };
    let horizons = vec![
        summary(Horizon::Fraud, suspects.len()),
        summary(Horizon::Boom, boom_towns.len()),
        summary(Horizon::Ghost, ghost_villages.len()),
        summary(Horizon::Digital, digital_dark_zones.len()),
    ];

    let fraud_audit = merge(suspects, Some(boom_towns.as_slice()));

    Ok(SignalReport {
        mode: RunMode::FullHistory,
        reference_date: reference,
        total_records: records.len(),
        seed: params.fraud.seed,
        horizons,
        boom_towns,
        ghost_villages,
        digital_dark_zones,
        fraud_audit,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use drishti_analytics_models::SignalKind;
    use drishti_enrolment_models::{EnrolmentRecord, LocationKey};

    use super::*;

    fn record(pincode: &str, date: NaiveDate, kids: f64, adults: f64) -> EnrolmentRecord {
        EnrolmentRecord {
            date,
            key: LocationKey::new("Maharashtra", "Pune", pincode),
            age_0_5: kids,
            age_5_17: 0.0,
            age_18_plus: adults,
            demo_young: kids,
            demo_old: adults,
            bio_young: 0.0,
            bio_old: 1.0,
        }
    }

    /// Thirty ordinary locations over the last 60 days, an old aging
    /// location seen only two years ago, and a migration hub whose last
    /// day jumps from 5 to 500.
    fn table() -> Vec<DerivedRecord> {
        let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let mut rows = Vec::new();
        for back in 0..60_i64 {
            let date = end - Duration::days(back);
            for loc in 0..30_i64 {
                let adults = 1.0 + f64::from(u8::try_from((loc + back) % 4).unwrap());
                rows.push(record(&format!("4110{loc:02}"), date, 1.0, adults));
            }
            if back < 4 {
                let adults = if back == 0 { 499.0 } else { 4.0 };
                rows.push(record("411099", date, 1.0, adults));
            }
        }
        for back in 700..720_i64 {
            rows.push(record("411098", end - Duration::days(back), 0.0, 3.0));
        }
        derive_features(rows)
    }

    #[tokio::test]
    async fn horizons_see_their_own_windows() {
        let report = run_multi_horizon(table(), &PipelineConfig::default(), null_progress())
            .await
            .unwrap();

        assert_eq!(
            report.reference_date,
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
        );
        assert_eq!(report.horizons.len(), 4);

        let fraud = report.horizon(Horizon::Fraud).unwrap();
        let ghost = report.horizon(Horizon::Ghost).unwrap();
        assert_eq!(fraud.window_days, Some(30));
        assert_eq!(fraud.locations, 31);
        assert_eq!(ghost.locations, 32);
        assert!(ghost.records > fraud.records);
    }

    #[tokio::test]
    async fn migration_hub_is_boom_and_never_high_risk() {
        let report = run_multi_horizon(table(), &PipelineConfig::default(), null_progress())
            .await
            .unwrap();

        assert!(report.boom_towns.iter().any(|p| p.key.pincode == "411099"));
        let hub = report
            .fraud_audit
            .iter()
            .find(|e| e.suspect.key.pincode == "411099")
            .expect("hub should be scored as a suspect");
        assert_eq!(hub.audit_status, AuditStatus::Suppressed);
        assert_eq!(report.audit_count(AuditStatus::HighRisk), 0);
    }

    #[tokio::test]
    async fn repeated_runs_are_identical() {
        let config = PipelineConfig::default();
        let first = run_multi_horizon(table(), &config, null_progress())
            .await
            .unwrap();
        let second = run_multi_horizon(table(), &config, null_progress())
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn sparse_recent_period_shrinks_short_horizons() {
        let mut rows = Vec::new();
        let old = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        for loc in 0..5_i64 {
            rows.push(record(&format!("4120{loc:02}"), old, 1.0, 3.0));
        }
        rows.push(record("412099", old + Duration::days(400), 1.0, 3.0));
        let table = derive_features(rows);

        let report = run_multi_horizon(table, &PipelineConfig::default(), null_progress())
            .await
            .unwrap();

        let boom = report.horizon(Horizon::Boom).unwrap();
        assert_eq!((boom.records, boom.locations), (1, 1));
        assert_eq!(report.horizon(Horizon::Ghost).unwrap().locations, 6);
        assert!(report.fraud_audit.is_empty());
    }

    #[tokio::test]
    async fn empty_table_is_fatal() {
        let result =
            run_multi_horizon(Vec::new(), &PipelineConfig::default(), null_progress()).await;
        assert!(matches!(result, Err(PipelineError::NoRecords)));
    }

    #[test]
    fn full_history_uses_every_record() {
        let table = table();
        let report = run_full_history(&table, &DetectionParams::default()).unwrap();

        assert_eq!(report.mode, RunMode::FullHistory);
        assert!(report.horizons.iter().all(|h| h.window_days.is_none()));
        assert!(report.horizons.iter().all(|h| h.locations == 32));
        assert_eq!(report.total_records, table.len());
    }

    /// Two hundred identical weekday locations with 100 enrolments each, and
    /// one weekend-only location with 30.
    fn quiet_weekend_table() -> Vec<DerivedRecord> {
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let mut rows = Vec::new();
        for loc in 0..200_i64 {
            for week in 0..2_i64 {
                for day in 0..5_i64 {
                    let date = monday + Duration::days(week * 7 + day);
                    rows.push(record(&format!("5{loc:05}"), date, 0.0, 10.0));
                }
            }
        }
        let saturday = monday + Duration::days(26);
        rows.push(record("599999", saturday, 0.0, 15.0));
        rows.push(record("599999", saturday + Duration::days(1), 0.0, 15.0));
        derive_features(rows)
    }

    #[test]
    fn full_history_does_not_score_low_volume_locations() {
        let table = quiet_weekend_table();
        let report = run_full_history(&table, &DetectionParams::default()).unwrap();

        assert!(report.fraud_audit.is_empty());

        let mut params = DetectionParams::default();
        params.fraud.full_history_noise_floor = 10.0;
        let report = run_full_history(&table, &params).unwrap();
        let pincodes: Vec<&str> = report
            .fraud_audit
            .iter()
            .map(|e| e.suspect.key.pincode.as_str())
            .collect();
        assert_eq!(pincodes, vec!["599999"]);
    }

    #[tokio::test]
    async fn full_history_runs_on_a_blocking_task() {
        let table = table();
        let params = DetectionParams::default();
        let expected = run_full_history(&table, &params).unwrap();

        let report = tokio::task::spawn_blocking(move || run_full_history(&table, &params))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report, expected);
    }

    #[test]
    fn detections_are_tagged() {
        let report = run_full_history(&table(), &DetectionParams::default()).unwrap();
        let detections = report.detections();
        let booms = detections
            .iter()
            .filter(|d| d.signal() == SignalKind::BoomTown)
            .count();
        assert_eq!(booms, report.boom_towns.len());
        assert_eq!(
            detections.len(),
            report.fraud_audit.len()
                + report.boom_towns.len()
                + report.ghost_villages.len()
                + report.digital_dark_zones.len()
        );
    }

    #[test]
    fn full_history_rejects_empty_table() {
        assert!(matches!(
            run_full_history(&[], &DetectionParams::default()),
            Err(PipelineError::NoRecords)
        ));
    }
}
