//! CSV and JSON report writers.
//!
//! Multi-horizon runs write one `engine_<signal>_<label>.csv` per horizon,
//! where the label comes from the window length. Full-history runs write
//! the `engine1_*`, `policy_overlay_*` and `engine2_*` files. Both write
//! `run_summary.json`. Every CSV carries a header row even when empty.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use drishti_analytics_models::{
    AuditStatus, DigitalDarkZone, FraudAuditEntry, Horizon, LocationProfile, SignalKind,
};
use serde::Serialize;
use strum::IntoEnumIterator as _;

use crate::{HorizonSummary, PipelineError, RunMode, SignalReport};

/// File name of the run summary.
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Human label for a window: whole years as `1year`/`3years`, otherwise
/// `<n>days`.
#[must_use]
pub fn horizon_label(days: u32) -> String {
    match days {
        365 => "1year".to_string(),
        d if d % 365 == 0 => format!("{}years", d / 365),
        d => format!("{d}days"),
    }
}

/// A serializable CSV row with a fixed header.
trait ReportRow: Serialize {
    const HEADERS: &'static [&'static str];
}

#[derive(Serialize)]
struct FraudRow<'a> {
    state: &'a str,
    district: &'a str,
    pincode: &'a str,
    audit_status: AuditStatus,
    risk_reason: &'a str,
    severity_score: f64,
}

impl ReportRow for FraudRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "state",
        "district",
        "pincode",
        "audit_status",
        "risk_reason",
        "severity_score",
    ];
}

impl<'a> From<&'a FraudAuditEntry> for FraudRow<'a> {
    fn from(e: &'a FraudAuditEntry) -> Self {
        Self {
            state: &e.suspect.key.state,
            district: &e.suspect.key.district,
            pincode: &e.suspect.key.pincode,
            audit_status: e.audit_status,
            risk_reason: &e.suspect.risk_reason,
            severity_score: e.suspect.severity_score,
        }
    }
}

#[derive(Serialize)]
struct AuditTrailRow<'a> {
    state: &'a str,
    district: &'a str,
    pincode: &'a str,
    audit_status: AuditStatus,
    total_txns: f64,
    risk_reason: &'a str,
    severity_score: f64,
}

impl ReportRow for AuditTrailRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "state",
        "district",
        "pincode",
        "audit_status",
        "total_txns",
        "risk_reason",
        "severity_score",
    ];
}

impl<'a> From<&'a FraudAuditEntry> for AuditTrailRow<'a> {
    fn from(e: &'a FraudAuditEntry) -> Self {
        Self {
            state: &e.suspect.key.state,
            district: &e.suspect.key.district,
            pincode: &e.suspect.key.pincode,
            audit_status: e.audit_status,
            total_txns: e.suspect.total_txns,
            risk_reason: &e.suspect.risk_reason,
            severity_score: e.suspect.severity_score,
        }
    }
}

#[derive(Serialize)]
struct BoomRow<'a> {
    state: &'a str,
    district: &'a str,
    pincode: &'a str,
    velocity_q3: f64,
    volume_sum: f64,
    volume_median: f64,
    child_ratio: f64,
}

impl ReportRow for BoomRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "state",
        "district",
        "pincode",
        "velocity_q3",
        "volume_sum",
        "volume_median",
        "child_ratio",
    ];
}

impl<'a> From<&'a LocationProfile> for BoomRow<'a> {
    fn from(p: &'a LocationProfile) -> Self {
        Self {
            state: &p.key.state,
            district: &p.key.district,
            pincode: &p.key.pincode,
            velocity_q3: p.velocity_q3,
            volume_sum: p.volume_sum,
            volume_median: p.volume_median,
            child_ratio: p.child_ratio_mean,
        }
    }
}

#[derive(Serialize)]
struct GhostRow<'a> {
    state: &'a str,
    district: &'a str,
    pincode: &'a str,
    elderly_pressure_median: f64,
    volume_median: f64,
}

impl ReportRow for GhostRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "state",
        "district",
        "pincode",
        "elderly_pressure_median",
        "volume_median",
    ];
}

impl<'a> From<&'a LocationProfile> for GhostRow<'a> {
    fn from(p: &'a LocationProfile) -> Self {
        Self {
            state: &p.key.state,
            district: &p.key.district,
            pincode: &p.key.pincode,
            elderly_pressure_median: p.elderly_pressure_median,
            volume_median: p.volume_median,
        }
    }
}

#[derive(Serialize)]
struct DigitalRow<'a> {
    state: &'a str,
    district: &'a str,
    pincode: &'a str,
    elderly_pressure: f64,
    bio_rate: f64,
    action: &'a str,
}

impl ReportRow for DigitalRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "state",
        "district",
        "pincode",
        "elderly_pressure",
        "bio_rate",
        "action",
    ];
}

impl<'a> From<&'a DigitalDarkZone> for DigitalRow<'a> {
    fn from(z: &'a DigitalDarkZone) -> Self {
        Self {
            state: &z.profile.key.state,
            district: &z.profile.key.district,
            pincode: &z.profile.key.pincode,
            elderly_pressure: z.profile.elderly_pressure_median,
            bio_rate: z.profile.bio_compliance_rate,
            action: &z.recommended_action,
        }
    }
}

/// Full profile row, optionally with the digital action column.
#[derive(Serialize)]
struct ProfileRow<'a> {
    state: &'a str,
    district: &'a str,
    pincode: &'a str,
    observations: usize,
    velocity_q3: f64,
    max_velocity: f64,
    volume_sum: f64,
    volume_median: f64,
    elderly_pressure_median: f64,
    child_ratio_mean: f64,
    weekend_activity: f64,
    bio_sum: f64,
    bio_compliance_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommended_action: Option<&'a str>,
}

const PROFILE_HEADERS: &[&str] = &[
    "state",
    "district",
    "pincode",
    "observations",
    "velocity_q3",
    "max_velocity",
    "volume_sum",
    "volume_median",
    "elderly_pressure_median",
    "child_ratio_mean",
    "weekend_activity",
    "bio_sum",
    "bio_compliance_rate",
];

impl ReportRow for ProfileRow<'_> {
    const HEADERS: &'static [&'static str] = PROFILE_HEADERS;
}

impl<'a> ProfileRow<'a> {
    fn new(p: &'a LocationProfile, recommended_action: Option<&'a str>) -> Self {
        Self {
            state: &p.key.state,
            district: &p.key.district,
            pincode: &p.key.pincode,
            observations: p.observations,
            velocity_q3: p.velocity_q3,
            max_velocity: p.max_velocity,
            volume_sum: p.volume_sum,
            volume_median: p.volume_median,
            elderly_pressure_median: p.elderly_pressure_median,
            child_ratio_mean: p.child_ratio_mean,
            weekend_activity: p.weekend_activity,
            bio_sum: p.bio_sum,
            bio_compliance_rate: p.bio_compliance_rate,
            recommended_action,
        }
    }
}

/// Profile row of a digital dark zone, with its action column.
#[derive(Serialize)]
#[serde(transparent)]
struct OverlayRow<'a>(ProfileRow<'a>);

impl ReportRow for OverlayRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "state",
        "district",
        "pincode",
        "observations",
        "velocity_q3",
        "max_velocity",
        "volume_sum",
        "volume_median",
        "elderly_pressure_median",
        "child_ratio_mean",
        "weekend_activity",
        "bio_sum",
        "bio_compliance_rate",
        "recommended_action",
    ];
}

fn write_rows<T, W>(writer: W, rows: impl IntoIterator<Item = T>) -> Result<usize, PipelineError>
where
    T: ReportRow,
    W: Write,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(T::HEADERS)?;
    let mut count = 0;
    for row in rows {
        wtr.serialize(row)?;
        count += 1;
    }
    wtr.flush()?;
    Ok(count)
}

fn write_csv<T: ReportRow>(
    dir: &Path,
    name: &str,
    rows: impl IntoIterator<Item = T>,
) -> Result<PathBuf, PipelineError> {
    let path = dir.join(name);
    let file = std::fs::File::create(&path)?;
    let count = write_rows(file, rows)?;
    log::info!("Wrote {count} rows to {}", path.display());
    Ok(path)
}

/// Per-horizon counts in the run summary.
#[derive(Debug, Serialize)]
struct SummaryHorizon<'a> {
    #[serde(flatten)]
    summary: &'a HorizonSummary,
    label: Option<String>,
}

#[derive(Debug, Serialize)]
struct FraudCounts {
    high_risk: usize,
    suppressed: usize,
}

/// Contents of `run_summary.json`.
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    mode: RunMode,
    generated_at: String,
    reference_date: String,
    total_records: usize,
    seed: u64,
    horizons: Vec<SummaryHorizon<'a>>,
    detections: BTreeMap<SignalKind, usize>,
    fraud: FraudCounts,
    outputs: Vec<String>,
}

/// Detections per signal, with a zero entry for every signal that found
/// nothing.
fn signal_counts(report: &SignalReport) -> BTreeMap<SignalKind, usize> {
    let mut counts: BTreeMap<SignalKind, usize> = SignalKind::iter().map(|k| (k, 0)).collect();
    for detection in report.detections() {
        *counts.entry(detection.signal()).or_default() += 1;
    }
    counts
}

/// Writes `run_summary.json` atomically (temp file, then rename).
fn write_summary(
    dir: &Path,
    report: &SignalReport,
    outputs: &[PathBuf],
) -> Result<PathBuf, PipelineError> {
    let summary = RunSummary {
        mode: report.mode,
        generated_at: chrono::Utc::now().to_rfc3339(),
        reference_date: report.reference_date.to_string(),
        total_records: report.total_records,
        seed: report.seed,
        horizons: report
            .horizons
            .iter()
            .map(|summary| SummaryHorizon {
                summary,
                label: summary.window_days.map(horizon_label),
            })
            .collect(),
        detections: signal_counts(report),
        fraud: FraudCounts {
            high_risk: report.audit_count(AuditStatus::HighRisk),
            suppressed: report.audit_count(AuditStatus::Suppressed),
        },
        outputs: outputs
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect(),
    };

    let path = dir.join(SUMMARY_FILE);
    let tmp_path = dir.join(format!("{SUMMARY_FILE}.tmp"));
    std::fs::write(&tmp_path, serde_json::to_string_pretty(&summary)?)?;
    std::fs::rename(&tmp_path, &path)?;
    log::info!("Saved run summary to {}", path.display());
    Ok(path)
}

fn label_for(report: &SignalReport, horizon: Horizon) -> String {
    report
        .horizon(horizon)
        .and_then(|h| h.window_days)
        .map_or_else(|| "full".to_string(), horizon_label)
}

/// Writes the per-horizon CSVs and the run summary into `dir`, creating
/// it if needed. Returns every path written, summary last.
///
/// # Errors
///
/// * If `dir` cannot be created or a file cannot be written
pub fn write_multi_horizon(
    report: &SignalReport,
    dir: &Path,
) -> Result<Vec<PathBuf>, PipelineError> {
    std::fs::create_dir_all(dir)?;

    let mut written = vec![
        write_csv(
            dir,
            &format!("engine_fraud_{}.csv", label_for(report, Horizon::Fraud)),
            report.fraud_audit.iter().map(FraudRow::from),
        )?,
        write_csv(
            dir,
            &format!("engine_boom_{}.csv", label_for(report, Horizon::Boom)),
            report.boom_towns.iter().map(BoomRow::from),
        )?,
        write_csv(
            dir,
            &format!("engine_ghost_{}.csv", label_for(report, Horizon::Ghost)),
            report.ghost_villages.iter().map(GhostRow::from),
        )?,
        write_csv(
            dir,
            &format!("engine_digital_{}.csv", label_for(report, Horizon::Digital)),
            report.digital_dark_zones.iter().map(DigitalRow::from),
        )?,
    ];

    let summary = write_summary(dir, report, &written)?;
    written.push(summary);
    Ok(written)
}

/// Writes the full-history CSVs and the run summary into `dir`, creating
/// it if needed. Returns every path written, summary last.
///
/// # Errors
///
/// * If `dir` cannot be created or a file cannot be written
pub fn write_full_history(
    report: &SignalReport,
    dir: &Path,
) -> Result<Vec<PathBuf>, PipelineError> {
    std::fs::create_dir_all(dir)?;

    let mut written = vec![
        write_csv(
            dir,
            "engine1_boom_towns.csv",
            report.boom_towns.iter().map(|p| ProfileRow::new(p, None)),
        )?,
        write_csv(
            dir,
            "engine1_ghost_villages.csv",
            report.ghost_villages.iter().map(|p| ProfileRow::new(p, None)),
        )?,
        write_csv(
            dir,
            "policy_overlay_digital_divide.csv",
            report
                .digital_dark_zones
                .iter()
                .map(|z| OverlayRow(ProfileRow::new(&z.profile, Some(z.recommended_action.as_str())))),
        )?,
        write_csv(
            dir,
            "engine2_fraud_audit_trail.csv",
            report.fraud_audit.iter().map(AuditTrailRow::from),
        )?,
    ];

    let summary = write_summary(dir, report, &written)?;
    written.push(summary);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use drishti_analytics_models::{FraudSuspect, Thresholds};
    use drishti_enrolment_models::LocationKey;

    use super::*;

    #[test]
    fn labels_prefer_whole_years() {
        assert_eq!(horizon_label(30), "30days");
        assert_eq!(horizon_label(180), "180days");
        assert_eq!(horizon_label(365), "1year");
        assert_eq!(horizon_label(1095), "3years");
        assert_eq!(horizon_label(400), "400days");
    }

    fn profile(pincode: &str) -> LocationProfile {
        LocationProfile {
            key: LocationKey::new("Tamil Nadu", "Chennai", pincode),
            observations: 12,
            velocity_q3: 42.5,
            max_velocity: 120.0,
            volume_sum: 900.0,
            volume_median: 60.0,
            elderly_pressure_median: 1.75,
            child_ratio_mean: 0.12,
            weekend_activity: 0.25,
            bio_sum: 3.0,
            bio_compliance_rate: 3.0 / 901.0,
        }
    }

    fn report(mode: RunMode) -> SignalReport {
        let window = |days| (mode == RunMode::MultiHorizon).then_some(days);
        let horizons = [
            (Horizon::Fraud, 30),
            (Horizon::Boom, 180),
            (Horizon::Ghost, 1095),
            (Horizon::Digital, 365),
        ]
        .into_iter()
        .map(|(horizon, days)| HorizonSummary {
            horizon,
            window_days: window(days),
            window_start: None,
            records: 10,
            locations: 2,
            thresholds: Thresholds::default(),
            detections: 1,
        })
        .collect();

        SignalReport {
            mode,
            reference_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            total_records: 10,
            seed: 42,
            horizons,
            boom_towns: vec![profile("600001")],
            ghost_villages: vec![profile("600002")],
            digital_dark_zones: vec![DigitalDarkZone {
                profile: profile("600003"),
                recommended_action: "Deploy vans".to_string(),
            }],
            fraud_audit: vec![FraudAuditEntry {
                suspect: FraudSuspect {
                    key: LocationKey::new("Tamil Nadu", "Chennai", "600004"),
                    total_txns: 812.0,
                    velocity_q3: 60.0,
                    max_velocity: 300.0,
                    weekend_activity: 0.5,
                    bio_rate: 0.01,
                    severity_score: -0.125,
                    risk_reason: "Suspicious Weekend Activity, Sustained High Speed".to_string(),
                },
                audit_status: AuditStatus::HighRisk,
            }],
        }
    }

    fn read(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn multi_horizon_files_use_window_labels() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_multi_horizon(&report(RunMode::MultiHorizon), dir.path()).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "engine_fraud_30days.csv",
                "engine_boom_180days.csv",
                "engine_ghost_3years.csv",
                "engine_digital_1year.csv",
                "run_summary.json",
            ]
        );

        let fraud = read(&dir.path().join("engine_fraud_30days.csv"));
        assert_eq!(
            fraud[0],
            "state,district,pincode,audit_status,risk_reason,severity_score"
        );
        assert_eq!(
            fraud[1],
            "Tamil Nadu,Chennai,600004,HIGH RISK - Action Required,\
             \"Suspicious Weekend Activity, Sustained High Speed\",-0.125"
        );

        let boom = read(&dir.path().join("engine_boom_180days.csv"));
        assert_eq!(
            boom[0],
            "state,district,pincode,velocity_q3,volume_sum,volume_median,child_ratio"
        );
        assert_eq!(boom[1], "Tamil Nadu,Chennai,600001,42.5,900.0,60.0,0.12");

        let digital = read(&dir.path().join("engine_digital_1year.csv"));
        assert!(digital[1].ends_with(",Deploy vans"));
    }

    #[test]
    fn full_history_files_carry_full_profiles() {
        let dir = tempfile::tempdir().unwrap();
        write_full_history(&report(RunMode::FullHistory), dir.path()).unwrap();

        let overlay = read(&dir.path().join("policy_overlay_digital_divide.csv"));
        assert!(overlay[0].ends_with("bio_compliance_rate,recommended_action"));
        assert!(overlay[1].starts_with("Tamil Nadu,Chennai,600003,12,42.5,"));
        assert!(overlay[1].ends_with(",Deploy vans"));

        let ghosts = read(&dir.path().join("engine1_ghost_villages.csv"));
        assert_eq!(ghosts[0], PROFILE_HEADERS.join(","));
        assert_eq!(ghosts.len(), 2);

        let audit = read(&dir.path().join("engine2_fraud_audit_trail.csv"));
        assert_eq!(
            audit[0],
            "state,district,pincode,audit_status,total_txns,risk_reason,severity_score"
        );
        assert!(audit[1].contains(",812.0,"));
    }

    #[test]
    fn empty_outputs_still_have_headers() {
        let dir = tempfile::tempdir().unwrap();
        let mut empty = report(RunMode::MultiHorizon);
        empty.boom_towns.clear();
        write_multi_horizon(&empty, dir.path()).unwrap();

        let boom = read(&dir.path().join("engine_boom_180days.csv"));
        assert_eq!(boom.len(), 1);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap())
                .unwrap();
        assert_eq!(json["detections"]["boom_town"], 0);
        assert_eq!(json["detections"]["ghost_village"], 1);
    }

    #[test]
    fn summary_reports_counts_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        write_multi_horizon(&report(RunMode::MultiHorizon), dir.path()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap())
                .unwrap();
        assert_eq!(json["mode"], "multi_horizon");
        assert_eq!(json["reference_date"], "2025-12-31");
        assert_eq!(json["fraud"]["high_risk"], 1);
        assert_eq!(json["fraud"]["suppressed"], 0);
        assert_eq!(json["horizons"][2]["label"], "3years");
        assert_eq!(json["horizons"][2]["horizon"], "ghost");
        assert_eq!(json["outputs"].as_array().unwrap().len(), 4);
        assert_eq!(json["detections"]["boom_town"], 1);
        assert_eq!(json["detections"]["fraud_suspect"], 1);
        assert!(!dir.path().join("run_summary.json.tmp").exists());
    }
}
