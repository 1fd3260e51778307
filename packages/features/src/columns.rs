//! Column naming contract for the master table.
//!
//! Upstream exports use bracket-style names (`demo_age_17_`, `bio_age_5_17`,
//! ...). Headers are trimmed and lower-cased, then [`RENAME_MAP`] maps them
//! onto the names the feature formulas use. A table missing any of
//! [`REQUIRED_COLUMNS`] after renaming cannot be processed.

use std::collections::BTreeMap;

use crate::FeatureError;

/// Raw header name to formula name.
pub const RENAME_MAP: &[(&str, &str)] = &[
    ("age_18_greater", "age_18_plus"),
    ("demo_age_5_17", "demo_young"),
    ("demo_age_17_", "demo_old"),
    ("bio_age_5_17", "bio_young"),
    ("bio_age_17_", "bio_old"),
];

/// Count columns, in [`CountColumn`] order.
pub const COUNT_COLUMNS: &[&str] = &[
    "age_0_5",
    "age_5_17",
    "age_18_plus",
    "demo_young",
    "demo_old",
    "bio_young",
    "bio_old",
];

/// Every column that must be present after renaming.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "date",
    "state",
    "district",
    "pincode",
    "age_0_5",
    "age_5_17",
    "age_18_plus",
    "demo_young",
    "demo_old",
    "bio_young",
    "bio_old",
];

/// Position of each count within [`ColumnLayout::counts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountColumn {
    Age0To5 = 0,
    Age5To17 = 1,
    Age18Plus = 2,
    DemoYoung = 3,
    DemoOld = 4,
    BioYoung = 5,
    BioOld = 6,
}

/// Normalizes a raw header: trim, lower-case, then apply [`RENAME_MAP`].
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    RENAME_MAP
        .iter()
        .find(|(from, _)| *from == lowered)
        .map_or(lowered, |(_, to)| (*to).to_string())
}

/// Field indices of the required columns within a CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date: usize,
    pub state: usize,
    pub district: usize,
    pub pincode: usize,
    pub counts: [usize; 7],
}

impl ColumnLayout {
    /// Resolves the layout from a header row.
    ///
    /// When a normalized name appears more than once the first occurrence
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::MissingColumns`] listing every required
    /// column that is absent after renaming.
    pub fn resolve<'a, I>(headers: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut positions: BTreeMap<String, usize> = BTreeMap::new();
        let mut found = Vec::new();

        for (idx, raw) in headers.into_iter().enumerate() {
            let name = normalize_header(raw);
            found.push(name.clone());
            positions.entry(name).or_insert(idx);
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !positions.contains_key(**c))
            .map(|c| (*c).to_string())
            .collect();

        if !missing.is_empty() {
            return Err(FeatureError::MissingColumns { missing, found });
        }

        let at = |name: &str| positions.get(name).copied().unwrap_or_default();

        let mut counts = [0usize; 7];
        for (slot, name) in counts.iter_mut().zip(COUNT_COLUMNS) {
            *slot = at(name);
        }

        Ok(Self {
            date: at("date"),
            state: at("state"),
            district: at("district"),
            pincode: at("pincode"),
            counts,
        })
    }

    /// Field index for the given count column.
    #[must_use]
    pub const fn count(&self, column: CountColumn) -> usize {
        self.counts[column as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_raw_bracket_headers() {
        assert_eq!(normalize_header(" Age_18_Greater "), "age_18_plus");
        assert_eq!(normalize_header("demo_age_17_"), "demo_old");
        assert_eq!(normalize_header("bio_age_5_17"), "bio_young");
        assert_eq!(normalize_header("pincode"), "pincode");
    }

    #[test]
    fn resolves_layout_after_rename() {
        let headers = [
            "date",
            "state",
            "district",
            "pincode",
            "age_0_5",
            "age_5_17",
            "age_18_greater",
            "demo_age_5_17",
            "demo_age_17_",
            "bio_age_5_17",
            "bio_age_17_",
        ];
        let layout = ColumnLayout::resolve(headers).unwrap();
        assert_eq!(layout.pincode, 3);
        assert_eq!(layout.count(CountColumn::Age18Plus), 6);
        assert_eq!(layout.count(CountColumn::BioOld), 10);
    }

    #[test]
    fn reports_every_missing_column() {
        let headers = ["date", "state", "district", "pincode", "age_0_5"];
        let err = ColumnLayout::resolve(headers).unwrap_err();
        match err {
            FeatureError::MissingColumns { missing, found } => {
                assert_eq!(missing.len(), 6);
                assert!(missing.contains(&"bio_old".to_string()));
                assert_eq!(found.len(), 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn first_duplicate_header_wins() {
        let headers = [
            "date", "state", "district", "pincode", "age_0_5", "age_0_5", "age_5_17",
            "age_18_plus", "demo_young", "demo_old", "bio_young", "bio_old",
        ];
        let layout = ColumnLayout::resolve(headers).unwrap();
        assert_eq!(layout.count(CountColumn::Age0To5), 4);
        assert_eq!(layout.count(CountColumn::Age5To17), 6);
    }
}
