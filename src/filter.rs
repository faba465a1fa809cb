use crate::types::{Dataset, FacilityRecord};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

pub const ALL: &str = "ALL";

/// Either the "all" sentinel or one concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// `"ALL"` maps to the sentinel, anything else to a concrete value.
    pub fn parse(value: &str) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Only(value.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(v) => v == value,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Only(v) => f.write_str(v),
        }
    }
}

/// Active region / district choice.
///
/// The district can only hold a value that occurs in the selected region;
/// changing the region resets it to `All`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterSelection {
    region: Selection,
    district: Selection,
}

impl FilterSelection {
    pub fn region(&self) -> &Selection {
        &self.region
    }

    pub fn district(&self) -> &Selection {
        &self.district
    }

    /// Regions offered for selection: `ALL` followed by the sorted regions.
    pub fn region_choices(dataset: &Dataset) -> Vec<Selection> {
        std::iter::once(Selection::All)
            .chain(dataset.regions().into_iter().map(Selection::Only))
            .collect()
    }

    /// Districts occurring in the selected region (every district for `ALL`).
    pub fn district_choices(&self, dataset: &Dataset) -> Vec<Selection> {
        let districts: BTreeSet<&str> = dataset
            .records
            .iter()
            .filter(|r| self.region.matches(&r.region) && !r.district.is_empty())
            .map(|r| r.district.as_str())
            .collect();
        std::iter::once(Selection::All)
            .chain(districts.into_iter().map(|d| Selection::Only(d.to_string())))
            .collect()
    }

    /// Returns `false` and leaves the selection untouched when the region does not occur.
    pub fn select_region(&mut self, dataset: &Dataset, region: Selection) -> bool {
        if !Self::region_choices(dataset).contains(&region) {
            return false;
        }
        self.region = region;
        self.district = Selection::All;
        true
    }

    /// Returns `false` when the district is not offered for the current region.
    pub fn select_district(&mut self, dataset: &Dataset, district: Selection) -> bool {
        if !self.district_choices(dataset).contains(&district) {
            return false;
        }
        self.district = district;
        true
    }

    pub fn apply(&self, dataset: &Dataset) -> Dataset {
        filter(dataset, &self.region, &self.district)
    }
}

/// Fresh subset of `dataset`; the input is never modified. No match gives an empty dataset.
pub fn filter(dataset: &Dataset, region: &Selection, district: &Selection) -> Dataset {
    let records: Vec<FacilityRecord> = dataset
        .records
        .iter()
        .filter(|r| region.matches(&r.region) && district.matches(&r.district))
        .cloned()
        .collect();
    debug!(%region, %district, rows = records.len(), "filtered dataset");
    dataset.with_records(records)
}

/// Rows where any cell (source or derived) contains `term`, ignoring case.
/// The term is matched as typed; only the empty term keeps every row.
pub fn search(dataset: &Dataset, term: &str) -> Dataset {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return dataset.clone();
    }
    let records: Vec<FacilityRecord> = dataset
        .records
        .iter()
        .filter(|r| {
            r.cells
                .iter()
                .map(String::as_str)
                .chain([r.facility_type.label(), r.status.label()])
                .any(|c| c.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();
    dataset.with_records(records)
}
