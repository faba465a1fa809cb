use crate::schema::Schema;
use crate::util::parse_f64_safe;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tabled::Tabled;

/// Facility category inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FacilityType {
    Hospital,
    HealthCenter,
    HealthPost,
    Eps,
    Other,
}

impl FacilityType {
    /// Label written to the `Type` column.
    pub fn label(self) -> &'static str {
        match self {
            FacilityType::Hospital => "Hôpital",
            FacilityType::HealthCenter => "Centre de Santé",
            FacilityType::HealthPost => "Poste de Santé",
            FacilityType::Eps => "EPS",
            FacilityType::Other => "Autre",
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AgreementStatus {
    Signed,
    NotSigned,
}

impl AgreementStatus {
    /// Label written to the `Statut Convention` column.
    pub fn label(self) -> &'static str {
        match self {
            AgreementStatus::Signed => "Signée",
            AgreementStatus::NotSigned => "Non Signée",
        }
    }
}

impl fmt::Display for AgreementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Delimited file as read from disk, before any derivation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    pub schema: Schema,
    pub rows: Vec<Vec<String>>,
}

/// One health facility. `cells` holds the source columns verbatim, except the
/// region cell which carries the normalized region.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityRecord {
    pub cells: Vec<String>,
    pub name: String,
    pub region: String,
    pub district: String,
    pub facility_type: FacilityType,
    pub status: AgreementStatus,
}

impl FacilityRecord {
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn number(&self, idx: usize) -> Option<f64> {
        parse_f64_safe(self.cells.get(idx).map(String::as_str))
    }
}

/// Derived dataset. Subsets produced by the filter share this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub schema: Schema,
    pub records: Vec<FacilityRecord>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Same columns, different rows.
    pub fn with_records(&self, records: Vec<FacilityRecord>) -> Dataset {
        Dataset {
            schema: self.schema.clone(),
            records,
        }
    }

    /// Parsed values of a numeric column, one entry per record. `None` when the
    /// column is absent.
    pub fn column_values(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.schema.index_of(column)?;
        Some(self.records.iter().map(|r| r.number(idx)).collect())
    }

    /// Sum of a numeric column, missing cells skipped. `None` when the column is absent.
    pub fn column_sum(&self, column: &str) -> Option<f64> {
        self.column_values(column)
            .map(|vals| vals.into_iter().flatten().sum())
    }

    /// Sorted distinct non-empty regions.
    pub fn regions(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !r.region.is_empty())
            .map(|r| r.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted distinct non-empty districts.
    pub fn districts(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !r.district.is_empty())
            .map(|r| r.district.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Mean of one numeric column within a region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricMean {
    pub column: String,
    pub mean: Option<f64>,
}

/// Per-region summary, rebuilt from scratch for every filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionAggregate {
    pub region: String,
    pub facility_count: usize,
    pub district_count: usize,
    pub structures_per_district: Option<f64>,
    pub dominant_type: FacilityType,
    pub signed_total: f64,
    pub not_signed_total: f64,
    /// Percentage 0..=100. `None` when the convention count columns are absent.
    pub signature_rate: Option<f64>,
    /// Mean `Valeurs` per structure.
    pub mean_value: Option<f64>,
    pub mean_share_signed: Option<f64>,
    pub metric_means: Vec<MetricMean>,
    pub score: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionSummaryRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Structures")]
    #[tabled(rename = "Structures")]
    pub structures: usize,
    #[serde(rename = "Districts")]
    #[tabled(rename = "Districts")]
    pub districts: usize,
    #[serde(rename = "StructuresPerDistrict")]
    #[tabled(rename = "StructuresPerDistrict")]
    pub structures_per_district: String,
    #[serde(rename = "DominantType")]
    #[tabled(rename = "DominantType")]
    pub dominant_type: String,
    #[serde(rename = "Signed")]
    #[tabled(rename = "Signed")]
    pub signed: String,
    #[serde(rename = "NotSigned")]
    #[tabled(rename = "NotSigned")]
    pub not_signed: String,
    #[serde(rename = "SignatureRate")]
    #[tabled(rename = "SignatureRate")]
    pub signature_rate: String,
    #[serde(rename = "MeanValue")]
    #[tabled(rename = "MeanValue")]
    pub mean_value: String,
    #[serde(rename = "Score")]
    #[tabled(rename = "Score")]
    pub score: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CountRow {
    #[serde(rename = "Name")]
    #[tabled(rename = "Name")]
    pub name: String,
    #[serde(rename = "Structures")]
    #[tabled(rename = "Structures")]
    pub structures: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct DistrictDensityRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "Structures")]
    #[tabled(rename = "Structures")]
    pub structures: usize,
}

/// Summary statistics of one numeric column.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ColumnStatsRow {
    #[serde(rename = "Column")]
    #[tabled(rename = "Column")]
    pub column: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Mean")]
    #[tabled(rename = "Mean")]
    pub mean: String,
    #[serde(rename = "Std")]
    #[tabled(rename = "Std")]
    pub std: String,
    #[serde(rename = "Min")]
    #[tabled(rename = "Min")]
    pub min: String,
    #[serde(rename = "25%")]
    #[tabled(rename = "25%")]
    pub q25: String,
    #[serde(rename = "50%")]
    #[tabled(rename = "50%")]
    pub median: String,
    #[serde(rename = "75%")]
    #[tabled(rename = "75%")]
    pub q75: String,
    #[serde(rename = "Max")]
    #[tabled(rename = "Max")]
    pub max: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CorrelationPair {
    #[serde(rename = "Var1")]
    #[tabled(rename = "Var1")]
    pub left: String,
    #[serde(rename = "Var2")]
    #[tabled(rename = "Var2")]
    pub right: String,
    #[serde(rename = "Correlation")]
    #[tabled(rename = "Correlation")]
    pub correlation: f64,
}

/// Pearson matrix over a fixed column list. `None` cells are undefined
/// (constant column or too few paired observations).
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Headline indicators for the current selection.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Kpis {
    pub total_structures: usize,
    pub regions_covered: usize,
    pub districts: usize,
    pub mean_structures_per_region: f64,
    pub dominant_type: Option<FacilityType>,
    pub dominant_type_share: f64,
    pub top_region: Option<String>,
    pub top_region_structures: usize,
    pub mean_districts_per_region: f64,
    pub coverage_rate: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StatusCounts {
    pub signed: usize,
    pub not_signed: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ConventionTotals {
    pub signed: f64,
    pub not_signed: f64,
    pub signature_rate: f64,
    pub total_value: Option<f64>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CoverageGaps {
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub under_served: Vec<CountRow>,
    pub well_served: Vec<CountRow>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DistrictExplorer {
    pub district: String,
    pub signed: Vec<String>,
    pub not_signed: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RegionExplorer {
    pub region: String,
    pub districts: Vec<DistrictExplorer>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Insights {
    pub top_region: Option<CountRow>,
    pub lowest_density_region: Option<(String, f64)>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DistrictRanking {
    pub best_served: Vec<CountRow>,
    pub least_served: Vec<CountRow>,
}

/// Region x facility-type counts. Only types present in the data get a column.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TypeCrosstab {
    pub regions: Vec<String>,
    pub types: Vec<FacilityType>,
    pub counts: Vec<Vec<usize>>,
}
