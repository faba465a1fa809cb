use crate::aggregate::{
    aggregate, convention_totals, correlation_view, coverage_gaps, describe, district_density,
    district_ranking, explore, insights, kpis, status_counts, strong_negative, strong_positive,
    top_pairs, type_crosstab,
};
use crate::config::DashboardConfig;
use crate::error::SchemaError;
use crate::filter::FilterSelection;
use crate::score::score;
use crate::types::{
    ColumnStats, ColumnStatsRow, ConventionTotals, CorrelationMatrix, CorrelationPair,
    CoverageGaps, Dataset, DistrictDensityRow, DistrictRanking, Insights, Kpis, RegionAggregate,
    RegionExplorer, RegionSummaryRow, StatusCounts, TypeCrosstab,
};
use crate::util::{format_number, format_opt};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CorrelationReport {
    pub matrix: CorrelationMatrix,
    pub top_pairs: Vec<CorrelationPair>,
    pub strong_positive: Vec<CorrelationPair>,
    pub strong_negative: Vec<CorrelationPair>,
}

/// Everything the rendering layer consumes for one filter selection.
#[derive(Debug, Serialize, Clone)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub selection: FilterSelection,
    pub kpis: Kpis,
    pub status_counts: StatusCounts,
    pub conventions: Option<ConventionTotals>,
    pub regions: Vec<RegionAggregate>,
    pub correlation: Option<CorrelationReport>,
    pub statistics: Option<Vec<ColumnStats>>,
    pub district_ranking: DistrictRanking,
    pub district_density: Vec<DistrictDensityRow>,
    pub type_crosstab: TypeCrosstab,
    pub coverage_gaps: CoverageGaps,
    pub explorer: Vec<RegionExplorer>,
    pub insights: Insights,
    /// Features skipped because the data lacks their columns.
    pub unavailable: Vec<String>,
}

/// Run an optional computation, turning a `SchemaError` into a skipped feature.
fn optional<T>(unavailable: &mut Vec<String>, result: Result<T, SchemaError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(err) => {
            warn!(error = %err, "skipping feature");
            unavailable.push(err.to_string());
            None
        }
    }
}

/// One full recomputation pass for the current selection.
///
/// `full` is only used for the coverage-gap analysis, which always looks at the
/// whole country.
pub fn build(
    full: &Dataset,
    subset: &Dataset,
    selection: &FilterSelection,
    config: &DashboardConfig,
) -> DashboardReport {
    let mut unavailable = Vec::new();

    let conventions = optional(&mut unavailable, convention_totals(subset));
    let correlation = optional(&mut unavailable, correlation_view(subset)).map(|matrix| {
        CorrelationReport {
            top_pairs: top_pairs(&matrix, config.corr_threshold, config.top_pairs),
            strong_positive: strong_positive(&matrix, config.corr_threshold, config.top_pairs),
            strong_negative: strong_negative(&matrix, config.corr_threshold, config.top_pairs),
            matrix,
        }
    });
    let statistics = optional(&mut unavailable, describe(subset));

    let regions = score(aggregate(subset));
    let report = DashboardReport {
        generated_at: Utc::now(),
        selection: selection.clone(),
        kpis: kpis(subset, config.expected_regions),
        status_counts: status_counts(subset),
        conventions,
        insights: insights(&regions),
        regions,
        correlation,
        statistics,
        district_ranking: district_ranking(subset, config.district_rank),
        district_density: district_density(subset),
        type_crosstab: type_crosstab(subset),
        coverage_gaps: coverage_gaps(full),
        explorer: explore(subset),
        unavailable,
    };
    info!(
        region = %selection.region(),
        district = %selection.district(),
        rows = subset.len(),
        regions = report.regions.len(),
        skipped = report.unavailable.len(),
        "report built"
    );
    report
}

/// Display rows for the region table, in score order.
pub fn region_rows(aggregates: &[RegionAggregate]) -> Vec<RegionSummaryRow> {
    aggregates
        .iter()
        .map(|a| RegionSummaryRow {
            region: a.region.clone(),
            structures: a.facility_count,
            districts: a.district_count,
            structures_per_district: format_opt(a.structures_per_district, 2),
            dominant_type: a.dominant_type.to_string(),
            signed: format_number(a.signed_total, 0),
            not_signed: format_number(a.not_signed_total, 0),
            signature_rate: format_opt(a.signature_rate, 1),
            mean_value: format_opt(a.mean_value, 2),
            score: format_opt(a.score, 2),
        })
        .collect()
}

pub fn stats_rows(stats: &[ColumnStats]) -> Vec<ColumnStatsRow> {
    stats
        .iter()
        .map(|s| ColumnStatsRow {
            column: s.column.clone(),
            count: s.count,
            mean: format_opt(s.mean, 2),
            std: format_opt(s.std, 2),
            min: format_opt(s.min, 2),
            q25: format_opt(s.q25, 2),
            median: format_opt(s.median, 2),
            q75: format_opt(s.q75, 2),
            max: format_opt(s.max, 2),
        })
        .collect()
}
