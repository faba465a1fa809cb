use crate::error::SchemaError;
use crate::schema::{COL_NOT_SIGNED, COL_SHARE_SIGNED, COL_SIGNED, COL_VALUE};
use crate::types::{
    AgreementStatus, ColumnStats, ConventionTotals, CorrelationMatrix, CorrelationPair, CountRow,
    CoverageGaps, Dataset, DistrictDensityRow, DistrictExplorer, DistrictRanking, FacilityRecord,
    FacilityType, Insights, Kpis, MetricMean, RegionAggregate, RegionExplorer, StatusCounts,
    TypeCrosstab,
};
use crate::util::{average, mean_present, percentage, quantile, round_to, sample_std};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;
use tracing::debug;

/// Most frequent item; ties go to the value seen first.
fn mode_first<T: Eq + Hash + Copy>(items: impl IntoIterator<Item = T>) -> Option<T> {
    value_counts(items).into_iter().next().map(|(v, _)| v)
}

/// Counts sorted by descending frequency, ties kept in first-seen order.
fn value_counts<T: Eq + Hash + Copy>(items: impl IntoIterator<Item = T>) -> Vec<(T, usize)> {
    let mut order: Vec<(T, usize)> = Vec::new();
    let mut pos: HashMap<T, usize> = HashMap::new();
    for item in items {
        match pos.get(&item) {
            Some(&i) => order[i].1 += 1,
            None => {
                pos.insert(item, order.len());
                order.push((item, 1));
            }
        }
    }
    // stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
}

fn count_rows<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<CountRow> {
    value_counts(names)
        .into_iter()
        .map(|(name, structures)| CountRow {
            name: name.to_string(),
            structures,
        })
        .collect()
}

/// Records grouped by region, regions sorted, rows in dataset order within a group.
/// Rows without a region belong to no group.
fn group_by_region(subset: &Dataset) -> BTreeMap<&str, Vec<&FacilityRecord>> {
    let mut groups: BTreeMap<&str, Vec<&FacilityRecord>> = BTreeMap::new();
    for r in subset.records.iter().filter(|r| !r.region.is_empty()) {
        groups.entry(r.region.as_str()).or_default().push(r);
    }
    groups
}

fn group_mean(records: &[&FacilityRecord], idx: Option<usize>) -> Option<f64> {
    let idx = idx?;
    let vals: Vec<Option<f64>> = records.iter().map(|r| r.number(idx)).collect();
    mean_present(&vals)
}

fn group_sum(records: &[&FacilityRecord], idx: Option<usize>) -> f64 {
    idx.map(|i| records.iter().filter_map(|r| r.number(i)).sum())
        .unwrap_or(0.0)
}

/// One `RegionAggregate` per region in `subset`, sorted by region name.
///
/// Columns that are absent leave the matching fields at `None` (or 0 for sums)
/// instead of failing the whole aggregation.
pub fn aggregate(subset: &Dataset) -> Vec<RegionAggregate> {
    let schema = &subset.schema;
    let signed_idx = schema.index_of(COL_SIGNED);
    let not_signed_idx = schema.index_of(COL_NOT_SIGNED);
    let value_idx = schema.index_of(COL_VALUE);
    let share_idx = schema.index_of(COL_SHARE_SIGNED);
    let numeric: Vec<(&str, usize)> = schema
        .numeric_columns()
        .into_iter()
        .filter_map(|c| schema.index_of(c).map(|i| (c, i)))
        .collect();

    let out: Vec<RegionAggregate> = group_by_region(subset)
        .into_iter()
        .map(|(region, records)| {
            let facility_count = records.len();
            let district_count = records
                .iter()
                .filter(|r| !r.district.is_empty())
                .map(|r| r.district.as_str())
                .collect::<BTreeSet<_>>()
                .len();
            let structures_per_district = if district_count == 0 {
                None
            } else {
                Some(round_to(facility_count as f64 / district_count as f64, 2))
            };
            let dominant_type =
                mode_first(records.iter().map(|r| r.facility_type)).unwrap_or(FacilityType::Other);

            let signed_total = group_sum(&records, signed_idx);
            let not_signed_total = group_sum(&records, not_signed_idx);
            let signature_rate = match (signed_idx, not_signed_idx) {
                (Some(_), Some(_)) => Some(round_to(
                    percentage(signed_total, signed_total + not_signed_total),
                    1,
                )),
                _ => None,
            };

            let metric_means = numeric
                .iter()
                .map(|(column, idx)| MetricMean {
                    column: column.to_string(),
                    mean: group_mean(&records, Some(*idx)),
                })
                .collect();

            RegionAggregate {
                region: region.to_string(),
                facility_count,
                district_count,
                structures_per_district,
                dominant_type,
                signed_total,
                not_signed_total,
                signature_rate,
                mean_value: group_mean(&records, value_idx),
                mean_share_signed: group_mean(&records, share_idx),
                metric_means,
                score: None,
            }
        })
        .collect();
    debug!(regions = out.len(), "aggregated regions");
    out
}

/// Pearson correlation over pairwise-complete observations.
/// `None` with fewer than two pairs or when either side has zero variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Correlation matrix over the given columns of the record set.
/// Columns the data lacks are skipped.
pub fn correlation(subset: &Dataset, columns: &[&str]) -> CorrelationMatrix {
    let series: Vec<(String, Vec<Option<f64>>)> = columns
        .iter()
        .filter_map(|c| subset.column_values(c).map(|v| (c.to_string(), v)))
        .collect();
    let n = series.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let c = pearson(&series[i].1, &series[j].1);
            let c = if i == j { c.map(|_| 1.0) } else { c };
            values[i][j] = c;
            values[j][i] = c;
        }
    }
    CorrelationMatrix {
        columns: series.into_iter().map(|(c, _)| c).collect(),
        values,
    }
}

/// Correlation over every declared numeric column present in `subset`.
pub fn correlation_view(subset: &Dataset) -> Result<CorrelationMatrix, SchemaError> {
    let columns = subset.schema.numeric_columns();
    if columns.is_empty() {
        return Err(SchemaError::MissingColumns {
            feature: "correlation matrix",
            columns: crate::schema::NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
        });
    }
    Ok(correlation(subset, &columns))
}

fn ranked_pairs(matrix: &CorrelationMatrix, keep: impl Fn(f64) -> bool, n: usize) -> Vec<CorrelationPair> {
    let mut pairs = Vec::new();
    for i in 0..matrix.columns.len() {
        for j in (i + 1)..matrix.columns.len() {
            if let Some(c) = matrix.values[i][j] {
                if keep(c) {
                    pairs.push(CorrelationPair {
                        left: matrix.columns[i].clone(),
                        right: matrix.columns[j].clone(),
                        correlation: c,
                    });
                }
            }
        }
    }
    pairs.sort_by(|a, b| {
        b.correlation
            .abs()
            .partial_cmp(&a.correlation.abs())
            .unwrap_or(Ordering::Equal)
    });
    pairs.truncate(n);
    pairs
}

/// Up to `n` distinct off-diagonal pairs with |r| above `threshold`, strongest first.
pub fn top_pairs(matrix: &CorrelationMatrix, threshold: f64, n: usize) -> Vec<CorrelationPair> {
    ranked_pairs(matrix, |c| c.abs() > threshold, n)
}

pub fn strong_positive(matrix: &CorrelationMatrix, threshold: f64, n: usize) -> Vec<CorrelationPair> {
    ranked_pairs(matrix, |c| c > threshold, n)
}

pub fn strong_negative(matrix: &CorrelationMatrix, threshold: f64, n: usize) -> Vec<CorrelationPair> {
    ranked_pairs(matrix, |c| c < -threshold, n)
}

/// count / mean / std / min / quartiles / max for each numeric column present.
pub fn describe(subset: &Dataset) -> Result<Vec<ColumnStats>, SchemaError> {
    let columns = subset.schema.numeric_columns();
    if columns.is_empty() {
        return Err(SchemaError::MissingColumns {
            feature: "descriptive statistics",
            columns: crate::schema::NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
        });
    }
    Ok(columns
        .into_iter()
        .map(|column| {
            let vals: Vec<f64> = subset
                .column_values(column)
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .collect();
            let present = !vals.is_empty();
            ColumnStats {
                column: column.to_string(),
                count: vals.len(),
                mean: present.then(|| average(&vals)),
                std: sample_std(&vals),
                min: vals.iter().copied().reduce(f64::min),
                q25: quantile(vals.clone(), 0.25),
                median: quantile(vals.clone(), 0.5),
                q75: quantile(vals.clone(), 0.75),
                max: vals.iter().copied().reduce(f64::max),
            }
        })
        .collect())
}

/// Headline indicators. `expected_regions` is the national region count.
pub fn kpis(subset: &Dataset, expected_regions: usize) -> Kpis {
    let total = subset.len();
    let regions = subset.regions().len();
    let districts = subset.districts().len();
    let per_region = |n: usize| if regions == 0 { 0.0 } else { n as f64 / regions as f64 };

    let type_counts = value_counts(subset.records.iter().map(|r| r.facility_type));
    let (dominant_type, dominant_count) = type_counts
        .first()
        .map(|(t, c)| (Some(*t), *c))
        .unwrap_or((None, 0));
    let region_counts = value_counts(
        subset
            .records
            .iter()
            .filter(|r| !r.region.is_empty())
            .map(|r| r.region.as_str()),
    );
    let (top_region, top_region_structures) = region_counts
        .first()
        .map(|(r, c)| (Some(r.to_string()), *c))
        .unwrap_or((None, 0));

    Kpis {
        total_structures: total,
        regions_covered: regions,
        districts,
        mean_structures_per_region: per_region(total),
        dominant_type,
        dominant_type_share: percentage(dominant_count as f64, total as f64),
        top_region,
        top_region_structures,
        mean_districts_per_region: per_region(districts),
        coverage_rate: percentage(regions as f64, expected_regions as f64),
    }
}

pub fn status_counts(subset: &Dataset) -> StatusCounts {
    let signed = subset
        .records
        .iter()
        .filter(|r| r.status == AgreementStatus::Signed)
        .count();
    StatusCounts {
        signed,
        not_signed: subset.len() - signed,
    }
}

/// Global convention sums and signature rate. `Valeurs` is optional here.
pub fn convention_totals(subset: &Dataset) -> Result<ConventionTotals, SchemaError> {
    subset
        .schema
        .require("convention totals", &[COL_SIGNED, COL_NOT_SIGNED])?;
    let signed = subset.column_sum(COL_SIGNED).unwrap_or(0.0);
    let not_signed = subset.column_sum(COL_NOT_SIGNED).unwrap_or(0.0);
    Ok(ConventionTotals {
        signed,
        not_signed,
        signature_rate: percentage(signed, signed + not_signed),
        total_value: subset.column_sum(COL_VALUE),
    })
}

/// Districts by facility count: the `n` best and `n` least served.
pub fn district_ranking(subset: &Dataset, n: usize) -> DistrictRanking {
    let rows = count_rows(
        subset
            .records
            .iter()
            .filter(|r| !r.district.is_empty())
            .map(|r| r.district.as_str()),
    );
    let best_served = rows.iter().take(n).cloned().collect();
    let least_served = rows[rows.len().saturating_sub(n)..].to_vec();
    DistrictRanking {
        best_served,
        least_served,
    }
}

/// Facility count per (region, district), sorted by region then district.
pub fn district_density(subset: &Dataset) -> Vec<DistrictDensityRow> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for r in subset
        .records
        .iter()
        .filter(|r| !r.region.is_empty() && !r.district.is_empty())
    {
        *counts.entry((r.region.as_str(), r.district.as_str())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((region, district), structures)| DistrictDensityRow {
            region: region.to_string(),
            district: district.to_string(),
            structures,
        })
        .collect()
}

pub fn type_crosstab(subset: &Dataset) -> TypeCrosstab {
    let regions = subset.regions();
    let types: Vec<FacilityType> = subset
        .records
        .iter()
        .map(|r| r.facility_type)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut counts = vec![vec![0usize; types.len()]; regions.len()];
    for r in &subset.records {
        // both lookups hit: regions and types were collected from these records
        if let (Ok(i), Some(j)) = (
            regions.binary_search(&r.region),
            types.iter().position(|t| *t == r.facility_type),
        ) {
            counts[i][j] += 1;
        }
    }
    TypeCrosstab {
        regions,
        types,
        counts,
    }
}

/// Under- and well-served regions, by the quartiles of per-region facility counts.
/// Meant to run over the full dataset, not the filtered subset.
pub fn coverage_gaps(full: &Dataset) -> CoverageGaps {
    let rows = count_rows(
        full.records
            .iter()
            .filter(|r| !r.region.is_empty())
            .map(|r| r.region.as_str()),
    );
    let counts: Vec<f64> = rows.iter().map(|r| r.structures as f64).collect();
    let low_threshold = quantile(counts.clone(), 0.25).unwrap_or(0.0);
    let high_threshold = quantile(counts, 0.75).unwrap_or(0.0);
    CoverageGaps {
        low_threshold,
        high_threshold,
        under_served: rows
            .iter()
            .filter(|r| r.structures as f64 <= low_threshold)
            .cloned()
            .collect(),
        well_served: rows
            .iter()
            .filter(|r| r.structures as f64 >= high_threshold)
            .cloned()
            .collect(),
    }
}

/// Region -> district -> signed / not-signed facility names.
pub fn explore(subset: &Dataset) -> Vec<RegionExplorer> {
    group_by_region(subset)
        .into_iter()
        .map(|(region, records)| {
            let mut districts: BTreeMap<&str, DistrictExplorer> = BTreeMap::new();
            for r in records {
                let entry = districts
                    .entry(r.district.as_str())
                    .or_insert_with(|| DistrictExplorer {
                        district: r.district.clone(),
                        signed: Vec::new(),
                        not_signed: Vec::new(),
                    });
                match r.status {
                    AgreementStatus::Signed => entry.signed.push(r.name.clone()),
                    AgreementStatus::NotSigned => entry.not_signed.push(r.name.clone()),
                }
            }
            RegionExplorer {
                region: region.to_string(),
                districts: districts.into_values().collect(),
            }
        })
        .collect()
}

/// Region with the most structures and region with the thinnest district coverage.
pub fn insights(aggregates: &[RegionAggregate]) -> Insights {
    let top_region = aggregates
        .iter()
        .fold(None::<&RegionAggregate>, |best, a| match best {
            Some(b) if b.facility_count >= a.facility_count => Some(b),
            _ => Some(a),
        })
        .map(|a| CountRow {
            name: a.region.clone(),
            structures: a.facility_count,
        });
    let lowest_density_region = aggregates
        .iter()
        .filter_map(|a| a.structures_per_district.map(|d| (a, d)))
        .fold(None::<(&RegionAggregate, f64)>, |best, (a, d)| match best {
            Some((b, bd)) if bd <= d => Some((b, bd)),
            _ => Some((a, d)),
        })
        .map(|(a, d)| (a.region.clone(), d));
    Insights {
        top_region,
        lowest_density_region,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive;
    use crate::schema::{Schema, COL_DISTRICT, COL_FACILITY, COL_REGION};
    use crate::types::RawDataset;

    const HEADERS: [&str; 7] = [
        COL_FACILITY,
        COL_REGION,
        COL_DISTRICT,
        COL_VALUE,
        COL_SIGNED,
        COL_NOT_SIGNED,
        COL_SHARE_SIGNED,
    ];

    fn dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
        derive(RawDataset {
            schema: Schema::new(headers.iter().map(|h| h.to_string()).collect()),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        })
        .unwrap()
    }

    fn five_in_one_district() -> Dataset {
        dataset(
            &HEADERS,
            &[
                &["Poste de santé A", "kolda", "Vélingara", "10", "1", "0", "50"],
                &["Poste de santé B", "kolda", "Vélingara", "20", "0", "1", "0"],
                &["Centre de santé C", "kolda", "Vélingara", "30", "1", "1", "50"],
                &["Centre de santé D", "kolda", "Vélingara", "40", "2", "0", "100"],
                &["Hopital E", "kolda", "Vélingara", "", "0", "0", ""],
            ],
        )
    }

    #[test]
    fn one_district_five_facilities() {
        let aggs = aggregate(&five_in_one_district());
        assert_eq!(aggs.len(), 1);
        let a = &aggs[0];
        assert_eq!(a.region, "KOLDA");
        assert_eq!(a.facility_count, 5);
        assert_eq!(a.district_count, 1);
        assert_eq!(a.structures_per_district, Some(5.0));
        assert_eq!(a.signed_total, 4.0);
        assert_eq!(a.not_signed_total, 2.0);
        assert_eq!(a.signature_rate, Some(66.7));
        assert_eq!(a.mean_value, Some(25.0));
        assert_eq!(a.mean_share_signed, Some(50.0));
        assert_eq!(a.metric_means.len(), 4);
    }

    #[test]
    fn rows_without_region_form_no_group() {
        let ds = dataset(
            &HEADERS,
            &[
                &["Poste de santé A", "dakar", "Pikine", "10", "1", "0", "50"],
                &["Poste de santé B", " ", "Pikine", "20", "0", "1", "0"],
            ],
        );
        let regions: Vec<String> = aggregate(&ds).into_iter().map(|a| a.region).collect();
        assert_eq!(regions, vec!["DAKAR".to_string()]);
        assert_eq!(ds.regions(), vec!["DAKAR".to_string()]);

        let k = kpis(&ds, 14);
        assert_eq!(k.total_structures, 2);
        assert_eq!(k.regions_covered, 1);
        assert_eq!(k.top_region.as_deref(), Some("DAKAR"));

        let gaps = coverage_gaps(&ds);
        assert!(gaps.under_served.iter().all(|r| !r.name.is_empty()));
        assert_eq!(district_density(&ds).len(), 1);
        assert_eq!(type_crosstab(&ds).regions, vec!["DAKAR".to_string()]);
    }

    #[test]
    fn dominant_type_ties_go_to_first_seen() {
        // two posts then two centres: the post was seen first
        let a = &aggregate(&five_in_one_district())[0];
        assert_eq!(a.dominant_type, FacilityType::HealthPost);
    }

    #[test]
    fn zero_conventions_give_zero_rate() {
        let ds = dataset(&HEADERS, &[&["Poste de santé A", "matam", "Kanel", "1", "0", "0", "0"]]);
        assert_eq!(aggregate(&ds)[0].signature_rate, Some(0.0));
        assert_eq!(convention_totals(&ds).unwrap().signature_rate, 0.0);
    }

    #[test]
    fn empty_district_is_undefined_density() {
        let ds = dataset(&HEADERS, &[&["Poste de santé A", "matam", "  ", "1", "0", "0", "0"]]);
        let a = &aggregate(&ds)[0];
        assert_eq!(a.district_count, 0);
        assert_eq!(a.structures_per_district, None);
    }

    #[test]
    fn missing_convention_columns_degrade() {
        let ds = dataset(
            &[COL_FACILITY, COL_REGION, COL_DISTRICT],
            &[&["Poste de santé A", "matam", "Kanel"]],
        );
        let a = &aggregate(&ds)[0];
        assert_eq!(a.signature_rate, None);
        assert_eq!(a.mean_value, None);
        assert!(a.metric_means.is_empty());
        assert!(convention_totals(&ds).is_err());
        assert!(describe(&ds).is_err());
        assert!(correlation_view(&ds).is_err());
    }

    #[test]
    fn empty_subset_aggregates_to_nothing() {
        let ds = five_in_one_district().with_records(Vec::new());
        assert!(aggregate(&ds).is_empty());
        let k = kpis(&ds, 14);
        assert_eq!(k.total_structures, 0);
        assert_eq!(k.regions_covered, 0);
        assert_eq!(k.mean_structures_per_region, 0.0);
        assert_eq!(k.dominant_type, None);
        assert_eq!(status_counts(&ds), StatusCounts { signed: 0, not_signed: 0 });
        assert_eq!(convention_totals(&ds).unwrap().signature_rate, 0.0);
        assert!(explore(&ds).is_empty());
    }

    #[test]
    fn pearson_handles_constant_and_sparse_columns() {
        let x = [Some(1.0), Some(2.0), Some(3.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0)];
        let z = [Some(5.0), Some(5.0), Some(5.0)];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &z), None);
        assert_eq!(pearson(&[Some(1.0), None], &[Some(1.0), Some(2.0)]), None);
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let m = correlation_view(&five_in_one_district()).unwrap();
        assert_eq!(m.columns.len(), 4);
        for i in 0..m.columns.len() {
            assert_eq!(m.values[i][i], Some(1.0));
            for j in 0..m.columns.len() {
                assert_eq!(m.values[i][j], m.values[j][i]);
            }
        }
    }

    #[test]
    fn top_pairs_skip_self_and_mirror() {
        let m = CorrelationMatrix {
            columns: vec!["a".into(), "b".into(), "c".into()],
            values: vec![
                vec![Some(1.0), Some(0.9), Some(-0.95)],
                vec![Some(0.9), Some(1.0), Some(0.2)],
                vec![Some(-0.95), Some(0.2), Some(1.0)],
            ],
        };
        let top = top_pairs(&m, 0.7, 5);
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].left.as_str(), top[0].right.as_str()), ("a", "c"));
        assert_eq!((top[1].left.as_str(), top[1].right.as_str()), ("a", "b"));
        assert_eq!(strong_positive(&m, 0.7, 3).len(), 1);
        assert_eq!(strong_negative(&m, 0.7, 3)[0].correlation, -0.95);
        assert_eq!(top_pairs(&m, 0.7, 1).len(), 1);
    }

    #[test]
    fn describe_matches_summary_statistics() {
        let stats = describe(&five_in_one_district()).unwrap();
        let value = stats.iter().find(|s| s.column == COL_VALUE).unwrap();
        assert_eq!(value.count, 4);
        assert_eq!(value.mean, Some(25.0));
        assert_eq!(value.min, Some(10.0));
        assert_eq!(value.q25, Some(17.5));
        assert_eq!(value.median, Some(25.0));
        assert_eq!(value.max, Some(40.0));
    }

    #[test]
    fn kpis_and_rankings_over_two_regions() {
        let ds = dataset(
            &HEADERS,
            &[
                &["Poste de santé A", "dakar", "Pikine", "1", "1", "0", "1"],
                &["Poste de santé B", "dakar", "Pikine", "1", "0", "1", "1"],
                &["Hopital C", "dakar", "Guédiawaye", "1", "1", "0", "1"],
                &["Poste de santé D", "fatick", "Foundiougne", "1", "0", "1", "1"],
            ],
        );
        let k = kpis(&ds, 14);
        assert_eq!(k.total_structures, 4);
        assert_eq!(k.regions_covered, 2);
        assert_eq!(k.districts, 3);
        assert_eq!(k.mean_structures_per_region, 2.0);
        assert_eq!(k.dominant_type, Some(FacilityType::HealthPost));
        assert_eq!(k.dominant_type_share, 75.0);
        assert_eq!(k.top_region.as_deref(), Some("DAKAR"));
        assert!((k.coverage_rate - 2.0 / 14.0 * 100.0).abs() < 1e-9);

        let ranking = district_ranking(&ds, 1);
        assert_eq!(ranking.best_served[0].name, "Pikine");
        assert_eq!(ranking.least_served[0].name, "Foundiougne");

        let density = district_density(&ds);
        assert_eq!(density.len(), 3);
        assert_eq!(density[0].district, "Guédiawaye");

        let tab = type_crosstab(&ds);
        assert_eq!(tab.types, vec![FacilityType::Hospital, FacilityType::HealthPost]);
        assert_eq!(tab.counts, vec![vec![1, 2], vec![0, 1]]);

        let tree = explore(&ds);
        assert_eq!(tree[0].districts[1].district, "Pikine");
        assert_eq!(tree[0].districts[1].signed, vec!["Poste de santé A".to_string()]);
        assert_eq!(tree[0].districts[1].not_signed, vec!["Poste de santé B".to_string()]);

        let ins = insights(&aggregate(&ds));
        assert_eq!(ins.top_region.unwrap().name, "DAKAR");
        assert_eq!(ins.lowest_density_region, Some(("FATICK".to_string(), 1.0)));
    }

    #[test]
    fn coverage_gaps_use_quartiles() {
        let ds = dataset(
            &HEADERS,
            &[
                &["A", "r1", "d", "", "", "", ""],
                &["B", "r2", "d", "", "", "", ""],
                &["C", "r2", "d", "", "", "", ""],
                &["D", "r3", "d", "", "", "", ""],
                &["E", "r3", "d", "", "", "", ""],
                &["F", "r3", "d", "", "", "", ""],
            ],
        );
        let gaps = coverage_gaps(&ds);
        assert_eq!(gaps.low_threshold, 1.5);
        assert_eq!(gaps.high_threshold, 2.5);
        assert_eq!(gaps.under_served, vec![CountRow { name: "R1".into(), structures: 1 }]);
        assert_eq!(gaps.well_served, vec![CountRow { name: "R3".into(), structures: 3 }]);
    }
}
