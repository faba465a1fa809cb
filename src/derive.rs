use crate::error::Result;
use crate::schema::{COL_DISTRICT, COL_FACILITY, COL_REGION, COL_SIGNED, REQUIRED_COLUMNS};
use crate::types::{AgreementStatus, Dataset, FacilityRecord, FacilityType, RawDataset};
use crate::util::parse_f64_safe;
use tracing::{debug, warn};

/// One classification rule: a lower-cased keyword and the type it selects.
#[derive(Debug, Clone, Copy)]
pub struct TypeRule {
    pub keyword: &'static str,
    pub facility_type: FacilityType,
}

impl TypeRule {
    pub fn matches(&self, lowered_name: &str) -> bool {
        lowered_name.contains(self.keyword)
    }
}

/// Evaluated in order, first match wins.
pub const TYPE_RULES: [TypeRule; 4] = [
    TypeRule { keyword: "hopital", facility_type: FacilityType::Hospital },
    TypeRule { keyword: "centre de santé", facility_type: FacilityType::HealthCenter },
    TypeRule { keyword: "poste de santé", facility_type: FacilityType::HealthPost },
    TypeRule { keyword: "eps", facility_type: FacilityType::Eps },
];

/// Total: every name, including the empty string, resolves to a type.
pub fn classify(name: &str) -> FacilityType {
    let lowered = name.to_lowercase();
    TYPE_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.facility_type)
        .unwrap_or(FacilityType::Other)
}

/// Trim and upper-case. Idempotent.
pub fn normalize_region(region: &str) -> String {
    region.trim().to_uppercase()
}

/// Missing or unparsable counts count as zero.
pub fn agreement_status(signed: Option<f64>) -> AgreementStatus {
    if signed.unwrap_or(0.0) > 0.0 {
        AgreementStatus::Signed
    } else {
        AgreementStatus::NotSigned
    }
}

/// Attach `Type`, normalized `Région` and `Statut Convention` to every row.
///
/// Fails only when the name/region/district columns are missing.
pub fn derive(raw: RawDataset) -> Result<Dataset> {
    raw.schema.require("field derivation", &REQUIRED_COLUMNS)?;
    let name_idx = raw.schema.index_of(COL_FACILITY).unwrap_or_default();
    let region_idx = raw.schema.index_of(COL_REGION).unwrap_or_default();
    let district_idx = raw.schema.index_of(COL_DISTRICT).unwrap_or_default();
    let signed_idx = raw.schema.index_of(COL_SIGNED);
    if signed_idx.is_none() {
        warn!(column = COL_SIGNED, "column absent, every facility is treated as not signed");
    }

    let width = raw.schema.len();
    let records: Vec<FacilityRecord> = raw
        .rows
        .into_iter()
        .map(|mut cells| {
            cells.resize(width, String::new());
            let region = normalize_region(&cells[region_idx]);
            cells[region_idx] = region.clone();
            let name = cells[name_idx].clone();
            let district = cells[district_idx].trim().to_string();
            let signed = signed_idx.and_then(|i| parse_f64_safe(Some(&cells[i])));
            FacilityRecord {
                facility_type: classify(&name),
                status: agreement_status(signed),
                name,
                region,
                district,
                cells,
            }
        })
        .collect();

    debug!(rows = records.len(), "derived facility fields");
    Ok(Dataset {
        schema: raw.schema,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::schema::Schema;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawDataset {
        RawDataset {
            schema: Schema::new(headers.iter().map(|h| h.to_string()).collect()),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn classification_follows_priority() {
        assert_eq!(classify("Hopital Regional de Thies"), FacilityType::Hospital);
        assert_eq!(classify("HOPITAL centre de santé"), FacilityType::Hospital);
        assert_eq!(classify("Centre de Santé de Mbour"), FacilityType::HealthCenter);
        assert_eq!(classify("POSTE DE SANTÉ Ndiaye"), FacilityType::HealthPost);
        assert_eq!(classify("EPS Matam"), FacilityType::Eps);
        assert_eq!(classify("Clinique"), FacilityType::Other);
        assert_eq!(classify(""), FacilityType::Other);
    }

    #[test]
    fn eps_keyword_is_a_plain_substring() {
        // "Depstation" contains "eps" once lower-cased.
        assert_eq!(classify("Depstation"), FacilityType::Eps);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_region("  thiès ");
        assert_eq!(once, "THIÈS");
        assert_eq!(normalize_region(&once), once);
    }

    #[test]
    fn status_treats_missing_as_zero() {
        assert_eq!(agreement_status(None), AgreementStatus::NotSigned);
        assert_eq!(agreement_status(Some(0.0)), AgreementStatus::NotSigned);
        assert_eq!(agreement_status(Some(2.0)), AgreementStatus::Signed);
    }

    #[test]
    fn derive_writes_normalized_region_back() {
        let ds = derive(raw(
            &[COL_FACILITY, COL_REGION, COL_DISTRICT, COL_SIGNED],
            &[&["Hopital Regional de Thies", " thies ", "Thiès", "1"]],
        ))
        .unwrap();
        let r = &ds.records[0];
        assert_eq!(r.region, "THIES");
        assert_eq!(r.cells[1], "THIES");
        assert_eq!(r.facility_type, FacilityType::Hospital);
        assert_eq!(r.status, AgreementStatus::Signed);
    }

    #[test]
    fn derive_without_signed_column_marks_not_signed() {
        let ds = derive(raw(
            &[COL_FACILITY, COL_REGION, COL_DISTRICT],
            &[&["Poste de santé A", "dakar", "Pikine"]],
        ))
        .unwrap();
        assert_eq!(ds.records[0].status, AgreementStatus::NotSigned);
    }

    #[test]
    fn derive_requires_name_region_district() {
        let err = derive(raw(&[COL_FACILITY, COL_REGION], &[])).unwrap_err();
        assert!(matches!(err, DashboardError::Schema(_)));
    }
}
