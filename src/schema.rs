// Source column vocabulary.
//
// Header text must stay byte-for-byte what the ministry's extract uses:
// the semicolon export writes these names back out unchanged.
use crate::error::SchemaError;

pub const COL_FACILITY: &str = "NOM DES STRUCTURES SANITAIRES CIBLES";
pub const COL_REGION: &str = "Région";
pub const COL_DISTRICT: &str = "District Sanitaire";
pub const COL_DISTRICTS_VISITED: &str = "NOMBRE DE DISTRICTS SANITAIRES VISITES";

pub const COL_VALUE: &str = "Valeurs";
pub const COL_SIGNED: &str = "Nb Conventions Signées";
pub const COL_NOT_SIGNED: &str = "Nb Conventions Non Signées";
pub const COL_SHARE_TARGETED: &str = "Part Structures Ciblées";
pub const COL_SHARE_SIGNED: &str = "Part Conventions Signées";
pub const COL_SHARE_NOT_SIGNED: &str = "Part Conventions Non Signées";

pub const COL_TYPE: &str = "Type";
pub const COL_STATUS: &str = "Statut Convention";

pub const REQUIRED_COLUMNS: [&str; 3] = [COL_FACILITY, COL_REGION, COL_DISTRICT];

/// Numeric metric columns, in the order statistics and correlations report them.
pub const NUMERIC_COLUMNS: [&str; 6] = [
    COL_VALUE,
    COL_SIGNED,
    COL_NOT_SIGNED,
    COL_SHARE_TARGETED,
    COL_SHARE_SIGNED,
    COL_SHARE_NOT_SIGNED,
];

/// Columns produced by derivation. If an input already carries them (a re-loaded
/// export), they are dropped and recomputed.
pub const DERIVED_COLUMNS: [&str; 2] = [COL_TYPE, COL_STATUS];

/// Header list of a loaded file with name -> position lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    headers: Vec<String>,
}

impl Schema {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Check that every column in `columns` exists before running `feature`.
    pub fn require(&self, feature: &'static str, columns: &[&str]) -> Result<(), SchemaError> {
        let missing: Vec<String> = columns
            .iter()
            .filter(|c| !self.has(c))
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::MissingColumns {
                feature,
                columns: missing,
            })
        }
    }

    /// The declared numeric columns this file actually carries.
    pub fn numeric_columns(&self) -> Vec<&'static str> {
        NUMERIC_COLUMNS
            .iter()
            .copied()
            .filter(|c| self.has(c))
            .collect()
    }
}
