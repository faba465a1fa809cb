use crate::derive::derive;
use crate::error::{DashboardError, Result};
use crate::schema::{Schema, DERIVED_COLUMNS};
use crate::types::{Dataset, RawDataset};
use csv::ReaderBuilder;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Decode file bytes: UTF-8 first, Latin-1 once if that fails.
///
/// Latin-1 maps every byte to the code point of the same value, so the
/// fallback cannot fail.
pub fn decode_text(path: &Path, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(mut text) => {
            if text.starts_with('\u{feff}') {
                text.replace_range(..'\u{feff}'.len_utf8(), "");
            }
            text
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err.utf8_error(), "not valid UTF-8, retrying as latin-1");
            err.as_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

/// `;` when the header line carries more semicolons than commas, `,` otherwise.
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    let semis = header.matches(';').count();
    let commas = header.matches(',').count();
    if semis > commas {
        b';'
    } else {
        b','
    }
}

/// Parse already-decoded delimited text.
pub fn parse_text(text: &str) -> Result<RawDataset> {
    let delimiter = sniff_delimiter(text);
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    // Previously derived columns are recomputed, so they are not source columns.
    let keep: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !DERIVED_COLUMNS.contains(&h.as_str()))
        .map(|(i, _)| i)
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let row: Vec<String> = keep
            .iter()
            .map(|&i| record.get(i).unwrap_or("").to_string())
            .collect();
        rows.push(row);
    }

    let schema = Schema::new(keep.iter().map(|&i| headers[i].clone()).collect());
    debug!(
        columns = schema.len(),
        rows = rows.len(),
        delimiter = %(delimiter as char),
        "parsed delimited text"
    );
    Ok(RawDataset { schema, rows })
}

/// Read a delimited file into memory. Deterministic for identical bytes.
pub fn load(path: &Path) -> Result<RawDataset> {
    let bytes = std::fs::read(path).map_err(|source| DashboardError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode_text(path, bytes);
    parse_text(&text)
}

/// Owns the derived dataset for the lifetime of the process.
///
/// Built once at startup and passed by reference; the file is read and derived
/// on the first `dataset()` call only, later calls share the same `Arc`.
#[derive(Debug)]
pub struct DatasetRepository {
    path: PathBuf,
    cell: OnceCell<Arc<Dataset>>,
}

impl DatasetRepository {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        self.cell
            .get_or_try_init(|| {
                let raw = load(&self.path)?;
                let dataset = derive(raw)?;
                info!(
                    path = %self.path.display(),
                    rows = dataset.len(),
                    regions = dataset.regions().len(),
                    "dataset loaded"
                );
                Ok(Arc::new(dataset))
            })
            .map(Arc::clone)
    }
}
