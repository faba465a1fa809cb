use crate::error::Result;
use crate::schema::{COL_STATUS, COL_TYPE};
use crate::types::Dataset;
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Semicolon-separated UTF-8 export: source columns in source order under
/// their original header text, then `Type` and `Statut Convention`.
pub fn export_subset_to<W: Write>(writer: W, dataset: &Dataset) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(b';').from_writer(writer);
    let mut header: Vec<&str> = dataset.schema.headers().iter().map(String::as_str).collect();
    header.extend([COL_TYPE, COL_STATUS]);
    wtr.write_record(&header)?;
    let width = dataset.schema.len();
    for r in &dataset.records {
        let row: Vec<&str> = (0..width)
            .map(|i| r.cell(i))
            .chain([r.facility_type.label(), r.status.label()])
            .collect();
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_subset(path: &Path, dataset: &Dataset) -> Result<()> {
    let file = std::fs::File::create(path)?;
    export_subset_to(std::io::BufWriter::new(file), dataset)?;
    info!(path = %path.display(), rows = dataset.len(), "exported filtered data");
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
