// Entry point and interactive menu.
//
// - Option [1] loads and derives the CSV once, printing diagnostics.
// - Options [2] and [3] pick the region, then a district of that region.
// - Option [4] builds every report for the current selection.
// - Option [5] searches the selection and exports it as a semicolon CSV.
use clap::Parser;
use msas_dashboard::config::{DashboardArgs, DashboardConfig};
use msas_dashboard::filter::{search, FilterSelection, Selection};
use msas_dashboard::loader::DatasetRepository;
use msas_dashboard::types::Dataset;
use msas_dashboard::util::{format_int, format_number, format_opt};
use msas_dashboard::{output, reports};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Next trimmed line from `input`, `None` once the input is closed.
fn read_answer(input: &mut impl BufRead) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn prompt(label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    read_answer(&mut io::stdin().lock())
}

fn read_choice() -> Option<String> {
    prompt("Enter choice: ")
}

/// Returns `true` for `Y`, `false` for `N` or a closed input.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(answer) = prompt("Back to menu (Y/N): ") else {
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Print numbered choices and return the one picked, `None` on a bad answer.
fn pick(title: &str, choices: &[Selection]) -> Option<Selection> {
    println!("{title}");
    for (i, c) in choices.iter().enumerate() {
        println!("[{}] {}", i + 1, c);
    }
    let idx: usize = read_choice()?.parse().ok()?;
    choices.get(idx.checked_sub(1)?).cloned()
}

fn loaded(repo: &DatasetRepository) -> Option<Arc<Dataset>> {
    if !repo.is_loaded() {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return None;
    }
    repo.dataset().ok()
}

fn handle_load(repo: &DatasetRepository) {
    match repo.dataset() {
        Ok(data) => {
            println!(
                "Dataset ready: {} structures, {} regions, {} districts.",
                format_int(data.len()),
                format_int(data.regions().len()),
                format_int(data.districts().len())
            );
            let missing: Vec<&str> = msas_dashboard::schema::NUMERIC_COLUMNS
                .iter()
                .copied()
                .filter(|c| !data.schema.has(c))
                .collect();
            if !missing.is_empty() {
                println!("Note: optional column(s) absent: {}.", missing.join(", "));
            }
            println!();
        }
        Err(e) => eprintln!("Failed to load file: {}\n", e),
    }
}

fn handle_select_region(repo: &DatasetRepository, selection: &mut FilterSelection) {
    let Some(data) = loaded(repo) else { return };
    match pick("Filter by region:", &FilterSelection::region_choices(&data)) {
        Some(region) if selection.select_region(&data, region.clone()) => {
            println!("Region set to {}, district reset to ALL.\n", selection.region());
        }
        _ => println!("Invalid choice.\n"),
    }
}

fn handle_select_district(repo: &DatasetRepository, selection: &mut FilterSelection) {
    let Some(data) = loaded(repo) else { return };
    match pick("Filter by district:", &selection.district_choices(&data)) {
        Some(district) if selection.select_district(&data, district.clone()) => {
            println!("District set to {}.\n", selection.district());
        }
        _ => println!("Invalid choice.\n"),
    }
}

fn handle_generate_reports(
    repo: &DatasetRepository,
    selection: &FilterSelection,
    config: &DashboardConfig,
) {
    let Some(data) = loaded(repo) else { return };
    let subset = selection.apply(&data);
    let report = reports::build(&data, &subset, selection, config);

    println!("Generating reports...");
    println!(
        "(Region: {}, District: {})\n",
        selection.region(),
        selection.district()
    );

    let k = &report.kpis;
    println!("Structures: {}", format_int(k.total_structures));
    println!("Regions covered: {}", format_int(k.regions_covered));
    println!("Districts: {}", format_int(k.districts));
    println!("Mean structures/region: {}", format_number(k.mean_structures_per_region, 1));
    println!(
        "Dominant type: {} ({}%)",
        k.dominant_type.map(|t| t.to_string()).unwrap_or_else(|| "N/A".into()),
        format_number(k.dominant_type_share, 1)
    );
    println!(
        "Region with most structures: {} ({})",
        k.top_region.as_deref().unwrap_or("N/A"),
        k.top_region_structures
    );
    println!("Mean districts/region: {}", format_number(k.mean_districts_per_region, 1));
    println!("Coverage rate: {}%", format_number(k.coverage_rate, 1));
    println!(
        "Facilities signed / not signed: {} / {}\n",
        report.status_counts.signed, report.status_counts.not_signed
    );

    if let Some(c) = &report.conventions {
        println!(
            "Global signature rate: {}% ({} signed, {} not signed, total value {})\n",
            format_number(c.signature_rate, 1),
            format_number(c.signed, 0),
            format_number(c.not_signed, 0),
            format_opt(c.total_value, 0)
        );
    }

    let rows = reports::region_rows(&report.regions);
    let file1 = config.out_dir.join("regional_performance.csv");
    if let Err(e) = output::write_csv(&file1, &rows) {
        eprintln!("Write error: {}", e);
    }
    println!("Regional Performance (by composite score)\n");
    output::preview_table_rows(&rows, 5);
    println!("(Full table exported to {})\n", file1.display());

    if let Some(stats) = &report.statistics {
        println!("Descriptive Statistics\n");
        output::preview_table_rows(&reports::stats_rows(stats), stats.len());
    }

    if let Some(corr) = &report.correlation {
        println!("Strong positive correlations (> {}):", config.corr_threshold);
        for p in &corr.strong_positive {
            println!("  {} <-> {}: {:.3}", p.left, p.right, p.correlation);
        }
        println!("Strong negative correlations (< -{}):", config.corr_threshold);
        for p in &corr.strong_negative {
            println!("  {} <-> {}: {:.3}", p.left, p.right, p.correlation);
        }
        println!();
    }

    println!("Best served districts\n");
    output::preview_table_rows(&report.district_ranking.best_served, config.district_rank);
    println!("Least served districts\n");
    output::preview_table_rows(&report.district_ranking.least_served, config.district_rank);

    let gaps = &report.coverage_gaps;
    println!("Regions to strengthen (<= {} structures)\n", gaps.low_threshold as i64);
    output::preview_table_rows(&gaps.under_served, gaps.under_served.len());
    println!("Best served regions (>= {} structures)\n", gaps.high_threshold as i64);
    output::preview_table_rows(&gaps.well_served, gaps.well_served.len());

    if let Some(top) = &report.insights.top_region {
        println!("Strength: {} has the most structures ({}).", top.name, top.structures);
    }
    if let Some((region, density)) = &report.insights.lowest_density_region {
        println!("Watch: {} has the lowest structures per district ({}).", region, density);
    }
    for feature in &report.unavailable {
        println!("Note: {}", feature);
    }
    println!();

    let summary = config.out_dir.join("summary.json");
    if let Err(e) = output::write_json(&summary, &report) {
        eprintln!("Write error: {}", e);
    }
    println!("Full report saved to {}\n", summary.display());
}

fn handle_export(repo: &DatasetRepository, selection: &FilterSelection, config: &DashboardConfig) {
    let Some(data) = loaded(repo) else { return };
    let subset = selection.apply(&data);
    let term = prompt("Search (empty for all rows): ").unwrap_or_default();
    let found = search(&subset, &term);
    let path = config.out_dir.join("donnees_filtrees.csv");
    match output::export_subset(&path, &found) {
        Ok(()) => println!(
            "{} rows exported to {}\n",
            format_int(found.len()),
            path.display()
        ),
        Err(e) => eprintln!("Export failed: {}\n", e),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = DashboardConfig::from(DashboardArgs::parse());
    let repo = DatasetRepository::open(config.data_path.clone());
    let mut selection = FilterSelection::default();

    loop {
        println!("MSAS Convention Dashboard");
        println!("[1] Load the file");
        println!("[2] Filter by region ({})", selection.region());
        println!("[3] Filter by district ({})", selection.district());
        println!("[4] Generate reports");
        println!("[5] Search and export data");
        println!("[0] Exit\n");
        let Some(choice) = read_choice() else {
            println!("Input closed, exiting.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&repo),
            "2" => handle_select_region(&repo, &mut selection),
            "3" => handle_select_district(&repo, &mut selection),
            "4" => {
                println!();
                handle_generate_reports(&repo, &selection, &config);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "5" => handle_export(&repo, &selection, &config),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter a number from the menu.\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_input_reads_as_none() {
        let mut input: &[u8] = b" 2 \nY";
        assert_eq!(read_answer(&mut input).as_deref(), Some("2"));
        assert_eq!(read_answer(&mut input).as_deref(), Some("Y"));
        assert_eq!(read_answer(&mut input), None);
    }

    #[test]
    fn blank_line_is_not_end_of_input() {
        let mut input: &[u8] = b"\n";
        assert_eq!(read_answer(&mut input).as_deref(), Some(""));
        assert_eq!(read_answer(&mut input), None);
    }
}
