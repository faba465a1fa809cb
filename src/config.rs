use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_DATA_FILE: &str = "Final_Full__type_colonnes_Cleaned.csv";

/// Senegal health-ministry convention dashboard (CSU partnership agreements).
#[derive(Debug, Parser)]
#[command(name = "msas_dashboard")]
#[command(version, about, long_about = None)]
pub struct DashboardArgs {
    /// Source CSV (comma or semicolon separated, UTF-8 or Latin-1)
    #[arg(long, env = "MSAS_DATA", default_value = DEFAULT_DATA_FILE)]
    pub data: PathBuf,

    /// Directory receiving exports and reports
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Minimum |r| for a correlation pair to be reported
    #[arg(long, default_value_t = 0.7)]
    pub corr_threshold: f64,

    /// How many correlation pairs to report per direction
    #[arg(long, default_value_t = 3)]
    pub top_pairs: usize,

    /// How many districts to list at each end of the district ranking
    #[arg(long, default_value_t = 5)]
    pub district_rank: usize,

    /// National region count used for the coverage rate
    #[arg(long, default_value_t = 14)]
    pub expected_regions: usize,
}

/// Settings the report builder reads. Constructed once in `main`.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub out_dir: PathBuf,
    pub corr_threshold: f64,
    pub top_pairs: usize,
    pub district_rank: usize,
    pub expected_regions: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            out_dir: PathBuf::from("."),
            corr_threshold: 0.7,
            top_pairs: 3,
            district_rank: 5,
            expected_regions: 14,
        }
    }
}

impl From<DashboardArgs> for DashboardConfig {
    fn from(args: DashboardArgs) -> Self {
        Self {
            data_path: args.data,
            out_dir: args.out_dir,
            corr_threshold: args.corr_threshold.abs(),
            top_pairs: args.top_pairs,
            district_rank: args.district_rank,
            expected_regions: args.expected_regions,
        }
    }
}
