//! Data pipeline behind the MSAS convention dashboard: load the facility
//! extract, derive facility type / region / convention status, filter by
//! region and district, then aggregate, correlate and score regions.
pub mod aggregate;
pub mod config;
pub mod derive;
pub mod error;
pub mod filter;
pub mod loader;
pub mod output;
pub mod reports;
pub mod schema;
pub mod score;
pub mod types;
pub mod util;

pub use error::{DashboardError, Result, SchemaError};
pub use filter::{FilterSelection, Selection};
pub use loader::DatasetRepository;
pub use types::{Dataset, FacilityRecord, RegionAggregate};
