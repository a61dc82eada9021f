//! Bolsistas Charts - charting helpers for scholarship recipient datasets
//!
//! Load a CSV, pick a column and build a chart:
//!
//! ```no_run
//! use bolsistas_charts::{ChartPlotter, DatasetLoader, LoadOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let df = DatasetLoader::load("bolsistas.csv", &LoadOptions::new().drop_columns(["cpf"]))?;
//! let figure = ChartPlotter::default().bar_chart(df.column("sexo")?, None)?;
//! let svg = figure.to_svg()?;
//! # Ok(())
//! # }
//! ```

pub mod charts;
pub mod config;
pub mod data;
pub mod stats;

pub use charts::{ChartError, ChartPlotter, Figure, StaticChartRenderer};
pub use config::{ChartConfig, ConfigError};
pub use data::{DataProcessor, DatasetLoader, LoadOptions, LoaderError};
pub use stats::{count_categories, BucketPolicy, FrequencyTable, SortOrder, StatsCalculator};
