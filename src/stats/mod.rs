//! Stats module - frequency tables, descriptive statistics and smoothing

mod calculator;
mod frequency;
mod smoothing;

pub use calculator::{StatsCalculator, Summary};
pub use frequency::{count_categories, BucketPolicy, FrequencyEntry, FrequencyTable, SortOrder};
pub use smoothing::{
    savgol_coefficients, savgol_smooth, HistogramBins, HistogramError, MAX_POLY_ORDER,
};
