//! Dataset Loader Module
//! Reads a delimited file with Polars, drops unwanted columns, optionally
//! subsamples and removes rows with missing values.

use log::{debug, info};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Cannot drop unknown column '{0}'")]
    UnknownColumn(String),
    #[error("Cannot sample {requested} rows from a table of {available}")]
    SampleTooLarge { requested: usize, available: usize },
}

/// Random subsample request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub rows: usize,
    /// Fixed seed for reproducible samples; `None` draws a fresh one.
    pub seed: Option<u64>,
}

/// What to do with the file once it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub separator: u8,
    pub drop_columns: Vec<String>,
    pub sample: Option<Sample>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            separator: b',',
            drop_columns: Vec::new(),
            sample: None,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn sample(mut self, rows: usize, seed: Option<u64>) -> Self {
        self.sample = Some(Sample { rows, seed });
        self
    }
}

/// Loads datasets into Polars DataFrames.
pub struct DatasetLoader;

impl DatasetLoader {
    /// Load a delimited file and clean it according to `options`.
    ///
    /// Steps run in order: read, drop columns, sample, drop rows with any null.
    pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<DataFrame, LoaderError> {
        let path = path.as_ref();

        let df = LazyCsvReader::new(path)
            .with_separator(options.separator)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;
        info!(
            "Loaded {}: {} rows x {} columns",
            path.display(),
            df.height(),
            df.width()
        );

        let df = Self::drop_columns(df, &options.drop_columns)?;
        let df = match options.sample {
            Some(sample) => Self::sample(&df, sample)?,
            None => df,
        };
        let df = Self::drop_missing(&df)?;

        info!("Cleaned dataset: {} rows x {} columns", df.height(), df.width());
        Ok(df)
    }

    /// Remove the named columns. Every name must exist in the frame.
    pub fn drop_columns(mut df: DataFrame, columns: &[String]) -> Result<DataFrame, LoaderError> {
        let mut dropped: HashSet<&str> = HashSet::new();

        for name in columns {
            if !dropped.insert(name.as_str()) {
                continue;
            }
            if df.get_column_index(name).is_none() {
                return Err(LoaderError::UnknownColumn(name.clone()));
            }
            df.drop_in_place(name)?;
            debug!("Dropped column '{}'", name);
        }

        Ok(df)
    }

    /// Draw `sample.rows` rows without replacement, shuffled.
    pub fn sample(df: &DataFrame, sample: Sample) -> Result<DataFrame, LoaderError> {
        if sample.rows > df.height() {
            return Err(LoaderError::SampleTooLarge {
                requested: sample.rows,
                available: df.height(),
            });
        }

        debug!("Sampling {} of {} rows (seed {:?})", sample.rows, df.height(), sample.seed);
        Ok(df.sample_n_literal(sample.rows, false, true, sample.seed)?)
    }

    /// Keep only rows where every column is non-null. NaN counts as missing.
    pub fn drop_missing(df: &DataFrame) -> Result<DataFrame, LoaderError> {
        let mut mask = BooleanChunked::full("mask".into(), true, df.height());
        for column in df.get_columns() {
            mask = &mask & &column.is_not_null();
            if column.dtype().is_float() {
                let not_nan: BooleanChunked = column
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .map(|v| !v.is_some_and(f64::is_nan))
                    .collect();
                mask = &mask & &not_nan;
            }
        }

        let cleaned = df.filter(&mask)?;
        debug!("Dropped {} rows with missing values", df.height() - cleaned.height());
        Ok(cleaned)
    }
}
