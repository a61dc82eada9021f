//! Data Processor Module
//! Column access and extraction: labels, numeric values and substring filtering.

use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column '{0}' is not numeric ({1})")]
    NonNumericColumn(String, DataType),
}

/// Handles column extraction and filtering.
pub struct DataProcessor;

impl DataProcessor {
    pub fn is_numeric(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Float32
                | DataType::Float64
                | DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }

    /// Get list of numeric column names.
    pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| Self::is_numeric(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Every value of the column rendered as text, `None` for nulls.
    pub fn categorical_values(column: &Column) -> Result<Vec<Option<String>>, ProcessorError> {
        let as_text = column.as_materialized_series().cast(&DataType::String)?;
        let values = as_text
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        Ok(values)
    }

    /// Non-null, non-NaN values of a numeric column.
    pub fn numeric_values(column: &Column) -> Result<Vec<f64>, ProcessorError> {
        if !Self::is_numeric(column.dtype()) {
            return Err(ProcessorError::NonNumericColumn(
                column.name().to_string(),
                column.dtype().clone(),
            ));
        }

        let value_f64 = column.cast(&DataType::Float64)?;
        let values = value_f64
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();
        Ok(values)
    }

    /// Rows of `target` whose `filter_column` text contains `pattern`.
    ///
    /// Rows where the filter column is null never match.
    pub fn filter_contains(
        df: &DataFrame,
        target: &str,
        filter_column: &str,
        pattern: &str,
    ) -> Result<Column, ProcessorError> {
        let filter_values = Self::categorical_values(df.column(filter_column)?)?;
        let mask: BooleanChunked = filter_values
            .iter()
            .map(|v| v.as_deref().is_some_and(|s| s.contains(pattern)))
            .collect();

        Ok(df.column(target)?.filter(&mask)?)
    }
}
