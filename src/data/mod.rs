//! Data module - dataset loading and column extraction

mod loader;
mod processor;

pub use loader::{DatasetLoader, LoadOptions, LoaderError, Sample};
pub use processor::{DataProcessor, ProcessorError};
