//! Chart Plotter Module
//! Builds bar, pie and histogram figures from dataset columns.

use crate::charts::{Axes, Figure, Mark, Orientation, Rgb};
use crate::config::{ChartConfig, ConfigError};
use crate::data::{DataProcessor, ProcessorError};
use crate::stats::{
    count_categories, savgol_smooth, FrequencyTable, HistogramBins, HistogramError, SortOrder,
    StatsCalculator, Summary,
};
use log::debug;
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error("Column '{0}' has no values to plot")]
    EmptyColumn(String),
    #[error("Column '{column}' has a degenerate range: every value equals {value}")]
    DegenerateRange { column: String, value: f64 },
    #[error("Cannot bin column '{column}': {source}")]
    Histogram {
        column: String,
        #[source]
        source: HistogramError,
    },
    #[error("Unsupported smoothing: window {window}, polynomial order {poly_order}")]
    Smoothing { window: usize, poly_order: usize },
    #[error("Failed to render chart: {0}")]
    Render(String),
    #[error("Failed to serialize chart: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<PolarsError> for ChartError {
    fn from(err: PolarsError) -> Self {
        ChartError::Processor(ProcessorError::PolarsError(err))
    }
}

/// Creates chart figures from columns using one configuration.
#[derive(Debug, Clone, Default)]
pub struct ChartPlotter {
    config: ChartConfig,
}

impl ChartPlotter {
    /// Create a plotter. The configuration is validated first.
    pub fn new(config: ChartConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Bar chart of category counts.
    pub fn bar_chart(&self, column: &Column, title: Option<&str>) -> Result<Figure, ChartError> {
        let table = Self::non_empty(count_categories(column)?, column)?;
        let style = &self.config.style;
        self.vertical_bars(
            title,
            column.name().as_str(),
            &style.count_label,
            &table,
            false,
        )
    }

    /// Bar chart of category proportions. The bars sum to one.
    pub fn proportion_bar_chart(
        &self,
        column: &Column,
        title: Option<&str>,
    ) -> Result<Figure, ChartError> {
        let table = Self::non_empty(count_categories(column)?, column)?.proportions();
        let style = &self.config.style;
        self.vertical_bars(
            title,
            column.name().as_str(),
            &style.proportion_label,
            &table,
            self.config.trend,
        )
    }

    /// Pie chart of the dominant categories, the long tail folded into "Others".
    pub fn pie_chart(&self, column: &Column, title: Option<&str>) -> Result<Figure, ChartError> {
        let table = Self::non_empty(count_categories(column)?, column)?
            .top_n(None, SortOrder::Descending, &self.config.bucket)
            .proportions();
        let style = &self.config.style;

        debug!("Pie chart of '{}' with {} wedges", column.name(), table.len());
        let axes = Axes {
            marks: vec![Mark::Wedges {
                labels: table.labels(),
                values: table.values(),
                colors: Rgb::cycle(&style.wedge_palette, table.len()),
            }],
            ..Default::default()
        };
        Ok(self.figure(title, axes))
    }

    /// Horizontal bar chart of the top categories by count.
    ///
    /// `limit` overrides the size-derived category limit; the first entry is drawn on top.
    pub fn horizontal_bar_chart(
        &self,
        column: &Column,
        title: Option<&str>,
        limit: Option<usize>,
        order: SortOrder,
    ) -> Result<Figure, ChartError> {
        let table = Self::non_empty(count_categories(column)?, column)?.top_n(
            limit,
            order,
            &self.config.bucket,
        );
        let style = &self.config.style;

        debug!("Horizontal bars of '{}': {} entries", column.name(), table.len());
        let axes = Axes {
            x_label: Some(style.count_label.clone()),
            y_label: Some(column.name().to_string()),
            marks: vec![Mark::Bars {
                labels: table.labels(),
                values: table.values(),
                colors: Rgb::cycle(&style.palette, table.len()),
                orientation: Orientation::Horizontal,
            }],
            annotations: Vec::new(),
        };
        Ok(self.figure(title, axes))
    }

    /// Density histogram with a smoothed density curve and a statistics annotation.
    pub fn histogram_chart(
        &self,
        column: &Column,
        title: Option<&str>,
    ) -> Result<Figure, ChartError> {
        let values = DataProcessor::numeric_values(column)?;
        let name = column.name().to_string();
        if values.is_empty() {
            return Err(ChartError::EmptyColumn(name));
        }

        let options = &self.config.histogram;
        let bins = HistogramBins::new(&values, options.bins).map_err(|err| match err {
            HistogramError::Degenerate(value) => ChartError::DegenerateRange {
                column: name.clone(),
                value,
            },
            source => ChartError::Histogram {
                column: name.clone(),
                source,
            },
        })?;
        let density = bins
            .smoothed_density(options.smoothing_window, options.poly_order)
            .ok_or(ChartError::Smoothing {
                window: options.smoothing_window,
                poly_order: options.poly_order,
            })?;
        let style = &self.config.style;

        let mut axes = Axes {
            x_label: Some(name),
            y_label: Some(style.density_label.clone()),
            marks: vec![
                Mark::Histogram {
                    edges: bins.edges.clone(),
                    heights: bins.density(),
                    color: style.histogram_color,
                },
                Mark::Curve {
                    name: style.density_label.clone(),
                    points: density,
                    color: style.curve_color,
                },
            ],
            annotations: Vec::new(),
        };
        if options.annotate {
            axes.annotations = Self::summary_lines(&StatsCalculator::describe_values(&values));
        }

        Ok(self.figure(title, axes))
    }

    /// Counts of `column` over the rows whose `filter_column` contains `pattern`.
    pub fn filtered_bar_chart(
        &self,
        df: &DataFrame,
        column: &str,
        filter_column: &str,
        pattern: &str,
        title: Option<&str>,
    ) -> Result<Figure, ChartError> {
        let filtered = DataProcessor::filter_contains(df, column, filter_column, pattern)?;
        debug!(
            "'{}' filtered on '{}' ~ '{}': {} rows",
            column,
            filter_column,
            pattern,
            filtered.len()
        );
        self.bar_chart(&filtered, title)
    }

    /// Proportions of `column` over the rows whose `filter_column` contains `pattern`.
    pub fn filtered_proportion_bar_chart(
        &self,
        df: &DataFrame,
        column: &str,
        filter_column: &str,
        pattern: &str,
        title: Option<&str>,
    ) -> Result<Figure, ChartError> {
        let filtered = DataProcessor::filter_contains(df, column, filter_column, pattern)?;
        self.proportion_bar_chart(&filtered, title)
    }

    fn non_empty(table: FrequencyTable, column: &Column) -> Result<FrequencyTable, ChartError> {
        if table.is_empty() {
            return Err(ChartError::EmptyColumn(column.name().to_string()));
        }
        Ok(table)
    }

    fn vertical_bars(
        &self,
        title: Option<&str>,
        x_label: &str,
        y_label: &str,
        table: &FrequencyTable,
        trend: bool,
    ) -> Result<Figure, ChartError> {
        let style = &self.config.style;
        let values = table.values();

        let mut marks = vec![Mark::Bars {
            labels: table.labels(),
            values: values.clone(),
            colors: Rgb::cycle(&style.palette, table.len()),
            orientation: Orientation::Vertical,
        }];
        if trend {
            let options = &self.config.histogram;
            let smoothed = savgol_smooth(&values, options.smoothing_window, options.poly_order)
                .ok_or(ChartError::Smoothing {
                    window: options.smoothing_window,
                    poly_order: options.poly_order,
                })?;
            marks.push(Mark::Curve {
                name: style.trend_label.clone(),
                points: smoothed
                    .into_iter()
                    .enumerate()
                    .map(|(i, y)| (i as f64, y))
                    .collect(),
                color: style.curve_color,
            });
        }

        let axes = Axes {
            x_label: Some(x_label.to_string()),
            y_label: Some(y_label.to_string()),
            marks,
            annotations: Vec::new(),
        };
        Ok(self.figure(title, axes))
    }

    fn figure(&self, title: Option<&str>, axes: Axes) -> Figure {
        let style = &self.config.style;
        Figure {
            title: title.unwrap_or(&style.default_title).to_string(),
            width: style.width,
            height: style.height,
            font_family: style.font_family.clone(),
            axes,
        }
    }

    fn summary_lines(summary: &Summary) -> Vec<String> {
        vec![
            format!("n = {}", summary.count),
            format!("média = {:.2}", summary.mean),
            format!("desvio padrão = {:.2}", summary.std),
            format!("Q1 = {:.2}", summary.q1),
            format!("mediana = {:.2}", summary.median),
            format!("Q3 = {:.2}", summary.q3),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bolsistas() -> DataFrame {
        df!(
            "sexo" => &[Some("F"), Some("M"), Some("F"), None, Some("F"), Some("M")],
            "modalidade" => &["Mestrado", "Doutorado", "Doutorado", "Mestrado", "Doutorado", "Mestrado"],
            "valor" => &[1500.0, 2200.0, 2200.0, 1500.0, 2200.0, 1500.0],
        )
        .unwrap()
    }

    #[test]
    fn test_bar_chart_counts() {
        let df = bolsistas();
        let figure = ChartPlotter::default()
            .bar_chart(df.column("sexo").unwrap(), None)
            .unwrap();

        assert_eq!(figure.title, "Número de bolsistas");
        assert_eq!(figure.axes.y_label.as_deref(), Some("número de bolsistas"));
        assert_eq!(figure.axes.x_label.as_deref(), Some("sexo"));

        let (labels, values) = figure.axes.categories().unwrap();
        assert_eq!(labels, ["F".to_string(), "M".to_string()]);
        assert_eq!(values, [3.0, 2.0]);
        assert!(matches!(
            &figure.axes.marks[0],
            Mark::Bars { colors, .. } if colors == &vec![Rgb::TAB_RED, Rgb::TAB_GREEN]
        ));
    }

    #[test]
    fn test_proportion_chart_sums_to_one() {
        let df = bolsistas();
        let figure = ChartPlotter::default()
            .proportion_bar_chart(df.column("modalidade").unwrap(), Some("Modalidade"))
            .unwrap();

        assert_eq!(figure.title, "Modalidade");
        let (_, values) = figure.axes.categories().unwrap();
        let total: f64 = values.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(figure.axes.curves().count(), 0);
    }

    #[test]
    fn test_proportion_chart_trend_curve() {
        let config = ChartConfig {
            trend: true,
            ..Default::default()
        };
        let df = bolsistas();
        let figure = ChartPlotter::new(config)
            .unwrap()
            .proportion_bar_chart(df.column("modalidade").unwrap(), None)
            .unwrap();

        let (name, points) = figure.axes.curves().next().unwrap();
        assert_eq!(name, "tendência");
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].0, 1.0);
    }

    #[test]
    fn test_pie_chart_folds_long_tail() {
        let mut labels: Vec<String> = vec!["A".to_string(); 60];
        labels.extend(std::iter::repeat("B".to_string()).take(30));
        labels.extend((0..10).map(|i| format!("rare{i}")));
        let df = df!("instituicao" => labels).unwrap();

        let figure = ChartPlotter::default()
            .pie_chart(df.column("instituicao").unwrap(), None)
            .unwrap();

        let (labels, values) = figure.axes.categories().unwrap();
        assert_eq!(labels, ["A".to_string(), "B".to_string(), "Others".to_string()]);
        assert!((values[2] - 0.10).abs() < 1e-12);
        assert!((values.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_horizontal_bar_chart_with_limit() {
        let df = bolsistas();
        let figure = ChartPlotter::default()
            .horizontal_bar_chart(
                df.column("valor").unwrap(),
                None,
                Some(1),
                SortOrder::Descending,
            )
            .unwrap();

        let (labels, values) = figure.axes.categories().unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1], "Others");
        assert_eq!(values, [3.0, 3.0]);
        assert!(matches!(
            figure.axes.marks[0],
            Mark::Bars { orientation: Orientation::Horizontal, .. }
        ));
    }

    #[test]
    fn test_histogram_chart() {
        let values: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let df = df!("idade" => values).unwrap();
        let figure = ChartPlotter::default()
            .histogram_chart(df.column("idade").unwrap(), Some("Idade"))
            .unwrap();

        let (edges, heights) = figure.axes.histogram().unwrap();
        assert_eq!(edges.len(), 11);
        assert_eq!(heights.len(), 10);
        assert_eq!(figure.axes.curves().count(), 1);
        assert_eq!(figure.axes.annotations[0], "n = 50");
        assert_eq!(figure.axes.annotations[1], "média = 24.50");
    }

    #[test]
    fn test_histogram_without_annotation() {
        let mut config = ChartConfig::default();
        config.histogram.annotate = false;
        let df = df!("x" => &[1.0, 2.0, 3.0]).unwrap();
        let figure = ChartPlotter::new(config)
            .unwrap()
            .histogram_chart(df.column("x").unwrap(), None)
            .unwrap();

        assert!(figure.axes.annotations.is_empty());
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let df = df!("x" => &[4.0, 4.0, 4.0]).unwrap();
        let err = ChartPlotter::default()
            .histogram_chart(df.column("x").unwrap(), None)
            .unwrap_err();

        assert!(matches!(err, ChartError::DegenerateRange { value, .. } if value == 4.0));
    }

    #[test]
    fn test_histogram_non_finite_value() {
        let df = df!("x" => &[1.0, f64::INFINITY, 3.0]).unwrap();
        let err = ChartPlotter::default()
            .histogram_chart(df.column("x").unwrap(), None)
            .unwrap_err();

        assert!(matches!(
            err,
            ChartError::Histogram { source: HistogramError::NonFinite(v), .. } if v.is_infinite()
        ));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = ChartConfig::default();
        config.bucket.medium_divisor = 0;
        assert!(matches!(ChartPlotter::new(config), Err(ConfigError::Invalid(_))));

        let mut config = ChartConfig::default();
        config.histogram.bins = 0;
        assert!(ChartPlotter::new(config).is_err());

        let mut config = ChartConfig::default();
        config.histogram.poly_order = 4;
        assert!(ChartPlotter::new(config).is_err());
    }

    #[test]
    fn test_histogram_rejects_text() {
        let df = bolsistas();
        let err = ChartPlotter::default()
            .histogram_chart(df.column("sexo").unwrap(), None)
            .unwrap_err();

        assert!(matches!(err, ChartError::Processor(ProcessorError::NonNumericColumn(..))));
    }

    #[test]
    fn test_empty_column() {
        let df = df!("x" => &[None::<&str>, None]).unwrap();
        let err = ChartPlotter::default()
            .bar_chart(df.column("x").unwrap(), None)
            .unwrap_err();

        assert!(matches!(err, ChartError::EmptyColumn(name) if name == "x"));
    }

    #[test]
    fn test_filtered_bar_chart() {
        let df = bolsistas();
        let figure = ChartPlotter::default()
            .filtered_bar_chart(&df, "sexo", "modalidade", "Dout", None)
            .unwrap();

        let (labels, values) = figure.axes.categories().unwrap();
        assert_eq!(labels, ["M".to_string(), "F".to_string()]);
        assert_eq!(values, [1.0, 2.0]);
    }

    #[test]
    fn test_filtered_proportion_bar_chart() {
        let df = bolsistas();
        let figure = ChartPlotter::default()
            .filtered_proportion_bar_chart(&df, "sexo", "modalidade", "Mestrado", None)
            .unwrap();

        let (labels, values) = figure.axes.categories().unwrap();
        assert_eq!(labels, ["F".to_string(), "M".to_string()]);
        assert_eq!(values, [0.5, 0.5]);
    }

    #[test]
    fn test_figure_json_export() {
        let df = bolsistas();
        let figure = ChartPlotter::default()
            .bar_chart(df.column("sexo").unwrap(), None)
            .unwrap();
        let json = figure.to_json().unwrap();

        assert!(json.contains("\"#d62728\""));
        let back: Figure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, figure);
    }
}
