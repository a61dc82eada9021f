//! Static Chart Renderer
//! Draws a [`Figure`] with plotters.
//!
//! Layout:
//! 1. Title centred on top
//! 2. Plot area with category labels drawn under (or beside) each bar
//! 3. Curve legend in the upper right, statistics annotation below it

use crate::charts::{ChartError, Figure, Mark, Orientation, Rgb};
use image::RgbImage;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const TITLE_SIZE: u32 = 22;
const LABEL_SIZE: u32 = 13;
const MARGIN: u32 = 15;
const BAR_WIDTH: f64 = 0.8;

type PlotContext<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn render_err<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Render(err.to_string())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render to an SVG document.
    pub fn render_svg(figure: &Figure) -> Result<String, ChartError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (figure.width, figure.height))
                .into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;
            Self::draw(figure, &root)?;
            root.present().map_err(render_err)?;
        }
        Ok(svg)
    }

    /// Render to an in-memory RGB bitmap.
    pub fn render_rgb(figure: &Figure) -> Result<RgbImage, ChartError> {
        let (width, height) = (figure.width, figure.height);
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;
            Self::draw(figure, &root)?;
            root.present().map_err(render_err)?;
        }
        RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| ChartError::Render("bitmap buffer size mismatch".into()))
    }

    /// Draw the figure onto any plotters drawing area.
    pub fn draw<DB: DrawingBackend>(
        figure: &Figure,
        root: &DrawingArea<DB, Shift>,
    ) -> Result<(), ChartError> {
        let primary = figure.axes.marks.iter().find(|m| !matches!(m, Mark::Curve { .. }));

        match primary {
            Some(Mark::Wedges {
                labels,
                values,
                colors,
            }) => Self::draw_pie(figure, root, labels, values, colors)?,
            Some(Mark::Bars {
                labels,
                values,
                colors,
                orientation: Orientation::Horizontal,
            }) => Self::draw_horizontal_bars(figure, root, labels, values, colors)?,
            Some(Mark::Bars {
                labels,
                values,
                colors,
                orientation: Orientation::Vertical,
            }) => Self::draw_vertical_bars(figure, root, labels, values, colors)?,
            Some(Mark::Histogram {
                edges,
                heights,
                color,
            }) => Self::draw_histogram(figure, root, edges, heights, *color)?,
            _ => {
                root.titled(&figure.title, Self::font(figure, TITLE_SIZE))
                    .map_err(render_err)?;
            }
        }

        Self::draw_annotations(figure, root)
    }

    fn draw_vertical_bars<DB: DrawingBackend>(
        figure: &Figure,
        root: &DrawingArea<DB, Shift>,
        labels: &[String],
        values: &[f64],
        colors: &[Rgb],
    ) -> Result<(), ChartError> {
        let n = labels.len().max(1) as f64;
        let y_max = Self::upper_bound(values.iter().copied().chain(Self::curve_ys(figure)));

        let mut chart = ChartBuilder::on(root)
            .caption(&figure.title, Self::font(figure, TITLE_SIZE))
            .margin(MARGIN)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..n - 0.5, 0f64..y_max)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len())
            .x_label_formatter(&|_| String::new())
            .x_desc(figure.axes.x_label.clone().unwrap_or_default())
            .y_desc(figure.axes.y_label.clone().unwrap_or_default())
            .label_style(Self::font(figure, LABEL_SIZE))
            .draw()
            .map_err(render_err)?;

        let half = BAR_WIDTH / 2.0;
        chart
            .draw_series(values.iter().enumerate().map(|(i, &v)| {
                let x = i as f64;
                Rectangle::new(
                    [(x - half, 0.0), (x + half, v)],
                    Self::color_at(colors, i).filled(),
                )
            }))
            .map_err(render_err)?;

        let label_style = TextStyle::from(Self::font(figure, LABEL_SIZE))
            .pos(Pos::new(HPos::Center, VPos::Top));
        for (i, label) in labels.iter().enumerate() {
            let (px, py) = chart.backend_coord(&(i as f64, 0.0));
            root.draw(&Text::new(label.clone(), (px, py + 5), label_style.clone()))
                .map_err(render_err)?;
        }

        Self::draw_curves(figure, &mut chart)
    }

    fn draw_horizontal_bars<DB: DrawingBackend>(
        figure: &Figure,
        root: &DrawingArea<DB, Shift>,
        labels: &[String],
        values: &[f64],
        colors: &[Rgb],
    ) -> Result<(), ChartError> {
        let n = labels.len().max(1);
        let x_max = Self::upper_bound(values.iter().copied());
        let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u32
            * (LABEL_SIZE / 2 + 1)
            + 20;

        let mut chart = ChartBuilder::on(root)
            .caption(&figure.title, Self::font(figure, TITLE_SIZE))
            .margin(MARGIN)
            .x_label_area_size(45)
            .y_label_area_size(label_width)
            .build_cartesian_2d(0f64..x_max, -0.5f64..n as f64 - 0.5)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(labels.len())
            .y_label_formatter(&|_| String::new())
            .x_desc(figure.axes.x_label.clone().unwrap_or_default())
            .label_style(Self::font(figure, LABEL_SIZE))
            .draw()
            .map_err(render_err)?;

        // First entry on top
        let row = |i: usize| (n - 1 - i) as f64;
        let half = BAR_WIDTH / 2.0;
        chart
            .draw_series(values.iter().enumerate().map(|(i, &v)| {
                let y = row(i);
                Rectangle::new(
                    [(0.0, y - half), (v, y + half)],
                    Self::color_at(colors, i).filled(),
                )
            }))
            .map_err(render_err)?;

        let label_style = TextStyle::from(Self::font(figure, LABEL_SIZE))
            .pos(Pos::new(HPos::Right, VPos::Center));
        for (i, label) in labels.iter().enumerate() {
            let (px, py) = chart.backend_coord(&(0.0, row(i)));
            root.draw(&Text::new(label.clone(), (px - 8, py), label_style.clone()))
                .map_err(render_err)?;
        }

        Ok(())
    }

    fn draw_histogram<DB: DrawingBackend>(
        figure: &Figure,
        root: &DrawingArea<DB, Shift>,
        edges: &[f64],
        heights: &[f64],
        color: Rgb,
    ) -> Result<(), ChartError> {
        let (x_min, x_max) = match (edges.first(), edges.last()) {
            (Some(&lo), Some(&hi)) if hi > lo => (lo, hi),
            _ => return Err(ChartError::Render("histogram has no bins".into())),
        };
        let y_max = Self::upper_bound(heights.iter().copied().chain(Self::curve_ys(figure)));

        let mut chart = ChartBuilder::on(root)
            .caption(&figure.title, Self::font(figure, TITLE_SIZE))
            .margin(MARGIN)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, 0f64..y_max)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc(figure.axes.x_label.clone().unwrap_or_default())
            .y_desc(figure.axes.y_label.clone().unwrap_or_default())
            .label_style(Self::font(figure, LABEL_SIZE))
            .draw()
            .map_err(render_err)?;

        let fill = RGBColor::from(color);
        chart
            .draw_series(edges.windows(2).zip(heights).map(|(bin, &h)| {
                Rectangle::new([(bin[0], 0.0), (bin[1], h)], fill.mix(0.6).filled())
            }))
            .map_err(render_err)?;
        chart
            .draw_series(edges.windows(2).zip(heights).map(|(bin, &h)| {
                Rectangle::new([(bin[0], 0.0), (bin[1], h)], BLACK.stroke_width(1))
            }))
            .map_err(render_err)?;

        Self::draw_curves(figure, &mut chart)
    }

    fn draw_pie<DB: DrawingBackend>(
        figure: &Figure,
        root: &DrawingArea<DB, Shift>,
        labels: &[String],
        values: &[f64],
        colors: &[Rgb],
    ) -> Result<(), ChartError> {
        let area = root
            .titled(&figure.title, Self::font(figure, TITLE_SIZE))
            .map_err(render_err)?;
        let (width, height) = area.dim_in_pixel();

        let center = ((width / 2) as i32, (height / 2) as i32);
        let radius = f64::from(width.min(height)) * 0.35;
        let wedge_colors: Vec<RGBColor> = (0..values.len())
            .map(|i| Self::color_at(colors, i))
            .collect();

        let mut pie = Pie::new(&center, &radius, values, &wedge_colors, labels);
        pie.start_angle(-90.0);
        pie.label_style(Self::font(figure, LABEL_SIZE).color(&BLACK));
        pie.percentages(Self::font(figure, LABEL_SIZE).color(&WHITE));
        area.draw(&pie).map_err(render_err)?;

        Ok(())
    }

    fn draw_curves<'a, DB: DrawingBackend + 'a>(
        figure: &Figure,
        chart: &mut PlotContext<'a, DB>,
    ) -> Result<(), ChartError> {
        let mut drawn = false;
        for mark in &figure.axes.marks {
            if let Mark::Curve {
                name,
                points,
                color,
            } = mark
            {
                let color = RGBColor::from(*color);
                chart
                    .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
                    .map_err(render_err)?
                    .label(name.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                drawn = true;
            }
        }

        if drawn {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .label_font(Self::font(figure, LABEL_SIZE))
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_err)?;
        }
        Ok(())
    }

    fn draw_annotations<DB: DrawingBackend>(
        figure: &Figure,
        root: &DrawingArea<DB, Shift>,
    ) -> Result<(), ChartError> {
        let (width, _) = root.dim_in_pixel();
        let style = TextStyle::from(Self::font(figure, LABEL_SIZE))
            .pos(Pos::new(HPos::Right, VPos::Top));
        let x = width as i32 - (MARGIN as i32) * 2;
        // Leave room for the caption and the curve legend
        let top = (MARGIN + TITLE_SIZE) as i32 + 60;

        for (i, line) in figure.axes.annotations.iter().enumerate() {
            let y = top + i as i32 * (LABEL_SIZE as i32 + 4);
            root.draw(&Text::new(line.clone(), (x, y), style.clone()))
                .map_err(render_err)?;
        }
        Ok(())
    }

    fn font(figure: &Figure, size: u32) -> FontDesc<'_> {
        (figure.font_family.as_str(), size).into_font()
    }

    fn color_at(colors: &[Rgb], i: usize) -> RGBColor {
        if colors.is_empty() {
            return Rgb::TAB_BLUE.into();
        }
        colors[i % colors.len()].into()
    }

    fn curve_ys(figure: &Figure) -> impl Iterator<Item = f64> + '_ {
        figure.axes.curves().flat_map(|(_, points)| points.iter().map(|p| p.1))
    }

    /// Axis upper bound with headroom; never zero.
    fn upper_bound(values: impl Iterator<Item = f64>) -> f64 {
        let max = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
        if max > 0.0 {
            max * 1.1
        } else {
            1.0
        }
    }
}

impl Figure {
    /// Render this figure to an SVG document.
    pub fn to_svg(&self) -> Result<String, ChartError> {
        StaticChartRenderer::render_svg(self)
    }

    /// Render this figure to an RGB bitmap of `width x height` pixels.
    pub fn to_rgb_image(&self) -> Result<RgbImage, ChartError> {
        StaticChartRenderer::render_rgb(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartPlotter;
    use crate::stats::SortOrder;
    use polars::prelude::*;

    fn sample_frame() -> DataFrame {
        df!(
            "sexo" => &["F", "M", "F", "F", "M", "F", "M", "F"],
            "idade" => &[23.0, 31.0, 27.5, 40.0, 35.0, 29.0, 26.0, 33.0],
        )
        .unwrap()
    }

    fn sample_figures() -> Vec<Figure> {
        let df = sample_frame();
        let plotter = ChartPlotter::default();
        let sexo = df.column("sexo").unwrap();
        vec![
            plotter.bar_chart(sexo, None).unwrap(),
            plotter.pie_chart(sexo, Some("Sexo")).unwrap(),
            plotter
                .horizontal_bar_chart(sexo, None, None, SortOrder::Ascending)
                .unwrap(),
            plotter.histogram_chart(df.column("idade").unwrap(), Some("Idade")).unwrap(),
        ]
    }

    #[test]
    fn test_render_svg() {
        for figure in sample_figures() {
            let svg = figure.to_svg().unwrap();
            assert!(svg.contains("<svg"), "{}", figure.title);
            assert!(svg.contains(&figure.title));
        }
    }

    #[test]
    fn test_render_svg_with_trend_curve() {
        let df = sample_frame();
        let mut config = crate::config::ChartConfig::default();
        config.trend = true;
        let figure = ChartPlotter::new(config)
            .unwrap()
            .proportion_bar_chart(df.column("sexo").unwrap(), None)
            .unwrap();

        let svg = figure.to_svg().unwrap();
        assert!(svg.contains("tendência"));
    }

    #[test]
    fn test_render_rgb_dimensions() {
        let mut figure = sample_figures().remove(3);
        figure.width = 320;
        figure.height = 200;

        let image = figure.to_rgb_image().unwrap();
        assert_eq!(image.dimensions(), (320, 200));
        // Something besides the white background was drawn
        assert!(image.pixels().any(|p| p.0 != [255, 255, 255]));
    }

    #[test]
    fn test_upper_bound() {
        assert_eq!(StaticChartRenderer::upper_bound([2.0, 10.0].into_iter()), 11.0);
        assert_eq!(StaticChartRenderer::upper_bound([0.0].into_iter()), 1.0);
        assert_eq!(StaticChartRenderer::upper_bound(std::iter::empty()), 1.0);
        assert_eq!(
            StaticChartRenderer::upper_bound([f64::NAN, 3.0].into_iter()),
            3.0 * 1.1
        );
    }

    #[test]
    fn test_color_at_cycles() {
        let colors = [Rgb::TAB_RED, Rgb::TAB_GREEN];
        assert_eq!(StaticChartRenderer::color_at(&colors, 2), RGBColor(214, 39, 40));
        assert_eq!(StaticChartRenderer::color_at(&[], 5), RGBColor(31, 119, 180));
    }
}
