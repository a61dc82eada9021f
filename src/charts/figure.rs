//! Figure Model
//! Plain-data description of a chart: one figure holding one set of axes.
//! Builders produce it, the renderer draws it, callers can inspect or export it.

use crate::charts::ChartError;
use crate::config::ConfigError;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// An RGB color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const TAB_BLUE: Rgb = Rgb(31, 119, 180);
    pub const TAB_ORANGE: Rgb = Rgb(255, 127, 14);
    pub const TAB_GREEN: Rgb = Rgb(44, 160, 44);
    pub const TAB_RED: Rgb = Rgb(214, 39, 40);

    /// Matplotlib's "tab10" qualitative palette.
    pub const TAB10: [Rgb; 10] = [
        Rgb::TAB_BLUE,
        Rgb::TAB_ORANGE,
        Rgb::TAB_GREEN,
        Rgb::TAB_RED,
        Rgb(148, 103, 189), // purple
        Rgb(140, 86, 75),   // brown
        Rgb(227, 119, 194), // pink
        Rgb(127, 127, 127), // gray
        Rgb(188, 189, 34),  // olive
        Rgb(23, 190, 207),  // cyan
    ];

    /// Cycle `palette` over `count` entries.
    pub fn cycle(palette: &[Rgb], count: usize) -> Vec<Rgb> {
        if palette.is_empty() {
            return vec![Rgb::TAB_BLUE; count];
        }
        palette.iter().copied().cycle().take(count).collect()
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.is_ascii())
            .ok_or_else(|| ConfigError::InvalidColor(value.clone()))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| ConfigError::InvalidColor(value.clone()))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
    }
}

impl From<Rgb> for RGBColor {
    fn from(color: Rgb) -> Self {
        RGBColor(color.0, color.1, color.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// A drawable element on the axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mark {
    /// One bar per category; the first category is leftmost (vertical) or topmost (horizontal).
    Bars {
        labels: Vec<String>,
        values: Vec<f64>,
        colors: Vec<Rgb>,
        orientation: Orientation,
    },
    /// Pie wedges, drawn counter-clockwise from 12 o'clock.
    Wedges {
        labels: Vec<String>,
        values: Vec<f64>,
        colors: Vec<Rgb>,
    },
    /// Contiguous bins; `edges.len() == heights.len() + 1`.
    Histogram {
        edges: Vec<f64>,
        heights: Vec<f64>,
        color: Rgb,
    },
    /// A line overlay. For bar charts x is the category index.
    Curve {
        name: String,
        points: Vec<(f64, f64)>,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub marks: Vec<Mark>,
    /// Free text drawn in the upper right corner, one entry per line.
    pub annotations: Vec<String>,
}

impl Axes {
    /// Labels and values of the first bar or wedge mark.
    pub fn categories(&self) -> Option<(&[String], &[f64])> {
        self.marks.iter().find_map(|mark| match mark {
            Mark::Bars { labels, values, .. } | Mark::Wedges { labels, values, .. } => {
                Some((labels.as_slice(), values.as_slice()))
            }
            _ => None,
        })
    }

    pub fn curves(&self) -> impl Iterator<Item = (&str, &[(f64, f64)])> {
        self.marks.iter().filter_map(|mark| match mark {
            Mark::Curve { name, points, .. } => Some((name.as_str(), points.as_slice())),
            _ => None,
        })
    }

    pub fn histogram(&self) -> Option<(&[f64], &[f64])> {
        self.marks.iter().find_map(|mark| match mark {
            Mark::Histogram { edges, heights, .. } => Some((edges.as_slice(), heights.as_slice())),
            _ => None,
        })
    }
}

/// A renderable chart: title, pixel size and its axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub axes: Axes,
}

impl Figure {
    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    pub fn axes_mut(&mut self) -> &mut Axes {
        &mut self.axes
    }

    /// Serialize the figure description as pretty JSON.
    pub fn to_json(&self) -> Result<String, ChartError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
