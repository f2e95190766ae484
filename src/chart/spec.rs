//! Declarative chart specification.
//!
//! Serializes to a Plotly figure (`{"data": [...], "layout": {...}}`) so any
//! Plotly-compatible renderer can draw it.

use serde::{Deserialize, Serialize};

use crate::data::CellValue;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// How a trace's points are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayMode {
    #[serde(rename = "lines")]
    Lines,
    #[serde(rename = "markers")]
    Markers,
    #[serde(rename = "lines+markers")]
    LinesAndMarkers,
}

/// Y axis a trace is plotted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum YAxis {
    #[serde(rename = "y")]
    Left,
    #[serde(rename = "y2")]
    Right,
}

/// What a drag gesture on the plot area does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    Pan,
    Zoom,
}

/// X-axis interaction configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum XInteraction {
    /// Visible range slider; dragging pans so it does not fight the slider.
    #[default]
    RangeSlider,
    /// No slider; dragging zooms.
    DragZoom,
    /// No slider; dragging pans.
    None,
}

impl XInteraction {
    /// Lenient parse: `"Range Slider"`, `"range-slider"`, `"range_slider"`
    /// all work. Unrecognized input is [`XInteraction::None`].
    pub fn parse(input: &str) -> Self {
        let key: String = input
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "rangeslider" => XInteraction::RangeSlider,
            "dragzoom" => XInteraction::DragZoom,
            _ => XInteraction::None,
        }
    }

    pub fn range_slider_visible(self) -> bool {
        matches!(self, XInteraction::RangeSlider)
    }

    pub fn drag_mode(self) -> DragMode {
        match self {
            XInteraction::DragZoom => DragMode::Zoom,
            XInteraction::RangeSlider | XInteraction::None => DragMode::Pan,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            XInteraction::RangeSlider => "Range Slider",
            XInteraction::DragZoom => "Drag Zoom",
            XInteraction::None => "None",
        }
    }
}

// ---------------------------------------------------------------------------
// Traces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub size: u32,
}

/// One series on the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: Vec<CellValue>,
    pub y: Vec<CellValue>,
    pub mode: DisplayMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub line: LineStyle,
    pub yaxis: YAxis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerStyle>,
    #[serde(rename = "showlegend")]
    pub show_legend: bool,
}

impl Trace {
    /// A visible scatter trace.
    pub fn scatter(
        name: String,
        x: Vec<CellValue>,
        y: Vec<CellValue>,
        mode: DisplayMode,
        color: &str,
        axis: YAxis,
    ) -> Self {
        Trace {
            kind: "scatter",
            x,
            y,
            mode,
            name: Some(name),
            line: LineStyle {
                color: color.to_string(),
            },
            yaxis: axis,
            marker: None,
            show_legend: true,
        }
    }

    /// An invisible, legend-hidden trace with a single null point.
    pub fn placeholder(axis: YAxis) -> Self {
        Trace {
            kind: "scatter",
            x: vec![CellValue::Missing],
            y: vec![CellValue::Missing],
            mode: DisplayMode::Lines,
            name: None,
            line: LineStyle {
                color: crate::color::TRANSPARENT.to_string(),
            },
            yaxis: axis,
            marker: None,
            show_legend: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !self.show_legend && self.name.is_none()
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

impl Title {
    pub fn plain(text: impl Into<String>) -> Self {
        Title {
            text: text.into(),
            font: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSlider {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XAxisLayout {
    pub title: Title,
    pub rangeslider: RangeSlider,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YAxisLayout {
    pub title: Title,
    pub tickfont: Font,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<&'static str>,
}

impl YAxisLayout {
    pub fn colored(title: String, color: &str) -> Self {
        YAxisLayout {
            title: Title {
                text: title,
                font: Some(Font {
                    size: None,
                    color: color.to_string(),
                }),
            },
            tickfont: Font {
                size: None,
                color: color.to_string(),
            },
            overlaying: None,
            side: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub x: f64,
    pub y: f64,
}

/// Free-text note pinned to the top-right corner of the plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub showarrow: bool,
    pub xref: &'static str,
    pub yref: &'static str,
    pub x: f64,
    pub y: f64,
    pub xanchor: &'static str,
    pub yanchor: &'static str,
    pub align: &'static str,
    pub font: Font,
    pub bgcolor: &'static str,
    pub bordercolor: &'static str,
    pub borderwidth: u32,
    pub borderpad: u32,
    pub opacity: f64,
}

impl Annotation {
    /// Note text with line breaks kept.
    pub fn note(text: &str) -> Self {
        Annotation {
            text: text.replace("\r\n", "\n").replace('\n', "<br>"),
            showarrow: false,
            xref: "paper",
            yref: "paper",
            x: 1.0,
            y: 1.0,
            xanchor: "right",
            yanchor: "top",
            align: "right",
            font: Font {
                size: Some(12),
                color: "black".to_string(),
            },
            bgcolor: "rgba(255, 255, 255, 0.7)",
            bordercolor: "lightgray",
            borderwidth: 1,
            borderpad: 4,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: XAxisLayout,
    pub yaxis: YAxisLayout,
    pub yaxis2: YAxisLayout,
    pub dragmode: DragMode,
    pub hovermode: &'static str,
    pub legend: Legend,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

// ---------------------------------------------------------------------------
// ChartSpec
// ---------------------------------------------------------------------------

/// A complete dual-axis chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl ChartSpec {
    pub fn traces(&self) -> &[Trace] {
        &self.data
    }

    /// Traces that show up in the legend.
    pub fn visible_traces(&self) -> impl Iterator<Item = &Trace> {
        self.data.iter().filter(|t| !t.is_placeholder())
    }

    /// Placeholder traces that only keep an axis alive.
    pub fn placeholder_traces(&self) -> impl Iterator<Item = &Trace> {
        self.data.iter().filter(|t| t.is_placeholder())
    }

    pub fn traces_on(&self, axis: YAxis) -> impl Iterator<Item = &Trace> {
        self.data.iter().filter(move |t| t.yaxis == axis)
    }

    /// Annotation text, if the chart carries a note.
    pub fn note(&self) -> Option<&str> {
        self.layout.annotations.first().map(|a| a.text.as_str())
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_parse() {
        assert_eq!(XInteraction::parse("Range Slider"), XInteraction::RangeSlider);
        assert_eq!(XInteraction::parse("range-slider"), XInteraction::RangeSlider);
        assert_eq!(XInteraction::parse("Drag Zoom"), XInteraction::DragZoom);
        assert_eq!(XInteraction::parse("drag_zoom"), XInteraction::DragZoom);
        assert_eq!(XInteraction::parse("scroll"), XInteraction::None);
        assert_eq!(XInteraction::parse(""), XInteraction::None);
    }

    #[test]
    fn test_interaction_settings() {
        assert!(XInteraction::RangeSlider.range_slider_visible());
        assert_eq!(XInteraction::RangeSlider.drag_mode(), DragMode::Pan);
        assert!(!XInteraction::DragZoom.range_slider_visible());
        assert_eq!(XInteraction::DragZoom.drag_mode(), DragMode::Zoom);
        assert!(!XInteraction::None.range_slider_visible());
        assert_eq!(XInteraction::None.drag_mode(), DragMode::Pan);
    }

    #[test]
    fn test_placeholder_serializes_nulls() {
        let json = serde_json::to_value(Trace::placeholder(YAxis::Right)).unwrap();
        assert_eq!(json["x"], serde_json::json!([null]));
        assert_eq!(json["y"], serde_json::json!([null]));
        assert_eq!(json["yaxis"], "y2");
        assert_eq!(json["showlegend"], false);
        assert_eq!(json["line"]["color"], "rgba(0,0,0,0)");
        assert!(json.get("name").is_none());
    }

    #[test]
    fn test_note_keeps_line_breaks() {
        assert_eq!(Annotation::note("a\nb\r\nc").text, "a<br>b<br>c");
    }

    #[test]
    fn test_display_mode_names() {
        assert_eq!(serde_json::to_value(DisplayMode::LinesAndMarkers).unwrap(), "lines+markers");
        let mode: DisplayMode = serde_json::from_str("\"markers\"").unwrap();
        assert_eq!(mode, DisplayMode::Markers);
    }
}
