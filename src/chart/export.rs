use std::path::{Path, PathBuf};

use thiserror::Error;

use super::spec::ChartSpec;

/// Plotly bundle referenced by exported documents.
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Directory finalized charts are written to by default.
pub const DEFAULT_OUTPUT_DIR: &str = "saved_graphs";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("serializing chart: {0}")]
    Json(#[from] serde_json::Error),

    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where an exported page gets the Plotly library from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlotlyScript {
    /// `<script src>` pointing at [`PLOTLY_CDN`]; needs network access to view.
    #[default]
    Cdn,
    /// The bundle's source inlined into the page, for offline viewing.
    Inline(String),
}

impl PlotlyScript {
    /// Read a local `plotly.min.js` to inline.
    pub fn from_file(path: &Path) -> Result<Self, ExportError> {
        std::fs::read_to_string(path)
            .map(PlotlyScript::Inline)
            .map_err(|source| ExportError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    fn tag(&self) -> String {
        match self {
            PlotlyScript::Cdn => format!(r#"<script src="{PLOTLY_CDN}"></script>"#),
            PlotlyScript::Inline(source) => {
                format!("<script type=\"text/javascript\">\n{source}\n</script>")
            }
        }
    }
}

/// Render an HTML page that draws `spec` with Plotly loaded from its CDN.
pub fn render_html(spec: &ChartSpec) -> Result<String, ExportError> {
    render_html_with(spec, &PlotlyScript::Cdn)
}

/// Render an HTML page that draws `spec`, taking Plotly from `script`.
pub fn render_html_with(spec: &ChartSpec, script: &PlotlyScript) -> Result<String, ExportError> {
    // `</` would end the script element early.
    let figure = spec.to_json_string()?.replace("</", "<\\/");
    let title = escape_html(&spec.layout.title.text);
    let plotly = script.tag();

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
{plotly}
<style>
  html, body {{ margin: 0; height: 100%; }}
  #chart {{ width: 100%; height: 100vh; }}
</style>
</head>
<body>
<div id="chart"></div>
<script type="text/javascript">
  const figure = {figure};
  Plotly.newPlot("chart", figure.data, figure.layout, {{ responsive: true }});
</script>
</body>
</html>
"#
    ))
}

/// File stem for a chart title: spaces become `_`, slashes become `-`.
pub fn safe_file_stem(title: &str) -> String {
    let stem = title.trim().replace(' ', "_").replace('/', "-");
    if stem.is_empty() {
        "chart".to_string()
    } else {
        stem
    }
}

/// Write `spec` as `<dir>/<safe title>.html`, creating `dir` if needed.
pub fn save_html(spec: &ChartSpec, dir: &Path, title: &str) -> Result<PathBuf, ExportError> {
    let html = render_html(spec)?;

    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(format!("{}.html", safe_file_stem(title)));
    std::fs::write(&path, html).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    log::info!("Graph saved to {}", path.display());
    Ok(path)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
