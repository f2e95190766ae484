use palette::Srgb;

// ---------------------------------------------------------------------------
// Dataset colour pairs
// ---------------------------------------------------------------------------

/// Fixed (left axis, right axis) colour pairs, cycled by dataset index.
pub const COLOR_PAIRS: [(&str, &str); 8] = [
    ("#1f77b4", "#ff7f0e"),
    ("#2ca02c", "#d62728"),
    ("#9467bd", "#8c564b"),
    ("#e377c2", "#7f7f7f"),
    ("#bcbd22", "#17becf"),
    ("#393b79", "#637939"),
    ("#8c6d31", "#843c39"),
    ("#7b4173", "#3182bd"),
];

/// Colour of the placeholder trace that keeps an empty right axis alive.
pub const TRANSPARENT: &str = "rgba(0,0,0,0)";

/// Colours for one dataset's left-axis and right-axis traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub left: &'static str,
    pub right: &'static str,
}

impl ColorPair {
    /// Pair for the dataset at `index`, wrapping around the palette.
    pub fn for_dataset(index: usize) -> Self {
        let (left, right) = COLOR_PAIRS[index % COLOR_PAIRS.len()];
        ColorPair { left, right }
    }
}

/// Parse a `#rrggbb` / `#rgb` colour. `None` for anything else, including
/// `rgba(...)` strings.
pub fn parse_hex(color: &str) -> Option<Srgb<u8>> {
    color.parse::<Srgb<u8>>().ok()
}
