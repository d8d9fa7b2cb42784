// Marker colour cycle for legend groups

/// Plotly's default qualitative palette
pub const PLOTLY: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A",
    "#19D3F3", "#FF6692", "#B6E880", "#FF97FF", "#FECB52",
];

#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<String>,
}

impl ColorPalette {
    pub fn plotly() -> Self {
        Self {
            colors: PLOTLY.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colour for the group at `ordinal`; wraps once the palette is exhausted
    pub fn color(&self, ordinal: usize) -> &str {
        &self.colors[ordinal % self.colors.len()]
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::plotly()
    }
}
