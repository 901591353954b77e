//! Series colours.

/// Ten-colour categorical palette used when a chart names none.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#2caffe", "#544fc5", "#00e272", "#fe6a35", "#6b8abc",
    "#d568fb", "#2ee0ca", "#fa4b42", "#feb56a", "#91e8e1",
];

/// Low-to-high colour stops for heatmaps.
pub const DEFAULT_SEQUENTIAL: [&str; 2] = ["#FFFFFF", "#2caffe"];

/// Colours cycle when there are more categories than palette entries.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    /// Use `custom` if non-empty, otherwise `fallback`.
    pub fn new(custom: &[String], fallback: &[&str]) -> Self {
        let colors = if custom.is_empty() {
            fallback.iter().map(|c| c.to_string()).collect()
        } else {
            custom.to_vec()
        };
        Self { colors }
    }

    pub fn categorical(custom: &[String]) -> Self {
        Self::new(custom, &DEFAULT_PALETTE)
    }

    pub fn color(&self, i: usize) -> &str {
        &self.colors[i % self.colors.len()]
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// Evenly spaced `[position, colour]` stops from 0 to 1.
    pub fn stops(&self) -> Vec<serde_json::Value> {
        let n = self.colors.len();
        self.colors
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let pos = if n > 1 { i as f64 / (n - 1) as f64 } else { 1.0 };
                serde_json::json!([pos, c])
            })
            .collect()
    }
}
