use plotters::style::RGBAColor;

/// Chart theme configuration
#[derive(Debug, Clone)]
pub struct ChartTheme {
    pub background_color: RGBAColor,
    pub text_color: RGBAColor,
    pub grid_color: RGBAColor,
    pub axis_color: RGBAColor,
    pub bar_color: RGBAColor,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background_color: RGBAColor(255, 255, 255, 1.0),
            text_color: RGBAColor(33, 37, 41, 1.0),
            grid_color: RGBAColor(0, 0, 0, 0.1),
            axis_color: RGBAColor(33, 37, 41, 0.8),
            bar_color: RGBAColor(31, 119, 180, 0.85),
        }
    }
}

/// Chart layout configuration
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
    pub margin: u32,
    pub label_area_size: u32,
    /// Gap in pixels on each side of a bar
    pub bar_margin: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 800,
            height: 500,
            font_size: 15,
            margin: 10,
            label_area_size: 50,
            bar_margin: 12,
        }
    }
}
