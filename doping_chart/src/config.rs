use serde::{Deserialize, Serialize};

use crate::axis::SecondsPadding;
use crate::{ChartError, DATA_URL};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 100.0,
            right: 150.0,
            bottom: 100.0,
            left: 75.0,
        }
    }
}

/// Every constant the chart layout depends on. JSON overrides may name any
/// subset of fields; the rest keep their defaults.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub data_url: String,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub margins: Margins,
    pub x_domain: [f64; 2],
    pub y_domain: [f64; 2],
    pub x_ticks: usize,
    pub y_ticks: usize,
    pub seconds_padding: SecondsPadding,
    pub marker_radius: f64,
    pub label_offset: (f64, f64),
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_titles: [String; 2],
    pub legend_offset: (f64, f64),
    pub legend_row_step: f64,
    pub legend_swatch: f64,
    /// Tooltip displacement from its anchor as (top, left).
    pub tooltip_offset: (f64, f64),
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            data_url: DATA_URL.to_string(),
            canvas_width: 800.0,
            canvas_height: 700.0,
            margins: Margins::default(),
            x_domain: [210.0, 0.0],
            y_domain: [1.0, 36.0],
            x_ticks: 3,
            y_ticks: 10,
            seconds_padding: SecondsPadding::AppendZero,
            marker_radius: 5.0,
            label_offset: (10.0, 5.0),
            title: "Doping in Professional Bicycle Racing".to_string(),
            x_label: "Minutes Behind Fastest Time".to_string(),
            y_label: "Ranking".to_string(),
            legend_titles: [
                "No doping allegations".to_string(),
                "Riders with doping allegations".to_string(),
            ],
            legend_offset: (100.0, -125.0),
            legend_row_step: 20.0,
            legend_swatch: 10.0,
            tooltip_offset: (-10.0, 0.0),
        }
    }
}

impl ChartConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ChartError> {
        let config: ChartConfig =
            serde_json::from_str(text).map_err(|e| ChartError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn plot_width(&self) -> f64 {
        self.canvas_width - self.margins.left - self.margins.right
    }

    pub fn plot_height(&self) -> f64 {
        self.canvas_height - self.margins.top - self.margins.bottom
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        if self.plot_width() <= 0.0 || self.plot_height() <= 0.0 {
            return Err(ChartError::InvalidParameter(format!(
                "margins leave no plot area ({}x{})",
                self.plot_width(),
                self.plot_height()
            )));
        }
        if self.marker_radius < 0.0 {
            return Err(ChartError::InvalidParameter(
                "marker radius must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
