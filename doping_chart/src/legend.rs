use crate::config::ChartConfig;
use crate::scale::{color_of, ColorToken};

#[derive(Clone, Debug, PartialEq)]
pub struct LegendRow {
    /// Display text, capitalized word by word.
    pub label: String,
    pub color: ColorToken,
    /// Row origin in plot coordinates.
    pub origin: (f64, f64),
    pub swatch_size: f64,
    /// Right edge of the label, relative to the row origin.
    pub text_offset: (f64, f64),
}

impl LegendRow {
    pub fn swatch_rect(&self) -> ((f64, f64), (f64, f64)) {
        let (x, y) = self.origin;
        ((x, y), (x + self.swatch_size, y + self.swatch_size))
    }

    pub fn text_anchor_point(&self) -> (f64, f64) {
        (
            self.origin.0 + self.text_offset.0,
            self.origin.1 + self.text_offset.1,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    pub origin: (f64, f64),
    pub rows: Vec<LegendRow>,
}

impl Legend {
    /// Lay out one row per category: clean riders first, then riders with an
    /// allegation.
    pub fn layout(config: &ChartConfig) -> Self {
        let origin = (
            config.plot_width() + config.legend_offset.0,
            config.plot_height() + config.legend_offset.1,
        );
        let rows = config
            .legend_titles
            .iter()
            .enumerate()
            .map(|(i, title)| LegendRow {
                label: capitalize_words(title),
                color: color_of(i > 0),
                origin: (origin.0, origin.1 + i as f64 * config.legend_row_step),
                swatch_size: config.legend_swatch,
                text_offset: (-10.0, config.legend_swatch),
            })
            .collect();
        Self { origin, rows }
    }
}

fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_rows_stacked_by_fixed_step() {
        let legend = Legend::layout(&ChartConfig::default());
        assert_eq!(legend.origin, (675.0, 375.0));
        assert_eq!(legend.rows.len(), 2);
        assert_eq!(legend.rows[0].origin, (675.0, 375.0));
        assert_eq!(legend.rows[1].origin, (675.0, 395.0));
        assert_eq!(legend.rows[0].color, ColorToken::Green);
        assert_eq!(legend.rows[1].color, ColorToken::Red);
    }

    #[test]
    fn labels_are_right_anchored_left_of_swatch() {
        let legend = Legend::layout(&ChartConfig::default());
        let row = &legend.rows[1];
        assert_eq!(row.label, "Riders With Doping Allegations");
        assert_eq!(row.text_anchor_point(), (665.0, 405.0));
        assert_eq!(row.swatch_rect(), ((675.0, 395.0), (685.0, 405.0)));
    }

    #[test]
    fn capitalizes_each_word() {
        assert_eq!(capitalize_words("no doping allegations"), "No Doping Allegations");
        assert_eq!(capitalize_words(""), "");
    }
}
