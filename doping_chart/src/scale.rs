use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ChartConfig;

// Nice-step thresholds: sqrt(50), sqrt(10), sqrt(2).
const E10: f64 = 7.0710678118654755;
const E5: f64 = 3.1622776601683795;
const E2: f64 = 1.4142135623730951;

/// Linear map from a domain interval onto a pixel range. The domain may be
/// descending; values outside it extrapolate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    pub fn map(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Round-number ticks inside the domain, roughly `count` of them, in
    /// domain order.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let [d0, d1] = self.domain;
        let reverse = d1 < d0;
        let (start, stop) = if reverse { (d1, d0) } else { (d0, d1) };
        let mut ticks = match tick_spec(start, stop, count as f64) {
            Some((i1, i2, inc)) => (i1 as i64..=i2 as i64)
                .map(|i| {
                    if inc < 0.0 {
                        i as f64 / -inc
                    } else {
                        i as f64 * inc
                    }
                })
                .collect(),
            None => Vec::new(),
        };
        if reverse {
            ticks.reverse();
        }
        ticks
    }

    /// Spacing between the values returned by [`LinearScale::ticks`].
    pub fn tick_step(&self, count: usize) -> f64 {
        let [d0, d1] = self.domain;
        let (start, stop) = if d1 < d0 { (d1, d0) } else { (d0, d1) };
        match tick_spec(start, stop, count as f64) {
            Some((_, _, inc)) if inc < 0.0 => 1.0 / -inc,
            Some((_, _, inc)) => inc,
            None => 0.0,
        }
    }
}

/// Index bounds and increment for nice ticks. A negative increment encodes a
/// fractional step as its reciprocal to keep tick values exact.
fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(f64, f64, f64)> {
    if count <= 0.0 || !(stop > start) {
        return None;
    }
    let step = (stop - start) / count;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };
    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let base = 10f64.powf(-power) / factor;
        i1 = (start * base).round();
        i2 = (stop * base).round();
        if i1 / base < start {
            i1 += 1.0;
        }
        if i2 / base > stop {
            i2 -= 1.0;
        }
        inc = -base;
    } else {
        let base = 10f64.powf(power) * factor;
        i1 = (start / base).round();
        i2 = (stop / base).round();
        if i1 * base < start {
            i1 += 1.0;
        }
        if i2 * base > stop {
            i2 -= 1.0;
        }
        inc = base;
    }
    if i2 < i1 {
        if (0.5..2.0).contains(&count) {
            return tick_spec(start, stop, count * 2.0);
        }
        return None;
    }
    Some((i1, i2, inc))
}

/// The two marker colors.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Green,
    Red,
}

impl ColorToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorToken::Green => "green",
            ColorToken::Red => "red",
        }
    }

    /// CSS named-color value.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            ColorToken::Green => (0, 128, 0),
            ColorToken::Red => (255, 0, 0),
        }
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn color_of(has_allegation: bool) -> ColorToken {
    if has_allegation {
        ColorToken::Red
    } else {
        ColorToken::Green
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scales {
    pub x: LinearScale,
    pub y: LinearScale,
}

impl Scales {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            x: LinearScale::new(config.x_domain, [0.0, config.plot_width()]),
            y: LinearScale::new(config.y_domain, [0.0, config.plot_height()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn x_scale_hits_descending_endpoints() {
        let scales = Scales::from_config(&ChartConfig::default());
        assert_eq!(scales.x.domain(), [210.0, 0.0]);
        assert!(close(scales.x.map(0.0), 575.0));
        assert!(close(scales.x.map(210.0), 0.0));
        assert!(close(scales.x.map(105.0), 287.5));
    }

    #[test]
    fn y_scale_grows_downward_with_rank() {
        let scales = Scales::from_config(&ChartConfig::default());
        assert_eq!(scales.y.domain(), [1.0, 36.0]);
        assert!(close(scales.y.map(1.0), 0.0));
        assert!(close(scales.y.map(36.0), 500.0));
        assert!(scales.y.map(1.0) < scales.y.map(36.0));
        let mut prev = f64::NEG_INFINITY;
        for rank in 1..=36 {
            let y = scales.y.map(rank as f64);
            assert!(y > prev);
            prev = y;
        }
    }

    #[test]
    fn values_outside_domain_extrapolate() {
        let x = LinearScale::new([210.0, 0.0], [0.0, 575.0]);
        assert!(x.map(-42.0) > 575.0);
        assert!(x.map(420.0) < 0.0);
        assert!(close(x.map(-42.0), 575.0 + 42.0 * 575.0 / 210.0));
    }

    #[test]
    fn degenerate_domain_maps_to_midpoint() {
        let s = LinearScale::new([3.0, 3.0], [0.0, 100.0]);
        assert_eq!(s.map(3.0), 50.0);
        assert_eq!(s.map(99.0), 50.0);
    }

    #[test]
    fn color_mapping() {
        assert_eq!(color_of(true), ColorToken::Red);
        assert_eq!(color_of(false), ColorToken::Green);
        assert_eq!(color_of(true).as_str(), "red");
        assert_eq!(color_of(false).to_string(), "green");
    }

    #[test]
    fn nice_ticks_for_rank_axis() {
        let y = LinearScale::new([1.0, 36.0], [0.0, 500.0]);
        assert_eq!(y.ticks(10), vec![5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0]);
        assert_eq!(y.tick_step(10), 5.0);
    }

    #[test]
    fn nice_ticks_follow_descending_domain() {
        let x = LinearScale::new([210.0, 0.0], [0.0, 575.0]);
        assert_eq!(x.ticks(3), vec![200.0, 150.0, 100.0, 50.0, 0.0]);
    }

    #[test]
    fn fractional_ticks_stay_exact() {
        let s = LinearScale::new([0.0, 1.0], [0.0, 100.0]);
        let ticks = s.ticks(5);
        assert_eq!(ticks, vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert!(close(s.tick_step(5), 0.2));
    }
}
