use serde::{Deserialize, Serialize};

use crate::scale::LinearScale;

/// Length of tick marks, outward from the axis line.
pub const TICK_SIZE: f64 = 6.0;
/// Gap between a tick mark and its label.
pub const TICK_PADDING: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisOrient {
    Bottom,
    Left,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickSpec {
    /// Round-number ticks; the count is a hint.
    Nice(usize),
    /// Exactly this many ticks, evenly spaced from the first domain bound to
    /// the second.
    Exact(usize),
}

/// How single-digit seconds are padded in `mm:ss` labels.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SecondsPadding {
    /// Append a trailing zero: 5 seconds renders as "50". Matches the
    /// published chart.
    #[default]
    AppendZero,
    /// Conventional left padding: 5 seconds renders as "05".
    LeftPad,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickFormat {
    Numeric,
    MinutesSeconds(SecondsPadding),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub value: f64,
    /// Pixel offset along the axis.
    pub position: f64,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    orient: AxisOrient,
    scale: LinearScale,
    spec: TickSpec,
    format: TickFormat,
}

impl Axis {
    pub fn bottom(scale: LinearScale) -> Self {
        Self {
            orient: AxisOrient::Bottom,
            scale,
            spec: TickSpec::Nice(10),
            format: TickFormat::Numeric,
        }
    }

    pub fn left(scale: LinearScale) -> Self {
        Self {
            orient: AxisOrient::Left,
            scale,
            spec: TickSpec::Nice(10),
            format: TickFormat::Numeric,
        }
    }

    pub fn with_ticks(mut self, spec: TickSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn with_format(mut self, format: TickFormat) -> Self {
        self.format = format;
        self
    }

    pub fn orient(&self) -> AxisOrient {
        self.orient
    }

    /// Pixel extent of the axis line.
    pub fn extent(&self) -> (f64, f64) {
        let [r0, r1] = self.scale.range();
        (r0.min(r1), r0.max(r1))
    }

    pub fn ticks(&self) -> Vec<Tick> {
        let (values, step) = match self.spec {
            TickSpec::Nice(count) => (self.scale.ticks(count), self.scale.tick_step(count)),
            TickSpec::Exact(count) => {
                let values = evenly_spaced(self.scale.domain(), count);
                let step = if values.len() > 1 {
                    (values[1] - values[0]).abs()
                } else {
                    1.0
                };
                (values, step)
            }
        };
        values
            .into_iter()
            .map(|value| Tick {
                value,
                position: self.scale.map(value),
                label: self.label(value, step),
            })
            .collect()
    }

    fn label(&self, value: f64, step: f64) -> String {
        match self.format {
            TickFormat::Numeric => format_numeric(value, step),
            TickFormat::MinutesSeconds(padding) => format_minutes_seconds_with(value, padding),
        }
    }
}

fn evenly_spaced(domain: [f64; 2], count: usize) -> Vec<f64> {
    let [d0, d1] = domain;
    match count {
        0 => Vec::new(),
        1 => vec![d0],
        n => (0..n)
            .map(|i| d0 + (d1 - d0) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Label with as many decimals as the tick step needs.
fn format_numeric(value: f64, step: f64) -> String {
    if step >= 1.0 || step <= 0.0 {
        format!("{:.0}", value)
    } else {
        let decimals = (-step.log10()).ceil().max(0.0) as usize;
        format!("{:.*}", decimals, value)
    }
}

/// `mm:ss` with the chart's historical padding (5 seconds renders "50").
pub fn format_minutes_seconds(seconds: f64) -> String {
    format_minutes_seconds_with(seconds, SecondsPadding::AppendZero)
}

pub fn format_minutes_seconds_with(seconds: f64, padding: SecondsPadding) -> String {
    let mins = (seconds / 60.0).floor();
    let secs = seconds % 60.0;
    let mm = if mins < 10.0 {
        format!("0{}", mins)
    } else {
        format!("{}", mins)
    };
    let ss = match padding {
        SecondsPadding::AppendZero if secs < 10.0 => format!("{}0", secs),
        SecondsPadding::LeftPad if secs < 10.0 => format!("0{}", secs),
        _ => format!("{}", secs),
    };
    format!("{mm}:{ss}")
}
