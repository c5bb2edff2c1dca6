use crate::Record;

const LINE_HEIGHT: f64 = 16.0;
const CHAR_WIDTH: f64 = 7.0;
const PADDING: f64 = 8.0;

#[derive(Clone, Debug, PartialEq)]
pub enum TooltipState {
    Hidden,
    Shown {
        record: Box<Record>,
        anchor: (f64, f64),
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TooltipLine {
    Text(String),
    Rule,
}

/// Placed overlay in plot coordinates: the box sits above its anchor, centered
/// horizontally, then shifted by the configured offset.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub lines: Vec<TooltipLine>,
}

/// The single hover overlay shared by every point.
#[derive(Clone, Debug)]
pub struct Tooltip {
    state: TooltipState,
    offset: (f64, f64),
}

impl Tooltip {
    /// `offset` is (top, left), added to the anchor before placement.
    pub fn new(offset: (f64, f64)) -> Self {
        Self {
            state: TooltipState::Hidden,
            offset,
        }
    }

    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, TooltipState::Shown { .. })
    }

    pub fn show(&mut self, record: &Record, anchor: (f64, f64)) {
        self.state = TooltipState::Shown {
            record: Box::new(record.clone()),
            anchor,
        };
    }

    pub fn hide(&mut self) {
        self.state = TooltipState::Hidden;
    }

    pub fn lines(&self) -> Option<Vec<TooltipLine>> {
        match &self.state {
            TooltipState::Hidden => None,
            TooltipState::Shown { record, .. } => Some(content_lines(record)),
        }
    }

    pub fn placement(&self) -> Option<TooltipBox> {
        let TooltipState::Shown { anchor, .. } = &self.state else {
            return None;
        };
        let lines = self.lines()?;
        let widest = lines
            .iter()
            .map(|line| match line {
                TooltipLine::Text(text) => text.chars().count(),
                TooltipLine::Rule => 0,
            })
            .max()
            .unwrap_or(0);
        let width = widest as f64 * CHAR_WIDTH + 2.0 * PADDING;
        let height = lines.len() as f64 * LINE_HEIGHT + 2.0 * PADDING;
        let (top, left) = self.offset;
        Some(TooltipBox {
            x: anchor.0 + left - width / 2.0,
            y: anchor.1 + top - height,
            width,
            height,
            lines,
        })
    }
}

fn content_lines(record: &Record) -> Vec<TooltipLine> {
    vec![
        TooltipLine::Text(format!("{}({})", record.name, record.nationality)),
        TooltipLine::Text(format!(
            "Year: {} Time: {}({})",
            record.year,
            record.time_display,
            record.place_display()
        )),
        TooltipLine::Rule,
        TooltipLine::Text(record.doping_allegation.clone()),
    ]
}
