use serde::Serialize;
use tracing::debug;

use crate::axis::{Axis, AxisOrient, TickFormat, TickSpec, TICK_PADDING, TICK_SIZE};
use crate::config::ChartConfig;
use crate::join::{JoinPlan, Label, Marker, PointLayer, PointStyle, PointerEvent};
use crate::legend::Legend;
use crate::scale::{ColorToken, Scales};
use crate::tooltip::{Tooltip, TooltipBox, TooltipState};
use crate::{ChartError, Record};

const AXIS_FONT: f64 = 10.0;
const LEGEND_FONT: f64 = 12.0;
const TITLE_FONT: f64 = 32.0;
const AXIS_LABEL_FONT: f64 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Static drawing primitive in canvas coordinates. Text positions are
/// baseline points; `rotated` text is turned a quarter turn counter-clockwise
/// around its position.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Line {
        from: (f64, f64),
        to: (f64, f64),
    },
    Rect {
        min: (f64, f64),
        max: (f64, f64),
        fill: ColorToken,
    },
    Text {
        pos: (f64, f64),
        text: String,
        size: f64,
        anchor: TextAnchor,
        rotated: bool,
        fill: Option<ColorToken>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScenePoint {
    pub rank: u32,
    pub marker: Marker,
    pub label: Label,
}

/// Everything a backend needs to paint one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub frame: Vec<Primitive>,
    pub points: Vec<ScenePoint>,
    pub tooltip: Option<TooltipBox>,
}

/// Chart context: built once from a config, then fed records and pointer
/// events. Owns the only tooltip.
#[derive(Clone, Debug)]
pub struct Chart {
    config: ChartConfig,
    scales: Scales,
    style: PointStyle,
    x_axis: Axis,
    y_axis: Axis,
    legend: Legend,
    points: PointLayer,
    tooltip: Tooltip,
}

impl Chart {
    pub fn new(config: ChartConfig) -> Result<Self, ChartError> {
        config.validate()?;
        let scales = Scales::from_config(&config);
        let x_axis = Axis::bottom(scales.x)
            .with_ticks(TickSpec::Exact(config.x_ticks))
            .with_format(TickFormat::MinutesSeconds(config.seconds_padding));
        let y_axis = Axis::left(scales.y).with_ticks(TickSpec::Nice(config.y_ticks));
        Ok(Self {
            scales,
            style: PointStyle::from_config(&config),
            x_axis,
            y_axis,
            legend: Legend::layout(&config),
            points: PointLayer::new(),
            tooltip: Tooltip::new(config.tooltip_offset),
            config,
        })
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn scales(&self) -> &Scales {
        &self.scales
    }

    pub fn x_axis(&self) -> &Axis {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &Axis {
        &self.y_axis
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn points(&self) -> &PointLayer {
        &self.points
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    /// Bind a dataset. A tooltip showing a rider that left the chart is
    /// hidden.
    pub fn render(&mut self, records: &[Record]) -> Result<JoinPlan<u32>, ChartError> {
        let plan = self.points.bind(records, &self.scales, &self.style)?;
        let stale = match self.tooltip.state() {
            TooltipState::Shown { record, .. } => self.points.get(record.rank).is_none(),
            TooltipState::Hidden => false,
        };
        if stale {
            self.tooltip.hide();
        }
        debug!(points = self.points.len(), "chart rendered");
        Ok(plan)
    }

    /// Deliver a pointer event to the element bound to `rank`. Returns false
    /// when no such element listens for it.
    pub fn dispatch(&mut self, rank: u32, event: PointerEvent) -> bool {
        let Some(element) = self.points.get(rank) else {
            return false;
        };
        if !element.listens_to(event) {
            return false;
        }
        match event {
            PointerEvent::Over => self.tooltip.show(&element.record, element.north()),
            PointerEvent::Out => self.tooltip.hide(),
        }
        true
    }

    pub fn hover_start(&mut self, rank: u32) -> bool {
        self.dispatch(rank, PointerEvent::Over)
    }

    pub fn hover_end(&mut self) {
        self.tooltip.hide();
    }

    pub fn scene(&self) -> Scene {
        let (ox, oy) = (self.config.margins.left, self.config.margins.top);
        let width = self.config.plot_width();
        let height = self.config.plot_height();
        let mut frame = Vec::new();

        self.push_axis(&mut frame, &self.x_axis, (ox, oy + height));
        self.push_axis(&mut frame, &self.y_axis, (ox, oy));

        frame.push(Primitive::Text {
            pos: (ox + width / 2.0, oy - 50.0),
            text: self.config.title.clone(),
            size: TITLE_FONT,
            anchor: TextAnchor::Middle,
            rotated: false,
            fill: None,
        });
        frame.push(Primitive::Text {
            pos: (ox + width / 2.0, oy + height + 50.0),
            text: self.config.x_label.clone(),
            size: AXIS_LABEL_FONT,
            anchor: TextAnchor::Middle,
            rotated: false,
            fill: None,
        });
        frame.push(Primitive::Text {
            pos: (ox - 30.0, oy),
            text: self.config.y_label.clone(),
            size: AXIS_LABEL_FONT,
            anchor: TextAnchor::End,
            rotated: true,
            fill: None,
        });

        for row in &self.legend.rows {
            let ((x0, y0), (x1, y1)) = row.swatch_rect();
            frame.push(Primitive::Rect {
                min: (ox + x0, oy + y0),
                max: (ox + x1, oy + y1),
                fill: row.color,
            });
            let (tx, ty) = row.text_anchor_point();
            frame.push(Primitive::Text {
                pos: (ox + tx, oy + ty),
                text: row.label.clone(),
                size: LEGEND_FONT,
                anchor: TextAnchor::End,
                rotated: false,
                fill: None,
            });
        }

        let points = self
            .points
            .iter()
            .map(|element| ScenePoint {
                rank: element.rank,
                marker: Marker {
                    cx: ox + element.marker.cx,
                    cy: oy + element.marker.cy,
                    ..element.marker.clone()
                },
                label: Label {
                    x: ox + element.label.x,
                    y: oy + element.label.y,
                    ..element.label.clone()
                },
            })
            .collect();

        let tooltip = self.tooltip.placement().map(|placed| TooltipBox {
            x: ox + placed.x,
            y: oy + placed.y,
            ..placed
        });

        Scene {
            width: self.config.canvas_width,
            height: self.config.canvas_height,
            frame,
            points,
            tooltip,
        }
    }

    fn push_axis(&self, frame: &mut Vec<Primitive>, axis: &Axis, origin: (f64, f64)) {
        let (ox, oy) = origin;
        let (start, end) = axis.extent();
        match axis.orient() {
            AxisOrient::Bottom => {
                frame.push(Primitive::Line {
                    from: (ox + start, oy),
                    to: (ox + end, oy),
                });
                for tick in axis.ticks() {
                    let x = ox + tick.position;
                    frame.push(Primitive::Line {
                        from: (x, oy),
                        to: (x, oy + TICK_SIZE),
                    });
                    frame.push(Primitive::Text {
                        pos: (x, oy + TICK_SIZE + TICK_PADDING + AXIS_FONT * 0.71),
                        text: tick.label,
                        size: AXIS_FONT,
                        anchor: TextAnchor::Middle,
                        rotated: false,
                        fill: None,
                    });
                }
            }
            AxisOrient::Left => {
                frame.push(Primitive::Line {
                    from: (ox, oy + start),
                    to: (ox, oy + end),
                });
                for tick in axis.ticks() {
                    let y = oy + tick.position;
                    frame.push(Primitive::Line {
                        from: (ox - TICK_SIZE, y),
                        to: (ox, y),
                    });
                    frame.push(Primitive::Text {
                        pos: (ox - TICK_SIZE - TICK_PADDING, y + AXIS_FONT * 0.32),
                        text: tick.label,
                        size: AXIS_FONT,
                        anchor: TextAnchor::End,
                        rotated: false,
                        fill: None,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::{record, records};

    fn chart() -> Chart {
        Chart::new(ChartConfig::default()).unwrap()
    }

    fn texts(scene: &Scene) -> Vec<&str> {
        scene
            .frame
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn end_to_end_two_riders() {
        let mut chart = chart();
        let plan = chart
            .render(&[record(1, 0.0, ""), record(2, 40.0, "suspended")])
            .unwrap();
        assert_eq!(plan.enter, vec![1, 2]);

        let scales = *chart.scales();
        let scene = chart.scene();
        assert_eq!(scene.points.len(), 2);

        let first = &scene.points[0];
        assert_eq!(first.rank, 1);
        assert_eq!(first.marker.cx, 75.0 + scales.x.map(0.0));
        assert_eq!(first.marker.cy, 100.0 + scales.y.map(1.0));
        assert_eq!(first.marker.fill, ColorToken::Green);

        let second = &scene.points[1];
        assert_eq!(second.marker.cx, 75.0 + scales.x.map(40.0));
        assert_eq!(second.marker.cy, 100.0 + scales.y.map(2.0));
        assert_eq!(second.marker.fill, ColorToken::Red);
    }

    #[test]
    fn frame_carries_titles_ticks_and_legend() {
        let scene = chart().scene();
        assert_eq!(scene.width, 800.0);
        assert_eq!(scene.height, 700.0);
        let labels = texts(&scene);
        assert!(labels.contains(&"Doping in Professional Bicycle Racing"));
        assert!(labels.contains(&"Minutes Behind Fastest Time"));
        assert!(labels.contains(&"Ranking"));
        assert!(labels.contains(&"03:30"));
        assert!(labels.contains(&"01:45"));
        assert!(labels.contains(&"00:00"));
        assert!(labels.contains(&"35"));
        assert!(labels.contains(&"No Doping Allegations"));
        let swatches = scene
            .frame
            .iter()
            .filter(|p| matches!(p, Primitive::Rect { .. }))
            .count();
        assert_eq!(swatches, 2);
    }

    fn text_at<'a>(scene: &'a Scene, wanted: &str) -> &'a Primitive {
        scene
            .frame
            .iter()
            .find(|p| matches!(p, Primitive::Text { text, .. } if text == wanted))
            .unwrap()
    }

    #[test]
    fn titles_sit_at_fixed_canvas_positions() {
        let scene = chart().scene();
        match text_at(&scene, "Doping in Professional Bicycle Racing") {
            Primitive::Text { pos, anchor, rotated, .. } => {
                assert_eq!(*pos, (75.0 + 287.5, 50.0));
                assert_eq!(*anchor, TextAnchor::Middle);
                assert!(!*rotated);
            }
            _ => unreachable!(),
        }
        match text_at(&scene, "Minutes Behind Fastest Time") {
            Primitive::Text { pos, rotated, .. } => {
                assert_eq!(*pos, (75.0 + 287.5, 100.0 + 500.0 + 50.0));
                assert!(!*rotated);
            }
            _ => unreachable!(),
        }
        match text_at(&scene, "Ranking") {
            Primitive::Text { pos, anchor, rotated, .. } => {
                assert_eq!(*pos, (45.0, 100.0));
                assert_eq!(*anchor, TextAnchor::End);
                assert!(*rotated);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn x_axis_sits_on_plot_bottom() {
        let scene = chart().scene();
        assert!(scene.frame.contains(&Primitive::Line {
            from: (75.0, 600.0),
            to: (650.0, 600.0),
        }));
        assert!(scene.frame.contains(&Primitive::Line {
            from: (75.0, 100.0),
            to: (75.0, 600.0),
        }));
    }

    #[test]
    fn hover_drives_single_tooltip() {
        let mut chart = chart();
        chart.render(&records(&[1, 2, 3])).unwrap();
        assert!(chart.scene().tooltip.is_none());

        assert!(chart.hover_start(2));
        assert!(chart.hover_start(3));
        match chart.tooltip().state() {
            TooltipState::Shown { record, anchor } => {
                assert_eq!(record.rank, 3);
                assert_eq!(*anchor, chart.points().get(3).unwrap().north());
            }
            TooltipState::Hidden => panic!("expected tooltip"),
        }
        assert!(chart.scene().tooltip.is_some());

        chart.hover_end();
        assert!(!chart.tooltip().is_visible());
    }

    #[test]
    fn hovering_unbound_rank_is_ignored() {
        let mut chart = chart();
        chart.render(&records(&[1])).unwrap();
        assert!(!chart.hover_start(9));
        assert!(!chart.tooltip().is_visible());
    }

    #[test]
    fn pointer_out_hides_tooltip() {
        let mut chart = chart();
        chart.render(&records(&[1, 2])).unwrap();
        chart.dispatch(1, PointerEvent::Over);
        assert!(chart.dispatch(1, PointerEvent::Out));
        assert!(!chart.tooltip().is_visible());
    }

    #[test]
    fn rerender_hides_tooltip_for_exited_rider() {
        let mut chart = chart();
        chart.render(&records(&[1, 2, 3])).unwrap();
        chart.hover_start(1);
        let plan = chart.render(&records(&[2, 3, 4])).unwrap();
        assert_eq!(plan.exit, vec![1]);
        assert!(!chart.tooltip().is_visible());

        chart.hover_start(2);
        chart.render(&records(&[2, 3, 4])).unwrap();
        assert!(chart.tooltip().is_visible());
    }

    #[test]
    fn tooltip_box_is_in_canvas_coordinates() {
        let mut chart = chart();
        chart.render(&records(&[1])).unwrap();
        chart.hover_start(1);
        let north = chart.points().get(1).unwrap().north();
        let placed = chart.scene().tooltip.unwrap();
        assert!((placed.y + placed.height - (100.0 + north.1 - 10.0)).abs() < 1e-9);
        assert!((placed.x + placed.width / 2.0 - (75.0 + north.0)).abs() < 1e-9);
    }
}
