use std::cell::Cell;
use std::panic;
use std::path::Path;
use std::rc::Rc;

use anyhow::Result;
use doping_chart::{ColorToken, Primitive, Scene, TextAnchor, TooltipBox, TooltipLine};
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle, FontTransform};
use plotters_backend::{
    text_anchor::{HPos, Pos, VPos},
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend,
    DrawingErrorKind,
};
use tracing::warn;

const POINT_LABEL_FONT: f64 = 10.0;
const TOOLTIP_FONT: f64 = 12.0;
const TOOLTIP_LINE_HEIGHT: f64 = 16.0;
const TOOLTIP_PADDING: f64 = 8.0;

pub enum ChartKind {
    Png,
    Svg,
}

/// Render `scene`, turning backend panics into an error string.
pub fn render_chart_guard(scene: &Scene, path: &Path, kind: ChartKind) -> Result<(), String> {
    let render = || render_scene(scene, path, kind).map_err(|e| format!("plotting error: {}", e));

    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| "plotting backend panicked".to_string())?
}

fn render_scene(scene: &Scene, path: &Path, kind: ChartKind) -> Result<()> {
    let size = (scene.width.round() as u32, scene.height.round() as u32);
    let skipped = Rc::new(Cell::new(0usize));
    match kind {
        ChartKind::Png => {
            let backend = BitMapBackend::new(path, size);
            let root = FontSafeBackend::new(backend, skipped.clone()).into_drawing_area();
            draw_scene(root, scene)?;
        }
        ChartKind::Svg => {
            let backend = SVGBackend::new(path, size);
            let root = FontSafeBackend::new(backend, skipped.clone()).into_drawing_area();
            draw_scene(root, scene)?;
        }
    }
    if skipped.get() > 0 {
        warn!(
            "{} text labels skipped in {} (no usable font)",
            skipped.get(),
            path.display()
        );
    }
    Ok(())
}

fn rgb(token: ColorToken) -> RGBColor {
    let (r, g, b) = token.rgb();
    RGBColor(r, g, b)
}

fn px(point: (f64, f64)) -> (i32, i32) {
    (point.0.round() as i32, point.1.round() as i32)
}

fn h_pos(anchor: TextAnchor) -> HPos {
    match anchor {
        TextAnchor::Start => HPos::Left,
        TextAnchor::Middle => HPos::Center,
        TextAnchor::End => HPos::Right,
    }
}

pub fn draw_scene<DB>(root: DrawingArea<DB, plotters::coord::Shift>, scene: &Scene) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    for primitive in &scene.frame {
        match primitive {
            Primitive::Line { from, to } => {
                root.draw(&PathElement::new(vec![px(*from), px(*to)], &BLACK))?;
            }
            Primitive::Rect { min, max, fill } => {
                root.draw(&Rectangle::new([px(*min), px(*max)], rgb(*fill).filled()))?;
            }
            Primitive::Text {
                pos,
                text,
                size,
                anchor,
                rotated,
                fill,
            } => {
                let color = fill.map(rgb).unwrap_or(BLACK);
                let mut font = FontDesc::new(FontFamily::SansSerif, *size, FontStyle::Normal);
                if *rotated {
                    font = font.transform(FontTransform::Rotate270);
                }
                let style = font
                    .color(&color)
                    .pos(Pos::new(h_pos(*anchor), VPos::Bottom));
                root.draw(&Text::new(text.clone(), px(*pos), style))?;
            }
        }
    }

    let label_font = FontDesc::new(FontFamily::SansSerif, POINT_LABEL_FONT, FontStyle::Normal);
    for point in &scene.points {
        let color = rgb(point.marker.fill);
        root.draw(&Circle::new(
            px((point.marker.cx, point.marker.cy)),
            point.marker.r.round() as i32,
            color.filled(),
        ))?;
        let style = label_font
            .color(&rgb(point.label.fill))
            .pos(Pos::new(HPos::Left, VPos::Bottom));
        root.draw(&Text::new(
            point.label.text.clone(),
            px((point.label.x, point.label.y)),
            style,
        ))?;
    }

    if let Some(tooltip) = scene.tooltip.as_ref() {
        draw_tooltip(&root, tooltip)?;
    }

    root.present()?;
    Ok(())
}

fn draw_tooltip<DB>(root: &DrawingArea<DB, plotters::coord::Shift>, tooltip: &TooltipBox) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.draw(&Rectangle::new(
        [
            px((tooltip.x, tooltip.y)),
            px((tooltip.x + tooltip.width, tooltip.y + tooltip.height)),
        ],
        BLACK.mix(0.8).filled(),
    ))?;

    let font = FontDesc::new(FontFamily::SansSerif, TOOLTIP_FONT, FontStyle::Normal);
    let left = tooltip.x + TOOLTIP_PADDING;
    for (idx, line) in tooltip.lines.iter().enumerate() {
        let top = tooltip.y + TOOLTIP_PADDING + idx as f64 * TOOLTIP_LINE_HEIGHT;
        match line {
            TooltipLine::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                let style = font.color(&WHITE).pos(Pos::new(HPos::Left, VPos::Top));
                root.draw(&Text::new(text.clone(), px((left, top)), style))?;
            }
            TooltipLine::Rule => {
                let y = top + TOOLTIP_LINE_HEIGHT / 2.0;
                root.draw(&PathElement::new(
                    vec![
                        px((left, y)),
                        px((tooltip.x + tooltip.width - TOOLTIP_PADDING, y)),
                    ],
                    &WHITE,
                ))?;
            }
        }
    }
    Ok(())
}

/// Wraps a backend so a missing system font does not abort the whole chart:
/// text the inner backend panics on is skipped and counted.
struct FontSafeBackend<DB> {
    inner: DB,
    skipped: Rc<Cell<usize>>,
}

impl<DB> FontSafeBackend<DB> {
    fn new(inner: DB, skipped: Rc<Cell<usize>>) -> Self {
        Self { inner, skipped }
    }
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        match panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.inner.draw_text(text, style, pos)
        })) {
            Ok(result) => result,
            Err(_) => {
                self.skipped.set(self.skipped.get() + 1);
                Ok(())
            }
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        self.inner.estimate_text_size(text, style)
    }
}
