use doping_chart::{
    parse_records, Chart, ChartConfig, Primitive, Scene, ScenePoint, TooltipBox, TooltipLine,
};
use leptos::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_COMMIT: &str = env!("GIT_COMMIT_HASH");

async fn fetch_text(url: &str) -> Result<String, String> {
    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("fetch failed: {:?}", e))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| "fetch did not return a Response".to_string())?;
    if !response.ok() {
        return Err(format!("{} returned HTTP {}", url, response.status()));
    }
    let body = response
        .text()
        .map_err(|e| format!("failed to read body: {:?}", e))?;
    let text = JsFuture::from(body)
        .await
        .map_err(|e| format!("failed to read body: {:?}", e))?;
    text.as_string()
        .ok_or_else(|| "response body was not text".to_string())
}

async fn load_chart(config: ChartConfig) -> Result<Chart, String> {
    let text = fetch_text(&config.data_url).await?;
    let records = parse_records(text.as_bytes()).map_err(|e| e.to_string())?;
    let mut chart = Chart::new(config).map_err(|e| e.to_string())?;
    chart.render(&records).map_err(|e| e.to_string())?;
    Ok(chart)
}

fn coord(v: f64) -> String {
    format!("{:.2}", v)
}

fn frame_view(primitive: &Primitive) -> View {
    match primitive {
        Primitive::Line { from, to } => view! {
            <line x1=coord(from.0) y1=coord(from.1) x2=coord(to.0) y2=coord(to.1) stroke="black"/>
        }
        .into_view(),
        Primitive::Rect { min, max, fill } => view! {
            <rect x=coord(min.0) y=coord(min.1) width=coord(max.0 - min.0) height=coord(max.1 - min.1)
                fill=fill.as_str()/>
        }
        .into_view(),
        Primitive::Text {
            pos,
            text,
            size,
            anchor,
            rotated,
            fill,
        } => {
            let transform = if *rotated {
                format!("rotate(-90 {} {})", coord(pos.0), coord(pos.1))
            } else {
                String::new()
            };
            let color = fill.map(|c| c.as_str()).unwrap_or("black");
            view! {
                <text x=coord(pos.0) y=coord(pos.1) font-size=format!("{}px", size)
                    text-anchor=anchor.as_str() fill=color transform=transform>
                    {text.clone()}
                </text>
            }
            .into_view()
        }
    }
}

fn point_view(point: &ScenePoint, chart: StoredValue<Option<Chart>>, set_tip: WriteSignal<Option<TooltipBox>>) -> View {
    let rank = point.rank;
    let on_over = move |_: ev::MouseEvent| {
        chart.update_value(|c| {
            if let Some(chart) = c.as_mut() {
                chart.hover_start(rank);
                set_tip.set(chart.scene().tooltip);
            }
        });
    };
    let on_out = move |_: ev::MouseEvent| {
        chart.update_value(|c| {
            if let Some(chart) = c.as_mut() {
                chart.hover_end();
            }
        });
        set_tip.set(None);
    };
    view! {
        <g class="point">
            <circle class="enter" cx=coord(point.marker.cx) cy=coord(point.marker.cy) r=coord(point.marker.r)
                fill=point.marker.fill.as_str() on:mouseover=on_over on:mouseout=on_out/>
            <text x=coord(point.label.x) y=coord(point.label.y) fill=point.label.fill.as_str() font-size="10px">
                {point.label.text.clone()}
            </text>
        </g>
    }
    .into_view()
}

fn tooltip_view(tip: &TooltipBox) -> View {
    let style = format!(
        "position:absolute;left:{}px;top:{}px;width:{}px;pointer-events:none;",
        coord(tip.x),
        coord(tip.y),
        coord(tip.width)
    );
    let lines = tip
        .lines
        .iter()
        .map(|line| match line {
            TooltipLine::Text(text) => view! { <span>{text.clone()}</span><br/> }.into_view(),
            TooltipLine::Rule => view! { <hr/> }.into_view(),
        })
        .collect_view();
    view! { <div class="d3-tip" style=style>{lines}</div> }.into_view()
}

fn chart_view(scene: &Scene, chart: StoredValue<Option<Chart>>, set_tip: WriteSignal<Option<TooltipBox>>) -> View {
    let frame = scene.frame.iter().map(frame_view).collect_view();
    let points = scene
        .points
        .iter()
        .map(|p| point_view(p, chart, set_tip))
        .collect_view();
    view! {
        <svg width=coord(scene.width) height=coord(scene.height)>
            <g class="frame">{frame}</g>
            <g class="points">{points}</g>
        </svg>
    }
    .into_view()
}

#[component]
pub fn App() -> impl IntoView {
    let chart = store_value(Option::<Chart>::None);
    let (scene, set_scene) = create_signal(Option::<Scene>::None);
    let (tip, set_tip) = create_signal(Option::<TooltipBox>::None);
    let (status, set_status) = create_signal(String::from("Loading dataset…"));

    spawn_local(async move {
        match load_chart(ChartConfig::default()).await {
            Ok(loaded) => {
                set_status.set(format!("{} riders", loaded.points().len()));
                set_scene.set(Some(loaded.scene()));
                chart.set_value(Some(loaded));
            }
            Err(err) => set_status.set(format!("Failed to load dataset: {err}")),
        }
    });

    view! {
        <main class="chart">
            <p class="status">{move || status.get()}</p>
            <div id="chart-area" style="position:relative;">
                {move || scene.with(|s| s.as_ref().map(|s| chart_view(s, chart, set_tip)))}
                {move || tip.with(|t| t.as_ref().map(tooltip_view))}
            </div>
            <footer class="meta">{format!("v{APP_VERSION} ({APP_COMMIT})")}</footer>
        </main>
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(|| view! { <App/> });
}
