use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use doping_chart::{summarize, Chart, ChartConfig, SecondsPadding};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod draw;
mod fetch;

use draw::{render_chart_guard, ChartKind};
use fetch::DataSource;

#[derive(Parser, Debug)]
#[command(author, version, about = "Doping in professional bicycle racing scatter plot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the cyclist dataset and draw the scatter plot
    Render(RenderArgs),
    /// Summarize a dataset without drawing it
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Dataset URL or local JSON file (defaults to the published dataset)
    #[arg(value_hint = ValueHint::AnyPath)]
    source: Option<String>,

    /// Output SVG path
    #[arg(long, default_value = "chart.svg", value_hint = ValueHint::FilePath)]
    svg: PathBuf,

    /// Output PNG path
    #[arg(long, value_hint = ValueHint::FilePath)]
    png: Option<PathBuf>,

    /// Write the bound points as CSV (`-` for stdout)
    #[arg(long, value_hint = ValueHint::FilePath)]
    csv: Option<PathBuf>,

    /// Show the tooltip of the rider with this rank in the output
    #[arg(long)]
    hover: Option<u32>,

    /// Dataset to bind before SOURCE; the second bind is logged as a re-render
    #[arg(long, value_hint = ValueHint::AnyPath)]
    previous: Option<String>,

    /// JSON file overriding chart constants
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Left-pad single-digit seconds on the x-axis (02:05 rather than 02:50)
    #[arg(long, action = ArgAction::SetTrue)]
    pad_seconds: bool,

    /// Disable SVG/PNG output
    #[arg(long, action = ArgAction::SetTrue)]
    no_plot: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Dataset URL or local JSON file (defaults to the published dataset)
    #[arg(value_hint = ValueHint::AnyPath)]
    source: Option<String>,

    /// Print the summary as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Command::Render(args) => args.verbose,
        Command::Inspect(args) => args.verbose,
    };
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Render(args) => handle_render(args),
        Command::Inspect(args) => handle_inspect(args),
    }
}

fn handle_render(args: RenderArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.pad_seconds)?;
    let timeout = Duration::from_secs(args.timeout.max(1));
    let source = DataSource::parse(args.source.as_deref().unwrap_or(&config.data_url));
    let mut chart = Chart::new(config)?;

    if let Some(previous) = args.previous.as_deref() {
        let previous = DataSource::parse(previous);
        let records = previous.load(timeout)?;
        let plan = chart.render(&records)?;
        info!(
            "Bound previous dataset {}: {} points",
            previous,
            plan.enter.len()
        );
    }

    let t_fetch = Instant::now();
    let records = source.load(timeout)?;
    info!(
        "Loaded {} records from {} in {:.1} ms",
        records.len(),
        source,
        t_fetch.elapsed().as_secs_f64() * 1000.0
    );

    let plan = chart.render(&records)?;
    info!(
        "Join: {} entered, {} updated, {} exited",
        plan.enter.len(),
        plan.update.len(),
        plan.exit.len()
    );
    if args.previous.is_some() && plan.is_stable() {
        info!("Re-render kept every point; only positions and colours were refreshed");
    }

    if let Some(rank) = args.hover {
        if !chart.hover_start(rank) {
            warn!("No point with rank {}; tooltip stays hidden", rank);
        }
    }

    if let Some(csv_path) = args.csv.as_ref() {
        if csv_path.as_os_str() == "-" {
            let stdout = io::stdout();
            let mut writer = csv::Writer::from_writer(stdout.lock());
            write_point_rows(&chart, &mut writer)?;
        } else {
            write_point_csv(&chart, csv_path)?;
            info!("Wrote point table: {}", csv_path.display());
        }
    }

    if args.no_plot {
        return Ok(());
    }

    let scene = chart.scene();
    let t_plot = Instant::now();
    if let Err(err) = render_chart_guard(&scene, &args.svg, ChartKind::Svg) {
        return Err(anyhow!("SVG render failed ({}): {}", args.svg.display(), err));
    }
    info!("Wrote chart: {}", args.svg.display());

    if let Some(path) = args.png.as_ref() {
        if let Err(err) = render_chart_guard(&scene, path, ChartKind::Png) {
            warn!("Skipping PNG render ({}): {}", path.display(), err);
        } else {
            info!("Wrote chart: {}", path.display());
        }
    }
    if args.verbose {
        info!(
            "Plot stage: {:.1} ms",
            t_plot.elapsed().as_secs_f64() * 1000.0
        );
    }

    Ok(())
}

fn handle_inspect(args: InspectArgs) -> Result<()> {
    let source = match args.source.as_deref() {
        Some(input) => DataSource::parse(input),
        None => DataSource::parse(&ChartConfig::default().data_url),
    };
    let records = source.load(Duration::from_secs(args.timeout.max(1)))?;
    let summary = summarize(&records)?;

    if !summary.first_is_fastest {
        warn!(
            "First record ({} s) is not the fastest ({} s); x positions are anchored to it",
            summary.leader_seconds, summary.min_seconds
        );
    }
    if !summary.duplicate_ranks.is_empty() {
        warn!("Duplicate ranks: {:?}", summary.duplicate_ranks);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let mut report = String::new();
    report.push_str(&format!("SOURCE: {}\n", source));
    report.push_str(&format!("  records: {}\n", summary.records));
    report.push_str(&format!(
        "  with_allegations: {}\n",
        summary.with_allegations
    ));
    report.push_str(&format!("  leader_seconds: {}\n", summary.leader_seconds));
    report.push_str(&format!("  fastest_seconds: {}\n", summary.min_seconds));
    report.push_str(&format!(
        "  ranks: {}..={}\n",
        summary.rank_range.0, summary.rank_range.1
    ));
    report.push_str(&format!(
        "  years: {}..={}\n",
        summary.year_range.0, summary.year_range.1
    ));
    print!("{}", report);
    Ok(())
}

fn load_config(path: Option<&Path>, pad_seconds: bool) -> Result<ChartConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            ChartConfig::from_json_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ChartConfig::default(),
    };
    if pad_seconds {
        config.seconds_padding = SecondsPadding::LeftPad;
    }
    Ok(config)
}

fn write_point_csv(chart: &Chart, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    write_point_rows(chart, &mut writer)
}

fn write_point_rows<W: Write>(chart: &Chart, writer: &mut csv::Writer<W>) -> Result<()> {
    writer.write_record([
        "rank",
        "name",
        "year",
        "seconds",
        "cx",
        "cy",
        "fill",
        "doping",
    ])?;

    for element in chart.points().iter() {
        writer.write_record([
            element.rank.to_string(),
            element.record.name.clone(),
            element.record.year.to_string(),
            format!("{}", element.record.seconds_behind_leader),
            format!("{:.3}", element.marker.cx),
            format!("{:.3}", element.marker.cy),
            element.marker.fill.to_string(),
            element.record.doping_allegation.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doping_chart::Record;

    fn rider(rank: u32, seconds: f64, doping: &str) -> Record {
        Record {
            rank,
            seconds_behind_leader: seconds,
            name: format!("Rider {rank}"),
            nationality: "ESP".to_string(),
            year: 2001,
            time_display: "38:00".to_string(),
            doping_allegation: doping.to_string(),
            url: None,
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_render_flags() {
        let cli = Cli::try_parse_from([
            "doping-chart",
            "render",
            "data.json",
            "--hover",
            "3",
            "--pad-seconds",
            "--csv",
            "-",
        ])
        .unwrap();
        match cli.command {
            Command::Render(args) => {
                assert_eq!(args.source.as_deref(), Some("data.json"));
                assert_eq!(args.hover, Some(3));
                assert!(args.pad_seconds);
                assert_eq!(args.svg, PathBuf::from("chart.svg"));
                assert_eq!(args.csv, Some(PathBuf::from("-")));
            }
            Command::Inspect(_) => panic!("expected render"),
        }
    }

    #[test]
    fn pad_seconds_overrides_config() {
        let config = load_config(None, true).unwrap();
        assert_eq!(config.seconds_padding, SecondsPadding::LeftPad);
        let config = load_config(None, false).unwrap();
        assert_eq!(config.seconds_padding, SecondsPadding::AppendZero);
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.json");
        fs::write(&path, r#"{ "title": "Tour de France" }"#).unwrap();
        let config = load_config(Some(&path), false).unwrap();
        assert_eq!(config.title, "Tour de France");
        assert_eq!(config.canvas_height, 700.0);
    }

    #[test]
    fn point_rows_list_bound_points() {
        let mut chart = Chart::new(ChartConfig::default()).unwrap();
        chart
            .render(&[rider(1, 2210.0, ""), rider(2, 2250.0, "suspended")])
            .unwrap();
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_point_rows(&chart, &mut writer).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "rank,name,year,seconds,cx,cy,fill,doping");
        assert_eq!(lines[1], "1,Rider 1,2001,2210,575.000,0.000,green,");
        assert!(lines[2].starts_with("2,Rider 2,2001,2250,"));
        assert!(lines[2].ends_with(",red,suspended"));
    }
}
