use anyhow::{anyhow, Context, Result};
use clap::Parser;
use forage_core::analysis::{self, InequalityReport};
use forage_core::{
    BoundaryPolicy, NoTargetBehavior, PopulationLayout, SensingShape, SignalSchedule, SimConfig,
    Simulation, TargetSelection,
};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const CSV_HEADER: &str = "sample_name,number_of_players,number_of_incentives,mean_wealth,\
median_wealth,std_wealth,skewness,kurtosis,gini_coefficient";

/// Run one foraging simulation and record its wealth inequality.
#[derive(Parser, Debug)]
#[command(name = "forage", version)]
struct Args {
    /// JSON file with a full or partial SimConfig; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    players: Option<usize>,
    #[arg(long, value_parser = parse_snake::<PopulationLayout>)]
    layout: Option<PopulationLayout>,
    #[arg(long)]
    resources: Option<usize>,
    #[arg(long)]
    sensing_radius: Option<f64>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    ticks: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_parser = parse_snake::<BoundaryPolicy>)]
    boundary: Option<BoundaryPolicy>,
    #[arg(long, value_parser = parse_snake::<SensingShape>)]
    sensing: Option<SensingShape>,
    #[arg(long, value_parser = parse_snake::<NoTargetBehavior>)]
    no_target: Option<NoTargetBehavior>,
    #[arg(long, value_parser = parse_snake::<TargetSelection>)]
    selection: Option<TargetSelection>,
    /// Tick at which to speed everything up (repeatable).
    #[arg(long = "speed-up-at")]
    speed_up_at: Vec<usize>,
    /// Tick at which to slow everything down (repeatable).
    #[arg(long = "speed-down-at")]
    speed_down_at: Vec<usize>,
    #[arg(long, default_value_t = 100)]
    sample_every: usize,
    /// Defaults to `PIDC_single_plyr_<players>_inctvs_<resources>`.
    #[arg(long)]
    sample_name: Option<String>,
    #[arg(long, default_value = "experiment_results.csv")]
    csv: PathBuf,
    #[arg(long, default_value = "LorenzPlots")]
    plots_dir: PathBuf,
    /// Also write the full run summary as JSON.
    #[arg(long)]
    summary_json: Option<PathBuf>,
    /// TrueType font for plot labels; common system fonts are tried otherwise.
    #[arg(long)]
    font: Option<PathBuf>,
}

fn parse_snake<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let tag = raw.replace('-', "_");
    serde_json::from_value(serde_json::Value::String(tag))
        .map_err(|_| format!("unrecognized value `{raw}`"))
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(v) = args.players {
        config.population_size = v;
    }
    if let Some(v) = args.layout {
        config.population_layout = v;
    }
    if let Some(v) = args.resources {
        config.resource_density = v;
    }
    if let Some(v) = args.sensing_radius {
        config.sensing_radius = v;
    }
    if let Some(v) = args.width {
        config.world_width = v;
    }
    if let Some(v) = args.height {
        config.world_height = v;
    }
    if let Some(v) = args.ticks {
        config.tick_limit = v;
    }
    if let Some(v) = args.seed {
        config.seed = v;
    }
    if let Some(v) = args.boundary {
        config.boundary_policy = v;
    }
    if let Some(v) = args.sensing {
        config.sensing_shape = v;
    }
    if let Some(v) = args.no_target {
        config.no_target_behavior = v;
    }
    if let Some(v) = args.selection {
        config.target_selection = v;
    }
    Ok(config)
}

fn csv_field(raw: &str) -> String {
    if raw.contains(&[',', '"', '\n'][..]) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn append_csv_row(
    path: &Path,
    sample_name: &str,
    players: usize,
    incentives: usize,
    report: &InequalityReport,
) -> Result<()> {
    let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut out = BufWriter::new(file);
    if is_new {
        writeln!(out, "{CSV_HEADER}")?;
    }
    writeln!(
        out,
        "{},{},{},{},{},{},{},{},{}",
        csv_field(sample_name),
        players,
        incentives,
        report.mean,
        report.median,
        report.std_dev,
        report.skewness,
        report.kurtosis,
        report.gini
    )?;
    out.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct LorenzArtifact<'a> {
    sample_name: &'a str,
    gini_coefficient: f64,
    degenerate: bool,
    population_fractions: &'a [f64],
    wealth_fractions: &'a [f64],
}

/// Register a font for plot text. Returns false when none could be loaded,
/// in which case the plot is drawn without text.
fn register_plot_font(explicit: Option<&Path>) -> bool {
    let candidates = explicit
        .into_iter()
        .map(Path::to_path_buf)
        .chain(FONT_CANDIDATES.iter().map(|p| PathBuf::from(*p)));
    for path in candidates {
        let Ok(bytes) = fs::read(&path) else {
            continue;
        };
        // The font registry keeps a 'static borrow for the life of the process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        if register_font("sans-serif", FontStyle::Normal, bytes).is_ok() {
            info!(font = %path.display(), "plot font loaded");
            return true;
        }
    }
    warn!("no usable font found; Lorenz plot is drawn without labels");
    false
}

fn draw_lorenz<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    report: &InequalityReport,
    labels: bool,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let mut builder = ChartBuilder::on(root);
    builder.margin(30);
    if labels {
        builder
            .caption("Lorenz Curve", ("sans-serif", 28))
            .x_label_area_size(45)
            .y_label_area_size(55);
    }
    let mut chart = builder.build_cartesian_2d(0f64..1f64, 0f64..1f64)?;
    if labels {
        chart
            .configure_mesh()
            .x_desc("Cumulative share of players")
            .y_desc("Cumulative share of wealth")
            .draw()?;
    } else {
        chart.plotting_area().draw(&Rectangle::new(
            [(0.0, 0.0), (1.0, 1.0)],
            BLACK.stroke_width(1),
        ))?;
    }

    let curve: Vec<(f64, f64)> = report.lorenz.points().collect();
    // The polygon closes from (1, 1) back to (0, 0) along the equality line.
    chart.draw_series(std::iter::once(Polygon::new(
        curve.clone(),
        BLUE.mix(0.2).filled(),
    )))?;
    chart.draw_series(LineSeries::new(
        [(0.0, 0.0), (1.0, 1.0)],
        BLACK.stroke_width(1),
    ))?;
    chart.draw_series(LineSeries::new(curve, BLUE.stroke_width(2)))?;

    if labels {
        let (x, y) = chart.backend_coord(&(0.05, 0.9));
        root.draw(&Text::new(
            format!("Gini Coefficient: {:.2}", report.gini),
            (x, y),
            ("sans-serif", 22).into_font(),
        ))?;
    }
    Ok(())
}

/// Render `<dir>/<sample>_lorenz_curve.png` and write the curve points beside
/// it as `<sample>_lorenz_curve.json`. Returns the image path.
fn write_lorenz_curve(
    dir: &Path,
    sample_name: &str,
    report: &InequalityReport,
    labels: bool,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let png_path = dir.join(format!("{sample_name}_lorenz_curve.png"));
    {
        let root = BitMapBackend::new(&png_path, (720, 720)).into_drawing_area();
        draw_lorenz(&root, report, labels)
            .and_then(|()| root.present())
            .map_err(|e| anyhow!("rendering {}: {e}", png_path.display()))?;
    }

    let json_path = dir.join(format!("{sample_name}_lorenz_curve.json"));
    let artifact = LorenzArtifact {
        sample_name,
        gini_coefficient: report.gini,
        degenerate: report.degenerate,
        population_fractions: &report.lorenz.population_fractions,
        wealth_fractions: &report.lorenz.wealth_fractions,
    };
    let file =
        fs::File::create(&json_path).with_context(|| format!("creating {}", json_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &artifact)?;
    Ok(png_path)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let schedule = SignalSchedule {
        speed_up: args.speed_up_at.clone(),
        speed_down: args.speed_down_at.clone(),
    };

    let mut sim = Simulation::new(config).context("building simulation")?;
    let summary = sim
        .run(&schedule, args.sample_every)
        .context("running simulation")?;
    let report = analysis::analyze(&summary.final_wealth).context("analyzing wealth")?;

    let sample_name = args.sample_name.clone().unwrap_or_else(|| {
        format!(
            "PIDC_single_plyr_{}_inctvs_{}",
            summary.population_size, summary.initial_resources
        )
    });

    append_csv_row(
        &args.csv,
        &sample_name,
        summary.population_size,
        summary.initial_resources,
        &report,
    )?;
    let labels = register_plot_font(args.font.as_deref());
    let curve_path = write_lorenz_curve(&args.plots_dir, &sample_name, &report, labels)?;
    if let Some(path) = &args.summary_json {
        let file =
            fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &summary)?;
    }

    info!(
        sample = %sample_name,
        gini = report.gini,
        lorenz = %curve_path.display(),
        "run recorded"
    );
    println!("Sample Name: {sample_name}");
    println!(
        "players={} incentives={} remaining={} gini={:.4} mean={:.3} median={:.3}",
        summary.population_size,
        summary.initial_resources,
        summary.remaining_resources,
        report.gini,
        report.mean,
        report.median
    );
    Ok(())
}
