use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use plotgrid::data::{AliasLog, Dataset};
use plotgrid::filter::FilterLog;
use plotgrid::ir::{LegendSpec, PlotRequest, PlotSpecification};
use plotgrid::parser::{parse_alias_arg, parse_filter_arg};
use plotgrid::smooth::{SmootherKind, SmoothingConfig};
use plotgrid::{compose, EngineOptions};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "plotgrid")]
#[command(about = "Compose a faceted scatter/trend plot specification from CSV data", long_about = None)]
struct Args {
    /// X variable (repeatable)
    #[arg(short = 'x', long = "x")]
    xs: Vec<String>,

    /// Y variable (repeatable)
    #[arg(short = 'y', long = "y")]
    ys: Vec<String>,

    /// Column mapped to marker size
    #[arg(long)]
    size: Option<String>,

    /// Column mapped to marker colour
    #[arg(long)]
    color: Option<String>,

    /// Column mapped to marker symbol
    #[arg(long)]
    symbol: Option<String>,

    /// Column shown in hover text (repeatable)
    #[arg(long)]
    hover: Vec<String>,

    /// Plot every X against every Y
    #[arg(long)]
    cartesian: bool,

    #[arg(long, value_enum, default_value_t = SmootherArg::None)]
    smoother: SmootherArg,

    /// Whittaker exponent (0-5) or moving-average window (1-50)
    #[arg(long)]
    smoother_parameter: Option<f64>,

    /// Row filter, FIELD:LOWER[:UPPER]; discrete fields take a comma-separated set
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Copy column NAME into a new column ALIAS before plotting, NAME=ALIAS
    #[arg(long = "alias")]
    aliases: Vec<String>,

    /// Read the whole request from a JSON file instead of flags
    #[arg(long, conflicts_with_all = ["xs", "ys"])]
    request: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

/// JSON document written to stdout
#[derive(Serialize)]
struct Output<'a> {
    plot: &'a PlotSpecification,
    /// Per-row filter result over the input dataset
    mask: &'a [bool],
    rows_kept: usize,
    filter_log: String,
    alias_log: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SmootherArg {
    None,
    Whittaker,
    MovingAverage,
}

impl From<SmootherArg> for SmootherKind {
    fn from(arg: SmootherArg) -> Self {
        match arg {
            SmootherArg::None => SmootherKind::None,
            SmootherArg::Whittaker => SmootherKind::Whittaker,
            SmootherArg::MovingAverage => SmootherKind::MovingAverage,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "plotgrid=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    // Read CSV from stdin
    let mut data = Dataset::from_csv_reader(io::stdin().lock())
        .context("Failed to read CSV from stdin")?;

    let mut alias_log = AliasLog::default();
    for arg in &args.aliases {
        let (_, (name, alias)) =
            parse_alias_arg(arg).map_err(|e| anyhow!("Invalid alias '{}': {}", arg, e))?;
        data = data
            .with_alias(&name, &alias)
            .with_context(|| format!("Failed to apply alias '{}'", arg))?;
        alias_log.push(&name, &alias);
    }

    let request = build_request(&args)?;
    let composed = compose(&data, &request).context("Failed to compose plot")?;

    let mut filter_log = FilterLog::default();
    filter_log.extend(&composed.filter_log);

    let document = Output {
        mask: &composed.mask,
        rows_kept: composed.rows_kept(),
        filter_log: filter_log.render(),
        alias_log: alias_log.render(),
        plot: &composed.plot,
    };
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .context("Failed to serialize plot")?;

    // Write JSON to stdout
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", rendered).context("Failed to write plot to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn build_request(args: &Args) -> Result<PlotRequest> {
    if let Some(path) = &args.request {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file '{}'", path))?;
        return serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse request file '{}'", path));
    }

    let filters = args
        .filters
        .iter()
        .map(|arg| {
            parse_filter_arg(arg)
                .map(|(_, spec)| spec)
                .map_err(|e| anyhow!("Invalid filter '{}': {}", arg, e))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PlotRequest {
        xs: args.xs.clone(),
        ys: args.ys.clone(),
        legend: LegendSpec {
            size: args.size.clone(),
            color: args.color.clone(),
            symbol: args.symbol.clone(),
            hover: args.hover.clone(),
        },
        cartesian: args.cartesian,
        smoother: SmoothingConfig::new(args.smoother.into(), args.smoother_parameter),
        filters,
        options: EngineOptions::default(),
    })
}
