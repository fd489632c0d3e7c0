use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use tfn_analysis::metrics::SizeMetric;
use tfn_dashboard::page;
use tfn_dashboard::view::{run_pipeline, DashboardData, MetricCell, RenderParams};
use tfn_data::cache::DatasetCache;

mod serve;

#[derive(Debug, Clone)]
struct AppContext {
    data_path: PathBuf,
}

#[derive(Parser, Debug)]
#[command(name = "transfer-net")]
#[command(about = "Football transfer market network analysis toolkit")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Path to the transfer dataset CSV.
    #[arg(long, global = true, default_value = "data/transfers.csv")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a self-contained HTML dashboard.
    Report(ReportArgs),
    /// Print summary metrics and top-club centrality tables.
    Stats(StatsArgs),
    /// Print the adjacency matrix for the highest-degree clubs.
    Matrix(MatrixArgs),
    /// Serve the dashboard over HTTP, re-running the pipeline per request.
    Serve(ServeArgs),
}

/// Pipeline parameters shared by the offline subcommands.
///
/// Boolean flags take explicit values (`--physics false`) so the defaults
/// stay visible in `--help`.
#[derive(Args, Debug)]
struct PipelineArgs {
    /// Metric that scales node sizes in the visualization.
    #[arg(long, value_enum, default_value_t = SizeMetric::Degree)]
    size_metric: SizeMetric,

    /// Widen edges by aggregated transfer value.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    edge_width: bool,

    /// Enable the layout physics simulation.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    physics: bool,

    /// Restrict to the largest weakly-connected component.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    connected_only: bool,

    /// Minimum transfer fee in millions.
    #[arg(long, default_value_t = 1.0)]
    min_fee: f64,
}

impl PipelineArgs {
    fn to_params(&self) -> RenderParams {
        RenderParams {
            size_metric: self.size_metric,
            edge_width_by_value: self.edge_width,
            physics: self.physics,
            connected_only: self.connected_only,
            min_fee_millions: self.min_fee,
        }
    }
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Output path for the HTML report.
    #[arg(long, default_value = "transfer_network.html")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct StatsArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Output format: table (default) or json.
    #[arg(long, default_value = "table")]
    output: String,
}

#[derive(Args, Debug)]
struct MatrixArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    let ctx = AppContext {
        data_path: cli.data,
    };

    match cli.command {
        Commands::Report(args) => handle_report(&ctx, args).await,
        Commands::Stats(args) => handle_stats(&ctx, args).await,
        Commands::Matrix(args) => handle_matrix(&ctx, args).await,
        Commands::Serve(args) => handle_serve(ctx, args).await,
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Load the dataset and run one full pipeline pass.
fn run_once(ctx: &AppContext, params: &RenderParams) -> Result<DashboardData> {
    let cache = DatasetCache::new();
    let records = cache.load(&ctx.data_path)?;
    run_pipeline(&records, params)
}

async fn handle_report(ctx: &AppContext, args: ReportArgs) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .wrap_err("failed to create progress style")?,
    );
    pb.set_message("loading dataset and building graph");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let data = run_once(ctx, &args.pipeline.to_params())?;
    let html = page::render_report(&data)?;

    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(&args.out, html)
        .wrap_err_with(|| format!("failed to write {}", args.out.display()))?;

    pb.finish_with_message("report written");
    info!(
        out = %args.out.display(),
        clubs = data.summary.clubs,
        flows = data.summary.flows,
        "report command completed"
    );

    Ok(())
}

async fn handle_stats(ctx: &AppContext, args: StatsArgs) -> Result<()> {
    let data = run_once(ctx, &args.pipeline.to_params())?;

    match args.output.to_lowercase().as_str() {
        "table" => print_stats_tables(&data),
        "json" => {
            let body = serde_json::json!({
                "summary": data.summary,
                "rankings": data.rankings,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&body).wrap_err("failed to serialize JSON")?
            );
        }
        other => {
            return Err(color_eyre::eyre::eyre!(
                "unknown output format '{}'; use 'table' or 'json'",
                other
            ))
        }
    }

    info!(
        clubs = data.summary.clubs,
        flows = data.summary.flows,
        output = %args.output,
        "stats command completed"
    );

    Ok(())
}

fn cell_text(cell: &MetricCell) -> String {
    match (&cell.value, cell.reason) {
        (Some(value), _) => value.clone(),
        (None, Some(reason)) => format!("not computable ({reason})"),
        (None, None) => "n/a".to_string(),
    }
}

fn print_stats_tables(data: &DashboardData) {
    let summary = &data.summary;

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Clubs", &summary.clubs.to_string()]);
    table.add_row(vec!["Transfer flows", &summary.flows.to_string()]);
    table.add_row(vec!["Density", &format!("{:.4}", summary.density)]);
    table.add_row(vec![
        "Strongly connected components",
        &summary.strongly_connected.to_string(),
    ]);
    table.add_row(vec![
        "Weakly connected components",
        &summary.weakly_connected.to_string(),
    ]);
    table.add_row(vec!["Diameter", &cell_text(&summary.diameter)]);
    table.add_row(vec!["Periphery", &cell_text(&summary.periphery)]);
    table.add_row(vec!["Assortativity", &cell_text(&summary.assortativity)]);
    table.add_row(vec!["Transfers", &summary.transfers.to_string()]);
    table.add_row(vec![
        "Total value (€M)",
        &format!("{:.2}", summary.total_fee_millions),
    ]);
    table.add_row(vec![
        "Average value (€M)",
        &format!("{:.2}", summary.avg_fee_millions),
    ]);

    println!("\n{table}\n");

    for ranking in &data.rankings {
        println!("Top {} clubs by {}:", ranking.rows.len(), ranking.label);

        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec![
            "Club",
            "Total degree",
            "In-degree",
            "Out-degree",
            "Betweenness",
            "Closeness",
            "Eigenvector",
        ]);

        for row in &ranking.rows {
            table.add_row(vec![
                row.club.clone(),
                row.degree.to_string(),
                row.in_degree.to_string(),
                row.out_degree.to_string(),
                format!("{:.3}", row.betweenness),
                format!("{:.3}", row.closeness),
                format!("{:.3}", row.eigenvector),
            ]);
        }

        println!("{table}\n");
    }
}

async fn handle_matrix(ctx: &AppContext, args: MatrixArgs) -> Result<()> {
    let data = run_once(ctx, &args.pipeline.to_params())?;
    let adjacency = &data.adjacency;

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);

    let mut header = vec![String::new()];
    header.extend(adjacency.labels.iter().cloned());
    table.set_header(header);

    for (row_index, label) in adjacency.labels.iter().enumerate() {
        let mut row = vec![label.clone()];
        row.extend(
            adjacency.cells[row_index]
                .iter()
                .map(|count| count.to_string()),
        );
        table.add_row(row);
    }

    println!("\n{table}\n");
    println!(
        "Transfers between the {} clubs with the most connections; rows sell, columns buy.",
        adjacency.labels.len()
    );

    info!(
        clubs = adjacency.labels.len(),
        "matrix command completed"
    );

    Ok(())
}

async fn handle_serve(ctx: AppContext, args: ServeArgs) -> Result<()> {
    serve::run_server(ctx.data_path, args.port).await
}
