use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sweeproute_lib::sample::{DEFAULT_BATCH_CAPACITY, DEFAULT_SPACING_M};
use sweeproute_lib::{
    enrich_waypoints, plan_route, prune_dead_ends, write_artifacts, Coordinate, FixtureSource,
    NominatimGeocoder, OverpassSource, PlanConfig, ReverseGeocoder, SolverStrategy, StreetSource,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Street-coverage route planning utilities")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan a coverage route and write its artifacts.
    Plan(PlanArgs),
    /// Print summary statistics for a graph fixture.
    Inspect {
        /// Graph fixture to inspect.
        #[arg(long = "graph-file")]
        graph_file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Center latitude.
    #[arg(long)]
    lat: f64,
    /// Center longitude.
    #[arg(long)]
    lon: f64,
    /// Search radius in meters.
    #[arg(long, default_value_t = 2000.0)]
    radius: f64,
    /// Coverage strategy: edge-cover or node-cover.
    #[arg(long, default_value = "edge-cover")]
    strategy: String,
    /// Minimum spacing between sampled waypoints, meters.
    #[arg(long, default_value_t = DEFAULT_SPACING_M)]
    spacing: f64,
    /// Waypoints per map deep link.
    #[arg(long = "batch-capacity", default_value_t = DEFAULT_BATCH_CAPACITY)]
    batch_capacity: usize,
    /// Output directory for artifacts.
    #[arg(long, default_value = "artifacts")]
    out: PathBuf,
    /// Plan against a local graph fixture instead of the Overpass API.
    #[arg(long = "graph-file")]
    graph_file: Option<PathBuf>,
    /// Enrich waypoints with street names via Nominatim (slow, one lookup
    /// per second).
    #[arg(long)]
    geocode: bool,
    /// Route name embedded in the KML document.
    #[arg(long, default_value = "coverage route")]
    name: String,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Plan(args) => handle_plan(args),
        Command::Inspect { graph_file } => handle_inspect(&graph_file),
    }
}

fn handle_plan(args: PlanArgs) -> Result<()> {
    let strategy: SolverStrategy = args
        .strategy
        .parse()
        .with_context(|| format!("invalid --strategy '{}'", args.strategy))?;

    let config = PlanConfig {
        center: Coordinate::new(args.lat, args.lon),
        radius_m: args.radius,
        strategy,
        spacing_m: args.spacing,
        batch_capacity: args.batch_capacity,
    };

    let source: Box<dyn StreetSource> = match &args.graph_file {
        Some(path) => Box::new(
            FixtureSource::from_path(path)
                .with_context(|| format!("failed to load graph fixture {}", path.display()))?,
        ),
        None => Box::new(OverpassSource::new().context("failed to build the Overpass client")?),
    };

    let plan = plan_route(source.as_ref(), &config).context("route planning failed")?;

    let geocoder = if args.geocode {
        Some(NominatimGeocoder::new().context("failed to build the Nominatim client")?)
    } else {
        None
    };
    let rows = enrich_waypoints(
        geocoder.as_ref().map(|g| g as &dyn ReverseGeocoder),
        &plan.waypoints,
    );

    let report = write_artifacts(&plan, &rows, &args.out, &args.name)
        .with_context(|| format!("failed to write artifacts to {}", args.out.display()))?;

    println!("Route length: {:.0} m", plan.length_m());
    println!(
        "Waypoints: {} sampled into {} batch(es)",
        plan.waypoints.len(),
        plan.batches.len()
    );
    println!("Links:");
    for link in &plan.links {
        println!("- {link}");
    }
    println!("Artifacts:");
    for path in report.paths() {
        println!("- {}", path.display());
    }
    for failure in &report.failures {
        eprintln!("export failed: {failure}");
    }

    Ok(())
}

fn handle_inspect(graph_file: &PathBuf) -> Result<()> {
    let source = FixtureSource::from_path(graph_file)
        .with_context(|| format!("failed to load graph fixture {}", graph_file.display()))?;
    let graph = source
        .fetch(Coordinate::new(0.0, 0.0), 0.0)
        .context("fixture holds no street network")?;
    let pruned = prune_dead_ends(&graph);

    println!("Nodes: {}", graph.node_count());
    println!("Edges: {}", graph.edge_count());
    println!("Components: {}", graph.component_count());
    println!("Odd-degree nodes: {}", graph.odd_nodes().len());
    println!("Total edge length: {:.0} m", graph.base_weight());
    println!(
        "After pruning: {} nodes, {} edges",
        pruned.node_count(),
        pruned.edge_count()
    );

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
