//! GrãoSeguro - Silo Environment Simulator Binary
//!
//! Runs the deterministic environment player from the command line.

use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use grao_seguro::{
    create_prng, format_environment, generate_environment_series, get_aqi_category, get_aqi_color,
    EnvironmentView, FormattedSeries, PlaybackState, Player, SimulationConfig,
    DEFAULT_CORRELATION, DEFAULT_NOISE, DEFAULT_POINTS_PER_DAY, DEFAULT_SEED,
    DEFAULT_UPDATE_INTERVAL_MS, DEFAULT_WINDOW_DAYS,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "grao_seguro")]
#[command(about = "🌾 GrãoSeguro - Silo Environment Simulator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Deterministic temperature, humidity and air-quality series for silo monitoring demos")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Seed string for the series generator
    #[arg(short, long, default_value = DEFAULT_SEED)]
    seed: String,

    /// Days of history per series
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    window_days: u32,

    /// Samples per simulated day
    #[arg(long, default_value_t = DEFAULT_POINTS_PER_DAY)]
    points_per_day: u32,

    /// Per-step perturbation scale (0 to 5)
    #[arg(short, long, default_value_t = DEFAULT_NOISE)]
    noise: f64,

    /// Shared share of the perturbation (0 to 1)
    #[arg(short, long, default_value_t = DEFAULT_CORRELATION)]
    correlation: f64,

    /// Live update interval in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_UPDATE_INTERVAL_MS)]
    interval: u64,

    /// JSON configuration file; command-line values are ignored when set
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the live simulation (default)
    Play(PlayArgs),

    /// Generate one window and print it
    Snapshot(SnapshotArgs),

    /// Classify an AQI reading
    Aqi {
        /// AQI reading
        value: f64,
    },
}

#[derive(Args, Default)]
struct PlayArgs {
    /// Stop after this many advancements
    #[arg(short, long)]
    ticks: Option<u64>,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,

    /// Number of most recent points to print
    #[arg(short, long, default_value_t = 5)]
    last: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    init_logging(&cli)?;

    let config = build_config(&cli)?;

    match &cli.command {
        Some(Commands::Play(args)) => play_command(config, args).await?,
        Some(Commands::Snapshot(args)) => snapshot_command(config, args)?,
        Some(Commands::Aqi { value }) => aqi_command(*value),
        None => play_command(config, &PlayArgs::default()).await?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<SimulationConfig> {
    if let Some(path) = &cli.config {
        info!("Loading configuration from {}", path.display());
        return Ok(SimulationConfig::load(path)?);
    }

    let config = SimulationConfig::new(cli.seed.clone())
        .with_window(cli.window_days, cli.points_per_day)
        .with_noise(cli.noise)
        .with_correlation(cli.correlation)
        .with_update_interval_ms(cli.interval);
    config.validate()?;
    Ok(config.normalized())
}

async fn play_command(config: SimulationConfig, args: &PlayArgs) -> anyhow::Result<()> {
    println!("🌾 GrãoSeguro - Silo Environment Simulator");
    println!("   Seed: {}", config.seed);
    println!(
        "   Window: {} days x {} points, update every {}ms",
        config.window_days, config.points_per_day, config.update_interval_ms
    );
    println!("   Press Ctrl-C to stop");
    println!();

    let window_size = config.window_size();
    let mut player = Player::new(config)?;
    let mut updates = player.updates();

    loop {
        tokio::select! {
            update = updates.next() => {
                let Some(snapshot) = update else { break };
                if snapshot.state != PlaybackState::Playing {
                    continue;
                }
                let view = format_environment(&snapshot.collection, window_size);
                print_summary_line(snapshot.ticks, &view);
                if args.ticks.is_some_and(|limit| snapshot.ticks >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    player.shutdown();
    Ok(())
}

fn snapshot_command(config: SimulationConfig, args: &SnapshotArgs) -> anyhow::Result<()> {
    let start = config
        .start_timestamp
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let mut prng = create_prng(&config.seed);
    let collection = generate_environment_series(&mut prng, &config.generator_config(start));
    let view = format_environment(&collection, config.window_size());

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&view)?;
            println!("{}", json);
        }
        "pretty" => print_pretty_view(&config.seed, &view, args.last),
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

fn aqi_command(value: f64) {
    let category = get_aqi_category(value);
    println!("AQI {}: {} ({})", value, category, get_aqi_color(category));
}

fn print_summary_line(ticks: u64, view: &EnvironmentView) {
    let label = view
        .temperature
        .points
        .last()
        .map(|p| p.label.as_str())
        .unwrap_or("--");
    println!(
        "#{:<5} {}  🌡️ {:>9}  💧 {:>5}  🌫️ {:>7} [{}]",
        ticks,
        label,
        view.temperature.latest_formatted(),
        view.humidity.latest_formatted(),
        view.air_quality.series.latest_formatted(),
        view.air_quality.category
    );
}

fn print_pretty_view(seed: &str, view: &EnvironmentView, last: usize) {
    println!("🌾 Environment Snapshot (seed '{}')", seed);
    println!("==========================================");
    println!();

    print_series("🌡️  Temperature", &view.temperature, last);
    print_series("💧 Humidity", &view.humidity, last);
    print_series("🌫️  Air Quality", &view.air_quality.series, last);
    println!(
        "  Category: {} ({})",
        view.air_quality.category, view.air_quality.color
    );
}

fn print_series(title: &str, series: &FormattedSeries, last: usize) {
    println!("{}:", title);
    println!("  Latest: {}", series.latest_formatted());
    println!(
        "  Average: {:.2} {} (σ {:.2})",
        series.average, series.unit, series.std_dev
    );
    let skip = series.points.len().saturating_sub(last);
    for point in &series.points[skip..] {
        println!(
            "  {}  {:>9}  band [{:.2}, {:.2}]",
            point.label, point.formatted_value, point.lower_band, point.upper_band
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["grao_seguro", "--seed", "silo-2", "--noise", "1.5"]).unwrap();
        assert_eq!(cli.seed, "silo-2");
        assert_eq!(cli.noise, 1.5);
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["grao_seguro"]).unwrap();
        assert_eq!(cli.seed, DEFAULT_SEED);
        assert_eq!(cli.interval, DEFAULT_UPDATE_INTERVAL_MS);
        assert_eq!(cli.window_days, DEFAULT_WINDOW_DAYS);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::try_parse_from(["grao_seguro", "play", "--ticks", "3"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Play(PlayArgs { ticks: Some(3) }))));

        let cli = Cli::try_parse_from(["grao_seguro", "aqi", "120"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Aqi { value }) if value == 120.0));
    }

    #[test]
    fn test_build_config_clamps_cli_values() {
        let cli = Cli::try_parse_from(["grao_seguro", "--correlation", "3", "--seed", " "]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.correlation, 1.0);
        assert_eq!(config.seed, DEFAULT_SEED);
    }
}
