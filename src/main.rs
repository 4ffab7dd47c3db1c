use clap::Parser;
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wayfarer::config::{load_app_config, AppConfig};
use wayfarer::location::{format_distance, Geolocator, IpGeolocator, LocationResolver, ResolvedLocation};
use wayfarer::oracle::{GeminiOracle, PlaceOracle, ReplayOracle};
use wayfarer::places::{group_by_locality, RankedPlace, SortKey};
use wayfarer::search::{SearchError, SearchState};

/// Wayfarer — find places near you, ranked by distance or rating.
///
/// Asks a generative-AI model for places matching the query, then sorts and
/// filters them locally by great-circle distance and star rating.
///
/// Examples:
///   wayfarer coffee --auto
///   wayfarer "ramen" --lat 35.6595 --lon 139.7005 --sort rating
///   wayfarer museums --lat 48.8566 --lon 2.3522 --min-rating 4.5
///   wayfarer coffee --lat 1 --lon 1 --replay recorded.json
///   wayfarer --serve --bind 0.0.0.0:8080
#[derive(Parser)]
#[command(name = "wayfarer", version, about, long_about = None)]
struct Cli {
    /// What to look for (positional). Example: wayfarer coffee
    #[arg(index = 1)]
    query: Option<String>,

    /// Auto-detect location via IP geolocation.
    #[arg(long, short = 'a')]
    auto: bool,

    /// Latitude (-90 to 90).
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Order results by "distance" (nearest first) or "rating" (best first).
    #[arg(long, default_value = "distance", value_parser = parse_sort)]
    sort: SortKey,

    /// Hide places rated below this (0-5).
    #[arg(long, default_value_t = 0.0)]
    min_rating: f64,

    /// Read the oracle response from a file instead of calling the API.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Run the HTTP API instead of a one-off search.
    #[arg(long)]
    serve: bool,

    /// Bind address for --serve (overrides WAYFARER_BIND_ADDR).
    #[arg(long)]
    bind: Option<SocketAddr>,
}

fn parse_sort(s: &str) -> Result<SortKey, String> {
    s.parse()
}

#[derive(Serialize)]
struct CliOutput<'a> {
    query: &'a str,
    location: &'a ResolvedLocation,
    sort: SortKey,
    min_rating: f64,
    results: &'a [RankedPlace],
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let config = load_app_config().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    init_tracing(&config);

    let oracle = build_oracle(&cli, &config);

    if cli.serve {
        serve(&cli, &config, oracle);
        return;
    }

    // ── Resolve location ────────────────────────────────────────

    let query = match cli.query.as_deref() {
        Some(q) => q,
        None => {
            eprintln!("Error: {}", SearchError::EmptyQuery);
            print_usage();
            std::process::exit(1);
        }
    };

    let resolver = LocationResolver::new(&config.geolocate_url, config.request_timeout());
    let manual = cli.lat.zip(cli.lon);
    if manual.is_none() && (cli.lat.is_some() || cli.lon.is_some()) {
        eprintln!("Error: --lat and --lon must be given together.");
        std::process::exit(1);
    }

    let mut state = SearchState::new();
    let resolved = resolver.resolve(manual, cli.auto);
    state.resolve_location(resolved.as_ref().map(|l| l.coord).map_err(|e| e.clone()));

    let resolved = match resolved {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", SearchError::from(e));
            print_usage();
            std::process::exit(1);
        }
    };

    eprintln!("  \u{1F4CD} {}", resolved.display_line());

    // ── Search ──────────────────────────────────────────────────

    state.set_query(query);
    state.set_sort_key(cli.sort);
    state.set_min_rating(cli.min_rating);

    match state.search(oracle.as_ref()) {
        Ok(()) | Err(SearchError::NoResults) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    let visible = state.visible();
    let notice = state.notice().map(|n| n.to_string());

    // Listing to stderr
    eprint!("{}", render_listing(&visible));
    if let Some(ref n) = notice {
        eprintln!("  {}", n);
    }

    // JSON to stdout
    let output = CliOutput {
        query: state.query(),
        location: &resolved,
        sort: state.sort_key(),
        min_rating: state.min_rating(),
        results: &visible,
        notice,
    };
    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_oracle(cli: &Cli, config: &AppConfig) -> Arc<dyn PlaceOracle> {
    if let Some(ref path) = cli.replay {
        return match ReplayOracle::from_path(path) {
            Ok(o) => Arc::new(o),
            Err(e) => {
                eprintln!("Error: Cannot read {}: {}", path.display(), e);
                std::process::exit(1);
            }
        };
    }

    match GeminiOracle::from_config(config) {
        Ok(o) => Arc::new(o),
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("  Set WAYFARER_API_KEY (or GEMINI_API_KEY), or use --replay <file>.");
            std::process::exit(1);
        }
    }
}

fn serve(cli: &Cli, config: &AppConfig, oracle: Arc<dyn PlaceOracle>) {
    let addr = cli.bind.unwrap_or(config.bind_addr);
    let geolocator: Arc<dyn Geolocator> =
        Arc::new(IpGeolocator::new(config.geolocate_url.clone(), config.request_timeout()));

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Error: Cannot start async runtime: {}", e);
        std::process::exit(1);
    });

    eprintln!("  Press Ctrl+C to stop.");

    if let Err(e) = runtime.block_on(wayfarer::server::start(addr, oracle, Some(geolocator))) {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Results grouped under locality headers, one line per place.
fn render_listing(places: &[RankedPlace]) -> String {
    let mut out = String::new();
    for (header, members) in group_by_locality(places) {
        out.push_str(&format!("\n  {}\n", header));
        for p in members {
            let distance = format_distance(p.distance_km.unwrap_or(f64::INFINITY));
            let rating = if p.place.rating > 0.0 {
                format!("\u{2605} {:.1} ({})", p.place.rating, p.place.review_count)
            } else {
                "unrated".to_string()
            };
            out.push_str(&format!("    {:<32} {:>8}  {}\n", p.place.name, distance, rating));
        }
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  wayfarer coffee --auto");
    eprintln!("  wayfarer \"ramen\" --lat 35.6595 --lon 139.7005 --sort rating");
    eprintln!("  wayfarer museums --lat 48.8566 --lon 2.3522 --min-rating 4.5");
    eprintln!("  wayfarer --serve");
}
