use cep_zones::config::{load_config, Config};
use cep_zones::location::{Coordinates, PostalCode};
use cep_zones::server;
use cep_zones::session::Session;
use cep_zones::zones::Classifier;
use clap::Parser;

/// cep-zones — CEP resolver and São Paulo zone classifier
///
/// Resolves Brazilian postal codes through BrasilAPI, falling back to
/// ViaCEP + Nominatim, and assigns each one a zone of the target city.
///
/// Examples:
///   cepzones "01310-100, 04077-000"
///   cepzones "01310100" --summary
///   cepzones 01001-000 --classify-only --neighborhood "Sé" --city "São Paulo"
///   cepzones --serve --port 3000
#[derive(Parser)]
#[command(name = "cepzones", version, about, long_about = None)]
struct Cli {
    /// Comma-separated CEPs. Example: cepzones "01310-100, 04077000"
    #[arg(index = 1)]
    ceps: Option<String>,

    /// Also print session aggregates (zones, neighborhoods, sources).
    #[arg(long)]
    summary: bool,

    /// Classify a single CEP without any network lookup.
    #[arg(long)]
    classify_only: bool,

    /// Neighborhood for --classify-only.
    #[arg(long)]
    neighborhood: Option<String>,

    /// City for --classify-only.
    #[arg(long)]
    city: Option<String>,

    /// Override the city whose zones are assigned (default: São Paulo).
    #[arg(long)]
    target_city: Option<String>,

    /// Cache lifetime in seconds for resolved CEPs.
    #[arg(long)]
    cache_ttl: Option<u64>,

    /// Start the JSON HTTP API instead of processing CEPs.
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Debug logging.
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn apply_overrides(cli: &Cli, mut cfg: Config) -> Config {
    if let Some(ref city) = cli.target_city {
        cfg.target_city = city.clone();
    }
    if let Some(ttl) = cli.cache_ttl {
        cfg.cache_ttl_secs = ttl;
    }
    if cli.verbose {
        cfg.debug = true;
    }
    cfg
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = apply_overrides(&cli, load_config()?);

    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    // ── Server mode ─────────────────────────────────────────────

    if cli.serve {
        let session = Session::from_config(&cfg);
        let runtime = tokio::runtime::Runtime::new()?;
        return runtime.block_on(server::start(&cli.host, cli.port, session));
    }

    let Some(ref input) = cli.ceps else {
        eprintln!("Error: No CEP specified.");
        eprintln!();
        eprintln!("Usage:");
        eprintln!("  cepzones \"01310-100, 04077-000\"");
        eprintln!("  cepzones 01001-000 --classify-only --neighborhood \"Sé\" --city \"São Paulo\"");
        eprintln!("  cepzones --serve");
        std::process::exit(1);
    };

    // ── Offline classification ──────────────────────────────────

    if cli.classify_only {
        let cep = PostalCode::parse(input)?;
        let classifier = Classifier::new(&cfg.target_city);
        let zone = classifier.classify(
            cep.as_str(),
            cli.neighborhood.as_deref().unwrap_or(""),
            cli.city.as_deref().unwrap_or(""),
            Coordinates::default(),
        );
        eprintln!("  \u{1F4CD} {} \u{2192} {}", cep, zone);
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "postal_code": cep.hyphenated(),
                "zone": zone,
            }))?
        );
        return Ok(());
    }

    // ── Resolve batch ───────────────────────────────────────────

    let mut session = Session::from_config(&cfg);
    let outcomes = session.add_batch(input)?;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(record) => {
                let city = if record.city.is_empty() { "no city" } else { record.city.as_str() };
                eprintln!("  \u{2714} CEP {} added ({})", record.postal_code, city);
                eprintln!("    {}", record.display_line());
            }
            Err(e) => eprintln!("  \u{2716} {}: {}", outcome.input, e),
        }
    }

    println!("{}", serde_json::to_string_pretty(session.records())?);
    if cli.summary {
        println!("{}", serde_json::to_string_pretty(&session.summary())?);
    }

    Ok(())
}
