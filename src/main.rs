use chrono::NaiveDate;
use clap::Parser;
use std::sync::Arc;

use fare_gateway::utils::{logger, validation::Validate};
use fare_gateway::{CacheStore, FareGateway, GatewayConfig, GatewayError, MemoryCache, OfferQuery};

#[derive(Debug, Parser)]
#[command(name = "fare-gateway")]
#[command(about = "Fetch the cheapest flight offer for a route from the Amadeus API")]
struct Cli {
    #[arg(long, default_value = "gateway.toml")]
    config: String,

    #[arg(long)]
    origin: String,

    #[arg(long)]
    destination: String,

    #[arg(long)]
    departure_date: NaiveDate,

    #[arg(long, default_value = "1")]
    adults: u32,

    #[arg(long, default_value = "1")]
    max: u32,

    #[arg(long, help = "Bypass cached offers and force a fresh upstream fetch")]
    no_cache: bool,

    #[arg(long, help = "Emit logs as JSON")]
    log_json: bool,

    #[arg(long, help = "Enable verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting fare-gateway");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    let config = match GatewayConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config from {}: {}", cli.config, e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let query = OfferQuery {
        origin: cli.origin.to_uppercase(),
        destination: cli.destination.to_uppercase(),
        departure_date: cli.departure_date,
        adults: cli.adults,
        max_results: cli.max,
        no_cache: cli.no_cache,
    };

    if let Err(e) = query.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let gateway = match FareGateway::new(&config, cache).await {
        Ok(gateway) => gateway,
        Err(e) => {
            tracing::error!("Failed to initialize gateway: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    match gateway.fetch_cheapest_offer(&query).await {
        Ok(result) => {
            tracing::info!("✅ Cheapest offer found");
            println!(
                "{} -> {} on {}: {}",
                result.origin, result.destination, result.departure_date, result.price
            );
        }
        Err(GatewayError::NoOffers) => {
            println!(
                "No flight offers found for {} -> {} on {}",
                query.origin, query.destination, query.departure_date
            );
        }
        Err(e) => {
            tracing::error!("❌ Failed to fetch flight offers: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
