//! Simple harness for the nearby-flights orchestrator.
//!
//! Usage: `server [ORIGIN] [CONFIG]`, e.g. `server LHR ./nearby-flights.toml`.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use flight_data::{DestinationIndex, OriginContext};
use server::bootstrap;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let code = args.next().unwrap_or_else(|| "LHR".to_string());
    let config_path = args.next().map(PathBuf::from);

    info!("Starting nearby-flights harness for {}", code);
    let (config, orchestrator) = bootstrap(config_path.as_deref())?;
    info!("Booking API at {}", config.api_base_url);

    let index = DestinationIndex::builtin();
    let origin = match index.get(&code) {
        Some(d) => OriginContext::new(d.code.clone(), d.city.clone(), d.country.clone()),
        None => OriginContext::new(code.clone(), "", ""),
    };

    match orchestrator.load_nearby(&origin).await? {
        Some(result) => {
            if let Some(notice) = &result.notice {
                warn!("{}", notice);
            }
            info!("Received {} recommendations:", result.flights.len());
            for (i, flight) in result.flights.iter().enumerate() {
                info!(
                    "{}. {} {} ({}) - {:.0} on {} - Score: {:.2}",
                    i + 1,
                    flight.destination_code,
                    flight.city.as_deref().unwrap_or("?"),
                    flight.country.as_deref().unwrap_or("?"),
                    flight.price,
                    flight.departure_date,
                    flight.recommendation_score.unwrap_or(0.0)
                );
            }
        }
        None => info!("Request superseded, nothing to show"),
    }

    orchestrator.shutdown();
    Ok(())
}
