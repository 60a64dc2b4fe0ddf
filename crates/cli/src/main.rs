use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use fetcher::CircuitStatus;
use flight_data::{DestinationIndex, OriginContext, Season};
use pipeline::scoring::score_breakdown;
use preferences::{FeedbackKind, SearchEvent, UserPreferences};
use server::{AppConfig, NearbyFlights, NearbyFlightsOrchestrator};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, warn};

/// nearby-flights - Personalized nearby flight recommendations
#[derive(Parser)]
#[command(name = "nearby-flights")]
#[command(about = "Personalized, fault-tolerant nearby flight recommendations", long_about = None)]
struct Cli {
    /// Path to a config.toml (defaults to the standard locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the directory where preferences and breaker state live
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the booking API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend flights departing from an origin airport
    Recommend {
        /// Origin airport code (e.g. LHR)
        #[arg(long)]
        origin: String,

        /// Number of recommendations to return
        #[arg(long)]
        limit: Option<usize>,

        /// Score with this season instead of the current one
        #[arg(long)]
        season: Option<Season>,

        /// Show the score breakdown for each recommendation
        #[arg(long)]
        explain: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a click on a destination
    Click {
        /// Destination airport code
        code: String,
    },

    /// Like a destination
    Like {
        /// Destination airport code
        code: String,
    },

    /// Dislike a destination
    Dislike {
        /// Destination airport code
        code: String,
    },

    /// Record a flight search
    Search {
        /// Origin airport code
        #[arg(long)]
        origin: String,

        /// Destination airport code
        #[arg(long)]
        destination: Option<String>,

        /// Price seen for the searched flight
        #[arg(long)]
        price: Option<f64>,

        /// Departure date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Action label stored with the search
        #[arg(long, default_value = "search")]
        action: String,
    },

    /// Inspect or clear stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },

    /// Inspect or reset the circuit breaker
    Breaker {
        #[command(subcommand)]
        action: BreakerAction,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Show the current preferences
    Show,
    /// Delete all stored preferences
    Clear,
}

#[derive(Subcommand)]
enum BreakerAction {
    /// Show the breaker state
    Status,
    /// Close the breaker and clear its failure count
    Reset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Commands::Recommend { limit: Some(limit), .. } = &cli.command {
        config.recommendation_limit = *limit;
    }
    config.validate()?;
    debug!(
        "Booking API at {}, breaker threshold {}",
        config.api_base_url, config.breaker.failure_threshold
    );

    let mut orchestrator = NearbyFlightsOrchestrator::from_config(&config)?;
    if let Commands::Recommend { season: Some(season), .. } = &cli.command {
        orchestrator = orchestrator.with_season(*season);
    }

    // Dispatch to appropriate command handler
    let result = match cli.command {
        Commands::Recommend {
            origin,
            season,
            explain,
            json,
            ..
        } => handle_recommend(&orchestrator, &origin, season, explain, json).await,
        Commands::Click { code } => {
            orchestrator.record_click(&code);
            println!("{} Recorded click on {}", "✓".green(), code.to_uppercase());
            Ok(())
        }
        Commands::Like { code } => handle_feedback(&orchestrator, &code, FeedbackKind::Like),
        Commands::Dislike { code } => handle_feedback(&orchestrator, &code, FeedbackKind::Dislike),
        Commands::Search {
            origin,
            destination,
            price,
            date,
            action,
        } => {
            let mut event = SearchEvent::new(&origin, action);
            if let Some(destination) = &destination {
                event = event.with_destination(destination);
            }
            if let Some(price) = price {
                event = event.with_price(price);
            }
            if let Some(date) = date {
                event = event.with_departure_date(date);
            }
            orchestrator.record_search(event);
            println!("{} Recorded search from {}", "✓".green(), origin.to_uppercase());
            Ok(())
        }
        Commands::Prefs { action } => match action {
            PrefsAction::Show => {
                // Make sure derived fields reflect the latest history
                orchestrator.preference_store().flush();
                print_preferences(&orchestrator.preferences());
                Ok(())
            }
            PrefsAction::Clear => {
                orchestrator.preference_store().clear();
                println!("{} Preferences cleared", "✓".green());
                Ok(())
            }
        },
        Commands::Breaker { action } => match action {
            BreakerAction::Status => {
                print_breaker(&orchestrator);
                Ok(())
            }
            BreakerAction::Reset => {
                orchestrator.reset_breaker();
                println!("{} Circuit breaker reset", "✓".green());
                Ok(())
            }
        },
    };

    // Commit debounced preference work before exiting
    orchestrator.shutdown();
    result
}

/// Handle the 'recommend' command
async fn handle_recommend(
    orchestrator: &NearbyFlightsOrchestrator,
    code: &str,
    season: Option<Season>,
    explain: bool,
    json: bool,
) -> Result<()> {
    let index = DestinationIndex::builtin();
    let origin = match index.get(code) {
        Some(d) => OriginContext::new(d.code.clone(), d.city.clone(), d.country.clone()),
        None => OriginContext::new(code.to_uppercase(), "", ""),
    };

    if origin.city.is_empty() {
        warn!("Unknown origin {}, scoring without city context", origin.code);
    }

    let start = Instant::now();
    let Some(result) = orchestrator.load_nearby(&origin).await? else {
        println!("{}", "Request superseded, nothing to show".yellow());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_recommendations(&result);
    println!("{}", format!("Done in {:.2?}", start.elapsed()).dimmed());

    if explain {
        let prefs = orchestrator.preferences();
        let season = season.unwrap_or_else(Season::current);
        println!("\n{}", format!("Score breakdown ({}):", season).bold().blue());
        for flight in &result.flights {
            match score_breakdown(flight, &prefs, season) {
                Some(b) => println!(
                    "  {}: country {:+.1}, price {:+.2}, season {:+.0}, feedback {:+.0}, click {:+.0}, exploration {:+.0} = {:.2}",
                    flight.destination_code,
                    b.country,
                    b.price,
                    b.season,
                    b.feedback,
                    b.click,
                    b.exploration,
                    b.total()
                ),
                None => println!("  {}: unknown destination", flight.destination_code),
            }
        }
    }
    Ok(())
}

/// Handle the 'like' and 'dislike' commands
fn handle_feedback(
    orchestrator: &NearbyFlightsOrchestrator,
    code: &str,
    kind: FeedbackKind,
) -> Result<()> {
    orchestrator.record_feedback(code, kind);
    let marker = match kind {
        FeedbackKind::Like => "♥".green(),
        FeedbackKind::Dislike => "✗".red(),
    };
    println!("{} Recorded {} for {}", marker, kind, code.to_uppercase());
    Ok(())
}

fn print_recommendations(result: &NearbyFlights) {
    let origin = if result.origin.city.is_empty() {
        result.origin.code.clone()
    } else {
        format!("{} ({})", result.origin.city, result.origin.code)
    };
    println!("{}", format!("Nearby flights from {}:", origin).bold().blue());

    if let Some(notice) = &result.notice {
        println!("{}", notice.yellow());
    }
    if result.flights.is_empty() {
        println!("  No recommendations");
        return;
    }

    for (i, flight) in result.flights.iter().enumerate() {
        println!(
            "{}. {} {}, {} - {:.0} on {} - Score: {:.2}",
            (i + 1).to_string().green(),
            flight.destination_code.bold(),
            flight.city.as_deref().unwrap_or("?"),
            flight.country.as_deref().unwrap_or("?"),
            flight.price,
            flight.departure_date,
            flight.recommendation_score.unwrap_or(0.0)
        );
    }
}

fn print_preferences(prefs: &UserPreferences) {
    println!("{}", "Travel preferences:".bold().blue());
    println!("{}Searches recorded: {}", "• ".green(), prefs.search_history.len());
    println!("{}Clicks recorded: {}", "• ".green(), prefs.clicked_destinations.len());

    let join = |codes: &std::collections::BTreeSet<String>| {
        if codes.is_empty() {
            "-".to_string()
        } else {
            codes.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    };
    println!("{}Liked: {}", "• ".green(), join(&prefs.liked_destinations));
    println!("{}Disliked: {}", "• ".green(), join(&prefs.disliked_destinations));

    let favorites = if prefs.favorite_countries.is_empty() {
        "-".to_string()
    } else {
        prefs.favorite_countries.join(", ")
    };
    println!("{}Favorite countries: {}", "• ".cyan(), favorites);
    println!(
        "{}Price range: {:.0} - {:.0}",
        "• ".cyan(),
        prefs.price_range.min,
        prefs.price_range.max
    );

    let seasons = &prefs.seasonal_preferences;
    println!(
        "{}Seasons: spring {}, summer {}, autumn {}, winter {}",
        "• ".cyan(),
        seasons.spring,
        seasons.summer,
        seasons.autumn,
        seasons.winter
    );
    if let Some(updated) = prefs.last_updated {
        println!("{}Last updated: {}", "• ".cyan(), updated.to_rfc3339());
    }
}

fn print_breaker(orchestrator: &NearbyFlightsOrchestrator) {
    let state = orchestrator.breaker_state();
    let status = match state.status {
        CircuitStatus::Closed => "CLOSED".green(),
        CircuitStatus::HalfOpen => "HALF_OPEN".yellow(),
        CircuitStatus::Open => "OPEN".red(),
    };
    println!("{}", "Circuit breaker:".bold().blue());
    println!("{}Status: {}", "• ".green(), status);
    println!(
        "{}Failures: {} / {}",
        "• ".green(),
        state.failure_count,
        state.failure_threshold
    );
    println!("{}Reset timeout: {} ms", "• ".green(), state.reset_timeout_ms);
    if let Some(at) = state.last_failure_time {
        println!("{}Last failure: {}", "• ".green(), at.to_rfc3339());
    }
}
