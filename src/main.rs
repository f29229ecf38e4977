use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_dashboard::api::{build_router, state::AppState};
use arena_dashboard::client::{BenchmarkSource, DashboardClient};
use arena_dashboard::config::AppConfig;
use arena_dashboard::duration::{horizon_steps, parse_iso8601_duration, UNAVAILABLE_STEPS};
use arena_dashboard::models::timestamp::parse_timestamp;
use arena_dashboard::models::{ChallengeFilters, ChallengeStatus, RankingFilters};
use arena_dashboard::summary::ChallengeSummary;

#[derive(Parser)]
#[command(name = "arena-dashboard")]
#[command(about = "Dashboard backend for a live time-series forecasting benchmark")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Benchmark API base URL (overrides X_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Benchmark API key (overrides X_API_KEY and the config file)
    #[arg(long)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,

        /// Log all HTTP requests
        #[arg(long)]
        access_log: bool,
    },

    /// List challenges, one summary line each
    Challenges {
        /// Comma-separated statuses (announced, registration, active, completed)
        #[arg(long)]
        status: Option<String>,

        /// Only announced and open-for-registration challenges
        #[arg(long)]
        upcoming: bool,

        /// Only completed challenges that ended on or after this date
        /// (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_since, conflicts_with = "upcoming")]
        completed_since: Option<DateTime<Utc>>,

        /// Free-text match on challenge name and description
        #[arg(long)]
        search: Option<String>,
    },

    /// Show the summary card for one challenge
    Challenge {
        id: String,
    },

    /// Show a model card and its latest Elo standing per definition
    Model {
        id: String,
    },

    /// Show model rankings
    Rankings {
        /// Time range to rank over (default: every range the API offers)
        #[arg(long)]
        time_range: Option<String>,

        /// Restrict to a domain (repeatable)
        #[arg(long)]
        domain: Vec<String>,
    },

    /// Describe an ISO-8601 duration
    Duration {
        value: String,
    },

    /// Number of frequency steps in a horizon
    Steps {
        frequency: String,
        horizon: String,
    },
}

/// `YYYY-MM-DD` (midnight UTC) or any timestamp the API itself accepts.
fn parse_since(value: &str) -> Result<DateTime<Utc>, String> {
    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    parse_timestamp(value).ok_or_else(|| format!("invalid date or timestamp: {}", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = Path::new(&cli.config).exists();
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    // Initialize tracing
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    if !config_found {
        tracing::warn!("Config file {} not found, using defaults", cli.config);
    }

    config.apply_env();
    config.apply_overrides(cli.api_url, cli.api_key);
    config.validate()?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            access_log,
        } => {
            tracing::info!("Starting arena-dashboard v{}", env!("CARGO_PKG_VERSION"));
            let client = DashboardClient::new(&config.api)?;
            tracing::info!("Benchmark API: {}", client.base_url());

            let state = AppState::new(Arc::new(client), &config.cache);
            let app = build_router(state, access_log, &config.server.cors_origin);

            let addr = format!(
                "{}:{}",
                host.unwrap_or(config.server.host),
                port.unwrap_or(config.server.port)
            );
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Dashboard API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Challenges {
            status,
            upcoming,
            completed_since,
            search,
        } => {
            let client = DashboardClient::new(&config.api)?;
            let challenges = if upcoming {
                client.list_upcoming_challenges().await?
            } else if let Some(since) = completed_since {
                client.list_completed_challenges_since(since).await?
            } else {
                let statuses: Vec<ChallengeStatus> =
                    arena_dashboard::models::split_csv(status.as_deref())
                        .into_iter()
                        .map(ChallengeStatus::from)
                        .collect();
                let filters = ChallengeFilters {
                    search,
                    ..ChallengeFilters::with_statuses(&statuses)
                };
                client.list_challenges(&filters).await?
            };

            if challenges.is_empty() {
                println!("No challenges found.");
            }
            let now = Utc::now();
            for challenge in &challenges {
                let series = client
                    .get_challenge_series(challenge.challenge_id.as_str())
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!("No series for {}: {}", challenge.challenge_id, e);
                        Vec::new()
                    });
                println!("{}", ChallengeSummary::build(challenge, &series, now));
            }
        }
        Commands::Challenge { id } => {
            let client = DashboardClient::new(&config.api)?;
            let Some(challenge) = client.get_challenge(&id).await? else {
                anyhow::bail!("Challenge {} not found", id);
            };
            let series = client.get_challenge_series(&id).await?;
            let summary = ChallengeSummary::build(&challenge, &series, Utc::now());

            println!("=== {} ===", summary.title);
            println!("ID:         {}", summary.challenge_id);
            println!("Status:     {}", summary.status);
            println!("Series:     {}", summary.n_time_series);
            println!("Models:     {}", summary.model_count);
            println!("Frequency:  {}", summary.frequency_label);
            println!("Horizon:    {}", summary.horizon_label);
            println!("Steps:      {}", summary.horizon_steps_label());
            println!("Context:    {}", summary.context_label());
            if let Some(countdown) = &summary.countdown {
                println!("Countdown:  {}", countdown);
            }
            if !series.is_empty() {
                println!("\nSeries:");
                for s in &series {
                    println!("  - [{}] {}", s.series_id, s.display_name());
                }
            }
            match client.list_challenge_models(&id).await {
                Ok(models) if !models.is_empty() => {
                    println!("\nModels:");
                    for m in &models {
                        println!("  - {} ({})", m.display_name(), m.readable_id);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("No models for challenge {}: {}", id, e),
            }
        }
        Commands::Model { id } => {
            let client = DashboardClient::new(&config.api)?;
            let Some(details) = client.get_model_details(&id).await? else {
                anyhow::bail!("Model {} not found", id);
            };
            println!(
                "=== {} ===",
                details.name.as_deref().unwrap_or(&details.readable_id)
            );
            println!("ID:           {}", details.readable_id);
            println!("Family:       {}", details.model_family.as_deref().unwrap_or("-"));
            println!("Architecture: {}", details.architecture.as_deref().unwrap_or("-"));
            println!(
                "Size:         {}",
                details
                    .model_size
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!("Published:    {}", details.publishing_date.as_deref().unwrap_or("-"));

            let history = client.get_model_rankings(&id).await?;
            for definition in &history.definition_rankings {
                let name = definition
                    .definition_name
                    .clone()
                    .unwrap_or_else(|| format!("Definition {}", definition.definition_id));
                match definition.latest() {
                    Some(day) => println!(
                        "{:<32} ELO: {:<7} Rank: {} ({})",
                        name,
                        day.elo_score
                            .map(|e| format!("{:.1}", e))
                            .unwrap_or_else(|| "N/A".to_string()),
                        day.rank_position
                            .map(|r| r.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        day.calculation_date
                    ),
                    None => println!("{:<32} no rankings yet", name),
                }
            }
        }
        Commands::Rankings { time_range, domain } => {
            let client = DashboardClient::new(&config.api)?;
            let filters = RankingFilters {
                domains: domain,
                ..Default::default()
            };
            let time_ranges = match time_range {
                Some(range) => vec![range],
                None => {
                    let options = client.get_filter_options().await?;
                    if options.time_ranges.is_empty() {
                        vec![arena_dashboard::api::routes::rankings::DEFAULT_TIME_RANGE.to_string()]
                    } else {
                        options.time_ranges
                    }
                }
            };

            for range in &time_ranges {
                let rows = client
                    .get_filtered_rankings(&filters.for_time_range(range))
                    .await?;
                println!("\n=== {} ({} models) ===", range, rows.len());
                for row in &rows {
                    println!(
                        "{:>3}. {:<32} MASE: {:<6} ELO: {:<7} Rounds: {}",
                        row.rank_position
                            .map(|r| r.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        row.model_name
                            .as_deref()
                            .or(row.readable_id.as_deref())
                            .unwrap_or("?"),
                        row.mase_avg
                            .map(|m| format!("{:.3}", m))
                            .unwrap_or_else(|| "N/A".to_string()),
                        row.elo_score
                            .map(|e| format!("{:.1}", e))
                            .unwrap_or_else(|| "N/A".to_string()),
                        row.rounds_participated
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    );
                }
            }
        }
        Commands::Duration { value } => {
            let parsed = parse_iso8601_duration(&value)?;
            let b = &parsed.breakdown;
            println!("Duration:      {}", value);
            println!(
                "Breakdown:     {}Y {}M {}W {}D {}h {}m {}s",
                b.years, b.months, b.weeks, b.days, b.hours, b.minutes, b.seconds
            );
            println!("Total seconds: {}", parsed.total_seconds);
            println!("Label:         {}", parsed.label());
        }
        Commands::Steps { frequency, horizon } => {
            let steps = horizon_steps(&frequency, &horizon);
            if steps == UNAVAILABLE_STEPS {
                tracing::warn!(
                    "Cannot compute steps for frequency {} and horizon {}",
                    frequency,
                    horizon
                );
            }
            println!("{}", steps);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_since() {
        let midnight = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_since("2025-10-01").unwrap(), midnight);
        assert_eq!(parse_since("2025-10-01T00:00:00Z").unwrap(), midnight);
        assert!(parse_since("last week").is_err());
    }
}
