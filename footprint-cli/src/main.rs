//! Footprint CLI
//!
//! Polite discovery and correlation of your own public profiles.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use footprint_analysis::generate_candidates;
use footprint_core::FootprintConfig;
use footprint_net::CompliantFetcher;
use footprint_runtime::{Investigation, InvestigationRequest};

#[derive(Parser)]
#[command(name = "footprint")]
#[command(author, version, about = "Footprint: public-profile self-audit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover and correlate public profiles
    Investigate {
        /// Name variant to search for (repeatable)
        #[arg(short, long = "name")]
        names: Vec<String>,

        /// Email address whose local part seeds candidates
        #[arg(short, long)]
        email: Option<String>,

        /// Already-known profile URL (repeatable)
        #[arg(short, long = "profile")]
        profiles: Vec<String>,

        /// TOML configuration file
        #[arg(short, long, env = "FOOTPRINT_CONFIG")]
        config: Option<PathBuf>,

        /// Output file for the JSON report (default: footprint_<timestamp>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum discovery runtime in seconds (0 = unlimited)
        #[arg(long, default_value = "300")]
        timeout: u64,

        /// Cap on generated username candidates
        #[arg(long)]
        max_candidates: Option<usize>,
    },

    /// Print generated username candidates without any network access
    Candidates {
        /// Name variant (repeatable)
        #[arg(short, long = "name")]
        names: Vec<String>,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long, env = "FOOTPRINT_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Check robots.txt policy for a URL
    Robots {
        #[arg(short, long)]
        url: String,

        #[arg(short, long, env = "FOOTPRINT_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the default configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Investigate {
            names,
            email,
            profiles,
            config,
            output,
            timeout,
            max_candidates,
        } => {
            let mut config = load_config(config.as_deref())?;
            if max_candidates.is_some() {
                config.discovery.max_candidates = max_candidates;
            }

            let request = InvestigationRequest {
                name_variants: names,
                email,
                known_profiles: profiles,
                max_runtime_secs: timeout,
            };
            run_investigation(config, request, output).await?;
        }
        Commands::Candidates {
            names,
            email,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            for candidate in generate_candidates(&names, email.as_deref(), &config.discovery) {
                println!("{}", candidate);
            }
        }
        Commands::Robots { url, config } => {
            check_robots(&url, load_config(config.as_deref())?).await?;
        }
        Commands::Config => {
            print!("{}", FootprintConfig::default().to_toml()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<FootprintConfig> {
    match path {
        Some(path) => FootprintConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(FootprintConfig::default()),
    }
}

async fn run_investigation(
    config: FootprintConfig,
    request: InvestigationRequest,
    output: Option<PathBuf>,
) -> Result<()> {
    println!("🔍 Footprint - public-profile self-audit\n");
    println!("👤 Names: {}", request.name_variants.join(", "));
    if let Some(email) = &request.email {
        println!("📧 Email: {}", email);
    }
    println!("⏱️  Timeout: {}s\n", request.max_runtime_secs);

    let investigation = Investigation::new(config)?;
    let report = investigation.run(&request).await?;

    let output_path = output.unwrap_or_else(|| {
        let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
        PathBuf::from(format!("footprint_{}.json", timestamp))
    });

    let json = serde_json::to_string_pretty(&report)?;
    fs::write(&output_path, json)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    let correlation = &report.correlation;
    println!("\n✅ Investigation complete!");
    println!("📄 Report saved to: {}", output_path.display());
    println!("\n{}", "=".repeat(60));
    println!("Profiles discovered: {}", report.candidates.len());
    for candidate in &report.candidates {
        println!(
            "   {:>5.1}  {:<10} {}",
            candidate.confidence_score, candidate.platform, candidate.url
        );
    }
    println!("Profiles correlated: {}", report.profiles.len());
    println!(
        "Correlation score:   {:.1}",
        correlation.overall_correlation_score
    );
    println!("Privacy risk:        {}", correlation.privacy_risk_assessment);
    println!("Sources recorded:    {}", report.attribution.total_sources);

    if !correlation.recommendations.is_empty() {
        println!("\nRecommendations:");
        for recommendation in &correlation.recommendations {
            println!("   - {}", recommendation);
        }
    }

    Ok(())
}

async fn check_robots(url: &str, config: FootprintConfig) -> Result<()> {
    config.validate()?;
    let user_agent = config.politeness.user_agent.clone();
    let fetcher = CompliantFetcher::new(config.politeness)?;

    let allowed = fetcher.robots().can_fetch(url, &user_agent).await;
    let delay = fetcher.robots().crawl_delay(url, &user_agent).await;

    if allowed {
        println!("✅ Allowed: {}", url);
    } else {
        println!("❌ Disallowed by robots.txt: {}", url);
    }
    println!("   User agent:  {}", user_agent);
    println!("   Crawl delay: {:.1}s", delay);

    Ok(())
}
