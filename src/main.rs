use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use scorecard::output::{format_failures, format_score_table, should_use_colors, ScoredEntry};
use scorecard::roster::Entity;
use scorecard::scores::{ScoreMap, Scorer};

const EXIT_SUCCESS: i32 = 0;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// List scores for the whole roster (default if no subcommand)
    List {
        /// Keep going when individual lookups fail and report failures
        /// per entry instead of aborting the batch
        #[arg(long)]
        partial: bool,
    },
    /// Look up the score of a single roster entry by its id
    Get {
        /// Roster id of the entry to score
        id: i64,
    },
}

#[derive(Parser, Debug)]
#[command(name = "scorecard")]
#[command(about = "Roster ranking lookup from the external scorecard site", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/scorecard/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::List { partial: false });
    let start_time = Instant::now();

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match scorecard::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = scorecard::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    if config.roster.is_empty() {
        eprintln!("No roster entries configured in config file.");
        eprintln!("Add entries to ~/.config/scorecard/config.yaml:");
        eprintln!("  roster:");
        eprintln!("    - id: 1");
        eprintln!("      search_key: jasmin-roeper");
        eprintln!("      region: de");
        eprintln!("      locale: Nuremberg");
        std::process::exit(EXIT_CONFIG);
    }

    if cli.verbose {
        eprintln!(
            "Loaded {} roster entries, site: {}",
            config.roster.len(),
            config.site
        );
    }

    // validate_config already checked the timeout string
    let timeout = match config.request_timeout() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Wire the transport for this deployment: proxied or direct
    let transport = match scorecard::transport::select_transport(config.proxy.as_deref(), timeout) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to set up HTTP transport: {}", e);
            std::process::exit(EXIT_NETWORK);
        }
    };

    if cli.verbose {
        match &config.proxy {
            Some(proxy) => eprintln!("Transport: proxied via {}", proxy),
            None => eprintln!("Transport: direct"),
        }
        eprintln!(
            "Timeout: {:?}, max in flight: {}",
            timeout,
            config.effective_max_in_flight()
        );
    }

    let entities = config.entities();
    let scorer = Scorer::new(transport, &config.site)
        .with_max_in_flight(config.effective_max_in_flight());

    let use_colors = should_use_colors();

    match command {
        Commands::List { partial: false } => {
            let scores = match scorer.scores_by_list(&entities).await {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Score lookup failed: {}", e);
                    eprintln!("Re-run with `list --partial` to keep results for reachable entries.");
                    std::process::exit(EXIT_NETWORK);
                }
            };

            print_table(&entities, &scores, use_colors);
        }
        Commands::List { partial: true } => {
            let (scores, failures) = scorer.scores_with_failures(&entities).await;

            // Only rows that actually resolved; failures go to stderr
            let resolved: Vec<Entity> = entities
                .iter()
                .filter(|e| scores.contains_key(&e.id))
                .cloned()
                .collect();
            print_table(&resolved, &scores, use_colors);

            if !failures.is_empty() {
                eprintln!();
                eprintln!("Failed lookups:");
                eprintln!("{}", format_failures(&failures, use_colors));
            }
        }
        Commands::Get { id } => {
            let Some(entity) = entities.iter().find(|e| e.id == id) else {
                eprintln!("No roster entry with id {}.", id);
                std::process::exit(EXIT_CONFIG);
            };

            match scorer.score(entity).await {
                Ok(score) => println!("{}", score),
                Err(e) => {
                    eprintln!("Score lookup failed: {}", e);
                    std::process::exit(EXIT_NETWORK);
                }
            }
        }
    }

    if cli.verbose {
        eprintln!();
        eprintln!("Done in {:?}", start_time.elapsed());
    }

    std::process::exit(EXIT_SUCCESS);
}

/// Print entries sorted by score descending, roster id as tie-breaker.
fn print_table(entities: &[Entity], scores: &ScoreMap, use_colors: bool) {
    let mut rows: Vec<ScoredEntry> = entities
        .iter()
        .map(|entity| ScoredEntry {
            id: entity.id,
            search_key: entity.lookup_target().map(|l| l.search_key.as_str()),
            score: scores.get(&entity.id).copied().unwrap_or(0),
        })
        .collect();

    rows.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));

    println!("{}", format_score_table(&rows, use_colors));
}
