use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use edh_stats::calculate::{
    aggregate_color_groups, process, visible_medals, year_summary, ProcessedStats,
};
use edh_stats::config::AppConfig;
use edh_stats::ingest::screen_matches;
use edh_stats::models::{Match, Window};
use edh_stats::query::{
    query_history, query_records, HistoryColumn, HistorySort, MatchFilter, SortGroup, SortKey,
    SortOrder, SortState, TurnComparison,
};
use edh_stats::report;
use edh_stats::storage::{
    derived_row_counts, read_matches, write_derived, DerivedKind, StorageConfig,
};

#[derive(Parser)]
#[command(name = "edh-stats")]
#[command(about = "Commander match statistics: win rates, medals, color groups")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Match dataset (default: <data-dir>/matches.json)
    #[arg(long)]
    matches: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Feed every match to the engine without validation
    #[arg(long)]
    lenient: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    Players,
    Decks,
}

#[derive(Subcommand)]
enum Commands {
    /// Player or deck statistics table with medals
    Stats {
        #[arg(long, value_enum, default_value_t = View::Players)]
        view: View,

        /// Window: total, recent or a year
        #[arg(long, default_value = "total")]
        window: Window,

        /// Case-insensitive name filter
        #[arg(long, default_value = "")]
        search: String,

        /// Sort column (name, games, wins, winrate, win-turn, made-c, ...)
        #[arg(long, default_value = "winrate")]
        sort: SortKey,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,

        /// Step a column-group sort (turns, decks, made, taken); repeatable
        #[arg(long)]
        cycle: Vec<SortGroup>,

        /// Let inactive players and decks take medals
        #[arg(long)]
        include_inactive: bool,
    },

    /// Color-group statistics table
    Colors {
        #[arg(long, default_value = "total")]
        window: Window,

        #[arg(long, default_value = "games")]
        sort: SortKey,

        #[arg(long)]
        asc: bool,

        #[arg(long)]
        cycle: Vec<SortGroup>,
    },

    /// Match history with filters
    History {
        /// Earliest date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Max elimination turn to compare against
        #[arg(long)]
        turn: Option<u32>,

        /// Turn comparison: equals, greater or less
        #[arg(long, default_value = "equals")]
        turn_cmp: TurnComparison,

        /// Player name search (word prefix)
        #[arg(long)]
        player: Option<String>,

        /// Deck name search (word prefix)
        #[arg(long)]
        deck: Option<String>,

        /// Finishing position 1-4 held by the searched player or deck; repeatable
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
        position: Vec<u8>,

        /// Header clicks applied in order (date, turn, winner, 2nd, 3rd, 4th); repeatable
        #[arg(long)]
        sort: Vec<HistoryColumn>,

        /// Show at most this many matches
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Year-in-review summary
    Retrospective {
        /// Year to summarize (default: latest year with matches)
        #[arg(long)]
        year: Option<u16>,
    },

    /// Write derived players, decks and colors as JSONL
    Export,

    /// Report matches rejected by validation
    Validate,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn sort_state(sort: SortKey, asc: bool, cycle: &[SortGroup]) -> SortState {
    let order = if asc { SortOrder::Asc } else { SortOrder::Desc };
    let mut state = SortState::new(sort, order);
    for group in cycle {
        state.cycle(*group);
    }
    state
}

fn load_matches(cli: &Cli, storage: &StorageConfig) -> Result<Vec<Match>> {
    let path = cli.matches.clone().unwrap_or_else(|| storage.matches_path());
    read_matches(&path).with_context(|| format!("Failed to load matches from {:?}", path))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_tracing(&level, cli.json_logs);

    tracing::info!("Starting edh-stats v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(cli.data_dir.clone().unwrap_or_else(|| config.data_dir.clone()));
    let matches = load_matches(&cli, &storage)?;

    let validating = matches!(cli.command, Commands::Validate);
    let (matches, rejected) = if cli.lenient && !validating {
        (matches, Vec::new())
    } else {
        let screening = screen_matches(matches);
        (screening.accepted, screening.rejected)
    };
    let stats = process(&matches, &config.stats);

    match cli.command {
        Commands::Stats {
            view,
            window,
            search,
            sort,
            asc,
            cycle,
            include_inactive,
        } => {
            let state = sort_state(sort, asc, &cycle);
            let table = match view {
                View::Players => {
                    let rows = query_records(&stats.players, window, &search, &state);
                    let medals = visible_medals(&rows, include_inactive, &config.medals);
                    report::stats_table(&rows, window, &medals)
                }
                View::Decks => {
                    let rows = query_records(&stats.decks, window, &search, &state);
                    let medals = visible_medals(&rows, include_inactive, &config.medals);
                    report::stats_table(&rows, window, &medals)
                }
            };
            println!("{}", table);
        }

        Commands::Colors {
            window,
            sort,
            asc,
            cycle,
        } => {
            let groups = aggregate_color_groups(&stats.decks);
            let state = sort_state(sort, asc, &cycle);
            let rows = query_records(&groups, window, "", &state);
            println!("{}", report::colors_table(&rows, window));
        }

        Commands::History {
            from,
            to,
            turn,
            turn_cmp,
            player,
            deck,
            position,
            sort,
            limit,
        } => {
            let filter = MatchFilter {
                date_from: from,
                date_to: to,
                turn: turn.map(|t| (turn_cmp, t)),
                player,
                deck,
                positions: position,
            };
            let mut order = HistorySort::default();
            for column in sort {
                order.toggle(column);
            }
            let mut rows = query_history(&matches, &filter, &order);
            tracing::debug!("History query kept {} of {} matches", rows.len(), matches.len());
            if let Some(limit) = limit {
                rows.truncate(limit);
            }
            println!("{}", report::history_table(&rows, &order));
        }

        Commands::Retrospective { year } => {
            let Some(year) = year.or_else(|| latest_year(&stats)) else {
                println!("No dated matches to summarize.");
                return Ok(());
            };
            println!("{}", report::year_summary_report(&year_summary(year, &stats)));
        }

        Commands::Export => {
            let groups = aggregate_color_groups(&stats.decks);
            let players = write_derived(&storage, DerivedKind::Players, &stats.players)
                .context("Failed to write players")?;
            let decks = write_derived(&storage, DerivedKind::Decks, &stats.decks)
                .context("Failed to write decks")?;
            let colors = write_derived(&storage, DerivedKind::Colors, &groups)
                .context("Failed to write color groups")?;

            println!("\n=== Export Results ===");
            println!("Players:          {}", players);
            println!("Decks:            {}", decks);
            println!("Color groups:     {}", colors);
            println!("Written to:       {:?}", storage.derived_dir());
        }

        Commands::Validate => {
            println!("{}", report::rejections_report(&rejected));
            println!("\n{}", report::run_summary_report(&stats.summary));

            let current = [
                stats.players.len(),
                stats.decks.len(),
                aggregate_color_groups(&stats.decks).len(),
            ];
            let status: Vec<_> = derived_row_counts(&storage)
                .context("Failed to read derived outputs")?
                .into_iter()
                .zip(current)
                .map(|((kind, on_disk), now)| (kind, on_disk, now))
                .collect();
            println!("\n{}", report::derived_status_report(&status));
        }
    }

    Ok(())
}

fn latest_year(stats: &ProcessedStats) -> Option<u16> {
    stats.summary.matches_by_year.keys().next_back().copied()
}
