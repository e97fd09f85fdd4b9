//! `stowage` CLI: availability, price estimates and bookings against a
//! marketplace snapshot, from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Inclusive day count and the dates it covers
//! stowage days --start 2024-05-01 --end 2024-05-03
//!
//! # Remaining capacity of one space
//! stowage --market market.json availability --space <SPACE_ID> --start 2024-06-11 --end 2024-06-13
//!
//! # Per-day usage of one space
//! stowage --market market.json calendar --space <SPACE_ID> --start 2024-06-01 --end 2024-06-30
//!
//! # Price estimate
//! stowage --market market.json quote --space <SPACE_ID> --start 2024-05-01 --end 2024-05-03 --small 2
//!
//! # Spaces that fit the items, counting every reservation that has not ended
//! STOWAGE_MARKET=market.json stowage --count upcoming search --start 2024-06-11 --end 2024-06-13 --medium 1
//!
//! # Items taken from an item-classifier reply on stdin
//! echo '{"small": 2, "large": 1}' | stowage --market market.json search --reply - --start 2024-06-11 --end 2024-06-13
//!
//! # Book and write the updated snapshot back
//! stowage --market market.json book --space <SPACE_ID> --renter <USER_ID> --start 2024-07-01 --end 2024-07-03 --small 1 --save
//!
//! # Owner figures for the current month
//! stowage --market market.json --today 2024-06-11 stats --space <SPACE_ID> --owner <USER_ID>
//! ```
//!
//! Results are JSON on stdout; logs go to stderr.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Read};
use std::sync::Arc;
use stowage_engine::dates::{days_between_inclusive, enumerate_days};
use stowage_engine::{
    parse_classifier_reply, DateRange, InMemoryStore, LivePolicy, MarketSnapshot, Marketplace,
    ReservationRequest, SearchQuery, SpaceId, TierCounts, UserId,
};
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(
    name = "stowage",
    version,
    about = "Storage-space marketplace availability and pricing CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Marketplace snapshot JSON with `spaces` and `reservations` (`-` reads stdin)
    #[arg(long, global = true, env = "STOWAGE_MARKET")]
    market: Option<String>,

    /// Reference date for `--count upcoming` and `stats` (defaults to today, UTC)
    #[arg(long, global = true, env = "STOWAGE_TODAY")]
    today: Option<NaiveDate>,

    /// Which reservations count against capacity
    #[arg(long, global = true, value_enum, default_value_t = Counting::NonRejected)]
    count: Counting,

    /// Log at DEBUG level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Counting {
    /// Every reservation except rejected ones
    NonRejected,
    /// Non-rejected reservations ending on or after `--today`
    Upcoming,
    /// Every reservation, whatever its status
    All,
}

impl Counting {
    fn policy(self, today: NaiveDate) -> LivePolicy {
        match self {
            Counting::NonRejected => LivePolicy::non_rejected(),
            Counting::Upcoming => LivePolicy::upcoming(today),
            Counting::All => LivePolicy::all(),
        }
    }
}

/// Inclusive date range arguments.
#[derive(Args)]
struct Window {
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,
    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,
}

impl Window {
    fn range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }
}

/// Requested item counts per tier.
#[derive(Args)]
struct Items {
    #[arg(long, default_value_t = 0)]
    small: u32,
    #[arg(long, default_value_t = 0)]
    medium: u32,
    #[arg(long, default_value_t = 0)]
    large: u32,
}

impl Items {
    fn counts(&self) -> TierCounts {
        TierCounts::new(self.small, self.medium, self.large)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Count and list the calendar days of a range
    Days {
        #[command(flatten)]
        window: Window,
    },
    /// Remaining capacity per tier of one space
    Availability {
        #[arg(long)]
        space: SpaceId,
        #[command(flatten)]
        window: Window,
    },
    /// Committed quantity per tier on each day of a range
    Calendar {
        #[arg(long)]
        space: SpaceId,
        #[command(flatten)]
        window: Window,
    },
    /// Price estimate for items in one space
    Quote {
        #[arg(long)]
        space: SpaceId,
        #[command(flatten)]
        window: Window,
        #[command(flatten)]
        items: Items,
    },
    /// Spaces that can take the items on every day of the range
    Search {
        #[command(flatten)]
        window: Window,
        #[command(flatten)]
        items: Items,
        /// Take the item counts from an item-classifier reply instead (`-` reads stdin)
        #[arg(long)]
        reply: Option<String>,
    },
    /// Create a pending reservation
    Book {
        #[arg(long)]
        space: SpaceId,
        #[arg(long)]
        renter: UserId,
        #[command(flatten)]
        window: Window,
        #[command(flatten)]
        items: Items,
        /// Item photo reference, once per requested item
        #[arg(long = "photo")]
        photos: Vec<String>,
        /// Write the updated snapshot back to the --market file
        #[arg(long)]
        save: bool,
    },
    /// Owner figures for the month containing --today
    Stats {
        #[arg(long)]
        space: SpaceId,
        #[arg(long)]
        owner: UserId,
    },
}

#[derive(Serialize)]
struct DaysOutput {
    days: u64,
    dates: Vec<NaiveDate>,
}

type Market = Marketplace<InMemoryStore, InMemoryStore>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let today = cli.today.unwrap_or_else(|| Utc::now().date_naive());
    let policy = cli.count.policy(today);
    let market_path = cli.market.as_deref();

    match cli.command {
        Commands::Days { window } => {
            let output = DaysOutput {
                days: days_between_inclusive(window.start, window.end),
                dates: enumerate_days(window.start, window.end).collect(),
            };
            print_json(&output)?;
        }
        Commands::Availability { space, window } => {
            let (market, _) = open_market(market_path, policy)?;
            let remaining = market
                .availability(space, window.range())
                .context("Failed to compute availability")?;
            print_json(&remaining)?;
        }
        Commands::Calendar { space, window } => {
            let (market, _) = open_market(market_path, policy)?;
            let days = market
                .calendar(space, window.range())
                .context("Failed to compute calendar")?;
            print_json(&days)?;
        }
        Commands::Quote {
            space,
            window,
            items,
        } => {
            let (market, _) = open_market(market_path, policy)?;
            let quote = market
                .quote(space, items.counts(), window.range())
                .context("Failed to compute quote")?;
            print_json(&quote)?;
        }
        Commands::Search {
            window,
            items,
            reply,
        } => {
            let requested = match reply.as_deref() {
                Some(source) => {
                    if !items.counts().is_zero() {
                        bail!("--reply cannot be combined with --small/--medium/--large");
                    }
                    if source == "-" && market_path == Some("-") {
                        bail!("stdin can feed only one of --market and --reply");
                    }
                    let raw = read_input(source)?;
                    parse_classifier_reply(&raw).context("Failed to read classifier reply")?
                }
                None => items.counts(),
            };
            let (market, _) = open_market(market_path, policy)?;
            let hits = market
                .search(&SearchQuery::new(window.range(), requested))
                .context("Search failed")?;
            print_json(&hits)?;
        }
        Commands::Book {
            space,
            renter,
            window,
            items,
            photos,
            save,
        } => {
            let (market, store) = open_market(market_path, policy)?;
            let request = ReservationRequest {
                renter_id: renter,
                space_id: space,
                range: window.range(),
                quantity: items.counts(),
                item_photos: photos,
            };
            let reservation = market
                .create_reservation(request, Utc::now())
                .context("Booking refused")?;
            if save {
                let path = match market_path {
                    Some(path) if path != "-" => path,
                    _ => bail!("--save needs --market to name a file"),
                };
                let snapshot = store.snapshot()?;
                let json = serde_json::to_string_pretty(&snapshot)?;
                write_file(path, &json)?;
                info!(path, "snapshot saved");
            }
            print_json(&reservation)?;
        }
        Commands::Stats { space, owner } => {
            let (market, _) = open_market(market_path, policy)?;
            let stats = market
                .space_stats(owner, space, today)
                .context("Failed to compute stats")?;
            print_json(&stats)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

/// Load a snapshot into a fresh in-memory marketplace. The store is returned
/// too so bookings can be written back.
fn open_market(path: Option<&str>, policy: LivePolicy) -> Result<(Market, Arc<InMemoryStore>)> {
    let path = path.context("No marketplace snapshot: pass --market or set STOWAGE_MARKET")?;
    let raw = read_input(path)?;
    let snapshot: MarketSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid marketplace snapshot: {}", path))?;
    debug!(
        spaces = snapshot.spaces.len(),
        reservations = snapshot.reservations.len(),
        "snapshot loaded"
    );

    let store = Arc::new(InMemoryStore::from_snapshot(snapshot));
    let market = Marketplace::in_memory(Arc::clone(&store)).with_policy(policy);
    Ok((market, store))
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(source).with_context(|| format!("Failed to read file: {}", source))
}

fn write_file(path: &str, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write file: {}", path))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
