use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::booking::{BookingDomain, PaymentMode, TurfBookingType, TurfSize};
use crate::filter::SettlementFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "courtside",
    version,
    about = "Courtside: booking calendar for turf and court venues",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Config file to read instead of $COURTSIDERC / ~/.courtsiderc.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Venue to work on (turf or court). Defaults to `default.domain`.
    #[arg(
        long = "domain",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<BookingDomain>()),
        global = true
    )]
    pub domain: Option<BookingDomain>,

    /// Read bookings from an exported API response instead of the backend.
    #[arg(long = "from-file", global = true)]
    pub from_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Month grid with booking chips.
    Calendar(CalendarArgs),
    /// Filtered booking table.
    List(ListArgs),
    /// Detail view of one booking.
    Show { id: String },
    /// Create a booking.
    Book(BookArgs),
    /// Delete a booking.
    Delete {
        id: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Record an additional payment against the pending balance.
    Pay { id: String, amount: f64 },
    /// Print the effective configuration.
    Config,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CalendarArgs {
    /// Month to show: today, next, prev, a month name, YYYY-MM or YYYY-MM-DD.
    #[arg(long)]
    pub month: Option<String>,

    /// Months to move from the selected month (negative goes back).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub offset: i32,

    /// Click a day cell (YYYY-MM-DD).
    #[arg(long)]
    pub day: Option<String>,

    /// Click a booking chip by id.
    #[arg(long)]
    pub booking: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Matches customer name, team name or phone.
    #[arg(long)]
    pub search: Option<String>,

    /// Booking type (turf) or sport (court); `all` disables.
    #[arg(long)]
    pub category: Option<String>,

    #[arg(
        long,
        default_value = "all",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<SettlementFilter>())
    )]
    pub settlement: SettlementFilter,
}

#[derive(Args, Debug, Clone)]
pub struct BookArgs {
    #[arg(long)]
    pub date: String,

    #[arg(long)]
    pub start: String,

    #[arg(long)]
    pub end: String,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long, default_value = "")]
    pub email: String,

    #[arg(long, default_value = "")]
    pub team: String,

    #[arg(long, default_value_t = 0.0)]
    pub advance: f64,

    #[arg(
        long,
        default_value = "cash",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<PaymentMode>())
    )]
    pub payment: PaymentMode,

    /// Turf booking method.
    #[arg(
        long = "type",
        default_value = "turf-wise",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<TurfBookingType>())
    )]
    pub booking_type: TurfBookingType,

    /// Turf size in square feet.
    #[arg(
        long,
        default_value = "10000",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<TurfSize>())
    )]
    pub size: TurfSize,

    /// Court sport (court bookings only).
    #[arg(long)]
    pub sport: Option<String>,

    /// Court number (court bookings only).
    #[arg(long = "court", default_value_t = 1)]
    pub court_number: u32,

    /// Total price (court bookings only); pending is derived from it.
    #[arg(long)]
    pub total: Option<f64>,

    #[arg(long = "created-by", default_value = "courtside")]
    pub created_by: String,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
