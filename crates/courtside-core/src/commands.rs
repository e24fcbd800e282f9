use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use chrono::NaiveDate;
use courtside_shared::{CourtBookingCreate, TurfBookingCreate};
use tokio::runtime::Runtime;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, NewBooking, decode_listing};
use crate::booking::{Booking, BookingDomain, normalize_bookings};
use crate::cli::{BookArgs, CalendarArgs, Command, ListArgs};
use crate::config::Config;
use crate::datetime::{parse_calendar_day, parse_month_expr, parse_wall_clock};
use crate::filter::BookingFilter;
use crate::format::{format_inr, format_long_date};
use crate::index::BookingIndex;
use crate::loadable::{Loadable, RequestSequence};
use crate::overlay::BookingDetail;
use crate::payment::settle_payment;
use crate::render::Renderer;
use crate::scheduler::{ClickOutcome, OutsideMonthPolicy, Scheduler, SchedulerEvents};

/// Where bookings come from for this invocation.
#[derive(Debug)]
pub enum BookingSource {
    Api(ApiClient),
    /// Exported listing response; read-only.
    Snapshot(PathBuf),
}

#[derive(Debug)]
pub struct CommandContext {
    pub domain: BookingDomain,
    pub today: NaiveDate,
    pub outside_month: OutsideMonthPolicy,
    pub source: BookingSource,
    /// Shared by every listing load so a late response cannot overwrite a
    /// newer one.
    pub requests: RequestSequence,
}

impl CommandContext {
    /// Current listing for the context's domain. Failures are logged and
    /// come back as `Loadable::Failed`.
    pub fn load_bookings(&self, rt: &Runtime) -> Loadable<Vec<Booking>> {
        let mut slot = Loadable::Loading;

        let (ticket, value) = match &self.source {
            BookingSource::Api(client) => {
                rt.block_on(client.fetch_listing(self.domain, &self.requests))
            }
            BookingSource::Snapshot(path) => {
                let ticket = self.requests.begin();
                let result = read_snapshot(self.domain, path);
                if let Err(err) = &result {
                    warn!(
                        path = %path.display(),
                        error = %format!("{err:#}"),
                        "failed reading booking snapshot"
                    );
                }
                (ticket, Loadable::from_result(result))
            }
        };
        self.requests.accept(ticket, value, &mut slot);

        slot
    }

    fn api(&self) -> anyhow::Result<&ApiClient> {
        match &self.source {
            BookingSource::Api(client) => Ok(client),
            BookingSource::Snapshot(path) => Err(anyhow!(
                "bookings were loaded from {}; changes need the booking API",
                path.display()
            )),
        }
    }
}

fn read_snapshot(domain: BookingDomain, path: &Path) -> anyhow::Result<Vec<Booking>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records = decode_listing(domain, &text)
        .with_context(|| format!("failed decoding bookings in {}", path.display()))?;
    Ok(normalize_bookings(records))
}

/// Collects the scheduler's create requests for printing after the grid.
#[derive(Debug, Default)]
struct CliEvents {
    create_requested: Option<NaiveDate>,
}

impl SchedulerEvents for CliEvents {
    fn on_request_create(&mut self, date: NaiveDate) {
        self.create_requested = Some(date);
    }

    fn on_select_booking(&mut self, booking: &Booking) {
        debug!(booking = %booking.id, "booking selected");
    }
}

#[instrument(skip_all)]
pub fn dispatch(
    ctx: &CommandContext,
    cfg: &Config,
    renderer: &Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    debug!(domain = ctx.domain.as_key(), today = %ctx.today, "dispatching command");

    match command {
        Command::Calendar(args) => cmd_calendar(ctx, renderer, &rt, &args),
        Command::List(args) => cmd_list(ctx, renderer, &rt, args),
        Command::Show { id } => cmd_show(ctx, renderer, &rt, &id),
        Command::Book(args) => cmd_book(ctx, renderer, &rt, &args),
        Command::Delete { id, yes } => cmd_delete(ctx, renderer, &rt, &id, yes),
        Command::Pay { id, amount } => cmd_pay(ctx, renderer, &rt, &id, amount),
        Command::Config => renderer.print_config(cfg),
    }
}

#[instrument(skip_all, fields(month = ?args.month, offset = args.offset))]
fn cmd_calendar(
    ctx: &CommandContext,
    renderer: &Renderer,
    rt: &Runtime,
    args: &CalendarArgs,
) -> anyhow::Result<()> {
    info!("command calendar");

    let loaded = ctx.load_bookings(rt);
    let bookings = loaded.loaded_or_empty();
    let index = BookingIndex::build(bookings);

    let mut scheduler = Scheduler::new(ctx.today, ctx.outside_month);
    if let Some(raw) = args.month.as_deref() {
        scheduler.show_month(parse_month_expr(raw, ctx.today)?);
    }
    if args.offset != 0 {
        scheduler.navigate_month(args.offset);
    }

    let grid = scheduler.grid(ctx.today, &index);
    renderer.print_month_grid(&grid)?;

    let mut events = CliEvents::default();

    if let Some(raw) = args.day.as_deref() {
        let date = parse_calendar_day(raw)?;
        if scheduler.click_day(date, &index, &mut events) == ClickOutcome::Ignored {
            renderer.print_message(&format!(
                "\n{} is outside {}; pass --rc calendar.outside_month=allow to open it.",
                format_long_date(date),
                grid.title()
            ))?;
        }
    }

    if let Some(id) = args.booking.as_deref() {
        let booking = index
            .find(id)
            .ok_or_else(|| anyhow!("no booking with id {id} in the loaded listing"))?;
        scheduler.click_booking(booking, &mut events);
    }

    if let Some(booking) = scheduler.selected() {
        renderer.print_message("")?;
        renderer.print_booking_detail(&BookingDetail::from_booking(booking))?;
        scheduler.close_detail();
    }

    if let Some(date) = events.create_requested {
        renderer.print_message("")?;
        renderer.print_create_hint(ctx.domain, date)?;
    }

    Ok(())
}

#[instrument(skip_all)]
fn cmd_list(
    ctx: &CommandContext,
    renderer: &Renderer,
    rt: &Runtime,
    args: ListArgs,
) -> anyhow::Result<()> {
    info!("command list");

    let loaded = ctx.load_bookings(rt);
    let filter = BookingFilter {
        search: args.search,
        category: args.category,
        settlement: args.settlement,
    };
    let matched = filter.apply(loaded.loaded_or_empty());
    debug!(matched = matched.len(), "filtered bookings");

    renderer.print_booking_table(&matched)
}

#[instrument(skip(ctx, renderer, rt))]
fn cmd_show(
    ctx: &CommandContext,
    renderer: &Renderer,
    rt: &Runtime,
    id: &str,
) -> anyhow::Result<()> {
    info!("command show");

    let booking = match &ctx.source {
        BookingSource::Api(client) => rt.block_on(client.get_booking(ctx.domain, id))?,
        BookingSource::Snapshot(_) => {
            let loaded = ctx.load_bookings(rt);
            loaded
                .loaded_or_empty()
                .iter()
                .find(|b| b.id == id)
                .cloned()
                .ok_or_else(|| anyhow!("no booking with id {id}"))?
        }
    };

    renderer.print_booking_detail(&BookingDetail::from_booking(&booking))
}

#[instrument(skip_all)]
fn cmd_book(
    ctx: &CommandContext,
    renderer: &Renderer,
    rt: &Runtime,
    args: &BookArgs,
) -> anyhow::Result<()> {
    info!("command book");

    let client = ctx.api()?;
    let create = build_new_booking(ctx.domain, args)?;
    match rt.block_on(client.create_booking(&create))? {
        Some(booking) => renderer.print_booking_detail(&BookingDetail::from_booking(&booking)),
        None => renderer.print_message("Booking created."),
    }
}

#[instrument(skip(ctx, renderer, rt))]
fn cmd_delete(
    ctx: &CommandContext,
    renderer: &Renderer,
    rt: &Runtime,
    id: &str,
    yes: bool,
) -> anyhow::Result<()> {
    info!("command delete");

    if !yes {
        bail!("refusing to delete booking {id} without --yes");
    }

    let client = ctx.api()?;
    rt.block_on(client.delete_booking(ctx.domain, id))?;
    renderer.print_message(&format!("Deleted booking {id}."))
}

#[instrument(skip(ctx, renderer, rt))]
fn cmd_pay(
    ctx: &CommandContext,
    renderer: &Renderer,
    rt: &Runtime,
    id: &str,
    amount: f64,
) -> anyhow::Result<()> {
    info!("command pay");

    let client = ctx.api()?;
    let booking = rt.block_on(client.get_booking(ctx.domain, id))?;
    let update = settle_payment(&booking, amount)?;
    rt.block_on(client.update_payment(ctx.domain, id, &update))?;

    renderer.print_message(&format!(
        "Recorded {} for {}. Advance {}, pending {}.",
        format_inr(amount),
        booking.customer_name,
        format_inr(update.advance_amount),
        format_inr(update.pending_amount)
    ))
}

/// Validates the `book` arguments and shapes the create payload for `domain`.
pub fn build_new_booking(domain: BookingDomain, args: &BookArgs) -> anyhow::Result<NewBooking> {
    let date = parse_calendar_day(&args.date)?;
    let start = parse_wall_clock(&args.start).context("invalid --start")?;
    let end = parse_wall_clock(&args.end).context("invalid --end")?;
    if end <= start {
        bail!("booking must end after it starts ({} - {})", args.start, args.end);
    }

    let name = args.name.trim();
    let phone = args.phone.trim();
    if name.is_empty() || phone.is_empty() {
        bail!("--name and --phone are required");
    }
    if !args.advance.is_finite() || args.advance < 0.0 {
        bail!("--advance must be a non-negative amount");
    }

    let booking_date = date.format("%Y-%m-%d").to_string();
    let start_time = start.format("%H:%M").to_string();
    let end_time = end.format("%H:%M").to_string();

    let create = match domain {
        BookingDomain::Turf => NewBooking::Turf(TurfBookingCreate {
            full_name: name.to_string(),
            email: args.email.trim().to_string(),
            phone: phone.to_string(),
            payment_mode: args.payment.into(),
            booking_type: args.booking_type.into(),
            team_name: args.team.trim().to_string(),
            advance_amount: args.advance,
            booking_date,
            start_time,
            end_time,
            turf_size: args.size.into(),
            created_by: args.created_by.clone(),
        }),
        BookingDomain::Court => {
            let sport = args
                .sport
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow!("--sport is required for court bookings"))?;
            if args.court_number == 0 {
                bail!("--court must be 1 or higher");
            }
            let pending_amount = match args.total {
                Some(total) if total < args.advance => {
                    bail!(
                        "--advance {} exceeds --total {}",
                        format_inr(args.advance),
                        format_inr(total)
                    );
                }
                Some(total) => Some(total - args.advance),
                None => None,
            };

            NewBooking::Court(CourtBookingCreate {
                full_name: name.to_string(),
                email: args.email.trim().to_string(),
                phone: phone.to_string(),
                payment_mode: args.payment.into(),
                team_name: args.team.trim().to_string(),
                sport_type: sport.to_ascii_lowercase(),
                court_number: args.court_number,
                advance_amount: args.advance,
                total_amount: args.total,
                pending_amount,
                booking_date,
                start_time,
                end_time,
                status: "confirmed".to_string(),
                created_by: args.created_by.clone(),
            })
        }
    };

    debug!(domain = domain.as_key(), date = %date, "built create payload");
    Ok(create)
}
