pub mod api;
pub mod booking;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod filter;
pub mod format;
pub mod index;
pub mod loadable;
pub mod overlay;
pub mod payment;
pub mod render;
pub mod scheduler;

#[cfg(test)]
mod test_support;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting courtside CLI"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  );

  let domain = match cli.domain {
    | Some(domain) => domain,
    | None => cfg.default_domain()?
  };
  let timezone =
    datetime::resolve_venue_timezone(
      cfg.get("timezone").as_deref()
    );
  let today = datetime::today_in(timezone);
  debug!(domain = domain.as_key(), timezone = %timezone, %today, "resolved venue context");

  let source = match cli.from_file {
    | Some(path) => {
      commands::BookingSource::Snapshot(
        path
      )
    }
    | None => {
      let settings = cfg
        .api_settings()
        .context(
          "failed to read booking API \
           settings"
        )?;
      commands::BookingSource::Api(
        api::ApiClient::new(&settings)?
      )
    }
  };

  let ctx = commands::CommandContext {
    domain,
    today,
    outside_month: cfg
      .outside_month_policy()?,
    source,
    requests:
      loadable::RequestSequence::new()
  };

  let renderer =
    render::Renderer::new(&cfg)?;
  let command =
    cli.command.unwrap_or_else(|| {
      cli::Command::Calendar(
        cli::CalendarArgs::default()
      )
    });

  commands::dispatch(
    &ctx, &cfg, &renderer, command
  )?;

  info!("done");
  Ok(())
}
