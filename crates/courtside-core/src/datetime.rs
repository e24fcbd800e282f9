use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  NaiveDate,
  NaiveTime,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;

use crate::calendar::{
  first_day_of_month,
  shift_months
};

const TIMEZONE_ENV_VAR: &str =
  "COURTSIDE_TIMEZONE";
pub const DEFAULT_VENUE_TIMEZONE: &str =
  "Asia/Kolkata";

/// Picks the venue timezone: env var,
/// then the configured value, then the
/// built-in default.
pub fn resolve_venue_timezone(
  configured: Option<&str>
) -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config:timezone")
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_VENUE_TIMEZONE,
    "DEFAULT_VENUE_TIMEZONE"
  )
  .unwrap_or_else(|| {
    tracing::error!(
      "failed to parse fallback \
       timezone; using UTC"
    );
    chrono_tz::UTC
  })
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "resolved venue timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
  Utc::now()
    .with_timezone(&tz)
    .date_naive()
}

/// Calendar day of an ISO date or
/// date-time string. Only the leading
/// `YYYY-MM-DD` is read, so any time of
/// day or offset suffix is ignored.
pub fn parse_calendar_day(
  raw: &str
) -> anyhow::Result<NaiveDate> {
  let trimmed = raw.trim();
  let prefix =
    trimmed.get(..10).ok_or_else(|| {
      anyhow!(
        "date too short: {trimmed:?}"
      )
    })?;
  NaiveDate::parse_from_str(
    prefix, "%Y-%m-%d"
  )
  .with_context(|| {
    format!(
      "expected YYYY-MM-DD, got \
       {trimmed:?}"
    )
  })
}

/// Wall-clock time in `HH:MM`,
/// `HH:MM:SS` or `h:MM am/pm` form.
pub fn parse_wall_clock(
  raw: &str
) -> anyhow::Result<NaiveTime> {
  let trimmed = raw.trim();
  let (hour, minute, second) =
    parse_clock_parts(trimmed)
      .ok_or_else(|| {
        anyhow!(
          "expected HH:MM, got \
           {trimmed:?}"
        )
      })?;
  NaiveTime::from_hms_opt(
    hour, minute, second
  )
  .ok_or_else(|| {
    anyhow!(
      "time out of range: {trimmed:?}"
    )
  })
}

fn clock_regex() -> Option<&'static Regex>
{
  static CLOCK_RE: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  CLOCK_RE
    .get_or_init(|| {
      Regex::new(
        r"(?i)^(?P<hour>\d{1,2}):(?P<minute>\d{2})(?::(?P<second>\d{2}))?\s*(?P<ampm>[ap]m)?$",
      )
      .ok()
    })
    .as_ref()
}

fn parse_clock_parts(
  token: &str
) -> Option<(u32, u32, u32)> {
  let captures =
    clock_regex()?.captures(token)?;

  let raw_hour = captures
    .name("hour")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let minute = captures
    .name("minute")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let second = match captures
    .name("second")
  {
    | Some(m) => {
      m.as_str().parse::<u32>().ok()?
    }
    | None => 0
  };
  if minute > 59 || second > 59 {
    return None;
  }

  let hour = if let Some(ampm_match) =
    captures.name("ampm")
  {
    if raw_hour == 0 || raw_hour > 12 {
      return None;
    }
    let pm = ampm_match
      .as_str()
      .eq_ignore_ascii_case("pm");
    match (pm, raw_hour) {
      | (false, 12) => 0,
      | (false, h) => h,
      | (true, 12) => 12,
      | (true, h) => h + 12
    }
  } else {
    if raw_hour > 23 {
      return None;
    }
    raw_hour
  };

  Some((hour, minute, second))
}

/// Resolves a month selector to the
/// first day of that month.
///
/// Accepts `today`, `next`, `prev`,
/// `YYYY-MM`, `YYYY-MM-DD` and month
/// names (`march`, `mar`) which resolve
/// within the year of `today`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_month_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let lower =
    input.trim().to_ascii_lowercase();
  let this_month = first_day_of_month(
    today.year(),
    today.month()
  );

  match lower.as_str() {
    | "" | "today" | "now" => {
      return Ok(this_month);
    }
    | "next" => {
      return Ok(shift_months(
        this_month, 1
      ));
    }
    | "prev" | "previous" | "last" => {
      return Ok(shift_months(
        this_month, -1
      ));
    }
    | _ => {}
  }

  if let Some(month) =
    parse_month_name(&lower)
  {
    return Ok(first_day_of_month(
      today.year(),
      month
    ));
  }

  if lower.len() >= 10 {
    let day = parse_calendar_day(&lower)?;
    return Ok(first_day_of_month(
      day.year(),
      day.month()
    ));
  }

  let (year_raw, month_raw) = lower
    .split_once('-')
    .ok_or_else(|| {
      anyhow!(
        "unrecognized month: {input}"
      )
    })?;
  let year: i32 =
    year_raw.parse().with_context(|| {
      format!("invalid year in {input}")
    })?;
  let month: u32 =
    month_raw.parse().with_context(|| {
      format!("invalid month in {input}")
    })?;
  NaiveDate::from_ymd_opt(year, month, 1)
    .ok_or_else(|| {
      anyhow!(
        "month out of range: {input}"
      )
    })
}

fn parse_month_name(
  token: &str
) -> Option<u32> {
  match token.trim() {
    | "january" | "jan" => Some(1),
    | "february" | "feb" => Some(2),
    | "march" | "mar" => Some(3),
    | "april" | "apr" => Some(4),
    | "may" => Some(5),
    | "june" | "jun" => Some(6),
    | "july" | "jul" => Some(7),
    | "august" | "aug" => Some(8),
    | "september" | "sep" | "sept" => {
      Some(9)
    }
    | "october" | "oct" => Some(10),
    | "november" | "nov" => Some(11),
    | "december" | "dec" => Some(12),
    | _ => None
  }
}
