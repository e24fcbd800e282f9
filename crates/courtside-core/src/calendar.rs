use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};

use crate::booking::Booking;
use crate::index::BookingIndex;

/// Cells in a month grid: six weeks of
/// seven days, whatever the month's
/// shape.
pub const GRID_CELLS: usize = 42;
pub const GRID_WEEKS: usize = 6;

/// Grids start on Sunday.
pub const WEEK_START: Weekday =
  Weekday::Sun;

pub const WEEKDAY_LABELS: [&str; 7] = [
  "Sun", "Mon", "Tue", "Wed", "Thu",
  "Fri", "Sat"
];

/// The 42 consecutive days shown for the
/// month containing `reference`, starting
/// on the Sunday on or before the 1st.
#[must_use]
pub fn month_grid_days(
  reference: NaiveDate
) -> [NaiveDate; GRID_CELLS] {
  let first = first_day_of_month(
    reference.year(),
    reference.month()
  );
  let grid_start =
    start_of_week(first, WEEK_START);

  let mut days = [grid_start; GRID_CELLS];
  for (offset, slot) in
    days.iter_mut().enumerate()
  {
    *slot =
      add_days(grid_start, offset as i64);
  }
  days
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
  pub date:             NaiveDate,
  pub in_current_month: bool,
  pub is_today:         bool,
  pub bookings:         Vec<Booking>
}

impl DayCell {
  pub fn has_bookings(&self) -> bool {
    !self.bookings.is_empty()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid {
  /// First day of the displayed month.
  pub month: NaiveDate,
  pub cells: Vec<DayCell>
}

impl MonthGrid {
  #[tracing::instrument(skip(index), fields(bookings = index.len()))]
  pub fn build(
    reference: NaiveDate,
    today: NaiveDate,
    index: &BookingIndex<'_>
  ) -> Self {
    let month = first_day_of_month(
      reference.year(),
      reference.month()
    );
    let cells = month_grid_days(month)
      .into_iter()
      .map(|date| {
        DayCell {
          date,
          in_current_month: date.year()
            == month.year()
            && date.month()
              == month.month(),
          is_today: date == today,
          bookings: index
            .for_day(date)
            .iter()
            .map(|b| (*b).clone())
            .collect()
        }
      })
      .collect::<Vec<_>>();

    tracing::debug!(
      month = %month.format("%Y-%m"),
      occupied = cells
        .iter()
        .filter(|c| c.has_bookings())
        .count(),
      "built month grid"
    );

    Self {
      month,
      cells
    }
  }

  pub fn title(&self) -> String {
    month_title(self.month)
  }

  pub fn weeks(
    &self
  ) -> impl Iterator<Item = &[DayCell]>
  {
    self.cells.chunks(7)
  }

  pub fn cell(
    &self,
    date: NaiveDate
  ) -> Option<&DayCell> {
    self
      .cells
      .iter()
      .find(|cell| cell.date == date)
  }
}

pub fn month_title(
  month: NaiveDate
) -> String {
  month.format("%B %Y").to_string()
}

pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let mut year = date.year();
  let mut month =
    date.month() as i32 + months;

  while month < 1 {
    month += 12;
    year = year.saturating_sub(1);
  }
  while month > 12 {
    month -= 12;
    year = year.saturating_add(1);
  }

  let month = month as u32;
  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}
