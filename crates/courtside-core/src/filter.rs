use std::str::FromStr;

use anyhow::anyhow;
use tracing::trace;

use crate::booking::Booking;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum SettlementFilter {
  #[default]
  All,
  /// Balance still due (or unknown).
  Unsettled,
  Paid
}

impl FromStr for SettlementFilter {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(Self::All),
      | "unsettled" | "unpaid"
      | "confirmed" => {
        Ok(Self::Unsettled)
      }
      | "paid" => Ok(Self::Paid),
      | other => Err(anyhow!(
        "invalid settlement filter: \
         {other} (expected all, \
         unsettled or paid)"
      ))
    }
  }
}

/// Search and facet filters of the
/// booking list.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
  pub search:     Option<String>,
  pub category:   Option<String>,
  pub settlement: SettlementFilter
}

impl BookingFilter {
  pub fn matches(
    &self,
    booking: &Booking
  ) -> bool {
    let ok = self.matches_search(booking)
      && self.matches_category(booking)
      && self.matches_settlement(booking);
    trace!(
      booking = %booking.id,
      ok,
      "evaluated booking filter"
    );
    ok
  }

  pub fn apply<'a>(
    &self,
    bookings: &'a [Booking]
  ) -> Vec<&'a Booking> {
    bookings
      .iter()
      .filter(|b| self.matches(b))
      .collect()
  }

  fn matches_search(
    &self,
    booking: &Booking
  ) -> bool {
    let Some(raw) = self.search.as_deref()
    else {
      return true;
    };
    let needle = raw.trim();
    if needle.is_empty() {
      return true;
    }

    let lower = needle.to_lowercase();
    booking
      .customer_name
      .to_lowercase()
      .contains(&lower)
      || booking
        .team_name
        .to_lowercase()
        .contains(&lower)
      || booking
        .contact_phone
        .contains(needle)
  }

  fn matches_category(
    &self,
    booking: &Booking
  ) -> bool {
    match self.category.as_deref() {
      | None => true,
      | Some(raw)
        if raw.trim().is_empty()
          || raw
            .trim()
            .eq_ignore_ascii_case(
              "all"
            ) =>
      {
        true
      }
      | Some(raw) => booking
        .category_label()
        .eq_ignore_ascii_case(raw.trim())
    }
  }

  fn matches_settlement(
    &self,
    booking: &Booking
  ) -> bool {
    match self.settlement {
      | SettlementFilter::All => true,
      | SettlementFilter::Paid => {
        booking.is_settled()
      }
      | SettlementFilter::Unsettled => {
        !booking.is_settled()
      }
    }
  }
}
