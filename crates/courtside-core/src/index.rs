use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::booking::Booking;

/// Bookings grouped by calendar day.
///
/// Within a day the source order is kept, so the first entry is always the
/// earliest-listed booking for that date.
#[derive(Debug, Clone, Default)]
pub struct BookingIndex<'a> {
    by_day: BTreeMap<NaiveDate, Vec<&'a Booking>>,
    total: usize,
}

impl<'a> BookingIndex<'a> {
    pub fn build(bookings: &'a [Booking]) -> Self {
        let mut by_day: BTreeMap<NaiveDate, Vec<&'a Booking>> = BTreeMap::new();
        for booking in bookings {
            by_day.entry(booking.date).or_default().push(booking);
        }

        tracing::trace!(
            bookings = bookings.len(),
            days = by_day.len(),
            "indexed bookings by day"
        );

        Self {
            by_day,
            total: bookings.len(),
        }
    }

    /// Bookings on `date`; empty when nothing is booked.
    pub fn for_day(&self, date: NaiveDate) -> &[&'a Booking] {
        self.by_day.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_on(&self, date: NaiveDate) -> Option<&'a Booking> {
        self.for_day(date).first().copied()
    }

    pub fn find(&self, id: &str) -> Option<&'a Booking> {
        self.by_day
            .values()
            .flat_map(|day| day.iter().copied())
            .find(|booking| booking.id == id)
    }

    /// Populated days in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.by_day.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
