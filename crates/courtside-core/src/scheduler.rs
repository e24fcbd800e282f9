use std::str::FromStr;

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use tracing::{debug, instrument};

use crate::booking::Booking;
use crate::calendar::{MonthGrid, first_day_of_month, shift_months};
use crate::index::BookingIndex;

/// Callbacks the scheduler fires towards its owner.
pub trait SchedulerEvents {
    /// An empty day was clicked; the owner should open a new-booking form for `date`.
    fn on_request_create(&mut self, date: NaiveDate);

    /// A booking was selected and the detail overlay opened.
    fn on_select_booking(&mut self, _booking: &Booking) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvents;

impl SchedulerEvents for NoEvents {
    fn on_request_create(&mut self, _date: NaiveDate) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerState {
    Idle,
    DetailOpen(Booking),
}

/// How clicks on leading/trailing cells from adjacent months are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutsideMonthPolicy {
    #[default]
    Ignore,
    Allow,
}

impl FromStr for OutsideMonthPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" | "off" | "no" => Ok(OutsideMonthPolicy::Ignore),
            "allow" | "on" | "yes" => Ok(OutsideMonthPolicy::Allow),
            other => Err(anyhow!("invalid calendar.outside_month value: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    OpenedDetail,
    RequestedCreate,
    Ignored,
}

/// Month view state: which month is shown and which booking (if any) is open.
#[derive(Debug, Clone)]
pub struct Scheduler {
    reference: NaiveDate,
    state: SchedulerState,
    outside_month: OutsideMonthPolicy,
}

impl Scheduler {
    pub fn new(today: NaiveDate, outside_month: OutsideMonthPolicy) -> Self {
        Self {
            reference: first_day_of_month(today.year(), today.month()),
            state: SchedulerState::Idle,
            outside_month,
        }
    }

    /// First day of the displayed month.
    pub fn reference_month(&self) -> NaiveDate {
        self.reference
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn selected(&self) -> Option<&Booking> {
        match &self.state {
            SchedulerState::DetailOpen(booking) => Some(booking),
            SchedulerState::Idle => None,
        }
    }

    pub fn show_month(&mut self, month: NaiveDate) {
        self.reference = first_day_of_month(month.year(), month.month());
    }

    #[instrument(skip(self))]
    pub fn navigate_month(&mut self, delta: i32) {
        let from = self.reference;
        self.reference = shift_months(from, delta);
        debug!(%from, to = %self.reference, "navigated month");
    }

    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.show_month(today);
    }

    pub fn grid(&self, today: NaiveDate, index: &BookingIndex<'_>) -> MonthGrid {
        MonthGrid::build(self.reference, today, index)
    }

    pub fn is_in_reference_month(&self, date: NaiveDate) -> bool {
        date.year() == self.reference.year() && date.month() == self.reference.month()
    }

    /// Day-cell click. Opens the first booking of the day, or asks the owner to create one
    /// when the day is free.
    #[instrument(skip(self, index, events), fields(date = %date))]
    pub fn click_day<E: SchedulerEvents>(
        &mut self,
        date: NaiveDate,
        index: &BookingIndex<'_>,
        events: &mut E,
    ) -> ClickOutcome {
        if !self.is_in_reference_month(date) && self.outside_month == OutsideMonthPolicy::Ignore {
            debug!("ignoring click outside displayed month");
            return ClickOutcome::Ignored;
        }

        match index.first_on(date) {
            Some(first) => {
                self.open(first.clone(), events);
                ClickOutcome::OpenedDetail
            }
            None => {
                debug!("free day clicked, requesting create");
                events.on_request_create(date);
                ClickOutcome::RequestedCreate
            }
        }
    }

    /// Booking-chip click. Always opens the detail overlay.
    pub fn click_booking<E: SchedulerEvents>(&mut self, booking: &Booking, events: &mut E) {
        self.open(booking.clone(), events);
    }

    pub fn close_detail(&mut self) {
        if self.selected().is_some() {
            debug!("closing booking detail");
        }
        self.state = SchedulerState::Idle;
    }

    fn open<E: SchedulerEvents>(&mut self, booking: Booking, events: &mut E) {
        debug!(booking = %booking.id, "opening booking detail");
        events.on_select_booking(&booking);
        self.state = SchedulerState::DetailOpen(booking);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, turf_booking};

    #[derive(Default)]
    struct Recorder {
        created: Vec<NaiveDate>,
        selected: Vec<String>,
    }

    impl SchedulerEvents for Recorder {
        fn on_request_create(&mut self, date: NaiveDate) {
            self.created.push(date);
        }

        fn on_select_booking(&mut self, booking: &Booking) {
            self.selected.push(booking.id.clone());
        }
    }

    fn sample() -> Vec<Booking> {
        vec![
            turf_booking("a", "2025-03-10"),
            turf_booking("b", "2025-03-10"),
            turf_booking("c", "2025-03-11"),
            turf_booking("z", "2025-04-01"),
        ]
    }

    #[test]
    fn occupied_day_opens_first_booking() {
        let bookings = sample();
        let index = BookingIndex::build(&bookings);
        let mut scheduler = Scheduler::new(day("2025-03-15"), OutsideMonthPolicy::Ignore);
        let mut events = Recorder::default();

        let outcome = scheduler.click_day(day("2025-03-10"), &index, &mut events);

        assert_eq!(outcome, ClickOutcome::OpenedDetail);
        assert_eq!(scheduler.selected().map(|b| b.id.as_str()), Some("a"));
        assert_eq!(events.selected, vec!["a"]);
        assert!(events.created.is_empty());
    }

    #[test]
    fn free_day_requests_create_without_state_change() {
        let bookings = sample();
        let index = BookingIndex::build(&bookings);
        let mut scheduler = Scheduler::new(day("2025-03-15"), OutsideMonthPolicy::Ignore);
        let mut events = Recorder::default();

        let outcome = scheduler.click_day(day("2025-03-12"), &index, &mut events);

        assert_eq!(outcome, ClickOutcome::RequestedCreate);
        assert_eq!(scheduler.state(), &SchedulerState::Idle);
        assert_eq!(events.created, vec![day("2025-03-12")]);
    }

    #[test]
    fn outside_month_cells_follow_policy() {
        let bookings = sample();
        let index = BookingIndex::build(&bookings);
        let mut events = Recorder::default();

        let mut strict = Scheduler::new(day("2025-03-15"), OutsideMonthPolicy::Ignore);
        assert_eq!(
            strict.click_day(day("2025-04-01"), &index, &mut events),
            ClickOutcome::Ignored
        );
        assert_eq!(
            strict.click_day(day("2025-02-28"), &index, &mut events),
            ClickOutcome::Ignored
        );
        assert_eq!(strict.state(), &SchedulerState::Idle);
        assert!(events.created.is_empty());

        let mut lenient = Scheduler::new(day("2025-03-15"), OutsideMonthPolicy::Allow);
        assert_eq!(
            lenient.click_day(day("2025-04-01"), &index, &mut events),
            ClickOutcome::OpenedDetail
        );
        assert_eq!(lenient.selected().map(|b| b.id.as_str()), Some("z"));
    }

    #[test]
    fn chip_click_opens_and_close_returns_idle() {
        let bookings = sample();
        let mut scheduler = Scheduler::new(day("2025-03-15"), OutsideMonthPolicy::Ignore);

        scheduler.click_booking(&bookings[1], &mut NoEvents);
        assert_eq!(scheduler.selected().map(|b| b.id.as_str()), Some("b"));

        scheduler.close_detail();
        assert_eq!(scheduler.state(), &SchedulerState::Idle);

        scheduler.close_detail();
        assert_eq!(scheduler.state(), &SchedulerState::Idle);
    }

    #[test]
    fn navigation_keeps_detail_state() {
        let bookings = sample();
        let index = BookingIndex::build(&bookings);
        let mut scheduler = Scheduler::new(day("2025-03-15"), OutsideMonthPolicy::Ignore);
        scheduler.click_day(day("2025-03-11"), &index, &mut NoEvents);

        scheduler.navigate_month(1);
        assert_eq!(scheduler.reference_month(), day("2025-04-01"));
        assert_eq!(scheduler.selected().map(|b| b.id.as_str()), Some("c"));

        scheduler.navigate_month(-13);
        assert_eq!(scheduler.reference_month(), day("2024-03-01"));

        scheduler.go_to_today(day("2025-12-31"));
        assert_eq!(scheduler.reference_month(), day("2025-12-01"));
        assert!(matches!(scheduler.state(), SchedulerState::DetailOpen(_)));
    }
}
