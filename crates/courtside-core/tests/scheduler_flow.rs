use std::fs;

use chrono::NaiveDate;
use courtside_core::api::decode_listing;
use courtside_core::booking::{BookingDomain, normalize_bookings};
use courtside_core::calendar::GRID_CELLS;
use courtside_core::config::Config;
use courtside_core::index::BookingIndex;
use courtside_core::overlay::BookingDetail;
use courtside_core::scheduler::{
    ClickOutcome, OutsideMonthPolicy, Scheduler, SchedulerEvents, SchedulerState,
};
use tempfile::tempdir;

const LISTING: &str = r#"{
  "success": true,
  "data": [
    {"_id": "a", "fullName": "Arjun Mehta", "phone": "9876543210", "paymentMode": "upi",
     "bookingType": "turf-wise", "teamName": "Night Owls", "advanceAmount": 1000,
     "pendingAmount": 2000, "bookingDate": "2025-03-10T18:30:00.000Z",
     "startTime": "19:00", "endTime": "20:00", "turfSize": "10000", "status": "confirmed"},
    {"_id": "b", "fullName": "Ravi K", "paymentMode": "cash", "bookingType": "bulk",
     "bookingDate": "2025-03-10", "startTime": "21:00", "endTime": "22:00",
     "status": "pending"},
    {"_id": "c", "fullName": "Sara", "paymentMode": "cash", "bookingType": "bulk",
     "bookingDate": "2025-03-11", "startTime": "06:00", "endTime": "07:00",
     "status": "completed", "pendingAmount": 0}
  ]
}"#;

fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}

#[derive(Default)]
struct Recorder {
    created: Vec<NaiveDate>,
}

impl SchedulerEvents for Recorder {
    fn on_request_create(&mut self, date: NaiveDate) {
        self.created.push(date);
    }
}

#[test]
fn listing_to_grid_to_detail() {
    let records = decode_listing(BookingDomain::Turf, LISTING).expect("decode listing");
    let bookings = normalize_bookings(records);
    let index = BookingIndex::build(&bookings);

    let ids = |date: &str| -> Vec<String> {
        index
            .for_day(day(date))
            .iter()
            .map(|b| b.id.clone())
            .collect()
    };
    assert_eq!(ids("2025-03-10"), vec!["a", "b"]);
    assert!(ids("2025-03-12").is_empty());

    let today = day("2025-03-15");
    let mut scheduler = Scheduler::new(today, OutsideMonthPolicy::Ignore);
    let grid = scheduler.grid(today, &index);

    assert_eq!(grid.cells.len(), GRID_CELLS);
    assert_eq!(grid.cells[0].date, day("2025-02-23"));
    assert_eq!(grid.cells[GRID_CELLS - 1].date, day("2025-04-05"));
    assert_eq!(grid.cells.iter().filter(|c| c.in_current_month).count(), 31);
    assert!(grid.cell(today).expect("today in grid").is_today);
    assert_eq!(grid.cell(day("2025-03-10")).expect("cell").bookings.len(), 2);

    let mut events = Recorder::default();
    assert_eq!(
        scheduler.click_day(day("2025-03-10"), &index, &mut events),
        ClickOutcome::OpenedDetail
    );
    let detail = BookingDetail::from_booking(scheduler.selected().expect("open booking"));
    assert_eq!(detail.title, "Arjun Mehta");
    assert_eq!(detail.status, "CONFIRMED");
    assert_eq!(detail.value("Time"), Some("7:00 PM - 8:00 PM"));
    assert_eq!(detail.value("Pending"), Some("₹2,000.00"));

    scheduler.close_detail();
    assert_eq!(scheduler.state(), &SchedulerState::Idle);

    assert_eq!(
        scheduler.click_day(day("2025-03-12"), &index, &mut events),
        ClickOutcome::RequestedCreate
    );
    assert_eq!(
        scheduler.click_day(day("2025-02-28"), &index, &mut events),
        ClickOutcome::Ignored
    );
    assert_eq!(events.created, vec![day("2025-03-12")]);
}

#[test]
fn config_file_drives_policy_and_domain() {
    let dir = tempdir().expect("tempdir");
    let rc = dir.path().join("courtsiderc");
    fs::write(
        &rc,
        "api.url = http://127.0.0.1:5000\ncalendar.outside_month = allow\ndefault.domain = piplay\n",
    )
    .expect("write rc");

    let cfg = Config::load(Some(&rc)).expect("load config");
    assert_eq!(
        cfg.outside_month_policy().expect("policy"),
        OutsideMonthPolicy::Allow
    );
    assert_eq!(cfg.default_domain().expect("domain"), BookingDomain::Court);
    assert_eq!(
        cfg.api_settings().expect("api").base_url,
        "http://127.0.0.1:5000"
    );
}
