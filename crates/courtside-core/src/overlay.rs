use serde::Serialize;

use crate::booking::{Booking, BookingCategory};
use crate::format::{format_inr, format_long_date, format_time_range};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

/// Read-only summary of one booking, as shown in the detail overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingDetail {
    pub title: String,
    pub status: String,
    pub rows: Vec<DetailRow>,
}

impl BookingDetail {
    pub fn from_booking(booking: &Booking) -> Self {
        let mut rows = vec![
            row("Team", or_dash(&booking.team_name)),
            row("Phone", or_dash(&booking.contact_phone)),
            row("Email", or_dash(&booking.contact_email)),
            row("Date", format_long_date(booking.date)),
            row("Time", format_time_range(booking.start_time, booking.end_time)),
        ];

        match &booking.category {
            BookingCategory::Turf { method, size } => {
                rows.push(row("Type", format!("{} booking", method.as_key())));
                rows.push(row(
                    "Turf size",
                    size.map(|s| s.as_key().to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ));
            }
            BookingCategory::Court {
                sport,
                court_number,
            } => {
                rows.push(row("Sport", or_dash(sport)));
                rows.push(row(
                    "Court",
                    court_number
                        .map(|n| format!("#{n}"))
                        .unwrap_or_else(|| "-".to_string()),
                ));
            }
        }

        rows.push(row("Advance", format_inr(booking.advance_amount)));
        rows.push(row(
            "Pending",
            booking
                .pending_amount
                .map(format_inr)
                .unwrap_or_else(|| "-".to_string()),
        ));
        rows.push(row("Payment mode", booking.payment_mode.as_key().to_string()));

        Self {
            title: booking.customer_name.clone(),
            status: booking.status.as_key().to_ascii_uppercase(),
            rows,
        }
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

fn row(label: &'static str, value: String) -> DetailRow {
    DetailRow { label, value }
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{TurfBookingType, TurfSize};
    use crate::test_support::{court_booking, turf_booking};

    #[test]
    fn turf_detail_fields() {
        let mut booking = turf_booking("a", "2025-03-10");
        booking.category = BookingCategory::Turf {
            method: TurfBookingType::Bulk,
            size: Some(TurfSize::Sqft6500),
        };
        let detail = BookingDetail::from_booking(&booking);

        assert_eq!(detail.title, "customer a");
        assert_eq!(detail.status, "CONFIRMED");
        assert_eq!(detail.value("Time"), Some("6:00 PM - 7:00 PM"));
        assert_eq!(detail.value("Type"), Some("bulk booking"));
        assert_eq!(detail.value("Turf size"), Some("6500"));
        assert_eq!(detail.value("Advance"), Some("₹1,000.00"));
        assert_eq!(detail.value("Pending"), Some("₹2,000.00"));
        assert_eq!(detail.value("Date"), Some("10 March 2025"));
    }

    #[test]
    fn court_detail_and_missing_values() {
        let mut booking = court_booking("c", "2025-03-11", "padel");
        booking.pending_amount = None;
        booking.team_name = String::new();
        let detail = BookingDetail::from_booking(&booking);

        assert_eq!(detail.value("Sport"), Some("padel"));
        assert_eq!(detail.value("Court"), Some("#1"));
        assert_eq!(detail.value("Pending"), Some("-"));
        assert_eq!(detail.value("Team"), Some("-"));
        assert_eq!(detail.value("Turf size"), None);
    }
}
