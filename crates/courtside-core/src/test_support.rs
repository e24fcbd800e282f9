use chrono::{NaiveDate, NaiveTime};

use crate::booking::{Booking, BookingCategory, BookingStatus, PaymentMode, TurfBookingType};

pub fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}

pub fn turf_booking(id: &str, date: &str) -> Booking {
    Booking {
        id: id.to_string(),
        customer_name: format!("customer {id}"),
        contact_phone: "9876543210".to_string(),
        contact_email: format!("{id}@example.com"),
        team_name: format!("team {id}"),
        category: BookingCategory::Turf {
            method: TurfBookingType::TurfWise,
            size: None,
        },
        date: day(date),
        start_time: NaiveTime::from_hms_opt(18, 0, 0).expect("valid time"),
        end_time: NaiveTime::from_hms_opt(19, 0, 0).expect("valid time"),
        advance_amount: 1000.0,
        pending_amount: Some(2000.0),
        payment_mode: PaymentMode::Cash,
        status: BookingStatus::Confirmed,
    }
}

pub fn court_booking(id: &str, date: &str, sport: &str) -> Booking {
    Booking {
        category: BookingCategory::Court {
            sport: sport.to_string(),
            court_number: Some(1),
        },
        ..turf_booking(id, date)
    }
}
