use std::fmt;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::{NaiveDate, NaiveTime};
use courtside_shared::{
    CourtBookingDto, PaymentModeDto, TurfBookingDto, TurfBookingTypeDto, TurfSizeDto,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::datetime::{parse_calendar_day, parse_wall_clock};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingDomain {
    Turf,
    Court,
}

impl BookingDomain {
    pub fn collection_path(self) -> &'static str {
        match self {
            BookingDomain::Turf => "/api/bookings",
            BookingDomain::Court => "/api/piplay",
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            BookingDomain::Turf => "turf",
            BookingDomain::Court => "court",
        }
    }
}

impl FromStr for BookingDomain {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "turf" => Ok(BookingDomain::Turf),
            "court" | "piplay" => Ok(BookingDomain::Court),
            other => Err(anyhow!("unknown booking domain: {other} (expected turf or court)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Pending,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_key(self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Pending => "pending",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "pending" => Ok(BookingStatus::Pending),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(anyhow!("unknown booking status: {other}")),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
}

impl PaymentMode {
    pub fn as_key(self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
        }
    }
}

impl FromStr for PaymentMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "upi" => Ok(PaymentMode::Upi),
            other => Err(anyhow!("unknown payment mode: {other} (expected cash or upi)")),
        }
    }
}

impl From<PaymentModeDto> for PaymentMode {
    fn from(value: PaymentModeDto) -> Self {
        match value {
            PaymentModeDto::Cash => PaymentMode::Cash,
            PaymentModeDto::Upi => PaymentMode::Upi,
        }
    }
}

impl From<PaymentMode> for PaymentModeDto {
    fn from(value: PaymentMode) -> Self {
        match value {
            PaymentMode::Cash => PaymentModeDto::Cash,
            PaymentMode::Upi => PaymentModeDto::Upi,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TurfBookingType {
    TurfWise,
    Bulk,
}

impl TurfBookingType {
    pub fn as_key(self) -> &'static str {
        match self {
            TurfBookingType::TurfWise => "turf-wise",
            TurfBookingType::Bulk => "bulk",
        }
    }
}

impl From<TurfBookingTypeDto> for TurfBookingType {
    fn from(value: TurfBookingTypeDto) -> Self {
        match value {
            TurfBookingTypeDto::TurfWise => TurfBookingType::TurfWise,
            TurfBookingTypeDto::Bulk => TurfBookingType::Bulk,
        }
    }
}

impl From<TurfBookingType> for TurfBookingTypeDto {
    fn from(value: TurfBookingType) -> Self {
        match value {
            TurfBookingType::TurfWise => TurfBookingTypeDto::TurfWise,
            TurfBookingType::Bulk => TurfBookingTypeDto::Bulk,
        }
    }
}

impl FromStr for TurfBookingType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "turf-wise" | "turfwise" => Ok(TurfBookingType::TurfWise),
            "bulk" => Ok(TurfBookingType::Bulk),
            other => Err(anyhow!("unknown turf booking type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TurfSize {
    Sqft10000,
    Sqft6500,
}

impl TurfSize {
    pub fn as_key(self) -> &'static str {
        match self {
            TurfSize::Sqft10000 => "10000",
            TurfSize::Sqft6500 => "6500",
        }
    }
}

impl From<TurfSizeDto> for TurfSize {
    fn from(value: TurfSizeDto) -> Self {
        match value {
            TurfSizeDto::Sqft10000 => TurfSize::Sqft10000,
            TurfSizeDto::Sqft6500 => TurfSize::Sqft6500,
        }
    }
}

impl From<TurfSize> for TurfSizeDto {
    fn from(value: TurfSize) -> Self {
        match value {
            TurfSize::Sqft10000 => TurfSizeDto::Sqft10000,
            TurfSize::Sqft6500 => TurfSizeDto::Sqft6500,
        }
    }
}

impl FromStr for TurfSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "10000" => Ok(TurfSize::Sqft10000),
            "6500" => Ok(TurfSize::Sqft6500),
            other => Err(anyhow!("unknown turf size: {other} (expected 10000 or 6500)")),
        }
    }
}

/// What was booked. Turf bookings are keyed by booking method, court bookings by sport.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum BookingCategory {
    Turf {
        method: TurfBookingType,
        size: Option<TurfSize>,
    },
    Court {
        sport: String,
        court_number: Option<u32>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub team_name: String,
    pub category: BookingCategory,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub advance_amount: f64,
    pub pending_amount: Option<f64>,
    pub payment_mode: PaymentMode,
    pub status: BookingStatus,
}

impl Booking {
    pub fn domain(&self) -> BookingDomain {
        match self.category {
            BookingCategory::Turf { .. } => BookingDomain::Turf,
            BookingCategory::Court { .. } => BookingDomain::Court,
        }
    }

    pub fn category_label(&self) -> &str {
        match &self.category {
            BookingCategory::Turf { method, .. } => method.as_key(),
            BookingCategory::Court { sport, .. } => sport.as_str(),
        }
    }

    /// Fully paid: the backend reported a pending balance of zero.
    pub fn is_settled(&self) -> bool {
        self.pending_amount.is_some_and(|pending| pending == 0.0)
    }

    pub fn total_amount(&self) -> Option<f64> {
        self.pending_amount
            .map(|pending| self.advance_amount + pending)
    }

    pub fn from_turf_dto(dto: TurfBookingDto) -> anyhow::Result<Self> {
        let id = dto.id;
        let date = parse_calendar_day(&dto.booking_date)
            .with_context(|| format!("booking {id}: invalid bookingDate"))?;
        let start_time = parse_wall_clock(&dto.start_time)
            .with_context(|| format!("booking {id}: invalid startTime"))?;
        let end_time = parse_wall_clock(&dto.end_time)
            .with_context(|| format!("booking {id}: invalid endTime"))?;
        let status = dto
            .status
            .parse::<BookingStatus>()
            .with_context(|| format!("booking {id}: invalid status"))?;

        let method = TurfBookingType::from(dto.booking_type);
        let size = dto.turf_size.map(TurfSize::from);

        Ok(Self {
            id,
            customer_name: dto.full_name,
            contact_phone: dto.phone,
            contact_email: dto.email,
            team_name: dto.team_name,
            category: BookingCategory::Turf { method, size },
            date,
            start_time,
            end_time,
            advance_amount: dto.advance_amount,
            pending_amount: dto.pending_amount,
            payment_mode: dto.payment_mode.into(),
            status,
        })
    }

    pub fn from_court_dto(dto: CourtBookingDto) -> anyhow::Result<Self> {
        let id = dto.id;
        let date = parse_calendar_day(&dto.booking_date)
            .with_context(|| format!("booking {id}: invalid bookingDate"))?;
        let start_time = parse_wall_clock(&dto.start_time)
            .with_context(|| format!("booking {id}: invalid startTime"))?;
        let end_time = parse_wall_clock(&dto.end_time)
            .with_context(|| format!("booking {id}: invalid endTime"))?;
        let status = dto
            .status
            .parse::<BookingStatus>()
            .with_context(|| format!("booking {id}: invalid status"))?;

        Ok(Self {
            id,
            customer_name: dto.full_name,
            contact_phone: dto.phone,
            contact_email: dto.email,
            team_name: dto.team_name,
            category: BookingCategory::Court {
                sport: dto.sport_type,
                court_number: dto.court_number.filter(|n| *n > 0),
            },
            date,
            start_time,
            end_time,
            advance_amount: dto.advance_amount,
            pending_amount: dto.pending_amount,
            payment_mode: dto.payment_mode.into(),
            status,
        })
    }
}

/// Raw listing rows from one collection endpoint, not yet checked against the
/// record shape of that domain.
#[derive(Debug, Clone)]
pub enum BookingRecords {
    Turf(Vec<Value>),
    Court(Vec<Value>),
}

impl BookingRecords {
    pub fn len(&self) -> usize {
        match self {
            BookingRecords::Turf(rows) => rows.len(),
            BookingRecords::Court(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn row_id(row: &Value) -> String {
    row.get("_id")
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string()
}

fn turf_row(row: Value) -> anyhow::Result<Booking> {
    let id = row_id(&row);
    let dto: TurfBookingDto = serde_json::from_value(row)
        .with_context(|| format!("booking {id}: unexpected turf record shape"))?;
    Booking::from_turf_dto(dto)
}

fn court_row(row: Value) -> anyhow::Result<Booking> {
    let id = row_id(&row);
    let dto: CourtBookingDto = serde_json::from_value(row)
        .with_context(|| format!("booking {id}: unexpected court record shape"))?;
    Booking::from_court_dto(dto)
}

/// Maps wire records into bookings, dropping malformed rows. Order is preserved.
#[tracing::instrument(skip(records), fields(count = records.len()))]
pub fn normalize_bookings(records: BookingRecords) -> Vec<Booking> {
    let converted: Vec<anyhow::Result<Booking>> = match records {
        BookingRecords::Turf(rows) => rows.into_iter().map(turf_row).collect(),
        BookingRecords::Court(rows) => rows.into_iter().map(court_row).collect(),
    };

    let mut out = Vec::with_capacity(converted.len());
    for item in converted {
        match item {
            Ok(booking) => out.push(booking),
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(error = %reason, "skipping malformed booking");
            }
        }
    }

    debug!(kept = out.len(), "normalized bookings");
    out
}
