use serde::{
  Deserialize,
  Serialize
};

/// Response wrapper used by every backend
/// endpoint.
#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct ApiEnvelope<T> {
  #[serde(default)]
  pub success: bool,
  pub data:    Option<T>,
  #[serde(default)]
  pub message: Option<String>
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentModeDto {
  Cash,
  Upi
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub enum TurfBookingTypeDto {
  #[serde(rename = "turf-wise")]
  TurfWise,
  #[serde(rename = "bulk")]
  Bulk
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub enum TurfSizeDto {
  #[serde(rename = "10000")]
  Sqft10000,
  #[serde(rename = "6500")]
  Sqft6500
}

/// Turf reservation as returned by
/// `GET /api/bookings`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct TurfBookingDto {
  #[serde(rename = "_id")]
  pub id:             String,
  #[serde(default)]
  pub full_name:      String,
  #[serde(default)]
  pub email:          String,
  #[serde(default)]
  pub phone:          String,
  pub payment_mode:   PaymentModeDto,
  pub booking_type:   TurfBookingTypeDto,
  #[serde(default)]
  pub team_name:      String,
  #[serde(default)]
  pub advance_amount: f64,
  pub pending_amount: Option<f64>,
  pub booking_date:   String,
  pub start_time:     String,
  pub end_time:       String,
  pub turf_size:      Option<TurfSizeDto>,
  pub status:         String,
  #[serde(default)]
  pub created_by:     String,
  pub created_at:     Option<String>
}

/// Court (padel / pickleball) reservation
/// as returned by `GET /api/piplay`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct CourtBookingDto {
  #[serde(rename = "_id")]
  pub id:               String,
  #[serde(default)]
  pub full_name:        String,
  #[serde(default)]
  pub email:            String,
  #[serde(default)]
  pub phone:            String,
  pub payment_mode:     PaymentModeDto,
  #[serde(default)]
  pub team_name:        String,
  #[serde(default)]
  pub sport_type:       String,
  pub court_number:     Option<u32>,
  #[serde(default)]
  pub booking_duration: String,
  #[serde(default)]
  pub advance_amount:   f64,
  pub pending_amount:   Option<f64>,
  pub total_amount:     Option<f64>,
  pub booking_date:     String,
  pub start_time:       String,
  pub end_time:         String,
  pub hours:            Option<f64>,
  pub status:           String,
  #[serde(default)]
  pub created_by:       String,
  pub created_at:       Option<String>,
  pub updated_at:       Option<String>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct TurfBookingCreate {
  pub full_name:      String,
  pub email:          String,
  pub phone:          String,
  pub payment_mode:   PaymentModeDto,
  pub booking_type:   TurfBookingTypeDto,
  pub team_name:      String,
  pub advance_amount: f64,
  pub booking_date:   String,
  pub start_time:     String,
  pub end_time:       String,
  pub turf_size:      TurfSizeDto,
  pub created_by:     String
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct CourtBookingCreate {
  pub full_name:      String,
  pub email:          String,
  pub phone:          String,
  pub payment_mode:   PaymentModeDto,
  pub team_name:      String,
  pub sport_type:     String,
  pub court_number:   u32,
  pub advance_amount: f64,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub total_amount:   Option<f64>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub pending_amount: Option<f64>,
  pub booking_date:   String,
  pub start_time:     String,
  pub end_time:       String,
  pub status:         String,
  pub created_by:     String
}

/// Body of `PATCH /{collection}/{id}/payment`.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdateDto {
  pub advance_amount: f64,
  pub pending_amount: f64
}
