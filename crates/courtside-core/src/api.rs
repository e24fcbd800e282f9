use anyhow::{
  Context,
  anyhow
};
use courtside_shared::{
  ApiEnvelope,
  CourtBookingCreate,
  CourtBookingDto,
  PaymentUpdateDto,
  TurfBookingCreate,
  TurfBookingDto
};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{
  debug,
  info,
  warn
};

use crate::booking::{
  Booking,
  BookingDomain,
  BookingRecords,
  normalize_bookings
};
use crate::config::ApiSettings;
use crate::loadable::{
  Loadable,
  RequestSequence,
  RequestTicket
};

/// Create payload for either venue.
#[derive(Debug, Clone)]
pub enum NewBooking {
  Turf(TurfBookingCreate),
  Court(CourtBookingCreate)
}

impl NewBooking {
  pub fn domain(&self) -> BookingDomain {
    match self {
      | NewBooking::Turf(_) => {
        BookingDomain::Turf
      }
      | NewBooking::Court(_) => {
        BookingDomain::Court
      }
    }
  }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
  http:     reqwest::Client,
  base_url: String,
  session:  Option<String>
}

impl ApiClient {
  pub fn new(
    settings: &ApiSettings
  ) -> anyhow::Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(settings.timeout)
      .build()
      .context(
        "failed building HTTP client \
         for booking API"
      )?;

    Ok(Self {
      http,
      base_url: settings.base_url.clone(),
      session: settings.session.clone()
    })
  }

  pub fn collection_url(
    &self,
    domain: BookingDomain
  ) -> String {
    format!(
      "{}{}",
      self.base_url,
      domain.collection_path()
    )
  }

  pub fn item_url(
    &self,
    domain: BookingDomain,
    id: &str
  ) -> String {
    format!(
      "{}/{}",
      self.collection_url(domain),
      id.trim()
    )
  }

  #[tracing::instrument(skip(self))]
  pub async fn list_bookings(
    &self,
    domain: BookingDomain
  ) -> anyhow::Result<Vec<Booking>> {
    let url = self.collection_url(domain);
    let body = self
      .send(self.http.get(&url), &url)
      .await?;
    let records =
      decode_listing(domain, &body)
        .with_context(|| {
          format!(
            "failed decoding booking \
             list from {url}"
          )
        })?;
    let bookings =
      normalize_bookings(records);
    info!(
      domain = domain.as_key(),
      count = bookings.len(),
      "fetched bookings"
    );
    Ok(bookings)
  }

  #[tracing::instrument(skip(self))]
  pub async fn get_booking(
    &self,
    domain: BookingDomain,
    id: &str
  ) -> anyhow::Result<Booking> {
    let url = self.item_url(domain, id);
    let body = self
      .send(self.http.get(&url), &url)
      .await?;
    decode_single(domain, &body)
      .with_context(|| {
        format!(
          "failed decoding booking \
           from {url}"
        )
      })
  }

  /// Creates a booking. The backend may
  /// echo the stored record; when it
  /// does, it is returned.
  #[tracing::instrument(skip_all, fields(domain = create.domain().as_key()))]
  pub async fn create_booking(
    &self,
    create: &NewBooking
  ) -> anyhow::Result<Option<Booking>> {
    let domain = create.domain();
    let url = self.collection_url(domain);
    let payload = match create {
      | NewBooking::Turf(body) => {
        to_json(body)?
      }
      | NewBooking::Court(body) => {
        to_json(body)?
      }
    };

    let request = self
      .http
      .post(&url)
      .header(
        CONTENT_TYPE,
        "application/json"
      )
      .body(payload);
    let body =
      self.send(request, &url).await?;

    match decode_created(domain, &body) {
      | Ok(Some(booking)) => {
        info!(booking = %booking.id, "created booking");
        Ok(Some(booking))
      }
      | Ok(None) => {
        debug!("create response carried no booking record");
        Ok(None)
      }
      | Err(err) => {
        warn!(
          url = %url,
          error = %format!("{err:#}"),
          "create succeeded but the echoed booking record is unreadable"
        );
        Ok(None)
      }
    }
  }

  #[tracing::instrument(skip(self))]
  pub async fn delete_booking(
    &self,
    domain: BookingDomain,
    id: &str
  ) -> anyhow::Result<()> {
    let url = self.item_url(domain, id);
    self
      .send(self.http.delete(&url), &url)
      .await?;
    info!(booking = %id, "deleted booking");
    Ok(())
  }

  #[tracing::instrument(skip(self))]
  pub async fn update_payment(
    &self,
    domain: BookingDomain,
    id: &str,
    update: &PaymentUpdateDto
  ) -> anyhow::Result<()> {
    let url = format!(
      "{}/payment",
      self.item_url(domain, id)
    );
    let request = self
      .http
      .patch(&url)
      .header(
        CONTENT_TYPE,
        "application/json"
      )
      .body(to_json(update)?);
    self.send(request, &url).await?;
    info!(
      booking = %id,
      advance = update.advance_amount,
      pending = update.pending_amount,
      "updated payment"
    );
    Ok(())
  }

  /// Starts a listing fetch. The ticket
  /// is taken before the request goes
  /// out, so hand both halves of the
  /// result to `RequestSequence::accept`:
  /// a response overtaken by a newer
  /// fetch is dropped there. Failures are
  /// logged and come back as `Failed`.
  pub fn fetch_listing(
    &self,
    domain: BookingDomain,
    seq: &RequestSequence
  ) -> impl Future<
    Output = (
      RequestTicket,
      Loadable<Vec<Booking>>
    )
  > + '_ {
    let ticket = seq.begin();
    async move {
      let result =
        self.list_bookings(domain).await;
      if let Err(err) = &result {
        warn!(
          domain = domain.as_key(),
          ticket = ticket.seq(),
          error = %format!("{err:#}"),
          "failed fetching bookings"
        );
      }
      (ticket, Loadable::from_result(result))
    }
  }

  async fn send(
    &self,
    request: reqwest::RequestBuilder,
    url: &str
  ) -> anyhow::Result<String> {
    let request = match &self.session {
      | Some(token) => {
        request.bearer_auth(token)
      }
      | None => request
    };

    let response =
      request.send().await.with_context(
        || {
          format!(
            "failed requesting {url}"
          )
        }
      )?;
    let status = response.status();
    let body =
      response.text().await.with_context(
        || {
          format!(
            "failed reading response \
             body from {url}"
          )
        }
      )?;

    debug!(
      url,
      status = %status,
      bytes = body.len(),
      "booking API responded"
    );

    if !status.is_success() {
      let detail = envelope_message(&body)
        .unwrap_or_default();
      return Err(anyhow!(
        "booking API returned HTTP {} \
         for {}{}",
        status,
        url,
        if detail.is_empty() {
          String::new()
        } else {
          format!(": {detail}")
        }
      ));
    }

    if let Ok(envelope) =
      serde_json::from_str::<
        ApiEnvelope<serde_json::Value>
      >(&body)
      && !envelope.success
      && envelope.message.is_some()
    {
      return Err(anyhow!(
        "booking API rejected request \
         to {}: {}",
        url,
        envelope
          .message
          .unwrap_or_default()
      ));
    }

    Ok(body)
  }
}

fn to_json<T: Serialize>(
  value: &T
) -> anyhow::Result<String> {
  serde_json::to_string(value)
    .context("failed encoding request body")
}

fn envelope_message(
  body: &str
) -> Option<String> {
  serde_json::from_str::<
    ApiEnvelope<serde_json::Value>
  >(body)
  .ok()
  .and_then(|e| e.message)
}

/// Decodes a listing body: either the
/// `{success, data}` envelope or a bare
/// JSON array (exported snapshots).
pub fn decode_listing(
  domain: BookingDomain,
  body: &str
) -> anyhow::Result<BookingRecords> {
  match domain {
    | BookingDomain::Turf => {
      decode_rows(body)
        .map(BookingRecords::Turf)
    }
    | BookingDomain::Court => {
      decode_rows(body)
        .map(BookingRecords::Court)
    }
  }
}

fn decode_rows(
  body: &str
) -> anyhow::Result<Vec<serde_json::Value>> {
  let value: serde_json::Value =
    serde_json::from_str(body)
      .context("response is not JSON")?;

  if let serde_json::Value::Array(rows) =
    value
  {
    return Ok(rows);
  }

  let envelope: ApiEnvelope<
    Vec<serde_json::Value>
  > = serde_json::from_value(value)
    .context(
      "unexpected booking envelope shape"
    )?;
  if !envelope.success {
    return Err(anyhow!(
      "backend reported failure: {}",
      envelope
        .message
        .unwrap_or_else(|| {
          "no message".to_string()
        })
    ));
  }
  Ok(envelope.data.unwrap_or_default())
}

/// Booking echoed by a create call, if
/// the response carries one. A record
/// that is present but unreadable is an
/// error.
pub fn decode_created(
  domain: BookingDomain,
  body: &str
) -> anyhow::Result<Option<Booking>> {
  let Ok(value) =
    serde_json::from_str::<
      serde_json::Value
    >(body)
  else {
    return Ok(None);
  };

  let has_record = match value.get("data")
  {
    | Some(data) => data.is_object(),
    | None => value.get("_id").is_some()
  };
  if !has_record {
    return Ok(None);
  }

  decode_single(domain, body).map(Some)
}

/// Decodes one booking from either
/// `{success, data: {...}}` or a bare
/// record.
pub fn decode_single(
  domain: BookingDomain,
  body: &str
) -> anyhow::Result<Booking> {
  match domain {
    | BookingDomain::Turf => {
      let dto =
        decode_record::<TurfBookingDto>(
          body
        )?;
      Booking::from_turf_dto(dto)
    }
    | BookingDomain::Court => {
      let dto =
        decode_record::<CourtBookingDto>(
          body
        )?;
      Booking::from_court_dto(dto)
    }
  }
}

fn decode_record<T: DeserializeOwned>(
  body: &str
) -> anyhow::Result<T> {
  let value: serde_json::Value =
    serde_json::from_str(body)
      .context("response is not JSON")?;

  if let Some(data) = value.get("data")
    && data.is_object()
  {
    return serde_json::from_value(
      data.clone()
    )
    .context(
      "unexpected booking record shape"
    );
  }

  serde_json::from_value(value).context(
    "unexpected booking record shape"
  )
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use tokio::io::{
    AsyncReadExt,
    AsyncWriteExt
  };
  use tokio::net::TcpListener;

  use super::*;

  const TURF_LIST: &str = r#"{
    "success": true,
    "data": [
      {"_id": "a", "fullName": "A", "paymentMode": "cash", "bookingType": "bulk",
       "bookingDate": "2025-03-10T00:00:00.000Z", "startTime": "06:00",
       "endTime": "09:00", "status": "confirmed"},
      {"_id": "broken", "fullName": "B", "paymentMode": "cash", "bookingType": "bulk",
       "bookingDate": "", "startTime": "06:00", "endTime": "07:00",
       "status": "confirmed"}
    ]
  }"#;

  #[test]
  fn listing_envelope_and_bare_array() {
    let records = decode_listing(
      BookingDomain::Turf,
      TURF_LIST
    )
    .expect("decode envelope");
    assert_eq!(records.len(), 2);
    let bookings =
      normalize_bookings(records);
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, "a");

    let bare = r#"[{"_id": "c1", "fullName": "P", "paymentMode": "upi",
      "sportType": "padel", "bookingDate": "2025-03-11", "startTime": "07:00",
      "endTime": "08:00", "status": "pending", "courtNumber": 2}]"#;
    let records = decode_listing(
      BookingDomain::Court,
      bare
    )
    .expect("decode array");
    assert_eq!(records.len(), 1);
  }

  #[test]
  fn failed_envelope_is_an_error() {
    let body = r#"{"success": false, "message": "session expired"}"#;
    let err = decode_listing(
      BookingDomain::Turf,
      body
    )
    .expect_err("failure envelope");
    assert!(
      err
        .to_string()
        .contains("session expired")
    );
  }

  #[test]
  fn single_record_with_or_without_envelope()
  {
    let wrapped = r#"{"success": true, "data": {"_id": "a", "fullName": "A",
      "paymentMode": "cash", "bookingType": "turf-wise", "bookingDate": "2025-03-10",
      "startTime": "06:00", "endTime": "07:00", "status": "completed",
      "pendingAmount": 0}}"#;
    let booking = decode_single(
      BookingDomain::Turf,
      wrapped
    )
    .expect("wrapped record");
    assert!(booking.is_settled());

    let bare = r#"{"_id": "b", "fullName": "B", "paymentMode": "upi",
      "bookingType": "bulk", "bookingDate": "2025-03-12", "startTime": "06:00",
      "endTime": "07:00", "status": "pending"}"#;
    let booking = decode_single(
      BookingDomain::Turf,
      bare
    )
    .expect("bare record");
    assert_eq!(booking.id, "b");
  }

  #[test]
  fn urls_follow_collection_paths() {
    let client = ApiClient::new(&ApiSettings {
      base_url: "https://venue.example"
        .to_string(),
      session:  None,
      timeout:  Duration::from_secs(5)
    })
    .expect("client");

    assert_eq!(
      client
        .collection_url(BookingDomain::Turf),
      "https://venue.example/api/bookings"
    );
    assert_eq!(
      client.item_url(
        BookingDomain::Court,
        " 42 "
      ),
      "https://venue.example/api/piplay/42"
    );
  }

  #[test]
  fn one_bad_row_does_not_blank_the_listing()
  {
    let body = r#"{"success": true, "data": [
      {"_id": "a", "fullName": "A", "paymentMode": "cash", "bookingType": "bulk",
       "bookingDate": "2025-03-10", "startTime": "06:00", "endTime": "07:00",
       "status": "confirmed"},
      {"_id": "card", "fullName": "B", "paymentMode": "card", "bookingType": "bulk",
       "bookingDate": "2025-03-10", "startTime": "07:00", "endTime": "08:00",
       "status": "confirmed"},
      {"_id": "nostatus", "fullName": "C", "paymentMode": "upi", "bookingType": "bulk",
       "bookingDate": "2025-03-11", "startTime": "07:00", "endTime": "08:00"}
    ]}"#;
    let records = decode_listing(
      BookingDomain::Turf,
      body
    )
    .expect("envelope decodes");
    assert_eq!(records.len(), 3);
    let bookings =
      normalize_bookings(records);
    let ids: Vec<&str> = bookings
      .iter()
      .map(|b| b.id.as_str())
      .collect();
    assert_eq!(ids, vec!["a"]);

    let bare = r#"[
      {"_id": "c1", "fullName": "P", "paymentMode": "upi", "sportType": "padel",
       "bookingDate": "2025-03-11", "startTime": "07:00", "endTime": "08:00"},
      {"_id": "c2", "fullName": "Q", "paymentMode": "upi", "sportType": "padel",
       "bookingDate": "2025-03-11", "startTime": "08:00", "endTime": "09:00",
       "status": "pending"}
    ]"#;
    let bookings = normalize_bookings(
      decode_listing(
        BookingDomain::Court,
        bare
      )
      .expect("array decodes")
    );
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, "c2");
  }

  #[test]
  fn created_record_is_optional_but_must_be_readable()
  {
    let none = decode_created(
      BookingDomain::Turf,
      r#"{"success": true, "message": "Booking created"}"#
    )
    .expect("no record");
    assert!(none.is_none());
    assert!(
      decode_created(
        BookingDomain::Turf,
        ""
      )
      .expect("empty body")
      .is_none()
    );

    let echoed = decode_created(
      BookingDomain::Turf,
      r#"{"success": true, "data": {"_id": "n1", "fullName": "N",
        "paymentMode": "cash", "bookingType": "bulk", "bookingDate": "2025-03-12",
        "startTime": "06:00", "endTime": "07:00", "status": "confirmed"}}"#
    )
    .expect("readable record");
    assert_eq!(
      echoed.map(|b| b.id),
      Some("n1".to_string())
    );

    assert!(
      decode_created(
        BookingDomain::Turf,
        r#"{"success": true, "data": {"_id": "n2", "paymentMode": "card"}}"#
      )
      .is_err()
    );
  }

  fn client_for(base_url: String) -> ApiClient {
    ApiClient::new(&ApiSettings {
      base_url,
      session: Some("token".to_string()),
      timeout: Duration::from_secs(5)
    })
    .expect("client")
  }

  /// Answers a single request with
  /// `body` and returns the base URL.
  async fn serve_listing_once(
    body: &'static str
  ) -> String {
    let listener =
      TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener
      .local_addr()
      .expect("listener addr");

    tokio::spawn(async move {
      let Ok((mut socket, _)) =
        listener.accept().await
      else {
        return;
      };
      let mut request = vec![0_u8; 8192];
      let _ = socket.read(&mut request).await;
      let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
      );
      let _ = socket
        .write_all(response.as_bytes())
        .await;
      let _ = socket.shutdown().await;
    });

    format!("http://{addr}")
  }

  const OLDER_LISTING: &str = r#"{"success": true, "data": [
    {"_id": "older", "fullName": "O", "paymentMode": "cash", "bookingType": "bulk",
     "bookingDate": "2025-03-10", "startTime": "06:00", "endTime": "07:00",
     "status": "confirmed"}]}"#;

  const NEWER_LISTING: &str = r#"{"success": true, "data": [
    {"_id": "newer", "fullName": "N", "paymentMode": "cash", "bookingType": "bulk",
     "bookingDate": "2025-04-10", "startTime": "06:00", "endTime": "07:00",
     "status": "confirmed"}]}"#;

  #[tokio::test]
  async fn older_listing_landing_late_is_discarded()
  {
    let older_client = client_for(
      serve_listing_once(OLDER_LISTING).await
    );
    let newer_client = client_for(
      serve_listing_once(NEWER_LISTING).await
    );
    let seq = RequestSequence::new();
    let mut slot = Loadable::Loading;

    let older = older_client
      .fetch_listing(BookingDomain::Turf, &seq);
    let newer = newer_client
      .fetch_listing(BookingDomain::Turf, &seq);

    let (ticket, value) = newer.await;
    assert!(seq.accept(ticket, value, &mut slot));

    let (ticket, value) = older.await;
    assert!(value.as_loaded().is_some());
    assert!(!seq.accept(ticket, value, &mut slot));

    let ids: Vec<&str> = slot
      .loaded_or_empty()
      .iter()
      .map(|b| b.id.as_str())
      .collect();
    assert_eq!(ids, vec!["newer"]);
  }

  #[tokio::test]
  async fn refused_connection_is_recorded_as_failed()
  {
    let listener =
      TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener
      .local_addr()
      .expect("listener addr");
    drop(listener);

    let client =
      client_for(format!("http://{addr}"));
    let seq = RequestSequence::new();
    let mut slot = Loadable::Loading;

    let (ticket, value) = client
      .fetch_listing(BookingDomain::Turf, &seq)
      .await;

    assert!(seq.accept(ticket, value, &mut slot));
    assert!(slot.error().is_some());
    assert!(slot.loaded_or_empty().is_empty());
  }
}
