// Booking drafts and price summaries
// A draft is created when checkout starts. It is appended to the `bookings`
// list, mirrored into `currentBooking`, and never changed afterwards.

use crate::clock::Clock;
use crate::search::{parse_date_time, SearchCriteria};
use crate::storage::{Storage, BOOKINGS_KEY, CURRENT_BOOKING_KEY};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub const TAX_RATE: f64 = 0.15;
pub const NO_ROOM_MESSAGE: &str = "Please select a room";

const BOOKING_ID_PREFIX: &str = "BK";
const BOOKING_ID_SUFFIX_LEN: usize = 9;
const BASE36_UPPER: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("No room selected")]
    NoRoomSelected,

    #[error("Invalid room price: {0}")]
    InvalidPrice(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedRoom {
    pub id: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub id: String,
    pub hotel: Option<HotelRef>,
    pub room: SelectedRoom,
    #[serde(flatten)]
    pub criteria: SearchCriteria,
    pub status: BookingStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl BookingDraft {
    pub fn nights(&self) -> u32 {
        compute_nights(self.criteria.checkin, self.criteria.checkout)
    }

    pub fn summary(&self) -> PriceSummary {
        compute_total(self.room.price, self.nights())
    }
}

// Whole calendar days between the two dates, 0 if either is missing
pub fn compute_nights(checkin: Option<NaiveDate>, checkout: Option<NaiveDate>) -> u32 {
    match (checkin, checkout) {
        (Some(checkin), Some(checkout)) => (checkout - checkin).num_days().unsigned_abs() as u32,
        _ => 0,
    }
}

// Same as `compute_nights` for raw input values; partial days round up
pub fn compute_nights_str(checkin: Option<&str>, checkout: Option<&str>) -> u32 {
    let (Some(checkin), Some(checkout)) = (
        checkin.and_then(parse_date_time),
        checkout.and_then(parse_date_time),
    ) else {
        return 0;
    };
    let seconds = (checkout - checkin).num_seconds().unsigned_abs() as f64;
    (seconds / SECONDS_PER_DAY).ceil() as u32
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceSummary {
    pub nightly_price: f64,
    pub nights: u32,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl PriceSummary {
    pub fn subtotal_display(&self) -> String {
        format!("{:.2}", self.subtotal)
    }

    pub fn tax_display(&self) -> String {
        format!("{:.2}", self.tax)
    }

    pub fn total_display(&self) -> String {
        format!("{:.2}", self.total)
    }
}

pub fn compute_total(nightly_price: f64, nights: u32) -> PriceSummary {
    compute_total_with_rate(nightly_price, nights, TAX_RATE)
}

pub fn compute_total_with_rate(nightly_price: f64, nights: u32, tax_rate: f64) -> PriceSummary {
    let subtotal = nightly_price * nights as f64;
    PriceSummary {
        nightly_price,
        nights,
        subtotal,
        tax: round_cents(subtotal * tax_rate),
        total: round_cents(subtotal * (1.0 + tax_rate)),
    }
}

// "BK" + epoch millis + 9 random base-36 characters. Collisions are unlikely, not impossible.
pub fn generate_booking_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..BOOKING_ID_SUFFIX_LEN)
        .map(|_| BASE36_UPPER[rng.gen_range(0..BASE36_UPPER.len())] as char)
        .collect();
    format!("{}{}{}", BOOKING_ID_PREFIX, now.timestamp_millis(), suffix)
}

pub struct BookingDraftBuilder {
    storage: Storage,
    clock: Arc<dyn Clock>,
    tax_rate: f64,
    selected_hotel: Option<HotelRef>,
    selected_room: Option<SelectedRoom>,
}

impl std::fmt::Debug for BookingDraftBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingDraftBuilder")
            .field("tax_rate", &self.tax_rate)
            .field("selected_hotel", &self.selected_hotel)
            .field("selected_room", &self.selected_room)
            .finish()
    }
}

impl BookingDraftBuilder {
    pub fn new(storage: Storage, clock: Arc<dyn Clock>, tax_rate: f64) -> Self {
        Self {
            storage,
            clock,
            tax_rate,
            selected_hotel: None,
            selected_room: None,
        }
    }

    pub fn select_hotel(&mut self, hotel: HotelRef) {
        self.selected_hotel = Some(hotel);
    }

    pub fn selected_hotel(&self) -> Option<&HotelRef> {
        self.selected_hotel.as_ref()
    }

    // Replaces any previous selection
    pub fn select_room(&mut self, id: &str, price: f64) -> Result<&SelectedRoom, BookingError> {
        if !price.is_finite() || price < 0.0 {
            return Err(BookingError::InvalidPrice(price));
        }
        tracing::debug!(room_id = id, price, "Room selected");
        Ok(&*self.selected_room.insert(SelectedRoom {
            id: id.to_string(),
            price,
        }))
    }

    pub fn selected_room(&self) -> Option<&SelectedRoom> {
        self.selected_room.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selected_room = None;
    }

    // Price summary for the current selection; no room prices at zero
    pub fn summary(&self, criteria: &SearchCriteria) -> PriceSummary {
        let nights = compute_nights(criteria.checkin, criteria.checkout);
        let price = self.selected_room.as_ref().map_or(0.0, |room| room.price);
        compute_total_with_rate(price, nights, self.tax_rate)
    }

    /// Builds a draft from the current selection and `criteria`, appends it to
    /// the stored booking list and records it as the current booking.
    ///
    /// Storage failures are logged; the draft is still returned.
    pub fn build(&self, criteria: &SearchCriteria) -> Result<BookingDraft, BookingError> {
        let room = self
            .selected_room
            .clone()
            .ok_or(BookingError::NoRoomSelected)?;

        let now = self.clock.now();
        let draft = BookingDraft {
            id: generate_booking_id(now),
            hotel: self.selected_hotel.clone(),
            room,
            criteria: criteria.clone(),
            status: BookingStatus::Pending,
            created_at: now,
        };

        let saved = self.save_booking(&draft);
        let current = self.storage.set(CURRENT_BOOKING_KEY, &draft);
        tracing::info!(
            booking_id = %draft.id,
            room_id = %draft.room.id,
            nights = draft.nights(),
            saved,
            current,
            "Booking draft created"
        );

        Ok(draft)
    }

    // Appends to the stored booking list
    pub fn save_booking(&self, draft: &BookingDraft) -> bool {
        let mut bookings = self.bookings();
        bookings.push(draft.clone());
        self.storage.set(BOOKINGS_KEY, &bookings)
    }

    pub fn bookings(&self) -> Vec<BookingDraft> {
        self.storage.get_or(BOOKINGS_KEY, Vec::new())
    }

    pub fn current_booking(&self) -> Option<BookingDraft> {
        self.storage.get(CURRENT_BOOKING_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            checkin: Some(date(2024, 1, 1)),
            checkout: Some(date(2024, 1, 4)),
            ..SearchCriteria::default()
        }
    }

    fn builder(storage: Storage) -> BookingDraftBuilder {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2023, 12, 20, 9, 30, 0).unwrap());
        BookingDraftBuilder::new(storage, Arc::new(clock), TAX_RATE)
    }

    #[test_case(Some(date(2024, 1, 1)), Some(date(2024, 1, 4)), 3 ; "three nights")]
    #[test_case(None, Some(date(2024, 1, 4)), 0 ; "missing checkin")]
    #[test_case(Some(date(2024, 1, 1)), None, 0 ; "missing checkout")]
    #[test_case(Some(date(2024, 1, 4)), Some(date(2024, 1, 1)), 3 ; "reversed dates")]
    #[test_case(Some(date(2024, 2, 28)), Some(date(2024, 3, 1)), 2 ; "leap day")]
    fn test_compute_nights(checkin: Option<NaiveDate>, checkout: Option<NaiveDate>, expected: u32) {
        assert_eq!(compute_nights(checkin, checkout), expected);
    }

    #[test]
    fn test_compute_nights_from_raw_values() {
        assert_eq!(compute_nights_str(Some("2024-01-01"), Some("2024-01-04")), 3);
        assert_eq!(compute_nights_str(None, Some("2024-01-04")), 0);
        assert_eq!(compute_nights_str(Some(""), Some("2024-01-04")), 0);
        assert_eq!(
            compute_nights_str(Some("2024-01-01T00:00:00Z"), Some("2024-01-02T06:00:00Z")),
            2
        );
    }

    #[test]
    fn test_compute_total() {
        let summary = compute_total(100.0, 3);
        assert_eq!(summary.subtotal, 300.0);
        assert_eq!(summary.tax, 45.0);
        assert_eq!(summary.total, 345.0);
        assert_eq!(summary.tax_display(), "45.00");
        assert_eq!(summary.total_display(), "345.00");
    }

    #[test]
    fn test_build_without_room_fails() {
        let storage = Storage::in_memory();
        let builder = builder(storage.clone());
        assert_eq!(builder.build(&criteria()), Err(BookingError::NoRoomSelected));
        assert!(builder.bookings().is_empty());
        assert!(storage.get::<BookingDraft>(CURRENT_BOOKING_KEY).is_none());
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let mut builder = builder(Storage::in_memory());
        assert_eq!(
            builder.select_room("deluxe", -1.0).unwrap_err(),
            BookingError::InvalidPrice(-1.0)
        );
        assert!(builder.selected_room().is_none());
    }

    #[test]
    fn test_build_appends_and_sets_current() {
        let storage = Storage::in_memory();
        let mut builder = builder(storage.clone());
        builder.select_hotel(HotelRef {
            id: "1".into(),
            name: "Grand Plaza".into(),
        });
        builder.select_room("deluxe", 120.0).unwrap();

        let first = builder.build(&criteria()).unwrap();
        let second = builder.build(&criteria()).unwrap();

        assert!(first.id.starts_with("BK1703064600000"));
        assert_eq!(first.id.len(), 2 + 13 + 9);
        assert!(first.id[15..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_eq!(first.status, BookingStatus::Pending);
        assert_eq!(first.summary().total, 414.0);

        let stored = builder.bookings();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], first);
        assert_eq!(builder.current_booking(), Some(second));
    }

    #[test]
    fn test_draft_json_shape() {
        let mut builder = builder(Storage::in_memory());
        builder.select_room("std", 80.0).unwrap();
        let draft = builder.build(&criteria()).unwrap();

        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["room"]["id"], "std");
        assert_eq!(value["checkin"], "2024-01-01");
        assert_eq!(value["adults"], 2);
        assert_eq!(value["status"], "pending");
        assert_eq!(value["hotel"], serde_json::Value::Null);
        assert!(value["createdAt"].as_str().unwrap().starts_with("2023-12-20T09:30:00"));
    }

    #[test]
    fn test_build_survives_storage_failure() {
        let backend = Arc::new(MemoryStore::new());
        let mut builder = builder(Storage::new(backend.clone()));
        builder.select_room("std", 80.0).unwrap();
        backend.set_enabled(false);

        assert!(builder.build(&criteria()).is_ok());
        backend.set_enabled(true);
        assert!(builder.bookings().is_empty());
    }

    #[test]
    fn test_summary_without_room_is_zero() {
        let mut builder = builder(Storage::in_memory());
        assert_eq!(builder.summary(&criteria()).total, 0.0);
        builder.select_room("std", 100.0).unwrap();
        assert_eq!(builder.summary(&criteria()).nights, 3);
        builder.clear_selection();
        assert_eq!(builder.summary(&criteria()).subtotal, 0.0);
    }

    #[test]
    fn test_generated_ids_differ() {
        let now = Utc::now();
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| generate_booking_id(now)).collect();
        assert_eq!(ids.len(), 100);
    }
}
