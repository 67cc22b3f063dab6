// Search criteria state: dates and guest/room counters
// Criteria live in memory while the form is edited and are persisted under
// `searchData` when a search is submitted.

use crate::clock::Clock;
use crate::i18n::Language;
use crate::notification::NotificationCenter;
use crate::storage::{Storage, SEARCH_DATA_KEY};
use crate::view::Navigation;
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const INVALID_DATES_MESSAGE: &str = "Please select valid dates";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Check-in date is missing")]
    MissingCheckIn,

    #[error("Check-out date is missing")]
    MissingCheckOut,

    #[error("Check-in {checkin} is before today ({today})")]
    CheckInInPast { checkin: NaiveDate, today: NaiveDate },

    #[error("Check-out {checkout} must be after check-in {checkin}")]
    CheckOutNotAfterCheckIn {
        checkin: NaiveDate,
        checkout: NaiveDate,
    },
}

// Parses "YYYY-MM-DD", also accepting a full RFC 3339 timestamp
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_date_time(raw).map(|dt| dt.date())
}

pub(crate) fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return date.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}

// Dates are written as "" when unset
mod optional_date {
    use super::{parse_date, DATE_FORMAT};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_date))
    }
}

// Counters were written both as numbers and as their text content ("2").
// Out-of-range values are clamped here and lifted to their floor by `normalized`.
mod count {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CountRepr {
        Number(i64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let count = match CountRepr::deserialize(deserializer)? {
            CountRepr::Number(n) => n,
            CountRepr::Text(text) => text.trim().parse::<i64>().map_err(de::Error::custom)?,
        };
        Ok(count.clamp(0, u32::MAX as i64) as u32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    #[serde(with = "optional_date")]
    pub checkin: Option<NaiveDate>,
    #[serde(with = "optional_date")]
    pub checkout: Option<NaiveDate>,
    #[serde(deserialize_with = "count::deserialize")]
    pub adults: u32,
    #[serde(deserialize_with = "count::deserialize")]
    pub children: u32,
    #[serde(deserialize_with = "count::deserialize")]
    pub rooms: u32,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            checkin: None,
            checkout: None,
            adults: 2,
            children: 0,
            rooms: 1,
        }
    }
}

impl SearchCriteria {
    pub fn total_guests(&self) -> u32 {
        self.adults + self.children
    }

    // Lifts counters that fell below their floor
    pub fn normalized(mut self) -> Self {
        for field in GuestField::ALL {
            let value = self.count(field).max(field.minimum());
            *self.count_mut(field) = value;
        }
        self
    }

    pub fn count(&self, field: GuestField) -> u32 {
        match field {
            GuestField::Adults => self.adults,
            GuestField::Children => self.children,
            GuestField::Rooms => self.rooms,
        }
    }

    fn count_mut(&mut self, field: GuestField) -> &mut u32 {
        match field {
            GuestField::Adults => &mut self.adults,
            GuestField::Children => &mut self.children,
            GuestField::Rooms => &mut self.rooms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestField {
    Adults,
    Children,
    Rooms,
}

impl GuestField {
    pub const ALL: [GuestField; 3] = [GuestField::Adults, GuestField::Children, GuestField::Rooms];

    pub fn minimum(self) -> u32 {
        match self {
            GuestField::Adults | GuestField::Rooms => 1,
            GuestField::Children => 0,
        }
    }
}

pub fn validate_dates(
    checkin: Option<NaiveDate>,
    checkout: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    let checkin = checkin.ok_or(ValidationError::MissingCheckIn)?;
    let checkout = checkout.ok_or(ValidationError::MissingCheckOut)?;

    if checkin < today {
        return Err(ValidationError::CheckInInPast { checkin, today });
    }
    if checkout <= checkin {
        return Err(ValidationError::CheckOutNotAfterCheckIn { checkin, checkout });
    }
    Ok(())
}

// Form defaults: check in tomorrow, check out a week from today
pub fn default_dates(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        today.checked_add_days(Days::new(1)).unwrap_or(today),
        today.checked_add_days(Days::new(7)).unwrap_or(today),
    )
}

// Earliest selectable check-out for a given check-in
pub fn min_checkout(checkin: NaiveDate) -> Option<NaiveDate> {
    checkin.succ_opt()
}

pub fn guest_summary(criteria: &SearchCriteria, language: Language) -> String {
    let guests = criteria.total_guests();
    let rooms = criteria.rooms;
    match language {
        Language::En => format!(
            "{} {}, {} {}",
            guests,
            if guests == 1 { "Guest" } else { "Guests" },
            rooms,
            if rooms == 1 { "Room" } else { "Rooms" }
        ),
        Language::Ar => format!(
            "{} {}, {} {}",
            guests,
            if guests == 1 { "ضيف" } else { "ضيوف" },
            rooms,
            if rooms == 1 { "غرفة" } else { "غرف" }
        ),
    }
}

pub struct SearchStateStore {
    storage: Storage,
    clock: Arc<dyn Clock>,
    criteria: SearchCriteria,
}

impl std::fmt::Debug for SearchStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchStateStore")
            .field("criteria", &self.criteria)
            .finish()
    }
}

impl SearchStateStore {
    pub fn new(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        let mut store = Self {
            storage,
            clock,
            criteria: SearchCriteria::default(),
        };
        store.criteria = store.load();
        store
    }

    // Persisted criteria, or the defaults when nothing (readable) is stored
    pub fn load(&self) -> SearchCriteria {
        self.storage
            .get::<SearchCriteria>(SEARCH_DATA_KEY)
            .map(SearchCriteria::normalized)
            .unwrap_or_default()
    }

    pub fn reload(&mut self) {
        self.criteria = self.load();
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    pub fn set_checkin(&mut self, checkin: Option<NaiveDate>) {
        self.criteria.checkin = checkin;
    }

    pub fn set_checkout(&mut self, checkout: Option<NaiveDate>) {
        self.criteria.checkout = checkout;
    }

    pub fn set_dates(&mut self, checkin: Option<NaiveDate>, checkout: Option<NaiveDate>) {
        self.criteria.checkin = checkin;
        self.criteria.checkout = checkout;
    }

    // Fills both dates with the form defaults relative to today
    pub fn apply_default_dates(&mut self) {
        let (checkin, checkout) = default_dates(self.clock.today());
        self.set_dates(Some(checkin), Some(checkout));
    }

    pub fn min_checkin(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn min_checkout(&self) -> Option<NaiveDate> {
        self.criteria.checkin.and_then(min_checkout)
    }

    pub fn increment(&mut self, field: GuestField) -> u32 {
        let count = self.criteria.count_mut(field);
        *count = count.saturating_add(1);
        *count
    }

    // Never goes below the field's floor
    pub fn decrement(&mut self, field: GuestField) -> u32 {
        let count = self.criteria.count_mut(field);
        if *count > field.minimum() {
            *count -= 1;
        }
        *count
    }

    pub fn validate(
        &self,
        checkin: Option<NaiveDate>,
        checkout: Option<NaiveDate>,
    ) -> Result<(), ValidationError> {
        validate_dates(checkin, checkout, self.clock.today())
    }

    pub fn is_valid(&self, checkin: Option<NaiveDate>, checkout: Option<NaiveDate>) -> bool {
        self.validate(checkin, checkout).is_ok()
    }

    // Persists unconditionally; false when storage refused the write
    pub fn save(&self, criteria: &SearchCriteria) -> bool {
        self.storage.set(SEARCH_DATA_KEY, criteria)
    }

    // Validates the current criteria, then persists them. Invalid dates surface
    // as an error notification and block the search.
    pub fn submit(
        &mut self,
        notifications: &mut NotificationCenter,
    ) -> Result<Navigation, ValidationError> {
        if let Err(err) = self.validate(self.criteria.checkin, self.criteria.checkout) {
            tracing::debug!(error = %err, "Search rejected");
            notifications.error(INVALID_DATES_MESSAGE, self.clock.now());
            return Err(err);
        }

        if !self.save(&self.criteria) {
            tracing::warn!("Search criteria could not be persisted");
        }
        Ok(Navigation::SearchResults)
    }

    pub fn guest_summary(&self, language: Language) -> String {
        guest_summary(&self.criteria, language)
    }
}
