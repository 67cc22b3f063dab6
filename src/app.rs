// Application state
// One explicitly constructed owner for every store. Event handlers call into
// AppState, which mutates state, persists it, and re-renders the Document.

use crate::booking::{BookingDraft, BookingDraftBuilder, BookingError, PriceSummary, NO_ROOM_MESSAGE, TAX_RATE};
use crate::clock::{Clock, SystemClock};
use crate::hotels::{Hotel, HotelCatalog, FEATURED_DEALS_LIMIT};
use crate::i18n::{Language, LanguageStateStore};
use crate::loader::{load_site_data, DataSource, LoaderConfig};
use crate::notification::{NotificationCenter, DEFAULT_NOTIFICATION_TTL_MS};
use crate::price_filter::{PriceFilter, PriceFilterConfig, PriceRange};
use crate::search::{SearchStateStore, ValidationError, INVALID_DATES_MESSAGE};
use crate::storage::Storage;
use crate::view::{Document, Navigation};
use crate::widgets::{run_autoplay, HeroSlider, DEFAULT_AUTOPLAY_MS};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub loader: LoaderConfig,
    pub price_filter: PriceFilterConfig,
    pub tax_rate: f64,
    pub notification_ttl_ms: u64,
    pub slider_autoplay_ms: u64,
    pub default_language: Language,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            price_filter: PriceFilterConfig::default(),
            tax_rate: TAX_RATE,
            notification_ttl_ms: DEFAULT_NOTIFICATION_TTL_MS,
            slider_autoplay_ms: DEFAULT_AUTOPLAY_MS,
            default_language: Language::En,
        }
    }
}

pub struct AppState {
    config: AppConfig,
    storage: Storage,
    clock: Arc<dyn Clock>,
    search: SearchStateStore,
    language: LanguageStateStore,
    booking: BookingDraftBuilder,
    price_filter: PriceFilter,
    catalog: HotelCatalog,
    notifications: NotificationCenter,
    document: Document,
    cancel: CancellationToken,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("search", &self.search)
            .field("language", &self.language.language())
            .field("booking", &self.booking)
            .field("hotels", &self.catalog.len())
            .finish()
    }
}

impl AppState {
    pub fn new(config: AppConfig, storage: Storage, clock: Arc<dyn Clock>) -> Self {
        let search = SearchStateStore::new(storage.clone(), clock.clone());
        let language = LanguageStateStore::new(storage.clone(), config.default_language);
        let booking = BookingDraftBuilder::new(storage.clone(), clock.clone(), config.tax_rate);
        let price_filter = PriceFilter::new(config.price_filter.clone());
        let notifications = NotificationCenter::new(config.notification_ttl_ms);

        Self {
            config,
            storage,
            clock,
            search,
            language,
            booking,
            price_filter,
            catalog: HotelCatalog::default(),
            notifications,
            document: Document::new(),
            cancel: CancellationToken::new(),
        }
    }

    // Default config, in-memory storage, wall clock
    pub fn with_defaults() -> Self {
        Self::new(AppConfig::default(), Storage::in_memory(), Arc::new(SystemClock))
    }

    /// Loads translations and hotels, then renders the active language.
    ///
    /// Failed loads leave the corresponding feature empty. Returns the number
    /// of bindings rendered.
    pub async fn init(&mut self, source: Arc<dyn DataSource>) -> usize {
        let data = load_site_data(source, &self.config.loader, &self.cancel).await;
        tracing::info!(
            hotels = data.hotels.len(),
            translations = !data.translations.is_empty(),
            "Site data loaded"
        );

        self.catalog = HotelCatalog::new(data.hotels);
        self.language.set_catalog(data.translations);
        self.language.apply(&mut self.document)
    }

    // Cancels any load still in flight and stops slider autoplay
    pub fn shutdown(&self) {
        tracing::debug!("Shutting down");
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn submit_search(&mut self) -> Result<Navigation, ValidationError> {
        self.search.submit(&mut self.notifications)
    }

    // A new search invalidates the room picked for the previous one
    pub fn start_new_search(&mut self) -> Result<Navigation, ValidationError> {
        self.booking.clear_selection();
        self.submit_search()
    }

    pub fn open_hotel(&mut self, id: &str) -> Option<Navigation> {
        let hotel = self.catalog.find(id)?.to_ref();
        let navigation = Navigation::HotelDetail(hotel.id.clone());
        self.booking.select_hotel(hotel);
        Some(navigation)
    }

    pub fn select_room(&mut self, id: &str, price: f64) -> Result<(), BookingError> {
        match self.booking.select_room(id, price) {
            Ok(_) => Ok(()),
            Err(err) => {
                self.notifications.error(err.to_string(), self.clock.now());
                Err(err)
            }
        }
    }

    /// Starts checkout for the selected room.
    ///
    /// Dates are checked first, then the room. Either failure is shown as a
    /// notification and nothing is written.
    pub fn submit_booking(&mut self) -> Result<(BookingDraft, Navigation), AppError> {
        let criteria = self.search.criteria().clone();
        if let Err(err) = self.search.validate(criteria.checkin, criteria.checkout) {
            self.notifications.error(INVALID_DATES_MESSAGE, self.clock.now());
            return Err(err.into());
        }

        let draft = match self.booking.build(&criteria) {
            Ok(draft) => draft,
            Err(err) => {
                let message = match err {
                    BookingError::NoRoomSelected => NO_ROOM_MESSAGE.to_string(),
                    ref other => other.to_string(),
                };
                self.notifications.error(message, self.clock.now());
                return Err(err.into());
            }
        };

        if !self.search.save(&criteria) {
            tracing::warn!("Search criteria could not be persisted with the booking");
        }
        Ok((draft, Navigation::Checkout))
    }

    // Hero slider advancing every `slider_autoplay_ms`
    pub fn hero_slider(&self, slide_count: usize, now: Instant) -> HeroSlider {
        HeroSlider::new(
            slide_count,
            Duration::from_millis(self.config.slider_autoplay_ms),
            now,
        )
    }

    // Runs autoplay for `slider` until shutdown
    pub fn start_autoplay(&self, slider: Arc<Mutex<HeroSlider>>) -> JoinHandle<()> {
        tokio::spawn(run_autoplay(slider, self.cancel.child_token()))
    }

    pub fn set_language(&mut self, language: Language) -> usize {
        self.language.set_language(language, &mut self.document)
    }

    pub fn toggle_language(&mut self) -> Language {
        self.language.toggle_language(&mut self.document)
    }

    pub fn translate(&self, key_path: &str, params: &[(&str, &str)]) -> String {
        self.language.translate(key_path, params)
    }

    pub fn booking_summary(&self) -> PriceSummary {
        self.booking.summary(self.search.criteria())
    }

    pub fn guest_summary(&self) -> String {
        self.search.guest_summary(self.language.language())
    }

    pub fn featured_deals(&self) -> Vec<&Hotel> {
        self.catalog.featured_deals(FEATURED_DEALS_LIMIT)
    }

    // Hotels inside the current price filter range
    pub fn filtered_hotels(&self) -> Vec<&Hotel> {
        self.catalog.within(&self.price_filter.values())
    }

    pub fn price_range(&self) -> PriceRange {
        self.price_filter.values()
    }

    // Drops expired notifications
    pub fn tick(&mut self) -> usize {
        self.notifications.prune(self.clock.now())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn search(&self) -> &SearchStateStore {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchStateStore {
        &mut self.search
    }

    pub fn language(&self) -> &LanguageStateStore {
        &self.language
    }

    pub fn booking(&self) -> &BookingDraftBuilder {
        &self.booking
    }

    pub fn price_filter_mut(&mut self) -> &mut PriceFilter {
        &mut self.price_filter
    }

    pub fn catalog(&self) -> &HotelCatalog {
        &self.catalog
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }
}
