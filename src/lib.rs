// Main library file for the hotel booking client state core

// Export modules for each part of the client
pub mod app;
pub mod booking;
pub mod clock;
pub mod hotels;
pub mod i18n;
pub mod loader;
pub mod notification;
pub mod price_filter;
pub mod search;
pub mod storage;
pub mod validator;
pub mod view;
pub mod widgets;

// Re-export key types for convenience
pub use app::{AppConfig, AppError, AppState};
pub use booking::{
    compute_nights, compute_total, BookingDraft, BookingDraftBuilder, BookingError, PriceSummary,
    SelectedRoom,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use hotels::{Hotel, HotelCatalog, StarRating};
pub use i18n::{
    format_currency, format_date, format_number, Direction, I18nError, Language,
    LanguageStateStore, TranslationCatalog,
};
pub use loader::{
    DataSource, FsDataSource, HttpDataSource, LoadError, LoadTask, LoaderConfig,
    MemoryDataSource, TaskOutcome,
};
pub use notification::{Notification, NotificationCenter, NotificationKind};
pub use price_filter::{PriceFilter, PriceFilterConfig, PriceRange, SpreadPolicy, Thumb};
pub use search::{GuestField, SearchCriteria, SearchStateStore, ValidationError};
pub use storage::{FileStore, KeyValueStore, MemoryStore, Storage, StorageError};
pub use validator::{FieldRules, FormValidator};
pub use view::{Binding, Document, Element, Navigation};
pub use widgets::{
    Accordion, Dropdown, HeroSlider, ImageGallery, Key, LoadingSpinner, Modal, NavMenu,
    SingleSelection, Tabs,
};
