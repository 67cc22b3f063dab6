// English/Arabic translations, text direction and locale formatting
// Key paths that do not resolve to a string come back as the key path itself.

use crate::storage::{Storage, LANGUAGE_KEY};
use crate::view::{Binding, Document};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum I18nError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Ar];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "ar" => Some(Language::Ar),
            _ => None,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Language::En => Direction::Ltr,
            Language::Ar => Direction::Rtl,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Ar,
            Language::Ar => Language::En,
        }
    }

    // BCP 47 tag used for date and number formatting
    pub fn locale_tag(self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Ar => "ar-SA",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = I18nError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| I18nError::UnsupportedLanguage(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

// Direction is always derived from the code, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LanguageState {
    code: Language,
}

impl LanguageState {
    pub fn new(code: Language) -> Self {
        Self { code }
    }

    pub fn code(&self) -> Language {
        self.code
    }

    pub fn direction(&self) -> Direction {
        self.code.direction()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationCatalog {
    trees: HashMap<Language, Value>,
}

impl TranslationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from `{ "en": {...}, "ar": {...} }`. Unknown language
    /// codes are skipped.
    pub fn from_value(value: Value) -> Self {
        let mut catalog = Self::new();
        match value {
            Value::Object(map) => {
                for (code, tree) in map {
                    match Language::from_code(&code) {
                        Some(language) => catalog.insert(language, tree),
                        None => tracing::debug!(code = %code, "Skipping translations for unsupported language"),
                    }
                }
            }
            other => {
                tracing::warn!(kind = ?json_kind(&other), "Translation document is not an object");
            }
        }
        catalog
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(Self::from_value(serde_json::from_slice(bytes)?))
    }

    pub fn insert(&mut self, language: Language, tree: Value) {
        self.trees.insert(language, tree);
    }

    pub fn contains(&self, language: Language) -> bool {
        self.trees.contains_key(&language)
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    // Only string leaves resolve
    pub fn lookup(&self, language: Language, key_path: &str) -> Option<&str> {
        let mut node = self.trees.get(&language)?;
        for segment in key_path.split('.') {
            node = node.get(segment)?;
        }
        node.as_str()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Language state plus the loaded catalog, persisted under the `language` key.
#[derive(Debug)]
pub struct LanguageStateStore {
    storage: Storage,
    state: LanguageState,
    catalog: TranslationCatalog,
}

impl LanguageStateStore {
    /// Restores the stored language, or `default_language` when nothing valid is stored.
    pub fn new(storage: Storage, default_language: Language) -> Self {
        let code = storage
            .get::<String>(LANGUAGE_KEY)
            .and_then(|code| Language::from_code(&code))
            .unwrap_or(default_language);

        Self {
            storage,
            state: LanguageState::new(code),
            catalog: TranslationCatalog::new(),
        }
    }

    pub fn state(&self) -> LanguageState {
        self.state
    }

    pub fn language(&self) -> Language {
        self.state.code()
    }

    pub fn direction(&self) -> Direction {
        self.state.direction()
    }

    pub fn catalog(&self) -> &TranslationCatalog {
        &self.catalog
    }

    pub fn set_catalog(&mut self, catalog: TranslationCatalog) {
        self.catalog = catalog;
    }

    /// Switches language, persists it, and re-renders every binding in `doc`.
    ///
    /// Returns the number of bindings that were re-rendered.
    pub fn set_language(&mut self, language: Language, doc: &mut Document) -> usize {
        self.state = LanguageState::new(language);
        let persisted = self.storage.set(LANGUAGE_KEY, language.code());

        tracing::info!(
            language = language.code(),
            direction = self.direction().as_str(),
            persisted,
            "Language changed"
        );

        self.apply(doc)
    }

    pub fn set_language_code(&mut self, code: &str, doc: &mut Document) -> Result<usize, I18nError> {
        let language = code.parse::<Language>()?;
        Ok(self.set_language(language, doc))
    }

    pub fn toggle_language(&mut self, doc: &mut Document) -> Language {
        let next = self.language().toggled();
        self.set_language(next, doc);
        next
    }

    /// Renders the active language into `doc` without touching storage.
    pub fn apply(&self, doc: &mut Document) -> usize {
        let language = self.language();
        doc.lang = language.code().to_string();
        doc.dir = language.direction();
        doc.language_label = language.code().to_uppercase();

        let mut rendered = 0;
        for element in doc.elements_mut() {
            let text = match &element.binding {
                Some(Binding::Translation { key, .. }) => match self.get_translation(key) {
                    Some(text) => Some(text.to_string()),
                    None => {
                        tracing::debug!(key = %key, element = %element.id, "No translation, keeping current text");
                        None
                    }
                },
                Some(Binding::Date(date)) => Some(self.format_date(*date)),
                Some(Binding::Number(number)) => Some(self.format_number(*number)),
                None => None,
            };

            if let Some(text) = text {
                element.render(text);
                rendered += 1;
            }
        }
        rendered
    }

    pub fn get_translation(&self, key_path: &str) -> Option<&str> {
        self.catalog.lookup(self.language(), key_path)
    }

    /// Translates `key_path`, substituting every `{name}` placeholder from `params`.
    /// Falls back to the key path itself.
    pub fn translate(&self, key_path: &str, params: &[(&str, &str)]) -> String {
        let mut text = self
            .get_translation(key_path)
            .unwrap_or(key_path)
            .to_string();
        for (name, value) in params {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }

    pub fn format_date(&self, date: NaiveDate) -> String {
        format_date(self.language(), date)
    }

    pub fn format_number(&self, number: f64) -> String {
        format_number(self.language(), number)
    }

    pub fn format_date_range(&self, checkin: NaiveDate, checkout: NaiveDate) -> String {
        format_date_range(self.language(), checkin, checkout)
    }
}

const EN_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const AR_MONTHS: [&str; 12] = [
    "يناير",
    "فبراير",
    "مارس",
    "أبريل",
    "مايو",
    "يونيو",
    "يوليو",
    "أغسطس",
    "سبتمبر",
    "أكتوبر",
    "نوفمبر",
    "ديسمبر",
];

const ARABIC_GROUP_SEPARATOR: char = '\u{066C}';
const ARABIC_DECIMAL_SEPARATOR: char = '\u{066B}';

fn month_name(language: Language, date: NaiveDate) -> &'static str {
    let index = date.month0() as usize;
    match language {
        Language::En => EN_MONTHS[index],
        Language::Ar => AR_MONTHS[index],
    }
}

fn short_month_name(language: Language, date: NaiveDate) -> &'static str {
    match language {
        Language::En => {
            let name: &'static str = EN_MONTHS[date.month0() as usize];
            &name[..3]
        }
        // Arabic has no abbreviated month names
        Language::Ar => month_name(language, date),
    }
}

// ASCII digits to Arabic-Indic digits (U+0660..U+0669)
pub fn to_arabic_indic_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from_u32(0x0660 + d).unwrap_or(c),
            None => c,
        })
        .collect()
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

fn format_decimal(value: f64, max_fraction_digits: usize, group: char, decimal: char) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut out = String::new();
    let is_zero = rounded.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, group));
    if !frac.is_empty() {
        out.push(decimal);
        out.push_str(frac);
    }
    out
}

/// Long date: "January 5, 2024" or "٥ يناير ٢٠٢٤". Gregorian calendar in both languages.
pub fn format_date(language: Language, date: NaiveDate) -> String {
    match language {
        Language::En => format!("{} {}, {}", month_name(language, date), date.day(), date.year()),
        Language::Ar => to_arabic_indic_digits(&format!(
            "{} {} {}",
            date.day(),
            month_name(language, date),
            date.year()
        )),
    }
}

fn format_short_date(language: Language, date: NaiveDate, with_year: bool) -> String {
    let text = match (language, with_year) {
        (Language::En, true) => format!("{} {}, {}", short_month_name(language, date), date.day(), date.year()),
        (Language::En, false) => format!("{} {}", short_month_name(language, date), date.day()),
        (Language::Ar, true) => format!("{} {} {}", date.day(), short_month_name(language, date), date.year()),
        (Language::Ar, false) => format!("{} {}", date.day(), short_month_name(language, date)),
    };
    match language {
        Language::En => text,
        Language::Ar => to_arabic_indic_digits(&text),
    }
}

/// "Jan 5 - Jan 8, 2024" inside one month, long dates otherwise.
pub fn format_date_range(language: Language, checkin: NaiveDate, checkout: NaiveDate) -> String {
    if checkin.month() == checkout.month() && checkin.year() == checkout.year() {
        format!(
            "{} - {}",
            format_short_date(language, checkin, false),
            format_short_date(language, checkout, true)
        )
    } else {
        format!("{} - {}", format_date(language, checkin), format_date(language, checkout))
    }
}

// Grouped number with up to three fraction digits
pub fn format_number(language: Language, number: f64) -> String {
    match language {
        Language::En => format_decimal(number, 3, ',', '.'),
        Language::Ar => to_arabic_indic_digits(&format_decimal(
            number,
            3,
            ARABIC_GROUP_SEPARATOR,
            ARABIC_DECIMAL_SEPARATOR,
        )),
    }
}

/// Whole-dollar USD amount, always in en-US form: "$1,235".
pub fn format_currency(amount: f64) -> String {
    let formatted = format_decimal(amount, 0, ',', '.');
    match formatted.strip_prefix('-') {
        Some(rest) => format!("-${}", rest),
        None => format!("${}", formatted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn catalog() -> TranslationCatalog {
        TranslationCatalog::from_value(json!({
            "en": {
                "nav": { "home": "Home" },
                "hero": { "title": "Find your stay", "greeting": "Hello {name}, {name}!" },
                "search": { "placeholder": "Where to?" },
                "rating": 5
            },
            "ar": {
                "nav": { "home": "الرئيسية" },
                "hero": { "title": "ابحث عن إقامتك" },
                "search": { "placeholder": "إلى أين؟" }
            },
            "fr": { "nav": { "home": "Accueil" } }
        }))
    }

    fn store(language: Language) -> LanguageStateStore {
        let storage = Storage::in_memory();
        storage.set(LANGUAGE_KEY, language.code());
        let mut store = LanguageStateStore::new(storage, Language::En);
        store.set_catalog(catalog());
        store
    }

    #[test]
    fn test_missing_key_path_returns_key() {
        let store = store(Language::En);
        assert_eq!(store.translate("booking.checkIn", &[]), "booking.checkIn");
        // A branch or a non-string leaf is not a translation either
        assert_eq!(store.translate("nav", &[]), "nav");
        assert_eq!(store.translate("rating", &[]), "rating");
        assert_eq!(store.translate("", &[]), "");
    }

    #[test]
    fn test_translate_with_params() {
        let store = store(Language::En);
        assert_eq!(store.translate("nav.home", &[]), "Home");
        assert_eq!(
            store.translate("hero.greeting", &[("name", "Sara")]),
            "Hello Sara, Sara!"
        );
    }

    #[test]
    fn test_unsupported_languages_are_skipped() {
        let catalog = catalog();
        assert!(catalog.contains(Language::Ar));
        assert_eq!(catalog.lookup(Language::Ar, "nav.home"), Some("الرئيسية"));
        assert!(TranslationCatalog::from_value(json!(["en"])).is_empty());
    }

    #[test]
    fn test_toggle_to_arabic_rerenders_every_binding() {
        let mut store = store(Language::En);
        let mut doc = Document::new();
        doc.bind_text("nav-home", "nav.home")
            .bind_text("hero-title", "hero.title")
            .bind_placeholder("destination", "search.placeholder")
            .bind_date("deal-date", NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
            .bind_number("hotel-count", 1560.0);
        assert_eq!(store.apply(&mut doc), 5);
        assert_eq!(doc.element("hero-title").unwrap().content, "Find your stay");

        assert_eq!(store.toggle_language(&mut doc), Language::Ar);
        assert_eq!(store.direction(), Direction::Rtl);
        assert_eq!(doc.dir, Direction::Rtl);
        assert_eq!(doc.lang, "ar");
        assert_eq!(doc.language_label, "AR");

        assert_eq!(doc.element("nav-home").unwrap().content, "الرئيسية");
        assert_eq!(doc.element("hero-title").unwrap().content, "ابحث عن إقامتك");
        assert_eq!(
            doc.element("destination").unwrap().placeholder.as_deref(),
            Some("إلى أين؟")
        );
        assert_eq!(doc.element("deal-date").unwrap().content, "٥ يناير ٢٠٢٤");
        assert_eq!(doc.element("hotel-count").unwrap().content, "١٬٥٦٠");
    }

    #[test]
    fn test_unresolved_binding_keeps_previous_text() {
        let mut store = store(Language::En);
        let mut doc = Document::new();
        doc.bind_text("footer", "footer.copyright");
        assert_eq!(store.set_language(Language::Ar, &mut doc), 0);
        assert!(doc.element("footer").unwrap().content.is_empty());
    }

    #[test]
    fn test_language_is_persisted_and_restored() {
        let storage = Storage::in_memory();
        let mut store = LanguageStateStore::new(storage.clone(), Language::En);
        assert_eq!(store.language(), Language::En);

        let mut doc = Document::new();
        assert!(store.set_language_code("ar", &mut doc).is_ok());
        assert_eq!(storage.get::<String>(LANGUAGE_KEY).as_deref(), Some("ar"));
        assert_eq!(
            store.set_language_code("de", &mut doc),
            Err(I18nError::UnsupportedLanguage("de".to_string()))
        );

        let restored = LanguageStateStore::new(storage.clone(), Language::En);
        assert_eq!(restored.language(), Language::Ar);

        storage.set(LANGUAGE_KEY, "klingon");
        let fallback = LanguageStateStore::new(storage, Language::En);
        assert_eq!(fallback.language(), Language::En);
    }

    #[test_case(Language::En, 1234567.891, "1,234,567.891" ; "english grouping")]
    #[test_case(Language::En, 0.5, "0.5" ; "english fraction")]
    #[test_case(Language::En, -42.0, "-42" ; "english negative")]
    #[test_case(Language::En, 2.00049, "2" ; "english rounding")]
    #[test_case(Language::Ar, 1234.5, "١٬٢٣٤٫٥" ; "arabic digits and separators")]
    fn test_format_number(language: Language, number: f64, expected: &str) {
        assert_eq!(format_number(language, number), expected);
    }

    #[test]
    fn test_format_dates() {
        let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let jan8 = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let feb2 = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();

        assert_eq!(format_date(Language::En, jan5), "January 5, 2024");
        assert_eq!(format_date_range(Language::En, jan5, jan8), "Jan 5 - Jan 8, 2024");
        assert_eq!(
            format_date_range(Language::En, jan5, feb2),
            "January 5, 2024 - February 2, 2024"
        );
        assert_eq!(format_date_range(Language::Ar, jan5, jan8), "٥ يناير - ٨ يناير ٢٠٢٤");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.6), "$1,235");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(-15.0), "-$15");
    }

    #[test]
    fn test_language_codes() {
        assert_eq!("AR".parse::<Language>(), Ok(Language::Ar));
        assert_eq!(Language::En.toggled().toggled(), Language::En);
        assert_eq!(Language::Ar.locale_tag(), "ar-SA");
        assert_eq!(Language::Ar.to_string(), "ar");
    }
}
