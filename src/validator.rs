// Form field validation

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const PHONE_MESSAGE: &str = "Please enter a valid phone number";

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-\(\)]+$").unwrap());

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

pub fn is_valid_phone(value: &str) -> bool {
    PHONE_REGEX.is_match(value)
}

// Escapes text before it is placed into markup
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Rules for a single field.
///
/// Every rule that fails overwrites the field's message, so when several
/// rules fail the message of the last one checked is reported. The check
/// order is required, email, phone, min length, max length, pattern.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    pub required: bool,
    pub email: bool,
    pub phone: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    // Used by the pattern rule
    pub message: Option<String>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn email(mut self) -> Self {
        self.email = true;
        self
    }

    pub fn phone(mut self) -> Self {
        self.phone = true;
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn pattern(mut self, pattern: Regex, message: impl Into<String>) -> Self {
        self.pattern = Some(pattern);
        self.message = Some(message.into());
        self
    }

    // None when the value passes every rule. Messages name the field.
    pub fn check(&self, field: &str, value: &str) -> Option<String> {
        let value = value.trim();
        let mut error = None;

        if self.required && value.is_empty() {
            error = Some(format!("{} is required", field));
        }
        if !value.is_empty() && self.email && !is_valid_email(value) {
            error = Some(EMAIL_MESSAGE.to_string());
        }
        if !value.is_empty() && self.phone && !is_valid_phone(value) {
            error = Some(PHONE_MESSAGE.to_string());
        }
        let len = value.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                error = Some(format!("{} must be at least {} characters", field, min));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                error = Some(format!("{} must not exceed {} characters", field, max));
            }
        }
        // Blank optional fields are not matched against the pattern
        if let Some(pattern) = &self.pattern {
            if !value.is_empty() && !pattern.is_match(value) {
                error = Some(
                    self.message
                        .clone()
                        .unwrap_or_else(|| format!("{} is not valid", field)),
                );
            }
        }
        error
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormValidator {
    rules: BTreeMap<String, FieldRules>,
    errors: BTreeMap<String, String>,
}

impl FormValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, rules: FieldRules) -> Self {
        self.add_field(name, rules);
        self
    }

    pub fn add_field(&mut self, name: impl Into<String>, rules: FieldRules) {
        self.rules.insert(name.into(), rules);
    }

    // Fields without rules always pass
    pub fn validate_field(&mut self, name: &str, value: &str) -> bool {
        let Some(rules) = self.rules.get(name) else {
            self.errors.remove(name);
            return true;
        };
        match rules.check(name, value) {
            Some(message) => {
                tracing::debug!(field = name, message = %message, "Field failed validation");
                self.errors.insert(name.to_string(), message);
                false
            }
            None => {
                self.errors.remove(name);
                true
            }
        }
    }

    /// Validates every field that has rules and is present in `form`.
    ///
    /// Errors from earlier runs are dropped first. Fields missing from the
    /// form are skipped rather than treated as empty.
    pub fn validate(&mut self, form: &HashMap<String, String>) -> bool {
        self.errors.clear();
        let names: Vec<String> = self.rules.keys().cloned().collect();
        let mut valid = true;
        for name in names {
            if let Some(value) = form.get(&name) {
                valid &= self.validate_field(&name, value);
            }
        }
        valid
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}
