// Price range filter
// Two thumbs over [0, cap]. Input is never rejected: out-of-range values are
// clamped so that the range always keeps at least `min_spread` between the thumbs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadPolicy {
    // The boundary being moved stops at `spread` from the other one
    ClampMoved,
    // The other boundary is pushed along; the moved one is clamped only at the cap
    PushOther,
}

#[derive(Debug, Clone)]
pub struct PriceFilterConfig {
    pub cap: u32,
    pub min_spread: u32,
    pub policy: SpreadPolicy,
}

impl Default for PriceFilterConfig {
    fn default() -> Self {
        Self {
            cap: 500,
            min_spread: 50,
            policy: SpreadPolicy::ClampMoved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thumb {
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min as f64 && price <= self.max as f64
    }

    pub fn spread(&self) -> u32 {
        self.max - self.min
    }
}

#[derive(Debug, Clone)]
pub struct PriceFilter {
    cap: i64,
    spread: i64,
    policy: SpreadPolicy,
    current_min: i64,
    current_max: i64,
}

impl Default for PriceFilter {
    fn default() -> Self {
        Self::new(PriceFilterConfig::default())
    }
}

impl PriceFilter {
    // Starts at the full range. A spread wider than the cap is narrowed to the cap.
    pub fn new(config: PriceFilterConfig) -> Self {
        let cap = config.cap as i64;
        let spread = (config.min_spread as i64).min(cap);
        Self {
            cap,
            spread,
            policy: config.policy,
            current_min: 0,
            current_max: cap,
        }
    }

    pub fn values(&self) -> PriceRange {
        PriceRange {
            min: self.current_min as u32,
            max: self.current_max as u32,
        }
    }

    pub fn cap(&self) -> u32 {
        self.cap as u32
    }

    pub fn policy(&self) -> SpreadPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: SpreadPolicy) {
        self.policy = policy;
    }

    pub fn reset(&mut self) {
        self.current_min = 0;
        self.current_max = self.cap;
    }

    pub fn set_min(&mut self, value: i64) -> PriceRange {
        let value = value.clamp(0, self.cap);
        match self.policy {
            SpreadPolicy::ClampMoved => {
                self.current_min = value.min(self.current_max - self.spread).max(0);
            }
            SpreadPolicy::PushOther => {
                self.current_min = value.min(self.cap - self.spread);
                self.current_max = self.current_max.max(self.current_min + self.spread);
            }
        }
        tracing::trace!(min = self.current_min, max = self.current_max, "Price min adjusted");
        self.values()
    }

    pub fn set_max(&mut self, value: i64) -> PriceRange {
        let value = value.clamp(0, self.cap);
        match self.policy {
            SpreadPolicy::ClampMoved => {
                self.current_max = value.max(self.current_min + self.spread).min(self.cap);
            }
            SpreadPolicy::PushOther => {
                self.current_max = value.max(self.spread);
                self.current_min = self.current_min.min(self.current_max - self.spread);
            }
        }
        tracing::trace!(min = self.current_min, max = self.current_max, "Price max adjusted");
        self.values()
    }

    // Pointer drag: `fraction` is the pointer position across the track (0.0..=1.0)
    pub fn drag_to(&mut self, thumb: Thumb, fraction: f64) -> PriceRange {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let value = (fraction * self.cap as f64).round() as i64;
        match thumb {
            Thumb::Min => self.set_min(value),
            Thumb::Max => self.set_max(value),
        }
    }

    // Text input for the lower bound; text without a leading integer counts as 0
    pub fn set_min_input(&mut self, text: &str) -> PriceRange {
        let value = parse_leading_int(text).unwrap_or(0);
        self.set_min(value)
    }

    // Text input for the upper bound; a missing or zero value counts as the cap
    pub fn set_max_input(&mut self, text: &str) -> PriceRange {
        let value = match parse_leading_int(text) {
            Some(value) if value != 0 => value,
            _ => self.cap,
        };
        self.set_max(value)
    }

    // Thumb positions along the track, in percent
    pub fn thumb_positions(&self) -> (f64, f64) {
        if self.cap == 0 {
            return (0.0, 100.0);
        }
        let cap = self.cap as f64;
        (
            self.current_min as f64 / cap * 100.0,
            self.current_max as f64 / cap * 100.0,
        )
    }

    pub fn contains(&self, price: f64) -> bool {
        self.values().contains(price)
    }
}

// Leading integer of `text`, ignoring whatever follows it ("120.5" and "120abc" are 120)
fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let digits_start = usize::from(text.starts_with(['-', '+']));
    let digits_end = text[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |i| i + digits_start);
    if digits_end == digits_start {
        return None;
    }
    let digits = &text[digits_start..digits_end];
    // Too many digits to fit saturates; the value gets clamped to the cap anyway
    let value = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if text.starts_with('-') { -value } else { value })
}
