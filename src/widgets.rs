// UI widget state machines
// Every "exactly one item is active" widget is a SingleSelection; the widgets
// only add their own event vocabulary on top of it.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_AUTOPLAY_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
    Other,
}

impl Key {
    // Maps a KeyboardEvent.key value
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "Escape" | "Esc" => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// At most one active item out of `len`.
///
/// Activating an item always clears every sibling first, so no two items can
/// ever be active together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleSelection {
    len: usize,
    active: Option<usize>,
}

impl SingleSelection {
    // Nothing active
    pub fn new(len: usize) -> Self {
        Self { len, active: None }
    }

    // First item active when there is one
    pub fn with_first(len: usize) -> Self {
        Self {
            len,
            active: if len > 0 { Some(0) } else { None },
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == Some(index)
    }

    // Out-of-range indexes are ignored
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.active = Some(index);
        true
    }

    // Re-selecting the active item deactivates it
    pub fn toggle(&mut self, index: usize) -> Option<usize> {
        if index >= self.len {
            return self.active;
        }
        self.active = if self.is_active(index) { None } else { Some(index) };
        self.active
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let next = self.active.map_or(0, |i| (i + 1) % self.len);
        self.active = Some(next);
        self.active
    }

    pub fn previous(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let prev = self.active.map_or(self.len - 1, |i| (i + self.len - 1) % self.len);
        self.active = Some(prev);
        self.active
    }

    // Active flag per item, in order
    pub fn states(&self) -> Vec<bool> {
        (0..self.len).map(|i| self.is_active(i)).collect()
    }
}

// Hero slider: slides and dots share one selection, autoplay advances it
#[derive(Debug, Clone)]
pub struct HeroSlider {
    slides: SingleSelection,
    interval: Duration,
    last_advance: Instant,
}

impl HeroSlider {
    pub fn new(slide_count: usize, interval: Duration, now: Instant) -> Self {
        Self {
            slides: SingleSelection::with_first(slide_count),
            interval,
            last_advance: now,
        }
    }

    pub fn current(&self) -> Option<usize> {
        self.slides.active()
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        self.slides.select(index)
    }

    pub fn next(&mut self) -> Option<usize> {
        self.slides.next()
    }

    pub fn previous(&mut self) -> Option<usize> {
        self.slides.previous()
    }

    // Dot states mirror slide states
    pub fn dots(&self) -> Vec<bool> {
        self.slides.states()
    }

    // Advances once per elapsed interval; manual navigation does not reset the timer
    pub fn tick(&mut self, now: Instant) -> usize {
        if self.slides.is_empty() || self.interval.is_zero() {
            return 0;
        }
        let mut advanced = 0;
        while now.saturating_duration_since(self.last_advance) >= self.interval {
            self.last_advance += self.interval;
            self.slides.next();
            advanced += 1;
        }
        advanced
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Drives `slider` autoplay until `cancel` fires.
pub async fn run_autoplay(slider: Arc<Mutex<HeroSlider>>, cancel: CancellationToken) {
    let interval = slider.lock().interval();
    if interval.is_zero() {
        return;
    }
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Slider autoplay stopped");
                return;
            }
            _ = ticker.tick() => {
                slider.lock().tick(Instant::now());
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageGallery {
    images: Vec<String>,
    selection: SingleSelection,
    fullscreen: bool,
}

impl ImageGallery {
    pub fn new(images: Vec<String>) -> Self {
        let selection = SingleSelection::with_first(images.len());
        Self {
            images,
            selection,
            fullscreen: false,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        self.selection.active()
    }

    pub fn current_image(&self) -> Option<&str> {
        self.selection
            .active()
            .and_then(|i| self.images.get(i))
            .map(String::as_str)
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        self.selection.select(index)
    }

    pub fn next(&mut self) -> Option<&str> {
        self.selection.next();
        self.current_image()
    }

    pub fn previous(&mut self) -> Option<&str> {
        self.selection.previous();
        self.current_image()
    }

    // (image, active) pairs for the thumbnail strip
    pub fn thumbnails(&self) -> Vec<(&str, bool)> {
        self.images
            .iter()
            .enumerate()
            .map(|(i, image)| (image.as_str(), self.selection.is_active(i)))
            .collect()
    }

    pub fn open_fullscreen(&mut self) -> bool {
        if self.images.is_empty() {
            return false;
        }
        self.fullscreen = true;
        true
    }

    pub fn close_fullscreen(&mut self) {
        self.fullscreen = false;
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    // Arrow keys page through images, Escape leaves fullscreen
    pub fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::ArrowLeft => self.previous().is_some(),
            Key::ArrowRight => self.next().is_some(),
            Key::Escape => {
                let was_open = self.fullscreen;
                self.close_fullscreen();
                was_open
            }
            Key::Other => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tabs {
    selection: SingleSelection,
}

impl Tabs {
    pub fn new(tab_count: usize) -> Self {
        Self {
            selection: SingleSelection::with_first(tab_count),
        }
    }

    pub fn show_tab(&mut self, index: usize) -> bool {
        self.selection.select(index)
    }

    pub fn active(&self) -> Option<usize> {
        self.selection.active()
    }

    // Value of aria-selected for each tab button; panes follow the same flags
    pub fn aria_selected(&self) -> Vec<bool> {
        self.selection.states()
    }
}

#[derive(Debug, Clone)]
pub struct Accordion {
    selection: SingleSelection,
}

impl Accordion {
    pub fn new(item_count: usize) -> Self {
        Self {
            selection: SingleSelection::new(item_count),
        }
    }

    // Opens `index` and closes the rest; clicking the open item closes it
    pub fn toggle(&mut self, index: usize) -> Option<usize> {
        self.selection.toggle(index)
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.selection.is_active(index)
    }

    pub fn open_item(&self) -> Option<usize> {
        self.selection.active()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Modal {
    open: bool,
}

impl Modal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    // Page scrolling is locked while the modal is open
    pub fn scroll_locked(&self) -> bool {
        self.open
    }

    pub fn handle_key(&mut self, key: Key) -> bool {
        if key == Key::Escape && self.open {
            self.close();
            return true;
        }
        false
    }
}

// Guest selector dropdown: opened by its button, closed by any click outside
#[derive(Debug, Clone, Default)]
pub struct Dropdown {
    open: bool,
}

impl Dropdown {
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn click_outside(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[derive(Debug, Clone, Default)]
pub struct NavMenu {
    open: bool,
}

impl NavMenu {
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    // Following a link closes the mobile menu
    pub fn link_clicked(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[derive(Debug, Clone)]
pub struct LoadingSpinner {
    text: Option<String>,
    visible: bool,
}

impl Default for LoadingSpinner {
    fn default() -> Self {
        Self {
            text: Some("Loading...".to_string()),
            visible: false,
        }
    }
}

impl LoadingSpinner {
    pub fn with_text(text: Option<String>) -> Self {
        Self {
            text,
            visible: false,
        }
    }

    // Showing twice is a no-op
    pub fn show(&mut self) -> bool {
        let changed = !self.visible;
        self.visible = true;
        changed
    }

    pub fn hide(&mut self) -> bool {
        let changed = self.visible;
        self.visible = false;
        changed
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}
