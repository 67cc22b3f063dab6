// Declarative view model
// Instead of mutating markup from event handlers, state is rendered into a Document
// whose elements carry bindings. Re-rendering a binding replaces the element's text.

use crate::i18n::Direction;
use chrono::NaiveDate;

// Where a translated string lands on its element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTarget {
    Content,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Translation { key: String, target: TextTarget },
    Date(NaiveDate),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: String,
    pub binding: Option<Binding>,
    pub content: String,
    pub placeholder: Option<String>,
}

impl Element {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            binding: None,
            content: String::new(),
            placeholder: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    // Writes rendered text to the slot the binding targets
    pub fn render(&mut self, text: String) {
        match &self.binding {
            Some(Binding::Translation {
                target: TextTarget::Placeholder,
                ..
            }) => self.placeholder = Some(text),
            _ => self.content = text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub lang: String,
    pub dir: Direction,
    // Text of the language toggle button ("EN" / "AR")
    pub language_label: String,
    elements: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            dir: Direction::Ltr,
            language_label: "EN".to_string(),
            elements: Vec::new(),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) -> &mut Self {
        self.elements.push(element);
        self
    }

    pub fn bind_text(&mut self, id: &str, key: &str) -> &mut Self {
        self.push(Element::new(id).with_binding(Binding::Translation {
            key: key.to_string(),
            target: TextTarget::Content,
        }))
    }

    pub fn bind_placeholder(&mut self, id: &str, key: &str) -> &mut Self {
        self.push(Element::new(id).with_binding(Binding::Translation {
            key: key.to_string(),
            target: TextTarget::Placeholder,
        }))
    }

    pub fn bind_date(&mut self, id: &str, date: NaiveDate) -> &mut Self {
        self.push(Element::new(id).with_binding(Binding::Date(date)))
    }

    pub fn bind_number(&mut self, id: &str, number: f64) -> &mut Self {
        self.push(Element::new(id).with_binding(Binding::Number(number)))
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.iter_mut()
    }

    pub fn bound_count(&self) -> usize {
        self.elements.iter().filter(|e| e.binding.is_some()).count()
    }
}

// Full-page navigation targets. State travels through storage, never the URL,
// except for the hotel id on the detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    SearchResults,
    Checkout,
    HotelDetail(String),
}

impl Navigation {
    pub fn path(&self) -> String {
        match self {
            Navigation::SearchResults => "pages/search.html".to_string(),
            Navigation::Checkout => "pages/checkout.html".to_string(),
            Navigation::HotelDetail(id) => format!("pages/hotel-detail.html?id={}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_binding_renders_into_placeholder() {
        let mut doc = Document::new();
        doc.bind_placeholder("newsletter-email", "newsletter.placeholder")
            .bind_text("hero-title", "hero.title");
        doc.push(Element::new("logo").with_content("Hotels"));

        for element in doc.elements_mut() {
            if element.binding.is_some() {
                element.render("rendered".to_string());
            }
        }

        let email = doc.element("newsletter-email").unwrap();
        assert_eq!(email.placeholder.as_deref(), Some("rendered"));
        assert!(email.content.is_empty());
        assert_eq!(doc.element("hero-title").unwrap().content, "rendered");
        assert_eq!(doc.element("logo").unwrap().content, "Hotels");
        assert_eq!(doc.bound_count(), 2);
    }

    #[test]
    fn test_navigation_paths() {
        assert_eq!(Navigation::SearchResults.path(), "pages/search.html");
        assert_eq!(Navigation::Checkout.path(), "pages/checkout.html");
        assert_eq!(
            Navigation::HotelDetail("h7".into()).path(),
            "pages/hotel-detail.html?id=h7"
        );
    }
}
