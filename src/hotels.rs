// Hotel catalog loaded from hotels.json

use crate::booking::HotelRef;
use crate::price_filter::PriceRange;
use serde::{de, Deserialize, Deserializer, Serialize};

pub const FEATURED_DEALS_LIMIT: usize = 4;
pub const MAX_STARS: u32 = 5;

// Ids show up both as numbers and strings in the data files
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Integer(i64),
    }

    match IdRepr::deserialize(deserializer) {
        Ok(IdRepr::Text(text)) => Ok(text),
        Ok(IdRepr::Integer(n)) => Ok(n.to_string()),
        Err(_) => Err(de::Error::custom("hotel id must be a string or an integer")),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub original_price: Option<f64>,
    // Percent off the original price
    #[serde(default)]
    pub discount: Option<u32>,
    #[serde(default)]
    pub rating: f32,
    pub location: Location,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl Hotel {
    pub fn to_ref(&self) -> HotelRef {
        HotelRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn has_deal(&self) -> bool {
        self.discount.map_or(false, |d| d > 0)
    }

    pub fn savings(&self) -> Option<f64> {
        self.original_price
            .map(|original| original - self.price)
            .filter(|saved| *saved > 0.0)
    }

    pub fn stars(&self) -> StarRating {
        StarRating::from_rating(self.rating, MAX_STARS)
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

// Full/half/empty star counts for a rating display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarRating {
    pub full: u32,
    pub half: bool,
    pub empty: u32,
}

impl StarRating {
    pub fn from_rating(rating: f32, max_stars: u32) -> Self {
        let rating = if rating.is_nan() {
            0.0
        } else {
            rating.clamp(0.0, max_stars as f32)
        };
        let full = rating.floor() as u32;
        let half = rating.fract() != 0.0;
        let empty = max_stars - rating.ceil() as u32;
        Self { full, half, empty }
    }
}

pub fn parse_hotels(bytes: &[u8]) -> Result<Vec<Hotel>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelCatalog {
    hotels: Vec<Hotel>,
}

impl HotelCatalog {
    pub fn new(hotels: Vec<Hotel>) -> Self {
        Self { hotels }
    }

    pub fn hotels(&self) -> &[Hotel] {
        &self.hotels
    }

    pub fn len(&self) -> usize {
        self.hotels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotels.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Hotel> {
        self.hotels.iter().find(|hotel| hotel.id == id)
    }

    // First `limit` discounted hotels, in catalog order
    pub fn featured_deals(&self, limit: usize) -> Vec<&Hotel> {
        self.hotels
            .iter()
            .filter(|hotel| hotel.has_deal())
            .take(limit)
            .collect()
    }

    pub fn within(&self, range: &PriceRange) -> Vec<&Hotel> {
        self.hotels
            .iter()
            .filter(|hotel| range.contains(hotel.price))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const HOTELS_JSON: &str = r#"[
        {"id": 1, "name": "Grand Plaza", "price": 180, "originalPrice": 240, "discount": 25,
         "rating": 4.5, "location": {"city": "New York", "country": "USA"},
         "images": ["hotel1-hero.jpg", "hotel1-room.jpg"], "amenities": ["wifi", "pool"]},
        {"id": "2", "name": "Ocean Breeze", "price": 95, "rating": 4,
         "location": {"city": "Miami", "country": "USA"}},
        {"id": 3, "name": "Alpine Lodge", "price": 320, "originalPrice": 400, "discount": 20,
         "rating": 5, "location": {"city": "Aspen", "country": "USA"}, "images": []},
        {"id": 4, "name": "Bay Suites", "price": 210, "discount": 0, "rating": 3.5,
         "location": {"city": "San Francisco", "country": "USA"}}
    ]"#;

    fn catalog() -> HotelCatalog {
        HotelCatalog::new(parse_hotels(HOTELS_JSON.as_bytes()).unwrap())
    }

    #[test]
    fn test_parse_mixed_id_types() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.find("1").unwrap().name, "Grand Plaza");
        assert_eq!(catalog.find("2").unwrap().original_price, None);
        assert_eq!(catalog.find("1").unwrap().cover_image(), Some("hotel1-hero.jpg"));
        assert_eq!(catalog.find("3").unwrap().cover_image(), None);
        assert_eq!(catalog.find("1").unwrap().savings(), Some(60.0));
    }

    #[test]
    fn test_featured_deals_skip_undiscounted() {
        let catalog = catalog();
        let names: Vec<&str> = catalog
            .featured_deals(FEATURED_DEALS_LIMIT)
            .iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(names, vec!["Grand Plaza", "Alpine Lodge"]);
        assert_eq!(catalog.featured_deals(1).len(), 1);
    }

    #[test]
    fn test_within_price_range() {
        let catalog = catalog();
        let hotels = catalog.within(&PriceRange { min: 100, max: 250 });
        let ids: Vec<&str> = hotels.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test_case(4.5, StarRating { full: 4, half: true, empty: 0 } ; "four and a half")]
    #[test_case(3.0, StarRating { full: 3, half: false, empty: 2 } ; "three")]
    #[test_case(0.0, StarRating { full: 0, half: false, empty: 5 } ; "zero")]
    #[test_case(7.0, StarRating { full: 5, half: false, empty: 0 } ; "clamped")]
    fn test_star_rating(rating: f32, expected: StarRating) {
        assert_eq!(StarRating::from_rating(rating, MAX_STARS), expected);
    }

    #[test]
    fn test_invalid_id_is_an_error() {
        let result = parse_hotels(br#"[{"id": null, "name": "x", "price": 1, "location": {"city": "a", "country": "b"}}]"#);
        assert!(result.is_err());
    }
}
