use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a point of interest.
///
/// Datasets in the wild use either numeric or string identifiers, so both
/// are accepted and compared by value.
///
/// # Examples
///
/// ```
/// use clustermap_types::PointId;
///
/// let numeric: PointId = serde_json::from_str("42").unwrap();
/// let textual: PointId = serde_json::from_str("\"h-42\"").unwrap();
/// assert_eq!(numeric, PointId::from(42));
/// assert_eq!(textual.to_string(), "h-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Number(n) => write!(f, "{}", n),
            PointId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PointId {
    fn from(value: i64) -> Self {
        PointId::Number(value)
    }
}

impl From<i32> for PointId {
    fn from(value: i32) -> Self {
        PointId::Number(value.into())
    }
}

impl From<u32> for PointId {
    fn from(value: u32) -> Self {
        PointId::Number(value.into())
    }
}

impl From<&str> for PointId {
    fn from(value: &str) -> Self {
        PointId::Text(value.to_string())
    }
}

impl From<String> for PointId {
    fn from(value: String) -> Self {
        PointId::Text(value)
    }
}

/// Nightly price as found in the dataset: either a number or a preformatted label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Label(String),
}

impl Price {
    /// Numeric value of the price, parsing labels such as `"189.50"` or `"$189"`.
    pub fn amount(&self) -> Option<f64> {
        match self {
            Price::Amount(value) => Some(*value),
            Price::Label(label) => label
                .trim()
                .trim_start_matches('$')
                .replace(',', "")
                .parse()
                .ok(),
        }
    }
}

/// One geo-located point of interest (a hotel).
///
/// Records are created once when the dataset is loaded and never mutated
/// afterwards; identity is [`PointRecord::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    #[serde(alias = "hotel_id")]
    pub id: PointId,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub image_url: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::star_rating")]
    pub star_rating: u8,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub price_per_night: Option<Price>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::review_count")]
    pub review_count: u32,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub room_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub amenities: Vec<String>,
}

/// Deserializers for display attributes. A null or malformed value becomes
/// the field's default; only id and coordinates can fail a record.
mod lenient {
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OrIgnored<T> {
        Value(T),
        Ignored(IgnoredAny),
    }

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(match OrIgnored::<T>::deserialize(deserializer)? {
            OrIgnored::Value(value) => value,
            OrIgnored::Ignored(_) => T::default(),
        })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Whole(u64),
        Fractional(f64),
        Ignored(IgnoredAny),
    }

    /// Non-negative count, rounded and saturated at `max`.
    fn count<'de, D: Deserializer<'de>>(deserializer: D, max: u64) -> Result<u64, D::Error> {
        Ok(match Count::deserialize(deserializer)? {
            Count::Whole(n) => n.min(max),
            Count::Fractional(f) if f.is_finite() && f > 0.0 => (f.round() as u64).min(max),
            Count::Fractional(_) | Count::Ignored(_) => 0,
        })
    }

    pub fn star_rating<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        count(deserializer, u8::MAX as u64).map(|n| n as u8)
    }

    pub fn review_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        count(deserializer, u32::MAX as u64).map(|n| n as u32)
    }
}

impl PointRecord {
    /// Create a record with coordinates and empty display attributes.
    ///
    /// # Examples
    ///
    /// ```
    /// use clustermap_types::PointRecord;
    ///
    /// let hotel = PointRecord::new("pike-place", -122.3422, 47.6097).with_name("Market Hotel");
    /// assert_eq!(hotel.location().x(), -122.3422);
    /// ```
    pub fn new(id: impl Into<PointId>, longitude: f64, latitude: f64) -> Self {
        Self {
            id: id.into(),
            longitude,
            latitude,
            name: String::new(),
            image_url: String::new(),
            address: String::new(),
            star_rating: 0,
            price_per_night: None,
            rating: None,
            review_count: 0,
            room_type: None,
            amenities: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }

    pub fn with_price(mut self, price: Price) -> Self {
        self.price_per_night = Some(price);
        self
    }

    /// Location as a `geo::Point` (x = longitude, y = latitude).
    pub fn location(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotel_json_uses_hotel_id_alias() {
        let json = r#"{
            "hotel_id": 1001,
            "name": "The Edgewater",
            "longitude": -122.3519,
            "latitude": 47.6128,
            "star_rating": 4,
            "price_per_night": "289",
            "review_count": 1530,
            "amenities": ["wifi", "parking"]
        }"#;

        let hotel: PointRecord = serde_json::from_str(json).unwrap();
        assert_eq!(hotel.id, PointId::Number(1001));
        assert_eq!(hotel.star_rating, 4);
        assert_eq!(hotel.price_per_night.unwrap().amount(), Some(289.0));
        assert_eq!(hotel.amenities.len(), 2);
        assert!(hotel.rating.is_none());
    }

    #[test]
    fn test_price_amount_parsing() {
        assert_eq!(Price::Amount(120.0).amount(), Some(120.0));
        assert_eq!(Price::Label("$1,250".into()).amount(), Some(1250.0));
        assert_eq!(Price::Label("call us".into()).amount(), None);
    }

    #[test]
    fn test_point_id_ordering_is_total() {
        let mut ids = vec![PointId::from("b"), PointId::from(2), PointId::from("a")];
        ids.sort();
        assert_eq!(ids[0], PointId::Number(2));
        assert_eq!(ids[1], PointId::from("a"));
    }

    #[test]
    fn test_malformed_display_fields_fall_back_to_defaults() {
        let json = r#"{
            "hotel_id": 7,
            "name": null,
            "image_url": 42,
            "longitude": -122.33,
            "latitude": 47.61,
            "star_rating": 3.6,
            "price_per_night": {"amount": 100},
            "rating": "great",
            "review_count": null,
            "room_type": null,
            "amenities": null
        }"#;

        let hotel: PointRecord = serde_json::from_str(json).unwrap();
        assert_eq!(hotel.id, PointId::from(7));
        assert_eq!(hotel.name, "");
        assert_eq!(hotel.image_url, "");
        assert_eq!(hotel.star_rating, 4);
        assert!(hotel.price_per_night.is_none());
        assert!(hotel.rating.is_none());
        assert_eq!(hotel.review_count, 0);
        assert!(hotel.room_type.is_none());
        assert!(hotel.amenities.is_empty());
    }

    #[test]
    fn test_negative_and_oversized_counts() {
        let json = r#"{"id": "x", "longitude": 0.0, "latitude": 0.0,
                       "star_rating": 900, "review_count": -12.5}"#;
        let hotel: PointRecord = serde_json::from_str(json).unwrap();
        assert_eq!(hotel.star_rating, u8::MAX);
        assert_eq!(hotel.review_count, 0);
    }

    #[test]
    fn test_bad_coordinates_still_fail() {
        let json = r#"{"hotel_id": 1, "name": "No latitude", "longitude": -122.33}"#;
        assert!(serde_json::from_str::<PointRecord>(json).is_err());
    }
}
