use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::de::Error;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::database::properties::{DbProperty, DbPropertyImages};
use crate::database::wishlist::DbFavorite;

/// Number of image columns in `property_images`.
pub const IMAGE_SLOTS: usize = 5;

/// Listing fields as submitted under the `data` form field.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingPayload {
    pub person_name: String,
    pub property_name: String,
    pub address: String,
    #[serde(deserialize_with = "from_value_or_str")]
    pub price: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "from_value_or_str")]
    pub bedroom: i32,
    #[serde(deserialize_with = "from_value_or_str")]
    pub bathroom: i32,
    #[serde(deserialize_with = "from_value_or_str")]
    pub total_floors: i32,
    #[serde(deserialize_with = "from_value_or_str")]
    pub garden: bool,
    #[serde(deserialize_with = "from_value_or_str")]
    pub power: bool,
    pub description: String,
}

/// Accepts either the JSON value itself or its string form, as browser forms
/// send `"250000"` or `"true"`.
fn from_value_or_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ValueOrStr<T> {
        Value(T),
        Str(String),
    }

    match ValueOrStr::<T>::deserialize(deserializer)? {
        ValueOrStr::Value(value) => Ok(value),
        ValueOrStr::Str(text) => text.trim().parse().map_err(|e| D::Error::custom(format!("invalid value {:?} : {}", text, e))),
    }
}

/// The five image columns of a listing, empty slots being `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageSlots([Option<String>; IMAGE_SLOTS]);

impl ImageSlots {
    /// Fills slots in order. Urls past the last slot are dropped.
    pub fn new(urls: Vec<String>) -> Self {
        let mut slots = ImageSlots::default();
        for (slot, url) in slots.0.iter_mut().zip(urls) {
            *slot = Some(url);
        }
        slots
    }

    pub fn slot(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|url| url.as_deref())
    }

    /// Non-null urls, in slot order.
    pub fn into_urls(self) -> Vec<String> {
        self.0.into_iter().flatten().collect()
    }
}

impl From<DbPropertyImages> for ImageSlots {
    fn from(row: DbPropertyImages) -> Self {
        ImageSlots([row.image1, row.image2, row.image3, row.image4, row.image5])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub property_name: String,
    pub address: String,
    pub price: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub bedroom: i32,
    pub bathroom: i32,
    pub total_floors: i32,
    pub garden: bool,
    pub power: bool,
    pub description: String,
    pub images: Vec<String>,
}

impl Listing {
    fn new(property: DbProperty, images: ImageSlots) -> Self {
        Listing {
            property_name: property.property_name,
            address: property.address,
            price: property.price,
            kind: property.kind,
            bedroom: property.bedroom,
            bathroom: property.bathroom,
            total_floors: property.total_floors,
            garden: property.garden,
            power: property.power_backup,
            description: property.description,
            images: images.into_urls(),
        }
    }
}

/// Listings keyed on the wire as `property_1`, `property_2`, ... in row order.
#[derive(Debug, Default)]
pub struct Listings(Vec<Listing>);

impl Listings {
    pub fn as_slice(&self) -> &[Listing] {
        &self.0
    }
}

impl Serialize for Listings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (index, listing) in self.0.iter().enumerate() {
            map.serialize_entry(&format!("property_{}", index + 1), listing)?;
        }
        map.end()
    }
}

/// Attaches to each property the first image row sharing its name.
pub fn project_listings(properties: Vec<DbProperty>, images: Vec<DbPropertyImages>) -> Listings {
    let mut by_name = HashMap::with_capacity(images.len());
    for row in images {
        by_name.entry(row.property_name.clone()).or_insert(row);
    }

    Listings(properties.into_iter().map(|property| {
        let images = by_name.get(&property.property_name).cloned().map(ImageSlots::from).unwrap_or_default();
        Listing::new(property, images)
    }).collect())
}

pub fn project_favorites(favorites: Vec<DbFavorite>) -> Listings {
    Listings(favorites.into_iter().map(|fav| {
        let images = ImageSlots([fav.image1, fav.image2, fav.image3, fav.image4, fav.image5]);
        Listing::new(fav.property, images)
    }).collect())
}
