//! In-memory collaborators for handler tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::database::properties::{DbProperty, DbPropertyImages};
use crate::database::wishlist::DbFavorite;
use crate::database::{DatabaseError, PropertyStore, WishlistStore};
use crate::media::{ImageFile, MediaError, MediaStore};
use crate::structures::listings::{ImageSlots, ListingPayload};
use crate::AppData;

/// Tables kept in vectors, in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    pub properties: Mutex<Vec<DbProperty>>,
    pub images: Mutex<Vec<DbPropertyImages>>,
    pub wishlist: Mutex<Vec<(String, String)>>,
    pub failing: AtomicBool,
    /// Fails listing inserts after the image row, before the property row.
    pub failing_property_insert: AtomicBool,
    pub calls: AtomicUsize,
}

impl MemoryStore {
    fn check(&self) -> Result<(), DatabaseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(DatabaseError::Sqlx(sqlx::Error::Protocol("store unavailable".to_string())))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn insert_listing(&self, listing: &ListingPayload, images: &ImageSlots) -> Result<(), DatabaseError> {
        self.check()?;
        let slot = |index| images.slot(index).map(str::to_string);
        // both rows become visible together, like the committed transaction
        let image_row = DbPropertyImages {
            property_name: listing.property_name.clone(),
            image1: slot(0),
            image2: slot(1),
            image3: slot(2),
            image4: slot(3),
            image5: slot(4),
        };
        if self.failing_property_insert.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::Protocol("property insert failed".to_string())));
        }
        self.images.lock().unwrap().push(image_row);
        self.properties.lock().unwrap().push(DbProperty {
            user_id: listing.person_name.clone(),
            property_name: listing.property_name.clone(),
            address: listing.address.clone(),
            price: listing.price,
            kind: listing.kind.clone(),
            bedroom: listing.bedroom,
            bathroom: listing.bathroom,
            total_floors: listing.total_floors,
            garden: listing.garden,
            power_backup: listing.power,
            description: listing.description.clone(),
        });
        Ok(())
    }

    async fn select_properties(&self) -> Result<Vec<DbProperty>, DatabaseError> {
        self.check()?;
        Ok(self.properties.lock().unwrap().clone())
    }

    async fn select_property_images(&self) -> Result<Vec<DbPropertyImages>, DatabaseError> {
        self.check()?;
        Ok(self.images.lock().unwrap().clone())
    }
}

#[async_trait]
impl WishlistStore for MemoryStore {
    async fn insert_wishlist(&self, user_name: &str, property_name: &str) -> Result<(), DatabaseError> {
        self.check()?;
        self.wishlist.lock().unwrap().push((user_name.to_string(), property_name.to_string()));
        Ok(())
    }

    async fn delete_wishlist(&self, user_name: &str, property_name: &str) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut wishlist = self.wishlist.lock().unwrap();
        let before = wishlist.len();
        wishlist.retain(|(user, property)| user != user_name || property != property_name);
        Ok((before - wishlist.len()) as u64)
    }

    async fn select_favorites(&self, user_name: &str) -> Result<Vec<DbFavorite>, DatabaseError> {
        self.check()?;
        let properties = self.properties.lock().unwrap();
        let images = self.images.lock().unwrap();
        let wishlist = self.wishlist.lock().unwrap();

        let mut favorites = Vec::new();
        for (_, favorite) in wishlist.iter().filter(|(user, _)| user == user_name) {
            for property in properties.iter().filter(|p| &p.property_name == favorite) {
                let row = images.iter().find(|row| row.property_name == property.property_name).cloned()
                    .unwrap_or_else(|| property_images(&property.property_name, &[]));
                favorites.push(DbFavorite {
                    property: property.clone(),
                    image1: row.image1,
                    image2: row.image2,
                    image3: row.image3,
                    image4: row.image4,
                    image5: row.image5,
                });
            }
        }
        Ok(favorites)
    }
}

/// Hands out `https://media.test/<file name>` and counts uploads.
#[derive(Default)]
pub struct FakeMedia {
    pub uploads: AtomicUsize,
    pub failing: AtomicBool,
}

#[async_trait]
impl MediaStore for FakeMedia {
    async fn upload(&self, image: ImageFile) -> Result<String, MediaError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MediaError::Provider("upload refused".to_string()));
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://media.test/{}", image.file_name.unwrap_or_default()))
    }
}

pub fn app() -> (Arc<MemoryStore>, Arc<FakeMedia>, Arc<AppData>) {
    let store = Arc::new(MemoryStore::default());
    let media = Arc::new(FakeMedia::default());
    let data = Arc::new(AppData {
        db: store.clone(),
        media: media.clone(),
    });
    (store, media, data)
}

pub fn property(name: &str) -> DbProperty {
    DbProperty {
        user_id: "Jane".to_string(),
        property_name: name.to_string(),
        address: "1 Oak Road".to_string(),
        price: 250000,
        kind: "Villa".to_string(),
        bedroom: 3,
        bathroom: 2,
        total_floors: 2,
        garden: true,
        power_backup: true,
        description: "Quiet street".to_string(),
    }
}

pub fn property_images(name: &str, urls: &[&str]) -> DbPropertyImages {
    let slot = |index: usize| urls.get(index).map(|url| url.to_string());
    DbPropertyImages {
        property_name: name.to_string(),
        image1: slot(0),
        image2: slot(1),
        image3: slot(2),
        image4: slot(3),
        image5: slot(4),
    }
}

pub fn listing_json(name: &str) -> String {
    json!({
        "person_name": "Jane",
        "property_name": name,
        "address": "1 Oak Road",
        "price": 250000,
        "type": "Villa",
        "bedroom": 3,
        "bathroom": 2,
        "total_floors": 2,
        "garden": true,
        "power": false,
        "description": "Quiet street"
    }).to_string()
}

/// Builds a `multipart/form-data` body, returning its content type and bytes.
pub fn multipart(data: Option<String>, images: &[(&str, &[u8])]) -> (String, Vec<u8>) {
    let boundary = "estate-listings-boundary";
    let mut body = Vec::new();

    if let Some(data) = data {
        body.extend_from_slice(format!("--{}\r\nContent-Disposition: form-data; name=\"data\"\r\n\r\n{}\r\n", boundary, data).as_bytes());
    }
    for (file_name, bytes) in images {
        body.extend_from_slice(format!("--{}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n", boundary, file_name).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}
