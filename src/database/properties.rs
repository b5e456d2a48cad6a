use async_trait::async_trait;
use sqlx::{Connection, FromRow};
use tracing::*;

use crate::database::{Database, DatabaseError};
use crate::structures::listings::{ImageSlots, ListingPayload};

#[derive(Debug, Clone, FromRow)]
pub struct DbProperty {
    pub user_id: String,
    pub property_name: String,
    pub address: String,
    pub price: i64,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub bedroom: i32,
    pub bathroom: i32,
    pub total_floors: i32,
    pub garden: bool,
    pub power_backup: bool,
    pub description: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbPropertyImages {
    pub property_name: String,
    pub image1: Option<String>,
    pub image2: Option<String>,
    pub image3: Option<String>,
    pub image4: Option<String>,
    pub image5: Option<String>,
}

#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Stores the image row then the property row as one unit.
    async fn insert_listing(&self, listing: &ListingPayload, images: &ImageSlots) -> Result<(), DatabaseError>;

    async fn select_properties(&self) -> Result<Vec<DbProperty>, DatabaseError>;

    async fn select_property_images(&self) -> Result<Vec<DbPropertyImages>, DatabaseError>;
}

#[async_trait]
impl PropertyStore for Database {
    #[instrument(skip(self, listing, images), fields(property = %listing.property_name), level = "debug")]
    async fn insert_listing(&self, listing: &ListingPayload, images: &ImageSlots) -> Result<(), DatabaseError> {
        let mut conn = self.connect().await?;
        // An error below returns before commit; dropping the transaction then
        // rolls back the image row already inserted.
        let mut tx = conn.begin().await?;

        sqlx::query("INSERT INTO property_images (property_name, image1, image2, image3, image4, image5) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(&listing.property_name)
            .bind(images.slot(0))
            .bind(images.slot(1))
            .bind(images.slot(2))
            .bind(images.slot(3))
            .bind(images.slot(4))
            .execute(&mut *tx).await?;

        sqlx::query("INSERT INTO property (user_id, property_name, address, price, type, bedroom, bathroom, total_floors, garden, power_backup, description) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)")
            .bind(&listing.person_name)
            .bind(&listing.property_name)
            .bind(&listing.address)
            .bind(listing.price)
            .bind(&listing.kind)
            .bind(listing.bedroom)
            .bind(listing.bathroom)
            .bind(listing.total_floors)
            .bind(listing.garden)
            .bind(listing.power)
            .bind(&listing.description)
            .execute(&mut *tx).await?;

        tx.commit().await?;
        conn.close().await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn select_properties(&self) -> Result<Vec<DbProperty>, DatabaseError> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query_as::<_, DbProperty>("SELECT user_id, property_name, address, price, type, bedroom, bathroom, total_floors, garden, power_backup, description FROM property")
            .fetch_all(&mut conn).await?;
        conn.close().await?;
        Ok(rows)
    }

    #[instrument(skip(self), level = "debug")]
    async fn select_property_images(&self) -> Result<Vec<DbPropertyImages>, DatabaseError> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query_as::<_, DbPropertyImages>("SELECT property_name, image1, image2, image3, image4, image5 FROM property_images")
            .fetch_all(&mut conn).await?;
        conn.close().await?;
        Ok(rows)
    }
}
