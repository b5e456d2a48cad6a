use async_trait::async_trait;
use sqlx::{Connection, FromRow};
use tracing::*;

use crate::database::properties::DbProperty;
use crate::database::{Database, DatabaseError};

/// A favorited property joined with its (possibly missing) image row.
#[derive(Debug, Clone, FromRow)]
pub struct DbFavorite {
    #[sqlx(flatten)]
    pub property: DbProperty,
    pub image1: Option<String>,
    pub image2: Option<String>,
    pub image3: Option<String>,
    pub image4: Option<String>,
    pub image5: Option<String>,
}

#[async_trait]
pub trait WishlistStore: Send + Sync {
    async fn insert_wishlist(&self, user_name: &str, property_name: &str) -> Result<(), DatabaseError>;

    /// Returns the number of removed rows, zero included.
    async fn delete_wishlist(&self, user_name: &str, property_name: &str) -> Result<u64, DatabaseError>;

    async fn select_favorites(&self, user_name: &str) -> Result<Vec<DbFavorite>, DatabaseError>;
}

#[async_trait]
impl WishlistStore for Database {
    #[instrument(skip(self), level = "debug")]
    async fn insert_wishlist(&self, user_name: &str, property_name: &str) -> Result<(), DatabaseError> {
        let mut conn = self.connect().await?;
        sqlx::query("INSERT INTO wishlist (user_name, wishlist_property) VALUES ($1, $2)")
            .bind(user_name)
            .bind(property_name)
            .execute(&mut conn).await?;
        conn.close().await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_wishlist(&self, user_name: &str, property_name: &str) -> Result<u64, DatabaseError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("DELETE FROM wishlist WHERE user_name = $1 AND wishlist_property = $2")
            .bind(user_name)
            .bind(property_name)
            .execute(&mut conn).await?;
        conn.close().await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), level = "debug")]
    async fn select_favorites(&self, user_name: &str) -> Result<Vec<DbFavorite>, DatabaseError> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query_as::<_, DbFavorite>(r#"
            SELECT p.user_id, p.property_name, p.address, p.price, p.type, p.bedroom, p.bathroom,
                   p.total_floors, p.garden, p.power_backup, p.description,
                   pi.image1, pi.image2, pi.image3, pi.image4, pi.image5
            FROM property p
            JOIN wishlist w ON p.property_name = w.wishlist_property
            LEFT JOIN property_images pi ON p.property_name = pi.property_name
            WHERE w.user_name = $1
        "#)
            .bind(user_name)
            .fetch_all(&mut conn).await?;
        conn.close().await?;
        Ok(rows)
    }
}
