use std::env::{var, VarError};

use sqlx::{Connection, PgConnection};
use thiserror::Error;
use tracing::*;

pub use crate::database::properties::PropertyStore;
pub use crate::database::wishlist::WishlistStore;

pub mod properties;
pub mod wishlist;

/// Handle on the relational store.
///
/// Only the connection URL is kept: every operation opens its own connection
/// and closes it once its statements are done.
pub struct Database {
    url: String,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("A required environment variable could not be found : {0}")]
    Var(#[from] VarError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Everything the HTTP layer needs from storage.
pub trait Store: PropertyStore + WishlistStore {}

impl<T: PropertyStore + WishlistStore> Store for T {}

#[instrument(name = "database_init")]
pub async fn init() -> Result<Database, DatabaseError> {
    let url = var("DATABASE_URL")?;

    let database = Database { url };

    let mut conn = database.connect().await?;
    conn.ping().await?;
    conn.close().await?;
    info!("Database is reachable");

    Ok(database)
}

impl Database {
    async fn connect(&self) -> Result<PgConnection, DatabaseError> {
        Ok(PgConnection::connect(&self.url).await?)
    }
}
