use std::env::VarError;

use async_trait::async_trait;
use thiserror::Error;

pub use crate::media::cloudinary::init;

pub mod cloudinary;

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("A required environment variable could not be found : {0}")]
    Var(#[from] VarError),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error("Media store : {0}")]
    Provider(String),
}

/// Hosted storage for listing photos.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Uploads one image and returns its public url.
    async fn upload(&self, image: ImageFile) -> Result<String, MediaError>;
}
